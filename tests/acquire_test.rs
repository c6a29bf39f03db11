mod common;

use common::{
    CopyRemuxer, FailingTagger, RecordingTagger, TruncatingRemuxer, downloadable_track,
    hls_track,
};
use scdlcli::{
    config::DEFAULT_TRACK_TEMPLATE,
    error::Gate,
    management::ScratchDir,
    media::{
        AcquisitionOptions, AcquisitionOrchestrator, AcquisitionResult, CollectionContext,
        Entitlement, QualityTier, SkipReason, acquire::full_size_artwork,
    },
    types::Track,
    utils::Metadata,
};
use serde_json::json;
use tempfile::TempDir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

const OPTIONS: AcquisitionOptions = AcquisitionOptions {
    tier: QualityTier::Aac,
    entitlement: Entitlement {
        is_high_tier_subscriber: false,
    },
    keep_cover: false,
};

fn album(total: u32) -> Metadata {
    Metadata {
        album: Some("Album".to_string()),
        albumartist: Some("artist".to_string()),
        tracktotal: total,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_existing_file_is_skipped_without_network() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let scratch = ScratchDir::create(dir.path().join("scratch")).await.unwrap();
    let folder = dir.path().join("artist - Album");
    std::fs::create_dir_all(&folder).unwrap();
    std::fs::write(folder.join("1. Song.m4a"), b"already here").unwrap();

    let client = common::test_client(&server.uri());
    let remuxer = CopyRemuxer::default();
    let tagger = RecordingTagger::default();
    let orchestrator = AcquisitionOrchestrator::new(&client, &remuxer, &tagger, &scratch, OPTIONS);

    let album = album(1);
    let ctx = CollectionContext {
        folder: &folder,
        album: &album,
        template: DEFAULT_TRACK_TEMPLATE,
        number_override: None,
        artwork_url: Some(format!("{}/art-large.jpg", server.uri())),
    };
    let tracks = vec![hls_track(&server.uri(), 1, "Song")];
    let report = orchestrator.process_collection(&tracks, &ctx).await;

    assert_eq!(report.entries.len(), 1);
    assert!(matches!(
        &report.entries[0].2,
        AcquisitionResult::Skipped(SkipReason::AlreadyExists(p)) if p == &folder.join("1. Song.m4a")
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
    assert_eq!(std::fs::read(folder.join("1. Song.m4a")).unwrap(), b"already here");
    assert_eq!(remuxer.call_count(), 0);
}

#[tokio::test]
async fn test_batch_continues_past_unstreamable_track() {
    let server = MockServer::start().await;
    let uri = server.uri();
    for id in [1, 2, 4, 5] {
        common::mount_track(&server, id).await;
    }
    Mock::given(method("GET"))
        .and(path("/art-t500x500.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"JPEG".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let scratch = ScratchDir::create(dir.path().join("scratch")).await.unwrap();
    let folder = dir.path().join("artist - Album");
    std::fs::create_dir_all(&folder).unwrap();

    let mut tracks: Vec<Track> = (1..=5)
        .map(|id| hls_track(&uri, id, &format!("Song {id}")))
        .collect();
    tracks[2].streamable = false;

    let client = common::test_client(&uri);
    let remuxer = CopyRemuxer::default();
    let tagger = RecordingTagger::default();
    let orchestrator = AcquisitionOrchestrator::new(&client, &remuxer, &tagger, &scratch, OPTIONS);

    let album = album(5);
    let ctx = CollectionContext {
        folder: &folder,
        album: &album,
        template: DEFAULT_TRACK_TEMPLATE,
        number_override: None,
        artwork_url: Some(format!("{uri}/art-large.jpg")),
    };
    let report = orchestrator.process_collection(&tracks, &ctx).await;

    assert_eq!(report.downloaded(), 4);
    assert_eq!(report.skipped(), 1);
    assert_eq!(report.failed(), 0);
    assert!(matches!(
        report.entries[2].2,
        AcquisitionResult::Skipped(SkipReason::NotDownloadable(Gate::NotStreamable))
    ));

    for id in [1, 2, 4, 5] {
        let final_path = folder.join(format!("{id}. Song {id}.m4a"));
        assert_eq!(
            std::fs::read(&final_path).unwrap(),
            format!("AUDIO{id}").into_bytes()
        );
        assert!(!folder.join(format!("{id}.m4a")).exists());
    }
    assert!(!folder.join("3. Song 3.m4a").exists());

    // Cover is fetched once, embedded, then removed.
    let calls = tagger.calls.lock().unwrap();
    assert_eq!(calls.len(), 4);
    assert!(calls.iter().all(|(_, cover)| cover.as_deref() == Some(&b"JPEG"[..])));
    assert_eq!(calls[0].0.tracknumber, 1);
    assert_eq!(calls[0].0.title.as_deref(), Some("Song 1"));
    assert_eq!(calls[0].0.artist.as_deref(), Some("artist"));
    assert!(!folder.join("cover.jpg").exists());

    // Every acquisition used its own scratch file.
    let scratch_paths: Vec<_> = remuxer
        .calls
        .lock()
        .unwrap()
        .iter()
        .map(|(input, _)| input.clone())
        .collect();
    let mut unique = scratch_paths.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), scratch_paths.len());
}

#[tokio::test]
async fn test_failed_track_is_recorded_and_batch_goes_on() {
    let server = MockServer::start().await;
    let uri = server.uri();
    common::mount_track(&server, 2).await;
    Mock::given(method("GET"))
        .and(path("/media/1/hls"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let scratch = ScratchDir::create(dir.path().join("scratch")).await.unwrap();
    let folder = dir.path().to_path_buf();

    let tracks = vec![hls_track(&uri, 1, "Broken"), hls_track(&uri, 2, "Fine")];
    let client = common::test_client(&uri);
    let remuxer = CopyRemuxer::default();
    let tagger = RecordingTagger::default();
    let options = AcquisitionOptions {
        keep_cover: true,
        ..OPTIONS
    };
    let orchestrator = AcquisitionOrchestrator::new(&client, &remuxer, &tagger, &scratch, options);

    let album = album(2);
    let ctx = CollectionContext {
        folder: &folder,
        album: &album,
        template: "{tracknumber} - {title}",
        number_override: None,
        artwork_url: None,
    };
    let report = orchestrator.process_collection(&tracks, &ctx).await;

    assert_eq!(report.failed(), 1);
    assert_eq!(report.downloaded(), 1);
    assert!(matches!(
        report.entries[0].2,
        AcquisitionResult::Failed(scdlcli::Error::Transport(_))
    ));
    assert!(folder.join("2 - Fine.m4a").is_file());
}

#[tokio::test]
async fn test_unknown_template_key_falls_back_to_default() {
    let server = MockServer::start().await;
    let uri = server.uri();
    common::mount_track(&server, 9).await;

    let dir = TempDir::new().unwrap();
    let scratch = ScratchDir::create(dir.path().join("scratch")).await.unwrap();
    let folder = dir.path().to_path_buf();

    let client = common::test_client(&uri);
    let remuxer = CopyRemuxer::default();
    let tagger = RecordingTagger::default();
    let orchestrator = AcquisitionOrchestrator::new(&client, &remuxer, &tagger, &scratch, OPTIONS);

    let album = album(12);
    let ctx = CollectionContext {
        folder: &folder,
        album: &album,
        template: "{bpm} {title}",
        number_override: Some(7),
        artwork_url: None,
    };
    let report = orchestrator
        .process_collection(&[hls_track(&uri, 9, "A/B")], &ctx)
        .await;

    assert_eq!(report.downloaded(), 1);
    assert_eq!(report.total, 12);
    assert_eq!(report.entries[0].0, 7);
    assert!(folder.join("07. A_B.m4a").is_file());
}

#[tokio::test]
async fn test_failed_remux_leaves_no_partial_file() {
    let server = MockServer::start().await;
    let uri = server.uri();
    common::mount_track(&server, 1).await;

    let dir = TempDir::new().unwrap();
    let scratch = ScratchDir::create(dir.path().join("scratch")).await.unwrap();
    let folder = dir.path().join("out");
    std::fs::create_dir_all(&folder).unwrap();

    let client = common::test_client(&uri);
    let tagger = RecordingTagger::default();
    let album = album(1);
    let ctx = CollectionContext {
        folder: &folder,
        album: &album,
        template: "{tracknumber}",
        number_override: None,
        artwork_url: None,
    };
    let tracks = vec![hls_track(&uri, 1, "Song")];

    let broken = TruncatingRemuxer;
    let report = AcquisitionOrchestrator::new(&client, &broken, &tagger, &scratch, OPTIONS)
        .process_collection(&tracks, &ctx)
        .await;
    scratch.cleanup().await.unwrap();

    assert!(matches!(
        report.entries[0].2,
        AcquisitionResult::Failed(scdlcli::Error::Mux(_))
    ));
    assert_eq!(std::fs::read_dir(&folder).unwrap().count(), 0);
    assert!(tagger.calls.lock().unwrap().is_empty());

    // A retry is not mistaken for an existing download.
    let remuxer = CopyRemuxer::default();
    let retry = AcquisitionOrchestrator::new(&client, &remuxer, &tagger, &scratch, OPTIONS)
        .process_collection(&tracks, &ctx)
        .await;
    assert!(retry.entries[0].2.is_success());
    assert_eq!(std::fs::read(folder.join("1.m4a")).unwrap(), b"AUDIO1");
}

#[tokio::test]
async fn test_best_tier_uses_download_button() {
    let server = MockServer::start().await;
    let uri = server.uri();
    Mock::given(method("GET"))
        .and(path("/tracks/1/download"))
        .and(header("authorization", "OAuth 2-123456-abcdef"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "redirectUri": format!("{uri}/files/abc") })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/files/abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Disposition", "attachment;filename=\"Song Master.wav\""),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"RIFFWAVE".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let scratch = ScratchDir::create(dir.path().join("scratch")).await.unwrap();
    let folder = dir.path().join("out");
    std::fs::create_dir_all(&folder).unwrap();

    let client = common::test_client(&uri);
    let remuxer = CopyRemuxer::default();
    let tagger = RecordingTagger::default();
    let options = AcquisitionOptions {
        tier: QualityTier::Best,
        ..OPTIONS
    };
    let orchestrator = AcquisitionOrchestrator::new(&client, &remuxer, &tagger, &scratch, options);

    let album = album(1);
    let ctx = CollectionContext {
        folder: &folder,
        album: &album,
        template: DEFAULT_TRACK_TEMPLATE,
        number_override: None,
        artwork_url: Some(format!("{uri}/art-large.jpg")),
    };
    let tracks = vec![downloadable_track(&uri, 1, "Song")];
    let report = orchestrator.process_collection(&tracks, &ctx).await;

    let final_path = folder.join("1. Song.wav");
    assert!(matches!(&report.entries[0].2, AcquisitionResult::Success(p) if p == &final_path));
    assert_eq!(std::fs::read(&final_path).unwrap(), b"RIFFWAVE");
    assert!(!folder.join("1.wav").exists());
    assert!(!folder.join("cover.jpg").exists());
    assert_eq!(remuxer.call_count(), 0);
    assert!(tagger.calls.lock().unwrap().is_empty());

    // The same stem with the original's extension counts as already downloaded.
    let requests_before = server.received_requests().await.unwrap().len();
    let rerun = orchestrator.process_collection(&tracks, &ctx).await;
    assert!(matches!(
        &rerun.entries[0].2,
        AcquisitionResult::Skipped(SkipReason::AlreadyExists(p)) if p == &final_path
    ));
    assert_eq!(
        server.received_requests().await.unwrap().len(),
        requests_before
    );
}

#[tokio::test]
async fn test_rename_failure_keeps_transient_file() {
    let server = MockServer::start().await;
    let uri = server.uri();
    common::mount_track(&server, 1).await;
    common::mount_track(&server, 2).await;

    let dir = TempDir::new().unwrap();
    let scratch = ScratchDir::create(dir.path().join("scratch")).await.unwrap();
    let folder = dir.path().join("out");
    std::fs::create_dir_all(folder.join("1. One.m4a")).unwrap();

    let client = common::test_client(&uri);
    let remuxer = CopyRemuxer::default();
    let tagger = RecordingTagger::default();
    let orchestrator = AcquisitionOrchestrator::new(&client, &remuxer, &tagger, &scratch, OPTIONS);

    let album = album(2);
    let ctx = CollectionContext {
        folder: &folder,
        album: &album,
        template: DEFAULT_TRACK_TEMPLATE,
        number_override: None,
        artwork_url: None,
    };
    let tracks = vec![hls_track(&uri, 1, "One"), hls_track(&uri, 2, "Two")];
    let report = orchestrator.process_collection(&tracks, &ctx).await;

    assert!(matches!(
        report.entries[0].2,
        AcquisitionResult::Failed(scdlcli::Error::Rename { .. })
    ));
    assert_eq!(std::fs::read(folder.join("1.m4a")).unwrap(), b"AUDIO1");
    assert!(report.entries[1].2.is_success());
    assert!(folder.join("2. Two.m4a").is_file());
    assert_eq!((report.downloaded(), report.failed()), (1, 1));
}

#[tokio::test]
async fn test_tag_failure_is_reported_as_untagged() {
    let server = MockServer::start().await;
    let uri = server.uri();
    common::mount_track(&server, 1).await;

    let dir = TempDir::new().unwrap();
    let scratch = ScratchDir::create(dir.path().join("scratch")).await.unwrap();
    let folder = dir.path().join("out");
    std::fs::create_dir_all(&folder).unwrap();

    let client = common::test_client(&uri);
    let remuxer = CopyRemuxer::default();
    let tagger = FailingTagger;
    let orchestrator = AcquisitionOrchestrator::new(&client, &remuxer, &tagger, &scratch, OPTIONS);

    let album = album(1);
    let ctx = CollectionContext {
        folder: &folder,
        album: &album,
        template: DEFAULT_TRACK_TEMPLATE,
        number_override: None,
        artwork_url: None,
    };
    let report = orchestrator
        .process_collection(&[hls_track(&uri, 1, "Song")], &ctx)
        .await;

    let final_path = folder.join("1. Song.m4a");
    assert!(matches!(
        &report.entries[0].2,
        AcquisitionResult::Untagged { path, .. } if path == &final_path
    ));
    assert!(report.entries[0].2.to_string().contains("tags not written"));
    assert_eq!(report.downloaded(), 1);
    assert_eq!(report.untagged(), 1);
    assert!(final_path.is_file());
}

#[test]
fn test_full_size_artwork() {
    assert_eq!(
        full_size_artwork("https://i1.sndcdn.com/artworks-000-abc-large.jpg"),
        "https://i1.sndcdn.com/artworks-000-abc-t500x500.jpg"
    );
    assert_eq!(
        full_size_artwork("https://i1.sndcdn.com/avatar.png"),
        "https://i1.sndcdn.com/avatar.png"
    );
}

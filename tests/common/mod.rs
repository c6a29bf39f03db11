#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};

use scdlcli::{
    Error, Res,
    media::{Remuxer, Tagger},
    soundcloud::{Client, ClientOptions},
    types::Track,
    utils::Metadata,
};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

pub fn test_client(server_uri: &str) -> Client {
    Client::new(ClientOptions {
        api_url: server_uri.to_string(),
        web_url: server_uri.to_string(),
        client_id: "test-client-id".to_string(),
        app_version: "1700000000".to_string(),
        locale: "en".to_string(),
        oauth_token: "2-123456-abcdef".to_string(),
        page_delay: Duration::ZERO,
    })
    .unwrap()
}

/// A fully hydrated track with one HLS AAC transcoding served from `server_uri`.
pub fn hls_track(server_uri: &str, id: u64, title: &str) -> Track {
    serde_json::from_value(json!({
        "id": id,
        "title": title,
        "permalink_url": format!("https://soundcloud.com/artist/{id}"),
        "streamable": true,
        "monetization_model": "AD_SUPPORTED",
        "policy": "ALLOW",
        "downloadable": false,
        "has_downloads_left": false,
        "user": { "id": 7, "username": "artist" },
        "media": {
            "transcodings": [{
                "url": format!("{server_uri}/media/{id}/hls"),
                "format": { "protocol": "hls", "mime_type": "audio/mp4; codecs=\"mp4a.40.2\"" }
            }]
        }
    }))
    .unwrap()
}

pub fn playlist_body(init: Option<&str>, segments: &[&str]) -> String {
    let mut body = String::from(
        "#EXTM3U\n#EXT-X-VERSION:7\n#EXT-X-TARGETDURATION:10\n#EXT-X-MEDIA-SEQUENCE:0\n",
    );
    if let Some(init) = init {
        body.push_str(&format!("#EXT-X-MAP:URI=\"{init}\"\n"));
    }
    for segment in segments {
        body.push_str("#EXTINF:10.0,\n");
        body.push_str(segment);
        body.push('\n');
    }
    body.push_str("#EXT-X-ENDLIST\n");
    body
}

/// Copies the input to the output and records every call.
#[derive(Default)]
pub struct CopyRemuxer {
    pub calls: Mutex<Vec<(PathBuf, PathBuf)>>,
}

impl CopyRemuxer {
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Remuxer for CopyRemuxer {
    async fn remux(&self, input: &Path, output: &Path) -> Res<()> {
        self.calls
            .lock()
            .unwrap()
            .push((input.to_path_buf(), output.to_path_buf()));
        tokio::fs::copy(input, output).await?;
        Ok(())
    }
}

/// Records the metadata and cover it is asked to write.
#[derive(Default)]
pub struct RecordingTagger {
    pub calls: Mutex<Vec<(Metadata, Option<Vec<u8>>)>>,
}

impl Tagger for RecordingTagger {
    fn write(
        &self,
        meta: &Metadata,
        _path: &Path,
        _extension: &str,
        cover: Option<&[u8]>,
    ) -> Res<()> {
        self.calls
            .lock()
            .unwrap()
            .push((meta.clone(), cover.map(<[u8]>::to_vec)));
        Ok(())
    }
}

/// Leaves a half-written output behind and then fails, like an aborted mux.
#[derive(Default)]
pub struct TruncatingRemuxer;

impl Remuxer for TruncatingRemuxer {
    async fn remux(&self, _input: &Path, output: &Path) -> Res<()> {
        tokio::fs::write(output, b"HALF").await?;
        Err(Error::Mux("exit status: 1".to_string()))
    }
}

/// Rejects every tag write.
#[derive(Default)]
pub struct FailingTagger;

impl Tagger for FailingTagger {
    fn write(
        &self,
        _meta: &Metadata,
        _path: &Path,
        _extension: &str,
        _cover: Option<&[u8]>,
    ) -> Res<()> {
        Err(Error::Config("tag store is read-only".to_string()))
    }
}

/// A track whose download button is enabled and whose only transcode is HLS AAC.
pub fn downloadable_track(server_uri: &str, id: u64, title: &str) -> Track {
    let mut track = hls_track(server_uri, id, title);
    track.downloadable = true;
    track.has_downloads_left = true;
    track
}

/// Serves the HLS chain of an [`hls_track`] whose audio is `AUDIO<id>`.
pub async fn mount_track(server: &MockServer, id: u64) {
    let uri = server.uri();
    Mock::given(method("GET"))
        .and(path(format!("/media/{id}/hls")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "url": format!("{uri}/playlists/{id}/index.m3u8") })),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/playlists/{id}/index.m3u8")))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(playlist_body(None, &["seg.m4s"])),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/playlists/{id}/seg.m4s")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(format!("AUDIO{id}").into_bytes()))
        .mount(server)
        .await;
}

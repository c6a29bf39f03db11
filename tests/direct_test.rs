mod common;

use scdlcli::{Error, media::DirectDownloader};
use tempfile::TempDir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

#[tokio::test]
async fn test_direct_download_streams_body_to_file() {
    let server = MockServer::start().await;
    let body: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
    Mock::given(method("GET"))
        .and(path("/files/original.wav"))
        .and(header("range", "bytes=0-"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("1.wav");
    let client = common::test_client(&server.uri());

    let written = DirectDownloader::new(client.cdn())
        .download(&format!("{}/files/original.wav", server.uri()), &output)
        .await
        .unwrap();

    assert_eq!(written, body.len() as u64);
    assert_eq!(std::fs::read(&output).unwrap(), body);
}

#[tokio::test]
async fn test_direct_download_accepts_partial_content() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/original.flac"))
        .respond_with(ResponseTemplate::new(206).set_body_bytes(b"fLaC".to_vec()))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("1.flac");
    let client = common::test_client(&server.uri());

    DirectDownloader::new(client.cdn())
        .download(&format!("{}/files/original.flac", server.uri()), &output)
        .await
        .unwrap();

    assert_eq!(std::fs::read(&output).unwrap(), b"fLaC");
}

#[tokio::test]
async fn test_direct_download_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/gone.wav"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("1.wav");
    let client = common::test_client(&server.uri());

    let result = DirectDownloader::new(client.cdn())
        .download(&format!("{}/files/gone.wav", server.uri()), &output)
        .await;

    assert!(matches!(result, Err(Error::Transport(_))));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_download_link_reads_content_disposition() {
    let server = MockServer::start().await;
    let uri = server.uri();
    Mock::given(method("GET"))
        .and(path("/tracks/42/download"))
        .and(header("authorization", "OAuth 2-123456-abcdef"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "redirectUri": format!("{uri}/files/abc") })),
        )
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/files/abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Disposition", "attachment;filename=\"My Song (Master).aiff\""),
        )
        .mount(&server)
        .await;

    let client = common::test_client(&uri);
    let link = client.download_link(42).await.unwrap();

    assert_eq!(link.filename, "My Song (Master).aiff");
    assert_eq!(link.extension, ".aiff");
    assert_eq!(link.url, format!("{uri}/files/abc"));
}

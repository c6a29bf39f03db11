mod common;

use scdlcli::soundcloud::{Cursor, Paginator};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

#[tokio::test]
async fn test_single_page_issues_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/1/tracks"))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "20"))
        .and(query_param("client_id", "test-client-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "collection": [1, 2, 3],
            "next_href": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::test_client(&server.uri());
    let items: Vec<u64> = Paginator::new(&client, "users/1/tracks".to_string(), 20)
        .fetch_all()
        .await
        .unwrap();

    assert_eq!(items, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_numeric_then_opaque_cursor_keeps_order() {
    let server = MockServer::start().await;
    let uri = server.uri();

    Mock::given(method("GET"))
        .and(path("/users/1/track_likes"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "collection": ["a", "b"],
            "next_href": format!("{uri}/users/1/track_likes?offset=24&limit=24")
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Numeric follow-ups advance by the number of items actually received.
    Mock::given(method("GET"))
        .and(path("/users/1/track_likes"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "collection": ["c", "d"],
            "next_href": format!("{uri}/users/1/track_likes?offset=2024-01-01T00%3A00%3A00.000Z%2Cuser-track-likes%2C99&limit=24")
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/1/track_likes"))
        .and(query_param(
            "offset",
            "2024-01-01T00:00:00.000Z,user-track-likes,99",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "collection": ["e"],
            "next_href": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::test_client(&uri);
    let items: Vec<String> = Paginator::new(&client, "users/1/track_likes".to_string(), 24)
        .fetch_all()
        .await
        .unwrap();

    assert_eq!(items, vec!["a", "b", "c", "d", "e"]);
}

#[tokio::test]
async fn test_empty_listing_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/1/albums"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "collection": [],
            "next_href": null
        })))
        .mount(&server)
        .await;

    let client = common::test_client(&server.uri());
    let items: Vec<u64> = Paginator::new(&client, "users/1/albums".to_string(), 10)
        .fetch_all()
        .await
        .unwrap();

    assert!(items.is_empty());
}

#[tokio::test]
async fn test_failed_page_fails_the_listing() {
    let server = MockServer::start().await;
    let uri = server.uri();

    Mock::given(method("GET"))
        .and(path("/users/1/tracks"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "collection": [1],
            "next_href": format!("{uri}/users/1/tracks?offset=1")
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/1/tracks"))
        .and(query_param("offset", "1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = common::test_client(&uri);
    let result: scdlcli::Res<Vec<u64>> = Paginator::new(&client, "users/1/tracks".to_string(), 20)
        .fetch_all()
        .await;

    assert!(matches!(result, Err(scdlcli::Error::Transport(_))));
}

#[test]
fn test_cursor_decode() {
    assert_eq!(
        Cursor::decode("https://api-v2.soundcloud.com/users/1/tracks?offset=40&limit=20").unwrap(),
        Cursor::NumericOffset(40)
    );
    assert_eq!(
        Cursor::decode("https://api-v2.soundcloud.com/users/1/track_likes?offset=1612-abc&limit=24")
            .unwrap(),
        Cursor::OpaqueToken("1612-abc".to_string())
    );
    assert_eq!(
        Cursor::decode("/users/1/tracks?limit=20&offset=7").unwrap(),
        Cursor::NumericOffset(7)
    );
    assert!(Cursor::decode("https://api-v2.soundcloud.com/users/1/tracks?limit=20").is_err());
}

#[test]
fn test_cursor_advance() {
    let start = Cursor::NumericOffset(0);
    let next = start.advance(Cursor::NumericOffset(999), 20);
    assert_eq!(next, Cursor::NumericOffset(20));

    let opaque = next.advance(Cursor::OpaqueToken("x-y".to_string()), 20);
    assert_eq!(opaque, Cursor::OpaqueToken("x-y".to_string()));
    assert_eq!(opaque.as_param(), "x-y");

    let back = opaque.advance(Cursor::NumericOffset(60), 20);
    assert_eq!(back, Cursor::NumericOffset(60));
}

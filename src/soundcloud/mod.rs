//! # SoundCloud Integration Module
//!
//! This module is the only place that talks to SoundCloud's web and v2 API
//! endpoints. Everything above it works with the typed objects from
//! [`crate::types`].
//!
//! ## Architecture
//!
//! ```text
//! CLI Layer (per-URL handlers)
//!          ↓
//! Media Layer (selection, acquisition)
//!          ↓
//! SoundCloud Integration Layer
//!     ├── Client (cookie-authenticated API calls)
//!     └── Pagination (cursor-following listings)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//! ```
//!
//! ## Authentication
//!
//! There is no OAuth flow here. The user exports the cookies of a signed-in
//! browser session; the `oauth_token` cookie is sent as an
//! `Authorization: OAuth <token>` header on every API call. The API also wants
//! the `client_id` of the web player, which [`discover_client_id`] scrapes
//! from the website's script bundles.
//!
//! ## API Coverage
//!
//! - `GET /me` - signed-in user id and subscription plan
//! - `GET /resolve?url=` - any permalink to its track/set object
//! - `GET /users/{id}` - artist profile
//! - `GET /users/{id}/albums`, `/users/{id}/tracks`, `/users/{id}/track_likes` - paginated listings
//! - `GET /tracks?ids=` - full objects for playlist stubs
//! - `GET /tracks/{id}/download` - direct download redirect
//!
//! ## Error Handling
//!
//! Every non-success status is turned into [`crate::Error::Transport`] right
//! where the response arrives. Nothing in this module retries; a failed page
//! or request fails the whole operation and the caller decides what that
//! means for the batch.

mod client;
mod pagination;

pub use client::{Client, ClientOptions, DirectDownload, StreamPlaylist};
pub use pagination::{Cursor, Paginator};

use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};

use crate::{Error, Res, utils};

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/89.0.4389.114 Safari/537.36";

pub(crate) fn browser_headers(web_url: &str) -> Res<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    let referer = HeaderValue::from_str(&format!("{}/", web_url.trim_end_matches('/')))
        .map_err(|e| Error::Config(format!("invalid web URL {web_url}: {e}")))?;
    headers.insert(REFERER, referer);
    Ok(headers)
}

/// Scrapes the web player's app version and client id.
///
/// Loads the discover page, reads the 10-digit app version it embeds and
/// walks the page's script bundles until one of them contains a
/// `client_id=` literal.
///
/// # Returns
///
/// `(app_version, client_id)` on success.
///
/// # Errors
///
/// - [`Error::Transport`] if the page or a script cannot be fetched
/// - [`Error::Auth`] if no script carries a client id
pub async fn discover_client_id(web_url: &str) -> Res<(String, String)> {
    let http = reqwest::Client::builder()
        .default_headers(browser_headers(web_url)?)
        .build()?;

    let page_url = format!("{}/discover", web_url.trim_end_matches('/'));
    let html = http
        .get(&page_url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let version_re = utils::pattern(r#"<script>window.__sc_version="(\d{10})"</script>"#)?;
    let app_version = version_re
        .captures(&html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| Error::Auth("app version not found on the discover page".to_string()))?;

    let script_re = utils::pattern(r#"<script crossorigin src="([^"]+)""#)?;
    let client_id_re = utils::pattern(r"client_id=([a-zA-Z\d]{32})")?;

    for script in script_re.captures_iter(&html) {
        let script_url = &script[1];
        let body = http
            .get(script_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        if let Some(client_id) = client_id_re.captures(&body).and_then(|c| c.get(1)) {
            return Ok((app_version, client_id.as_str().to_string()));
        }
    }

    Err(Error::Auth(
        "no client id found in the web player scripts".to_string(),
    ))
}

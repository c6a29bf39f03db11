use std::{collections::HashMap, time::Duration};

use reqwest::header::{AUTHORIZATION, CONTENT_DISPOSITION, HeaderValue};
use serde::de::DeserializeOwned;

use crate::{
    Error, Res,
    soundcloud::{Paginator, browser_headers},
    types::{
        DownloadRedirect, Like, Me, Page, Plan, Playlist, StreamLocation, Track, User,
    },
    utils,
};

/// Maximum number of ids the `/tracks` endpoint accepts per call.
const HYDRATE_CHUNK: usize = 50;

/// Everything needed to build a [`Client`] without touching the network.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub api_url: String,
    pub web_url: String,
    pub client_id: String,
    pub app_version: String,
    pub locale: String,
    pub oauth_token: String,
    pub page_delay: Duration,
}

/// A playlist fetched through the stream indirection, with the URL it was
/// served from so relative segment URIs can be resolved.
#[derive(Debug, Clone)]
pub struct StreamPlaylist {
    pub url: String,
    pub body: String,
}

/// A resolved "download button" link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectDownload {
    pub filename: String,
    pub extension: String,
    pub url: String,
}

/// Cookie-authenticated SoundCloud API client.
///
/// Holds two HTTP clients: `http` carries the OAuth header and talks to the
/// API, `cdn` is header-free and fetches media (segments, redirect targets,
/// cover art) from third-party hosts.
pub struct Client {
    http: reqwest::Client,
    cdn: reqwest::Client,
    api_url: String,
    web_url: String,
    client_id: String,
    app_version: String,
    locale: String,
    page_delay: Duration,
    user_id: Option<u64>,
    plan: Plan,
}

impl Client {
    pub fn new(options: ClientOptions) -> Res<Self> {
        let mut headers = browser_headers(&options.web_url)?;
        let auth = HeaderValue::from_str(&format!("OAuth {}", options.oauth_token))
            .map_err(|e| Error::Auth(format!("invalid oauth token: {e}")))?;
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder().default_headers(headers).build()?;
        let cdn = reqwest::Client::builder()
            .default_headers(browser_headers(&options.web_url)?)
            .build()?;

        Ok(Self {
            http,
            cdn,
            api_url: options.api_url.trim_end_matches('/').to_string(),
            web_url: options.web_url.trim_end_matches('/').to_string(),
            client_id: options.client_id,
            app_version: options.app_version,
            locale: options.locale,
            page_delay: options.page_delay,
            user_id: None,
            plan: Plan::Free,
        })
    }

    /// Fetches the signed-in user and their subscription plan.
    ///
    /// Must run before [`Client::user_likes`]; the plan decides whether
    /// high-tier tracks can be downloaded.
    pub async fn sign_in(&mut self) -> Res<Plan> {
        let me: Me = self.make_call("me", &[]).await?;
        let product = me
            .consumer_subscription
            .map(|s| s.product.id)
            .unwrap_or_else(|| "free".to_string());
        let plan = Plan::from_product_id(&product)
            .ok_or_else(|| Error::Api(format!("unknown subscription product: {product}")))?;

        self.user_id = Some(me.id);
        self.plan = plan;
        Ok(plan)
    }

    pub fn plan(&self) -> Plan {
        self.plan
    }

    pub fn cdn(&self) -> &reqwest::Client {
        &self.cdn
    }

    pub fn page_delay(&self) -> Duration {
        self.page_delay
    }

    /// Issues an API GET and decodes the JSON body. `client_id` is always appended.
    pub async fn make_call<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Res<T> {
        let url = format!("{}/{}", self.api_url, endpoint.trim_start_matches('/'));
        let response = self
            .http
            .get(&url)
            .query(params)
            .query(&[("client_id", self.client_id.as_str())])
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<T>().await?)
    }

    /// Parameters every listing call carries besides the cursor.
    pub fn listing_params(&self, limit: u32) -> Vec<(&'static str, String)> {
        vec![
            ("limit", limit.to_string()),
            ("app_version", self.app_version.clone()),
            ("app_locale", self.locale.clone()),
        ]
    }

    pub async fn resolve<T: DeserializeOwned>(&self, url: &str) -> Res<T> {
        self.make_call("resolve", &[("url", url.to_string())]).await
    }

    /// Reads the numeric user id from an artist's profile page.
    pub async fn artist_id(&self, url: &str) -> Res<String> {
        let html = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let re = utils::pattern(r#"content="soundcloud://users:(\d+)">"#)?;
        re.captures(&html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| Error::Api(format!("no user id found on {url}")))
    }

    pub async fn artist_info(&self, url: &str) -> Res<User> {
        let artist_id = self.artist_id(url).await?;
        let params = [
            ("app_version", self.app_version.clone()),
            ("app_locale", self.locale.clone()),
        ];
        self.make_call(&format!("users/{artist_id}"), &params).await
    }

    pub async fn artist_albums(&self, artist_id: u64) -> Res<Vec<Playlist>> {
        Paginator::new(self, format!("users/{artist_id}/albums"), 10)
            .with_label("albums")
            .fetch_all()
            .await
    }

    pub async fn artist_tracks(&self, artist_id: u64) -> Res<Vec<Track>> {
        Paginator::new(self, format!("users/{artist_id}/tracks"), 20)
            .with_label("tracks")
            .fetch_all()
            .await
    }

    pub async fn user_likes(&self) -> Res<Vec<Like>> {
        let user_id = self
            .user_id
            .ok_or_else(|| Error::Auth("not signed in".to_string()))?;
        Paginator::new(self, format!("users/{user_id}/track_likes"), 24)
            .with_label("likes")
            .fetch_all()
            .await
    }

    /// Replaces id-only playlist entries with full track objects, keeping order.
    ///
    /// Ids the API does not return stay as stubs; they fail the streamability
    /// check later and are reported as skipped.
    pub async fn hydrate_tracks(&self, tracks: Vec<Track>) -> Res<Vec<Track>> {
        let stub_ids: Vec<u64> = tracks.iter().filter(|t| t.is_stub()).map(|t| t.id).collect();
        if stub_ids.is_empty() {
            return Ok(tracks);
        }

        let mut full: HashMap<u64, Track> = HashMap::new();
        for chunk in stub_ids.chunks(HYDRATE_CHUNK) {
            let ids = chunk
                .iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join(",");
            let fetched: Vec<Track> = self.make_call("tracks", &[("ids", ids)]).await?;
            full.extend(fetched.into_iter().map(|t| (t.id, t)));
        }

        Ok(tracks
            .into_iter()
            .map(|t| {
                if t.is_stub() {
                    full.remove(&t.id).unwrap_or(t)
                } else {
                    t
                }
            })
            .collect())
    }

    /// Follows a transcoding URL to its playlist text.
    ///
    /// The transcoding URL answers with `{"url": ...}`; that second URL serves
    /// the actual m3u8 body.
    pub async fn stream_playlist(&self, transcoding_url: &str) -> Res<StreamPlaylist> {
        let location: StreamLocation = self
            .http
            .get(transcoding_url)
            .query(&[("client_id", self.client_id.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let body = self
            .http
            .get(&location.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(StreamPlaylist {
            url: location.url,
            body,
        })
    }

    /// Resolves the download button of a track to its file URL and name.
    ///
    /// Costs two round trips: the API call that yields the redirect target and
    /// a `HEAD` on that target to read the original filename.
    pub async fn download_link(&self, track_id: u64) -> Res<DirectDownload> {
        let params = [
            ("app_version", self.app_version.clone()),
            ("app_locale", self.locale.clone()),
        ];
        let redirect: DownloadRedirect = self
            .make_call(&format!("tracks/{track_id}/download"), &params)
            .await?;

        let head = self
            .cdn
            .head(&redirect.redirect_uri)
            .send()
            .await?
            .error_for_status()?;

        let filename = head
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition)
            .or_else(|| filename_from_url(&redirect.redirect_uri))
            .ok_or_else(|| {
                Error::Api(format!("no filename for download of track {track_id}"))
            })?;

        let extension = match filename.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => format!(".{ext}"),
            _ => {
                return Err(Error::Api(format!(
                    "download of track {track_id} has no extension: {filename}"
                )));
            }
        };

        Ok(DirectDownload {
            filename,
            extension,
            url: redirect.redirect_uri,
        })
    }

    pub async fn fetch_bytes(&self, url: &str) -> Res<Vec<u8>> {
        let bytes = self
            .cdn
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }

    pub fn web_url(&self) -> &str {
        &self.web_url
    }

    /// Decodes one page from an arbitrary listing endpoint.
    pub(crate) async fn page<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Res<Page<T>> {
        self.make_call(endpoint, params).await
    }
}

fn filename_from_disposition(value: &str) -> Option<String> {
    value
        .split('"')
        .nth(1)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

fn filename_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .next_back()
        .filter(|segment| segment.contains('.'))
        .map(str::to_string)
}

use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// One page of a cursor-paginated collection endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub collection: Vec<T>,
    pub next_href: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientIdentity {
    pub app_version: String,
    pub client_id: String,
    pub obtained_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Me {
    pub id: u64,
    pub consumer_subscription: Option<ConsumerSubscription>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsumerSubscription {
    pub product: Product,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    pub id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    Free,
    ProUnlimited,
    GoPlus,
    GoPlusDj,
}

impl Plan {
    pub fn from_product_id(id: &str) -> Option<Self> {
        match id {
            "free" => Some(Plan::Free),
            "pro-unlimited" => Some(Plan::ProUnlimited),
            "consumer-high-tier" => Some(Plan::GoPlus),
            "consumer-high-dj-tier" => Some(Plan::GoPlusDj),
            _ => None,
        }
    }

    pub fn is_high_tier(&self) -> bool {
        matches!(self, Plan::GoPlus | Plan::GoPlusDj)
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Plan::Free => "free",
            Plan::ProUnlimited => "Pro Unlimited",
            Plan::GoPlus => "Go+",
            Plan::GoPlusDj => "Go+ DJ",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub full_name: Option<String>,
    pub permalink: Option<String>,
    pub permalink_url: Option<String>,
    pub city: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: u64,
    pub username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonetizationModel {
    AdSupported,
    Blackbox,
    NotApplicable,
    SubHighTier,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Policy {
    Allow,
    Monetize,
    Snip,
    Block,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublisherMetadata {
    pub artist: Option<String>,
    pub isrc: Option<String>,
    pub upc_or_ean: Option<String>,
    pub c_line: Option<String>,
    pub p_line: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Format {
    pub protocol: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcoding {
    pub url: String,
    pub format: Format,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Media {
    #[serde(default)]
    pub transcodings: Vec<Transcoding>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: u64,
    pub title: Option<String>,
    pub permalink_url: Option<String>,
    pub artwork_url: Option<String>,
    pub release_date: Option<String>,
    pub genre: Option<String>,
    pub label_name: Option<String>,
    #[serde(default)]
    pub streamable: bool,
    pub monetization_model: Option<MonetizationModel>,
    pub policy: Option<Policy>,
    #[serde(default)]
    pub downloadable: bool,
    #[serde(default)]
    pub has_downloads_left: bool,
    pub media: Option<Media>,
    pub user: Option<UserSummary>,
    pub publisher_metadata: Option<PublisherMetadata>,
}

impl Track {
    /// Playlist listings only carry full objects for the first few entries;
    /// the rest are `{id, kind}` stubs.
    pub fn is_stub(&self) -> bool {
        self.media.is_none() || self.title.is_none()
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("Unknown Title")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: u64,
    pub title: String,
    pub permalink_url: Option<String>,
    pub artwork_url: Option<String>,
    pub genre: Option<String>,
    pub release_date: Option<String>,
    pub user: UserSummary,
    pub publisher_metadata: Option<PublisherMetadata>,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Like {
    pub track: Track,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamLocation {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadRedirect {
    #[serde(rename = "redirectUri")]
    pub redirect_uri: String,
}

#[derive(Tabled)]
pub struct BatchReportRow {
    pub track: String,
    pub title: String,
    pub outcome: String,
}

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::de::DeserializeOwned;
use tokio::time::sleep;

use crate::{Error, Res, soundcloud::Client};

/// Position of the next page in a listing.
///
/// Some listings page by plain numeric offset; others hand out an opaque
/// continuation key in the same `offset` parameter. A token containing any
/// non-digit character is treated as opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cursor {
    NumericOffset(u64),
    OpaqueToken(String),
}

impl Cursor {
    /// Decodes the `offset` query parameter of a `next_href`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] if the link carries no `offset` parameter.
    pub fn decode(next_href: &str) -> Res<Self> {
        let url = url::Url::parse(next_href)
            .or_else(|_| url::Url::parse("https://api.invalid/").and_then(|b| b.join(next_href)))
            .map_err(|e| Error::Api(format!("malformed next_href {next_href}: {e}")))?;

        let token = url
            .query_pairs()
            .find(|(key, _)| key == "offset")
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| Error::Api(format!("next_href without offset: {next_href}")))?;

        if !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()) {
            match token.parse() {
                Ok(offset) => Ok(Cursor::NumericOffset(offset)),
                Err(_) => Ok(Cursor::OpaqueToken(token)),
            }
        } else {
            Ok(Cursor::OpaqueToken(token))
        }
    }

    /// Cursor for the request after a page of `count` items.
    ///
    /// A numeric follow-up advances the local offset by the page size rather
    /// than trusting the server's number; an opaque follow-up is adopted
    /// verbatim.
    pub fn advance(self, next: Cursor, count: usize) -> Cursor {
        match (self, next) {
            (_, Cursor::OpaqueToken(token)) => Cursor::OpaqueToken(token),
            (Cursor::NumericOffset(offset), Cursor::NumericOffset(_)) => {
                Cursor::NumericOffset(offset + count as u64)
            }
            (Cursor::OpaqueToken(_), numeric) => numeric,
        }
    }

    pub fn as_param(&self) -> String {
        match self {
            Cursor::NumericOffset(offset) => offset.to_string(),
            Cursor::OpaqueToken(token) => token.clone(),
        }
    }
}

/// Follows `next_href` links until a listing is exhausted.
///
/// Pages are requested strictly one after another with a fixed pause in
/// between. A failed page request fails the whole listing; nothing is retried
/// here.
pub struct Paginator<'a> {
    client: &'a Client,
    endpoint: String,
    params: Vec<(&'static str, String)>,
    delay: Duration,
    label: &'static str,
}

impl<'a> Paginator<'a> {
    pub fn new(client: &'a Client, endpoint: String, limit: u32) -> Self {
        Self {
            client,
            endpoint,
            params: client.listing_params(limit),
            delay: client.page_delay(),
            label: "items",
        }
    }

    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    /// Fetches every page and returns the items in server order.
    ///
    /// An empty result is valid; callers decide whether it is an error.
    pub async fn fetch_all<T: DeserializeOwned>(&self) -> Res<Vec<T>> {
        let pb = ProgressBar::new_spinner();
        pb.set_message(format!("Fetching {}...", self.label));
        pb.enable_steady_tick(Duration::from_millis(100));
        if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
            pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }

        let mut cursor = Cursor::NumericOffset(0);
        let mut items: Vec<T> = Vec::new();

        loop {
            let mut params = self.params.clone();
            params.push(("offset", cursor.as_param()));

            let page = match self.client.page::<T>(&self.endpoint, &params).await {
                Ok(page) => page,
                Err(e) => {
                    pb.finish_and_clear();
                    return Err(e);
                }
            };

            let count = page.collection.len();
            items.extend(page.collection);
            pb.set_message(format!("Fetched {} {}...", items.len(), self.label));

            let Some(next_href) = page.next_href else {
                break;
            };

            let next = match Cursor::decode(&next_href) {
                Ok(next) => next,
                Err(e) => {
                    pb.finish_and_clear();
                    return Err(e);
                }
            };
            cursor = cursor.advance(next, count);
            sleep(self.delay).await;
        }

        pb.finish_and_clear();
        Ok(items)
    }
}

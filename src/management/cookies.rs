use std::{collections::HashMap, path::Path};

use crate::{Error, Res};

/// Cookies exported from a signed-in browser session.
///
/// Only two values matter to the API client: the OAuth token that
/// authenticates every request and the locale sent with listing calls.
#[derive(Debug, Clone)]
pub struct CookieJar {
    cookies: HashMap<String, String>,
}

impl CookieJar {
    pub async fn load(path: &Path) -> Res<Self> {
        let content = async_fs::read_to_string(path).await.map_err(|e| {
            Error::Auth(format!("cannot read cookies from {}: {}", path.display(), e))
        })?;
        Ok(Self::parse(&content))
    }

    /// Parses a Netscape `cookies.txt` export. The last two tab-separated
    /// columns of every non-comment line are the cookie name and value.
    pub fn parse(content: &str) -> Self {
        let cookies = content
            .lines()
            .filter(|line| !line.starts_with('#') && !line.trim().is_empty())
            .filter_map(|line| {
                let fields: Vec<&str> = line.split('\t').collect();
                if fields.len() < 2 {
                    return None;
                }
                let name = fields[fields.len() - 2];
                let value = fields[fields.len() - 1]
                    .trim_end_matches(['\r', '\n'])
                    .replace("&amp;", "&")
                    .replace("&quot;", "\"");
                Some((name.to_string(), value))
            })
            .collect();

        Self { cookies }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn oauth_token(&self) -> Res<&str> {
        self.get("oauth_token").ok_or_else(|| {
            Error::Auth("cookies were dumped while signed out, please dump them again".to_string())
        })
    }

    pub fn locale(&self) -> &str {
        self.get("sclocale").unwrap_or("en")
    }
}

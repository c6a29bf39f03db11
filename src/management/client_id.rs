use std::path::PathBuf;

use chrono::Utc;

use crate::{Res, config, soundcloud, types::ClientIdentity};

/// Cached web client id and app version.
///
/// The API refuses calls without a `client_id` parameter. The value is
/// scraped from the website's scripts once and kept on disk until the user
/// refreshes it with `scdlcli client-id`.
pub struct ClientIdManager {
    identity: ClientIdentity,
}

impl ClientIdManager {
    pub fn new(identity: ClientIdentity) -> Self {
        ClientIdManager { identity }
    }

    pub async fn load() -> Res<Self> {
        let content = async_fs::read_to_string(Self::identity_path()).await?;
        let identity: ClientIdentity = serde_json::from_str(&content)?;
        Ok(Self { identity })
    }

    pub async fn persist(&self) -> Res<()> {
        let path = Self::identity_path();
        if let Some(parent) = path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(&self.identity)?;
        async_fs::write(path, json).await?;
        Ok(())
    }

    /// Scrapes a fresh identity from the website and persists it.
    pub async fn refresh(web_url: &str) -> Res<Self> {
        let (app_version, client_id) = soundcloud::discover_client_id(web_url).await?;
        let manager = Self::new(ClientIdentity {
            app_version,
            client_id,
            obtained_at: Utc::now().timestamp(),
        });
        manager.persist().await?;
        Ok(manager)
    }

    /// Environment override first, then the cache, then a fresh scrape.
    pub async fn resolve(web_url: &str) -> Res<Self> {
        if let Some((app_version, client_id)) = config::client_identity_override() {
            return Ok(Self::new(ClientIdentity {
                app_version,
                client_id,
                obtained_at: Utc::now().timestamp(),
            }));
        }

        match Self::load().await {
            Ok(manager) => Ok(manager),
            Err(_) => Self::refresh(web_url).await,
        }
    }

    fn identity_path() -> PathBuf {
        config::data_dir().join("cache/client_id.json")
    }

    pub fn current(&self) -> &ClientIdentity {
        &self.identity
    }
}

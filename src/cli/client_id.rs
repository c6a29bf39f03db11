use chrono::DateTime;

use crate::{config, error, management::ClientIdManager, success};

/// Scrapes the web player's client id again and replaces the cached one.
pub async fn client_id() {
    let manager = match ClientIdManager::refresh(&config::web_url()).await {
        Ok(manager) => manager,
        Err(e) => error!("Failed to obtain a client id: {}", e),
    };

    let identity = manager.current();
    let obtained = DateTime::from_timestamp(identity.obtained_at, 0)
        .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default();
    success!(
        "Client id {} (app version {}) cached at {}.",
        identity.client_id,
        identity.app_version,
        obtained
    );
}

mod client_id;
mod cookies;
mod scratch;

pub use client_id::ClientIdManager;
pub use cookies::CookieJar;
pub use scratch::ScratchDir;

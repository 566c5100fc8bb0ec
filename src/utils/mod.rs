//! Utility modules shared across ingestion, relay and the web layer

pub mod http_client;
pub mod url;

pub use http_client::StandardHttpClient;
pub use url::UrlUtils;

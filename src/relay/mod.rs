//! Stream resolution and pass-through relay
//!
//! Infers the container type of a stream URL, wraps URLs so a blocked client
//! can re-request them through this service, and performs the upstream fetch
//! with browser-like headers. Upstream bodies are streamed through as they
//! arrive, so endless live transport streams are relayed without buffering.

use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, REFERER};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::RelayConfig;
use crate::errors::{AppResult, RelayError, RelayResult};
use crate::models::StreamType;
use crate::utils::{StandardHttpClient, UrlUtils};

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const RELAY_QUERY_PREFIX: &str = "?url=";

/// Best-effort container type from the URL alone
pub fn infer_stream_type(url: &str) -> StreamType {
    if url.contains(".mp4") {
        StreamType::Mp4
    } else if url.contains(".webm") {
        StreamType::WebM
    } else {
        StreamType::Hls
    }
}

/// Explicit type wins, otherwise infer from the URL
pub fn resolve_stream_type(url: &str, explicit: Option<&StreamType>) -> StreamType {
    explicit
        .cloned()
        .unwrap_or_else(|| infer_stream_type(url))
}

/// Wrap `target` as the `url` parameter of the relay endpoint at `relay_path`
pub fn relay_url(relay_path: &str, target: &str) -> String {
    format!(
        "{relay_path}{RELAY_QUERY_PREFIX}{}",
        urlencoding::encode(target)
    )
}

/// Inverse of [`relay_url`]; `None` if `url` is not a relay URL for `relay_path`
pub fn unwrap_relay_url(relay_path: &str, url: &str) -> Option<String> {
    let encoded = url
        .strip_prefix(relay_path)?
        .strip_prefix(RELAY_QUERY_PREFIX)?;
    urlencoding::decode(encoded).ok().map(|s| s.into_owned())
}

/// Upstream response whose headers have been accepted; the body is still
/// arriving
pub struct RelayedBody {
    pub content_type: String,
    pub content_length: Option<u64>,
    pub body: BoxStream<'static, reqwest::Result<Bytes>>,
}

pub struct StreamResolver {
    client: StandardHttpClient,
    relay_path: String,
    cache_max_age: Duration,
}

impl StreamResolver {
    pub fn from_config(config: &RelayConfig) -> AppResult<Self> {
        let client =
            StandardHttpClient::with_connection_timeout(config.connect_timeout, &config.user_agent)?;

        Ok(Self {
            client,
            relay_path: config.path.clone(),
            cache_max_age: config.cache_max_age,
        })
    }

    pub fn relay_path(&self) -> &str {
        &self.relay_path
    }

    pub fn relay_url(&self, target: &str) -> String {
        relay_url(&self.relay_path, target)
    }

    /// `Cache-Control` value for relayed responses
    pub fn cache_control(&self) -> String {
        format!("public, max-age={}", self.cache_max_age.as_secs())
    }

    /// Fetch `url` with the configured User-Agent and a Referer of the URL's
    /// own origin. Returns once upstream headers are in; the body is streamed.
    pub async fn fetch(&self, url: &str) -> RelayResult<RelayedBody> {
        let target = url.trim();
        if target.is_empty() {
            return Err(RelayError::MissingUrl);
        }

        let origin = UrlUtils::origin(target).ok_or_else(|| RelayError::InvalidUrl {
            url: UrlUtils::obfuscate_credentials(target),
        })?;
        let safe_url = UrlUtils::obfuscate_credentials(target);

        debug!("Relaying {}", safe_url);

        let response = self
            .client
            .inner_client()
            .get(target)
            .header(REFERER, origin)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                warn!("Relay request to {} failed: {}", safe_url, e);
                RelayError::Network {
                    message: e.to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            debug!("Upstream {} answered {}", safe_url, status);
            return Err(RelayError::Upstream {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        let content_length: Option<u64> = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        debug!(
            "Upstream accepted: ct={} cl={:?} url={}",
            content_type, content_length, safe_url
        );

        // Headers are already sent once the body is flowing, so a broken
        // upstream just ends the client's stream
        let body = response
            .bytes_stream()
            .map_err(move |e| {
                let e = e.without_url();
                warn!("Relay body from {} interrupted: {}", safe_url, e);
                e
            })
            .boxed();

        Ok(RelayedBody {
            content_type,
            content_length,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_stream_type() {
        assert_eq!(infer_stream_type("https://a/b/video.mp4"), StreamType::Mp4);
        assert_eq!(infer_stream_type("https://a/clip.webm?x=1"), StreamType::WebM);
        assert_eq!(infer_stream_type("https://a/live/index.m3u8"), StreamType::Hls);
        assert_eq!(infer_stream_type("https://a/live/stream"), StreamType::Hls);
    }

    #[test]
    fn test_explicit_type_wins() {
        let explicit = StreamType::Mp4;
        assert_eq!(
            resolve_stream_type("https://a/index.m3u8", Some(&explicit)),
            StreamType::Mp4
        );
        assert_eq!(resolve_stream_type("https://a/x.webm", None), StreamType::WebM);
    }

    #[test]
    fn test_relay_url_encodes_target() {
        let wrapped = relay_url("/api/proxy", "https://cdn.example.com/a b/index.m3u8?token=1&x=2");
        assert_eq!(
            wrapped,
            "/api/proxy?url=https%3A%2F%2Fcdn.example.com%2Fa%20b%2Findex.m3u8%3Ftoken%3D1%26x%3D2"
        );
        assert_eq!(
            unwrap_relay_url("/api/proxy", &wrapped).as_deref(),
            Some("https://cdn.example.com/a b/index.m3u8?token=1&x=2")
        );
        assert_eq!(unwrap_relay_url("/api/proxy", "https://direct/x.m3u8"), None);
    }

    #[test]
    fn test_cache_control_header() {
        let resolver = StreamResolver::from_config(&RelayConfig::default()).unwrap();
        assert_eq!(resolver.cache_control(), "public, max-age=60");
        assert_eq!(resolver.relay_url("http://x/y"), "/api/proxy?url=http%3A%2F%2Fx%2Fy");
    }

    #[tokio::test]
    async fn test_fetch_rejects_bad_urls_before_network() {
        let resolver = StreamResolver::from_config(&RelayConfig::default()).unwrap();
        assert!(matches!(resolver.fetch("  ").await, Err(RelayError::MissingUrl)));
        assert!(matches!(
            resolver.fetch("not-a-url").await,
            Err(RelayError::InvalidUrl { .. })
        ));
    }
}

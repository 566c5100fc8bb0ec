use std::time::Duration;

use reqwest::{Client, Response};
use tracing::debug;

use crate::errors::{AppError, AppResult, SourceError, SourceResult};
use crate::utils::url::UrlUtils;

/// Thin wrapper over a configured reqwest client
#[derive(Debug, Clone)]
pub struct StandardHttpClient {
    client: Client,
}

impl StandardHttpClient {
    /// Create new HTTP client with a total request timeout
    pub fn with_timeout(timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Create new HTTP client with only a connection timeout (no total request timeout)
    ///
    /// Relayed media can be large, so the body transfer is left unbounded.
    pub fn with_connection_timeout(connect_timeout: Duration, user_agent: &str) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Fetch URL and return text content
    pub async fn fetch_text(&self, url: &str) -> SourceResult<String> {
        let safe_url = UrlUtils::obfuscate_credentials(url);
        debug!("Fetching text content from: {}", safe_url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::source_error(e, &safe_url))?;

        let response = Self::ensure_success(response)?;
        let content = response
            .text()
            .await
            .map_err(|e| Self::source_error(e, &safe_url))?;

        debug!("Successfully fetched {} characters of text content", content.len());
        Ok(content)
    }

    /// Get underlying reqwest client for custom operations
    pub fn inner_client(&self) -> &Client {
        &self.client
    }

    fn ensure_success(response: Response) -> SourceResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        Err(SourceError::Http {
            status: status.as_u16(),
            message: status.canonical_reason().unwrap_or("Unknown").to_string(),
        })
    }

    fn source_error(error: reqwest::Error, safe_url: &str) -> SourceError {
        if error.is_timeout() {
            SourceError::timeout(safe_url)
        } else {
            SourceError::fetch(safe_url, error.without_url().to_string())
        }
    }
}

//! Catalog assembly
//!
//! Fans the M3U parser out over every configured language source, waits for
//! all of them to settle, then merges the results in priority order with
//! first-wins deduplication by stream URL and a hard size cap.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{CatalogConfig, PlaylistSourceConfig};
use crate::errors::{AppResult, SourceResult};
use crate::models::Channel;
use crate::sources::M3uParser;
use crate::utils::{StandardHttpClient, UrlUtils};

/// Retrieves the raw text of one playlist document
#[async_trait]
pub trait PlaylistFetcher: Send + Sync {
    async fn fetch_playlist(&self, url: &str) -> SourceResult<String>;
}

#[async_trait]
impl PlaylistFetcher for StandardHttpClient {
    async fn fetch_playlist(&self, url: &str) -> SourceResult<String> {
        self.fetch_text(url).await
    }
}

/// Outcome of one source within an assembly run
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SourceReport {
    pub language: String,
    /// Channels the parser produced, before deduplication
    pub channels: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of one full assembly run
#[derive(Debug, Clone, Default)]
pub struct AssembledCatalog {
    pub channels: Vec<Channel>,
    pub reports: Vec<SourceReport>,
    pub duplicates_dropped: usize,
    pub truncated: usize,
}

/// Builds a fresh channel catalog from a fixed list of playlist sources
pub struct CatalogAssembler<F> {
    fetcher: F,
    sources: Vec<PlaylistSourceConfig>,
    /// Id range width per source, aligned with `sources`
    id_capacities: Vec<u32>,
    max_channels: usize,
    seed: Option<u64>,
}

impl CatalogAssembler<StandardHttpClient> {
    /// Assembler over HTTP using the catalog configuration
    pub fn from_config(config: &CatalogConfig) -> AppResult<Self> {
        let fetcher = StandardHttpClient::with_timeout(config.fetch_timeout)?;
        Ok(Self::new(fetcher, config))
    }
}

impl<F: PlaylistFetcher> CatalogAssembler<F> {
    pub fn new(fetcher: F, config: &CatalogConfig) -> Self {
        Self {
            fetcher,
            sources: config.sources.clone(),
            id_capacities: config
                .sources
                .iter()
                .map(|source| config.id_capacity(source))
                .collect(),
            max_channels: config.max_channels,
            seed: config.viewer_seed,
        }
    }

    pub fn sources(&self) -> &[PlaylistSourceConfig] {
        &self.sources
    }

    /// Fetch and parse every source concurrently, then merge
    pub async fn assemble(&self) -> AssembledCatalog {
        let started = Instant::now();
        let ingested_at = Utc::now();

        info!("Assembling catalog from {} sources", self.sources.len());

        let per_source = join_all(
            self.sources
                .iter()
                .zip(&self.id_capacities)
                .map(|(source, &capacity)| self.ingest_source(source, capacity, ingested_at)),
        )
        .await;

        let mut reports = Vec::with_capacity(per_source.len());
        let mut ordered = Vec::with_capacity(per_source.len());
        for (channels, report) in per_source {
            reports.push(report);
            ordered.push(channels);
        }

        let mut catalog = merge_sources(ordered, self.max_channels);
        catalog.reports = reports;

        info!(
            "Catalog assembled: {} channels ({} duplicates dropped, {} over cap) in {:?}",
            catalog.channels.len(),
            catalog.duplicates_dropped,
            catalog.truncated,
            started.elapsed()
        );

        catalog
    }

    /// Any failure degrades to an empty list for this source only
    async fn ingest_source(
        &self,
        source: &PlaylistSourceConfig,
        id_capacity: u32,
        ingested_at: DateTime<Utc>,
    ) -> (Vec<Channel>, SourceReport) {
        match self.fetcher.fetch_playlist(&source.url).await {
            Ok(content) => {
                let mut rng = self.rng_for(source);
                let channels = M3uParser::new(source.id_offset, &source.language, ingested_at)
                    .with_id_capacity(id_capacity)
                    .parse(&content, &mut rng);
                debug!(
                    "Source {} yielded {} channels",
                    source.language,
                    channels.len()
                );
                let report = SourceReport {
                    language: source.language.clone(),
                    channels: channels.len(),
                    error: None,
                };
                (channels, report)
            }
            Err(e) => {
                warn!(
                    "Failed to fetch/parse playlist {} from {}: {}",
                    source.language,
                    UrlUtils::obfuscate_credentials(&source.url),
                    e
                );
                let report = SourceReport {
                    language: source.language.clone(),
                    channels: 0,
                    error: Some(e.to_string()),
                };
                (Vec::new(), report)
            }
        }
    }

    fn rng_for(&self, source: &PlaylistSourceConfig) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ u64::from(source.id_offset)),
            None => StdRng::from_rng(&mut rand::rng()),
        }
    }
}

/// Concatenate per-source lists in the given order, keep the first channel
/// for each stream URL and cap the result
pub fn merge_sources(sources: Vec<Vec<Channel>>, max_channels: usize) -> AssembledCatalog {
    let mut seen_urls = HashSet::new();
    let mut channels = Vec::new();
    let mut duplicates_dropped = 0;

    for channel in sources.into_iter().flatten() {
        if seen_urls.insert(channel.stream_url.clone()) {
            channels.push(channel);
        } else {
            duplicates_dropped += 1;
        }
    }

    let truncated = channels.len().saturating_sub(max_channels);
    channels.truncate(max_channels);

    AssembledCatalog {
        channels,
        reports: Vec::new(),
        duplicates_dropped,
        truncated,
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::demo::demo_channels;
use crate::ingestor::{AssembledCatalog, CatalogAssembler, PlaylistFetcher, SourceReport};
use crate::models::Channel;

pub const NO_CHANNELS_FOUND: &str = "No channels found";
pub const FAILED_TO_FETCH_CHANNELS: &str = "Failed to fetch channels";

/// Anything that can produce a complete catalog in one pass
#[async_trait]
pub trait CatalogSource: Send + Sync + 'static {
    async fn build(&self) -> AssembledCatalog;
}

#[async_trait]
impl<F: PlaylistFetcher + 'static> CatalogSource for CatalogAssembler<F> {
    async fn build(&self) -> AssembledCatalog {
        self.assemble().await
    }
}

/// Serves the generated demo catalog
pub struct DemoCatalogSource {
    seed: Option<u64>,
}

impl DemoCatalogSource {
    pub fn new(seed: Option<u64>) -> Self {
        Self { seed }
    }
}

#[async_trait]
impl CatalogSource for DemoCatalogSource {
    async fn build(&self) -> AssembledCatalog {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        AssembledCatalog {
            channels: demo_channels(Utc::now(), &mut rng),
            ..Default::default()
        }
    }
}

/// Consistent view of the catalog state
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub channels: Arc<Vec<Channel>>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// Summary of one refresh call
#[derive(Debug, Clone, Serialize)]
pub struct RefreshOutcome {
    pub channel_count: usize,
    pub replaced: bool,
    pub error: Option<String>,
    pub reports: Vec<SourceReport>,
}

/// Process-wide channel catalog. The channel list is only ever replaced whole.
#[derive(Clone)]
pub struct CatalogStore {
    state: Arc<RwLock<CatalogSnapshot>>,
    source: Arc<dyn CatalogSource>,
}

impl CatalogStore {
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self {
            state: Arc::new(RwLock::new(CatalogSnapshot::default())),
            source,
        }
    }

    pub async fn snapshot(&self) -> CatalogSnapshot {
        self.state.read().await.clone()
    }

    pub async fn channels(&self) -> Arc<Vec<Channel>> {
        self.state.read().await.channels.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading
    }

    /// Rebuild the catalog and swap it in.
    ///
    /// An empty build keeps the previous channels and records
    /// "No channels found". Concurrent callers are not coalesced.
    pub async fn refresh(&self) -> RefreshOutcome {
        {
            let mut state = self.state.write().await;
            state.is_loading = true;
            state.error = None;
        }

        // A panic inside the build must not leave the store loading forever
        let source = self.source.clone();
        let built = tokio::spawn(async move { source.build().await }).await;

        let mut state = self.state.write().await;
        state.is_loading = false;

        match built {
            Ok(catalog) if catalog.channels.is_empty() => {
                warn!("Catalog refresh produced no channels, keeping previous catalog");
                state.error = Some(NO_CHANNELS_FOUND.to_string());
                RefreshOutcome {
                    channel_count: state.channels.len(),
                    replaced: false,
                    error: state.error.clone(),
                    reports: catalog.reports,
                }
            }
            Ok(catalog) => {
                let count = catalog.channels.len();
                state.channels = Arc::new(catalog.channels);
                state.refreshed_at = Some(Utc::now());
                info!("Catalog replaced with {} channels", count);
                RefreshOutcome {
                    channel_count: count,
                    replaced: true,
                    error: None,
                    reports: catalog.reports,
                }
            }
            Err(e) => {
                error!("Catalog refresh failed: {}", e);
                state.error = Some(FAILED_TO_FETCH_CHANNELS.to_string());
                RefreshOutcome {
                    channel_count: state.channels.len(),
                    replaced: false,
                    error: state.error.clone(),
                    reports: Vec::new(),
                }
            }
        }
    }
}

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use defaults::*;

use crate::models::UserSettings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    /// Initial user settings; hydrated into the preference store at startup
    #[serde(default)]
    pub preferences: UserSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// One language-tagged playlist feed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaylistSourceConfig {
    pub language: String,
    pub url: String,
    /// First channel number handed out for this source. The range runs up to
    /// the next higher offset of any other source.
    pub id_offset: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Maximum number of channels kept after deduplication
    #[serde(default = "default_max_channels")]
    pub max_channels: usize,
    #[serde(default = "default_fetch_timeout", with = "duration_serde::duration")]
    pub fetch_timeout: Duration,
    #[serde(default = "default_refresh_on_startup")]
    pub refresh_on_startup: bool,
    /// Serve the procedurally generated demo catalog instead of fetching feeds
    #[serde(default = "default_demo_mode")]
    pub demo_mode: bool,
    /// Seed for advisory viewer counts and featured shuffles; random when unset
    #[serde(default)]
    pub viewer_seed: Option<u64>,
    /// Sources in merge priority order
    #[serde(default = "default_sources")]
    pub sources: Vec<PlaylistSourceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Route the relay endpoint is mounted on
    #[serde(default = "default_relay_path")]
    pub path: String,
    #[serde(default = "default_relay_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_relay_cache_max_age", with = "duration_serde::duration")]
    pub cache_max_age: Duration,
    #[serde(default = "default_relay_connect_timeout", with = "duration_serde::duration")]
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Load attempts per source before the session fails (initial load included)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Flat delay before each automatic retry
    #[serde(default = "default_retry_delay", with = "duration_serde::duration")]
    pub retry_delay: Duration,
    #[serde(default = "default_live_edge_threshold", with = "duration_serde::duration")]
    pub live_edge_threshold: Duration,
    #[serde(default = "default_data_saver_max_height")]
    pub data_saver_max_height: u32,
}

// Web defaults
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

// Catalog defaults
fn default_max_channels() -> usize {
    DEFAULT_MAX_CHANNELS
}

fn default_fetch_timeout() -> Duration {
    humantime::parse_duration(DEFAULT_FETCH_TIMEOUT).unwrap_or(Duration::from_secs(30))
}

fn default_refresh_on_startup() -> bool {
    DEFAULT_REFRESH_ON_STARTUP
}

fn default_demo_mode() -> bool {
    DEFAULT_DEMO_MODE
}

fn default_sources() -> Vec<PlaylistSourceConfig> {
    DEFAULT_LANGUAGE_SOURCES
        .iter()
        .map(|(language, stem, id_offset)| PlaylistSourceConfig {
            language: language.to_string(),
            url: format!("{DEFAULT_PLAYLIST_BASE_URL}/{stem}.m3u"),
            id_offset: *id_offset,
        })
        .collect()
}

// Relay defaults
fn default_relay_path() -> String {
    DEFAULT_RELAY_PATH.to_string()
}

fn default_relay_user_agent() -> String {
    DEFAULT_RELAY_USER_AGENT.to_string()
}

fn default_relay_cache_max_age() -> Duration {
    humantime::parse_duration(DEFAULT_RELAY_CACHE_MAX_AGE).unwrap_or(Duration::from_secs(60))
}

fn default_relay_connect_timeout() -> Duration {
    humantime::parse_duration(DEFAULT_RELAY_CONNECT_TIMEOUT).unwrap_or(Duration::from_secs(15))
}

// Playback defaults
fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_retry_delay() -> Duration {
    humantime::parse_duration(DEFAULT_RETRY_DELAY).unwrap_or(Duration::from_millis(1500))
}

fn default_live_edge_threshold() -> Duration {
    humantime::parse_duration(DEFAULT_LIVE_EDGE_THRESHOLD).unwrap_or(Duration::from_secs(15))
}

fn default_data_saver_max_height() -> u32 {
    DEFAULT_DATA_SAVER_MAX_HEIGHT
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            max_channels: default_max_channels(),
            fetch_timeout: default_fetch_timeout(),
            refresh_on_startup: default_refresh_on_startup(),
            demo_mode: default_demo_mode(),
            viewer_seed: None,
            sources: default_sources(),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            path: default_relay_path(),
            user_agent: default_relay_user_agent(),
            cache_max_age: default_relay_cache_max_age(),
            connect_timeout: default_relay_connect_timeout(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay: default_retry_delay(),
            live_edge_threshold: default_live_edge_threshold(),
            data_saver_max_height: default_data_saver_max_height(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            web: WebConfig::default(),
            catalog: CatalogConfig::default(),
            relay: RelayConfig::default(),
            playback: PlaybackConfig::default(),
            preferences: UserSettings::default(),
        }
    }
}

impl CatalogConfig {
    /// Check that per-source id ranges do not collide
    pub fn validate(&self) -> Result<(), String> {
        if self.max_channels == 0 {
            return Err("catalog.max_channels must be greater than zero".to_string());
        }

        let mut offsets: Vec<(u32, &str)> = self
            .sources
            .iter()
            .map(|s| (s.id_offset, s.language.as_str()))
            .collect();
        offsets.sort_unstable();

        for pair in offsets.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(format!(
                    "Sources '{}' and '{}' share id offset {}",
                    pair[0].1, pair[1].1, pair[0].0
                ));
            }
        }

        Ok(())
    }

    /// Number of channel ids `source` may use before reaching the next
    /// source's range
    pub fn id_capacity(&self, source: &PlaylistSourceConfig) -> u32 {
        self.sources
            .iter()
            .map(|s| s.id_offset)
            .filter(|&offset| offset > source.id_offset)
            .min()
            .map_or(u32::MAX, |next| next - source.id_offset)
    }
}

impl RelayConfig {
    /// The relay path is mounted as a route, so it must be absolute
    pub fn validate(&self) -> Result<(), String> {
        if !self.path.starts_with('/') || self.path.contains('?') {
            return Err(format!("relay.path must be an absolute path: {}", self.path));
        }
        Ok(())
    }
}

impl Config {
    pub fn load_from_file(config_file: &str) -> Result<Self> {
        let config: Self = if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            toml::from_str(&contents)?
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            default_config
        };

        config
            .catalog
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid catalog configuration: {e}"))?;
        config
            .relay
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid relay configuration: {e}"))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sources_put_english_last() {
        let config = CatalogConfig::default();
        assert_eq!(config.sources.len(), 12);
        assert_eq!(config.sources.first().unwrap().language, "Hindi");
        assert_eq!(config.sources.last().unwrap().language, "English");
        assert_eq!(config.sources.last().unwrap().id_offset, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duplicate_offsets_rejected() {
        let mut config = CatalogConfig::default();
        config.sources[1].id_offset = config.sources[0].id_offset;
        let err = config.validate().unwrap_err();
        assert!(err.contains("share id offset"));
    }

    #[test]
    fn test_id_capacity_ends_at_next_offset() {
        let config = CatalogConfig::default();
        let capacity_of = |language: &str| {
            let source = config
                .sources
                .iter()
                .find(|s| s.language == language)
                .unwrap();
            config.id_capacity(source)
        };

        assert_eq!(capacity_of("English"), 2999);
        assert_eq!(capacity_of("Hindi"), 1000);
        assert_eq!(capacity_of("Bengali"), 200);
        assert_eq!(capacity_of("Urdu"), u32::MAX);
    }

    #[test]
    fn test_relay_path_must_be_absolute() {
        let mut relay = RelayConfig::default();
        assert!(relay.validate().is_ok());
        relay.path = "api/proxy".to_string();
        assert!(relay.validate().is_err());
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [web]
            port = 9000

            [playback]
            retry_delay = "2s"
            "#,
        )
        .unwrap();

        assert_eq!(config.web.port, 9000);
        assert_eq!(config.web.host, DEFAULT_HOST);
        assert_eq!(config.playback.retry_delay, Duration::from_secs(2));
        assert_eq!(config.playback.max_attempts, 3);
        assert_eq!(config.relay.cache_max_age, Duration::from_secs(60));
        assert_eq!(config.catalog.max_channels, 1200);
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.catalog.sources, CatalogConfig::default().sources);
        assert_eq!(parsed.playback.retry_delay, Duration::from_millis(1500));
    }
}

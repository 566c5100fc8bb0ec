/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Web server defaults
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

// Catalog defaults
pub const DEFAULT_MAX_CHANNELS: usize = 1200;
pub const DEFAULT_FETCH_TIMEOUT: &str = "30s";
pub const DEFAULT_REFRESH_ON_STARTUP: bool = true;
pub const DEFAULT_DEMO_MODE: bool = false;
pub const DEFAULT_PLAYLIST_BASE_URL: &str = "https://iptv-org.github.io/iptv/languages";

/// Language playlists in priority order: regional languages first, English last.
/// Each entry is (language label, playlist file stem, channel id offset).
pub const DEFAULT_LANGUAGE_SOURCES: &[(&str, &str, u32)] = &[
    ("Hindi", "hin", 3000),
    ("Tamil", "tam", 4000),
    ("Telugu", "tel", 4500),
    ("Malayalam", "mal", 5000),
    ("Kannada", "kan", 5500),
    ("Bengali", "ben", 6000),
    ("Odia", "ori", 6200),
    ("Punjabi", "pan", 6500),
    ("Marathi", "mar", 7000),
    ("Gujarati", "guj", 7500),
    ("Urdu", "urd", 8000),
    ("English", "eng", 1),
];

// Relay defaults
pub const DEFAULT_RELAY_PATH: &str = "/api/proxy";
pub const DEFAULT_RELAY_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_RELAY_CACHE_MAX_AGE: &str = "60s";
pub const DEFAULT_RELAY_CONNECT_TIMEOUT: &str = "15s";

// Playback defaults
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: &str = "1500ms";
pub const DEFAULT_LIVE_EDGE_THRESHOLD: &str = "15s";
pub const DEFAULT_DATA_SAVER_MAX_HEIGHT: u32 = 480;

// Preference defaults
pub const DEFAULT_VOLUME: f32 = 1.0;
pub const DEFAULT_MUTED: bool = false;
pub const DEFAULT_DATA_SAVER: bool = false;
pub const RECENT_CHANNELS_LIMIT: usize = 10;

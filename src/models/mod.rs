use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::defaults::{DEFAULT_DATA_SAVER, DEFAULT_MUTED, DEFAULT_VOLUME};

/// Fixed channel taxonomy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    Trending,
    All,
    News,
    Sports,
    Entertainment,
    Movies,
    Kids,
    Music,
    Documentary,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Trending,
        Category::All,
        Category::News,
        Category::Sports,
        Category::Entertainment,
        Category::Movies,
        Category::Kids,
        Category::Music,
        Category::Documentary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Trending => "Trending",
            Category::All => "All",
            Category::News => "News",
            Category::Sports => "Sports",
            Category::Entertainment => "Entertainment",
            Category::Movies => "Movies",
            Category::Kids => "Kids",
            Category::Music => "Music",
            Category::Documentary => "Documentary",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown category: {s}"))
    }
}

/// Declared container type of a stream
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StreamType {
    /// Adaptive HLS (`application/x-mpegURL`)
    Hls,
    /// Progressive MP4 (`video/mp4`)
    Mp4,
    /// WebM (`video/webm`)
    WebM,
    /// Anything else a feed declared explicitly
    Other(String),
}

impl StreamType {
    pub const HLS_MIME: &'static str = "application/x-mpegURL";
    pub const MP4_MIME: &'static str = "video/mp4";
    pub const WEBM_MIME: &'static str = "video/webm";

    pub fn mime(&self) -> &str {
        match self {
            StreamType::Hls => Self::HLS_MIME,
            StreamType::Mp4 => Self::MP4_MIME,
            StreamType::WebM => Self::WEBM_MIME,
            StreamType::Other(mime) => mime,
        }
    }
}

impl From<String> for StreamType {
    fn from(value: String) -> Self {
        match value.as_str() {
            v if v.eq_ignore_ascii_case(Self::HLS_MIME) => StreamType::Hls,
            v if v.eq_ignore_ascii_case("application/vnd.apple.mpegurl") => StreamType::Hls,
            v if v.eq_ignore_ascii_case(Self::MP4_MIME) => StreamType::Mp4,
            v if v.eq_ignore_ascii_case(Self::WEBM_MIME) => StreamType::WebM,
            _ => StreamType::Other(value),
        }
    }
}

impl From<&str> for StreamType {
    fn from(value: &str) -> Self {
        StreamType::from(value.to_string())
    }
}

impl From<StreamType> for String {
    fn from(value: StreamType) -> Self {
        value.mime().to_string()
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// A scheduled or synthetic broadcast unit. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Program {
    pub id: String,
    pub title: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Length in minutes
    pub duration: i64,
    pub genre: Vec<String>,
    pub rating: String,
    pub thumbnail: String,
}

impl Program {
    /// Build a program whose duration is derived from its bounds.
    #[allow(clippy::too_many_arguments)]
    pub fn synthetic(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        genre: Vec<String>,
        rating: impl Into<String>,
        thumbnail: impl Into<String>,
    ) -> Self {
        let seconds = (end_time - start_time).num_seconds();
        let duration = (seconds as f64 / 60.0).round() as i64;

        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            start_time,
            end_time,
            duration,
            genre,
            rating: rating.into(),
            thumbnail: thumbnail.into(),
        }
    }

    pub fn is_airing_at(&self, instant: DateTime<Utc>) -> bool {
        self.start_time <= instant && instant < self.end_time
    }
}

/// A single live source in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Channel {
    /// Stable within one catalog build only
    pub id: String,
    pub name: String,
    pub number: String,
    pub logo: String,
    pub category: Category,
    pub is_live: bool,
    /// Advisory only
    pub current_viewer_count: u32,
    /// Index 0 is the program currently airing
    pub programs: Vec<Program>,
    pub stream_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_type: Option<StreamType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Channel {
    pub fn current_program(&self) -> Option<&Program> {
        self.programs.first()
    }

    /// Poster for the player: current program thumbnail, else the logo
    pub fn poster(&self) -> &str {
        self.current_program()
            .map(|p| p.thumbnail.as_str())
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.logo)
    }
}

/// Quality choice: a specific vertical resolution or adaptive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum QualitySelection {
    #[default]
    Auto,
    Height(u32),
}

impl TryFrom<String> for QualitySelection {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for QualitySelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("auto") {
            return Ok(QualitySelection::Auto);
        }
        trimmed
            .trim_end_matches(['p', 'P'])
            .parse::<u32>()
            .map(QualitySelection::Height)
            .map_err(|_| format!("Invalid quality: {s}"))
    }
}

impl From<QualitySelection> for String {
    fn from(value: QualitySelection) -> Self {
        value.to_string()
    }
}

impl fmt::Display for QualitySelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualitySelection::Auto => f.write_str("auto"),
            QualitySelection::Height(h) => write!(f, "{h}p"),
        }
    }
}

/// User settings consumed by the core; persistence is owned elsewhere
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSettings {
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default = "default_muted")]
    pub is_muted: bool,
    #[serde(default)]
    pub quality: QualitySelection,
    #[serde(default = "default_data_saver")]
    pub data_saver: bool,
}

fn default_volume() -> f32 {
    DEFAULT_VOLUME
}

fn default_muted() -> bool {
    DEFAULT_MUTED
}

fn default_data_saver() -> bool {
    DEFAULT_DATA_SAVER
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            is_muted: default_muted(),
            quality: QualitySelection::Auto,
            data_saver: default_data_saver(),
        }
    }
}

/// Partial settings update; absent fields keep their current value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserSettingsPatch {
    pub volume: Option<f32>,
    pub is_muted: Option<bool>,
    pub quality: Option<QualitySelection>,
    pub data_saver: Option<bool>,
}

impl UserSettings {
    pub fn apply(&mut self, patch: UserSettingsPatch) {
        if let Some(volume) = patch.volume {
            self.volume = volume.clamp(0.0, 1.0);
        }
        if let Some(is_muted) = patch.is_muted {
            self.is_muted = is_muted;
        }
        if let Some(quality) = patch.quality {
            self.quality = quality;
        }
        if let Some(data_saver) = patch.data_saver {
            self.data_saver = data_saver;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_category_parse_is_case_insensitive() {
        assert_eq!("news".parse::<Category>().unwrap(), Category::News);
        assert_eq!("DOCUMENTARY".parse::<Category>().unwrap(), Category::Documentary);
        assert!("weather".parse::<Category>().is_err());
    }

    #[test]
    fn test_stream_type_mime_mapping() {
        assert_eq!(StreamType::from("application/x-mpegURL"), StreamType::Hls);
        assert_eq!(StreamType::from("video/MP4"), StreamType::Mp4);
        assert_eq!(
            StreamType::from("video/x-matroska"),
            StreamType::Other("video/x-matroska".to_string())
        );
        assert_eq!(String::from(StreamType::WebM), "video/webm");
    }

    #[test]
    fn test_synthetic_program_duration_matches_bounds() {
        let start = Utc::now();
        let program = Program::synthetic(
            "p",
            "t",
            "d",
            start,
            start + Duration::hours(24),
            vec!["News".to_string()],
            "TV-G",
            "",
        );
        assert_eq!(program.duration, 1440);
        assert!(program.is_airing_at(start));
        assert!(!program.is_airing_at(start + Duration::hours(24)));
    }

    #[test]
    fn test_quality_selection_parsing() {
        assert_eq!("auto".parse::<QualitySelection>().unwrap(), QualitySelection::Auto);
        assert_eq!("720p".parse::<QualitySelection>().unwrap(), QualitySelection::Height(720));
        assert_eq!("1080".parse::<QualitySelection>().unwrap(), QualitySelection::Height(1080));
        assert!("hd".parse::<QualitySelection>().is_err());
        assert_eq!(QualitySelection::Height(480).to_string(), "480p");
    }

    #[test]
    fn test_settings_patch_keeps_unset_fields() {
        let mut settings = UserSettings::default();
        settings.apply(UserSettingsPatch {
            data_saver: Some(true),
            volume: Some(3.0),
            ..Default::default()
        });
        assert!(settings.data_saver);
        assert_eq!(settings.volume, 1.0);
        assert!(!settings.is_muted);
        assert_eq!(settings.quality, QualitySelection::Auto);
    }
}

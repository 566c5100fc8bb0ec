use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::collections::HashMap;
use tracing::{debug, trace, warn};

use crate::models::{Category, Channel, Program, StreamType};

const EXTINF_PREFIX: &str = "#EXTINF:";
const STREAM_URL_PREFIX: &str = "http";
const UNKNOWN_CHANNEL_NAME: &str = "Unknown Channel";
const SYNTHETIC_PROGRAM_HOURS: i64 = 24;
const SYNTHETIC_PROGRAM_RATING: &str = "TV-G";
const VIEWER_COUNT_MIN: u32 = 100;
const VIEWER_COUNT_MAX: u32 = 5100;

/// Group label keywords in match order; first hit wins
const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (Category::News, &["news"]),
    (Category::Sports, &["sport", "soccer", "cricket"]),
    (Category::Movies, &["movie", "cinema", "film"]),
    (Category::Kids, &["kids", "cartoon", "animation"]),
    (Category::Music, &["music", "mtv", "songs"]),
    (
        Category::Documentary,
        &["documentary", "nature", "science", "history"],
    ),
    (Category::Entertainment, &["entertainment", "lifestyle"]),
];

/// Map a raw `group-title` onto the fixed taxonomy
pub fn infer_category(group: &str) -> Category {
    let lower = group.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::All)
}

/// Metadata from the most recent `#EXTINF` line, waiting for its URL
#[derive(Debug, Clone)]
struct PendingMetadata {
    name: String,
    logo: String,
    category: Category,
}

/// Parser for one language-tagged M3U document
#[derive(Debug, Clone)]
pub struct M3uParser {
    id_offset: u32,
    /// Channel numbers this source may use, starting at `id_offset`
    id_capacity: u32,
    language: String,
    ingested_at: DateTime<Utc>,
}

impl M3uParser {
    pub fn new(id_offset: u32, language: impl Into<String>, ingested_at: DateTime<Utc>) -> Self {
        Self {
            id_offset,
            id_capacity: u32::MAX,
            language: language.into(),
            ingested_at,
        }
    }

    /// Stop emitting channels once `capacity` ids have been handed out
    pub fn with_id_capacity(mut self, capacity: u32) -> Self {
        self.id_capacity = capacity;
        self
    }

    /// Parse M3U content into channels
    pub fn parse<R: Rng + ?Sized>(&self, content: &str, rng: &mut R) -> Vec<Channel> {
        let mut channels = Vec::new();
        let mut pending: Option<PendingMetadata> = None;

        debug!("Starting M3U parsing for language: {}", self.language);

        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();

            if let Some(info) = line.strip_prefix(EXTINF_PREFIX) {
                pending = Some(self.parse_extinf(info));
            } else if line.starts_with(STREAM_URL_PREFIX) {
                let Some(metadata) = pending.take() else {
                    trace!("Dropping stream URL without EXTINF metadata at line {}", line_num + 1);
                    continue;
                };

                if metadata.logo.is_empty() {
                    trace!("Skipping channel without logo: {}", metadata.name);
                    continue;
                }

                let position = channels.len() as u32;
                if position >= self.id_capacity {
                    warn!(
                        "Source {} exceeds its id range of {} channels starting at {}, dropping the rest",
                        self.language, self.id_capacity, self.id_offset
                    );
                    break;
                }
                let Some(number) = self.id_offset.checked_add(position) else {
                    warn!(
                        "Channel ids for source {} overflow past offset {}, dropping the rest",
                        self.language, self.id_offset
                    );
                    break;
                };

                channels.push(self.build_channel(metadata, line, number, rng));
            }
        }

        debug!(
            "Parsed {} channels from M3U source: {}",
            channels.len(),
            self.language
        );
        channels
    }

    /// Parse the part of an EXTINF line after the `#EXTINF:` prefix
    fn parse_extinf(&self, info: &str) -> PendingMetadata {
        // Format: duration key="value" key="value",Display Name
        let (attrs_part, name_part) = match info.rfind(',') {
            Some(pos) => (&info[..pos], &info[pos + 1..]),
            None => ("", info),
        };

        let attributes = parse_extinf_attributes(attrs_part);
        let name = match name_part.trim() {
            "" => UNKNOWN_CHANNEL_NAME.to_string(),
            name => name.to_string(),
        };
        let group = attributes.get("group-title").map(String::as_str).unwrap_or("");

        PendingMetadata {
            name,
            logo: attributes.get("tvg-logo").cloned().unwrap_or_default(),
            category: infer_category(group),
        }
    }

    fn build_channel<R: Rng + ?Sized>(
        &self,
        metadata: PendingMetadata,
        url: &str,
        number: u32,
        rng: &mut R,
    ) -> Channel {
        let id = format!("iptv-{number}");
        let program = Program::synthetic(
            format!("prog-{id}"),
            format!("{} Live", metadata.name),
            format!("Live streaming of {}", metadata.name),
            self.ingested_at,
            self.ingested_at + Duration::hours(SYNTHETIC_PROGRAM_HOURS),
            vec![metadata.category.to_string()],
            SYNTHETIC_PROGRAM_RATING,
            metadata.logo.clone(),
        );

        Channel {
            id,
            name: metadata.name,
            number: number.to_string(),
            logo: metadata.logo,
            category: metadata.category,
            is_live: true,
            current_viewer_count: rng.random_range(VIEWER_COUNT_MIN..VIEWER_COUNT_MAX),
            programs: vec![program],
            stream_url: url.to_string(),
            stream_type: Some(StreamType::Hls),
            language: Some(self.language.clone()),
        }
    }
}

/// Scan `key="value"` pairs from the attribute part of an EXTINF line.
/// Bare tokens such as the duration are skipped; unquoted values end at
/// whitespace.
fn parse_extinf_attributes(attrs_part: &str) -> HashMap<String, String> {
    let mut attributes = HashMap::new();
    let mut rest = attrs_part.trim_start();

    while !rest.is_empty() {
        let key_end = rest
            .find(|c: char| c == '=' || c.is_whitespace())
            .unwrap_or(rest.len());
        let key = &rest[..key_end];
        rest = &rest[key_end..];

        let Some(after_eq) = rest.strip_prefix('=') else {
            rest = rest.trim_start();
            continue;
        };

        let (value, remainder) = match after_eq.strip_prefix('"') {
            Some(quoted) => match quoted.find('"') {
                Some(close) => (&quoted[..close], &quoted[close + 1..]),
                None => (quoted, ""),
            },
            None => {
                let end = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
                (&after_eq[..end], &after_eq[end..])
            }
        };

        if !key.is_empty() {
            attributes.insert(key.to_string(), value.to_string());
        }
        rest = remainder.trim_start();
    }

    attributes
}

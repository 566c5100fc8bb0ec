//! Read-only views over a channel list
//!
//! Every function here borrows the catalog and returns references in catalog
//! order unless stated otherwise.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

use crate::models::{Category, Channel};

/// Curated names that are usually reliable; drives the Trending view
pub const TRENDING_KEYWORDS: &[&str] = &[
    "NASA",
    "Red Bull",
    "Al Jazeera",
    "DW",
    "NHK",
    "ABC News",
    "Bloomberg",
    "France 24",
    "CNA",
    "Sky News",
    "NDTV",
    "India Today",
    "Republic",
    "Fashion TV",
    "TRT World",
    "Eurosport",
    "DD News",
    "DD Sports",
];

pub const DEFAULT_RELATED_LIMIT: usize = 4;
pub const DEFAULT_FEATURED_LIMIT: usize = 5;
pub const DEFAULT_PER_CATEGORY: usize = 4;

const ALL_LANGUAGES: &str = "All";

pub fn matches_trending(channel: &Channel) -> bool {
    let name = channel.name.to_lowercase();
    TRENDING_KEYWORDS
        .iter()
        .any(|keyword| name.contains(&keyword.to_lowercase()))
}

/// Language then category filter. `None` or `"All"` language matches everything.
pub fn filter<'a>(
    channels: &'a [Channel],
    language: Option<&str>,
    category: Category,
) -> Vec<&'a Channel> {
    let language = language.filter(|l| !l.eq_ignore_ascii_case(ALL_LANGUAGES));

    channels
        .iter()
        .filter(|channel| match language {
            Some(lang) => channel
                .language
                .as_deref()
                .is_some_and(|l| l.eq_ignore_ascii_case(lang)),
            None => true,
        })
        .filter(|channel| match category {
            Category::All => true,
            Category::Trending => matches_trending(channel),
            other => channel.category == other,
        })
        .collect()
}

/// Case-insensitive substring match over channel names and program titles
pub fn search<'a>(channels: &'a [Channel], query: &str) -> Vec<&'a Channel> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    channels
        .iter()
        .filter(|channel| {
            channel.name.to_lowercase().contains(&query)
                || channel
                    .programs
                    .iter()
                    .any(|p| p.title.to_lowercase().contains(&query))
        })
        .collect()
}

pub fn find<'a>(channels: &'a [Channel], id: &str) -> Option<&'a Channel> {
    channels.iter().find(|c| c.id == id)
}

/// Channels sharing the category of `id`, excluding `id` itself
pub fn related<'a>(channels: &'a [Channel], id: &str, limit: usize) -> Vec<&'a Channel> {
    let Some(current) = find(channels, id) else {
        return Vec::new();
    };

    channels
        .iter()
        .filter(|c| c.category == current.category && c.id != current.id)
        .take(limit)
        .collect()
}

/// Hero pool: trending-keyword names, then the Trending category, then
/// News/Sports. Shuffled, first `limit` kept.
pub fn featured<'a, R: Rng + ?Sized>(
    channels: &'a [Channel],
    rng: &mut R,
    limit: usize,
) -> Vec<&'a Channel> {
    let mut seen = HashSet::new();
    let mut pool: Vec<&Channel> = Vec::new();

    let priority = channels.iter().filter(|c| matches_trending(c));
    let trending = channels
        .iter()
        .filter(|c| c.category == Category::Trending);
    let fallback = channels
        .iter()
        .filter(|c| matches!(c.category, Category::News | Category::Sports));

    for channel in priority.chain(trending).chain(fallback) {
        if seen.insert(channel.id.as_str()) {
            pool.push(channel);
        }
    }

    pool.shuffle(rng);
    pool.truncate(limit);
    pool
}

/// Group by category in first-seen order, skipping `All`, at most
/// `per_category` channels each
pub fn by_category(channels: &[Channel], per_category: usize) -> Vec<(Category, Vec<&Channel>)> {
    let mut groups: Vec<(Category, Vec<&Channel>)> = Vec::new();

    for channel in channels.iter().filter(|c| c.category != Category::All) {
        match groups.iter_mut().find(|(cat, _)| *cat == channel.category) {
            Some((_, members)) => {
                if members.len() < per_category {
                    members.push(channel);
                }
            }
            None if per_category > 0 => groups.push((channel.category, vec![channel])),
            None => {}
        }
    }

    groups
}

/// Resolve ids to channels, keeping the order of `ids` and skipping unknown ones
pub fn resolve_ids<'a>(channels: &'a [Channel], ids: &[String]) -> Vec<&'a Channel> {
    ids.iter().filter_map(|id| find(channels, id)).collect()
}

/// Distinct language labels in catalog order
pub fn languages(channels: &[Channel]) -> Vec<&str> {
    let mut seen = HashSet::new();
    channels
        .iter()
        .filter_map(|c| c.language.as_deref())
        .filter(|l| seen.insert(*l))
        .collect()
}

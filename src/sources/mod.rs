//! Playlist source handlers
//!
//! Converts raw playlist documents into ordered channel records. Parsing is
//! pure and synchronous; fetching lives in the ingestor.

pub mod m3u;

pub use m3u::{infer_category, M3uParser};

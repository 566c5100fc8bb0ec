//! Live TV service library
//!
//! Builds a channel catalog from language-tagged M3U playlists, relays stream
//! resources for origins that refuse direct access, and drives a single
//! media engine through a retrying playback session.

pub mod catalog;
pub mod config;
pub mod errors;
pub mod ingestor;
pub mod models;
pub mod playback;
pub mod relay;
pub mod sources;
pub mod utils;
pub mod web;

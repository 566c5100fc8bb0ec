//! Seam to the external media engine
//!
//! The controller drives an engine through [`MediaEngine`] and learns about
//! progress through [`EngineEvent`]s delivered by whatever binds the engine.

use serde::Serialize;

use super::quality::RepresentationSource;
use super::retry::MediaErrorCode;
use crate::models::StreamType;

/// What the engine is asked to load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaSource {
    pub url: String,
    pub stream_type: StreamType,
    /// Session epoch; bindings tag emitted events with it
    pub epoch: u64,
}

/// Why a play request did not start playback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayRejection {
    /// Superseded by a pause or source change
    Aborted,
    /// Autoplay policy or similar
    NotAllowed(String),
    Other(String),
}

/// Notifications from the engine binding
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    LoadedMetadata,
    Playing,
    Pause,
    TimeUpdate,
    Error { code: MediaErrorCode },
    VolumeChange { volume: f32, muted: bool },
    FullscreenChange { fullscreen: bool },
}

pub trait MediaEngine: Send {
    fn set_source(&mut self, source: &MediaSource);
    fn set_poster(&mut self, poster: &str);
    /// Drop the current source and any buffered state, keeping the instance
    fn reset(&mut self);
    fn load(&mut self);
    fn play(&mut self) -> Result<(), PlayRejection>;
    fn pause(&mut self);
    fn is_paused(&self) -> bool;
    fn seek(&mut self, position: f64);
    fn current_time(&self) -> f64;
    /// End of the seekable range, if the stream has one
    fn live_edge(&self) -> Option<f64>;
    fn set_volume(&mut self, volume: f32);
    fn set_muted(&mut self, muted: bool);
    fn set_fullscreen(&mut self, fullscreen: bool);
    /// Adaptive representation controls; `None` for progressive sources
    fn representations(&mut self) -> Option<&mut dyn RepresentationSource>;
    /// Release every resource held by the engine
    fn dispose(&mut self);
}

pub trait MediaEngineFactory: Send {
    type Engine: MediaEngine;

    fn create(&self) -> Self::Engine;
}

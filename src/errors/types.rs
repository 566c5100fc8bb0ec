//! Error type definitions for the live TV service
//!
//! This module defines all error types used throughout the application,
//! providing a hierarchical error system that keeps per-source and per-request
//! failures isolated from the aggregate they belong to.

use thiserror::Error;

use crate::playback::state::{PlaybackState, StateEvent};

/// Top-level application error type
///
/// Source, relay and playback failures keep their own types; they are turned
/// into empty lists, relay bodies and session state rather than bubbling up.
#[derive(Error, Debug)]
pub enum AppError {
    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Resource not found errors
    #[error("Not found: {resource} with id {id}")]
    NotFound { resource: String, id: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Playlist source specific errors
#[derive(Error, Debug)]
pub enum SourceError {
    /// Network connection timeouts
    #[error("Connection timeout: {url}")]
    Timeout { url: String },

    /// Non-success HTTP status from a playlist host
    #[error("HTTP error: {status} - {message}")]
    Http { status: u16, message: String },

    /// Transport level failures (DNS, TLS, reset)
    #[error("Fetch failed: {url} - {message}")]
    Fetch { url: String, message: String },
}

/// Relay (pass-through) specific errors
#[derive(Error, Debug)]
pub enum RelayError {
    /// The `url` query parameter was absent or empty
    #[error("Missing URL parameter")]
    MissingUrl,

    /// The target could not be parsed as an absolute URL
    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Upstream answered with a non-success status
    #[error("Upstream error: {status} {reason}")]
    Upstream { status: u16, reason: String },

    /// Any transport failure while talking to upstream
    #[error("Failed to fetch stream: {message}")]
    Network { message: String },
}

/// Playback session errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// An operation needed a loaded source but none is set
    #[error("No source loaded")]
    NoSource,

    /// The session driver has shut down
    #[error("Playback session closed")]
    SessionClosed,

    /// The state machine rejected an event
    #[error("Invalid transition: {event:?} from {from:?}")]
    InvalidTransition {
        from: PlaybackState,
        event: StateEvent,
    },
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not found error for a specific resource
    pub fn not_found<R: Into<String>, I: Into<String>>(resource: R, id: I) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl SourceError {
    /// Create a timeout error
    pub fn timeout<U: Into<String>>(url: U) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Create a transport failure error
    pub fn fetch<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }
}

impl RelayError {
    /// HTTP status the relay endpoint answers with for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingUrl | Self::InvalidUrl { .. } => 400,
            Self::Upstream { status, .. } => *status,
            Self::Network { .. } => 500,
        }
    }

    /// Client-facing message. Network details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::Network { .. } => "Failed to fetch stream".to_string(),
            other => other.to_string(),
        }
    }
}

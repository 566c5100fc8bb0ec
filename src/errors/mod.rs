//! Centralized error handling for the live TV service
//!
//! This module unifies error types across the ingestion, relay, playback and
//! web layers so every network-facing operation can convert failures into a
//! typed result rather than letting them escape.
//!
//! # Error Categories
//!
//! - **Source Errors**: playlist fetch and parse failures (isolated per source)
//! - **Relay Errors**: pass-through fetch failures surfaced by the relay endpoint
//! - **Playback Errors**: invalid session transitions and missing sources
//! - **Validation Errors**: bad input at the HTTP boundary
//!
//! # Usage
//!
//! ```rust
//! use live_tv::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Ok("success".to_string())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for Source Results
pub type SourceResult<T> = Result<T, SourceError>;

/// Convenience type alias for Relay Results
pub type RelayResult<T> = Result<T, RelayError>;

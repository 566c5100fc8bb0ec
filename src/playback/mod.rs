//! Playback session core
//!
//! A single [`PlaybackSessionController`] owns one media engine at a time and
//! reacts to source changes, engine events and user intents. Retry timers are
//! deadlines; [`spawn_session`] runs the controller on its own task and fires
//! them.

pub mod clock;
pub mod controller;
pub mod driver;
pub mod engine;
pub mod live_edge;
pub mod quality;
pub mod retry;
pub mod state;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{PlaybackOptions, PlaybackSessionController, PlaybackSnapshot};
pub use driver::{spawn_session, PlaybackHandle, PlayerInput, PlayerIntent};
pub use engine::{EngineEvent, MediaEngine, MediaEngineFactory, MediaSource, PlayRejection};
pub use quality::{QualityLadder, QualityLevel, Representation, RepresentationSource};
pub use retry::{FailureNotice, MediaErrorCode, RetryDecision, RetryPlan, RetryPolicy, RetryStrategy};
pub use state::{PlaybackState, StateEvent};

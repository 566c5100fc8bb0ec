//! Playback session controller
//!
//! Owns the single media engine instance and the state of the stream being
//! watched. All methods are synchronous; timers are expressed as deadlines
//! read from a [`Clock`] and fired through [`PlaybackSessionController::poll_retry`].

use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::engine::{EngineEvent, MediaEngine, MediaEngineFactory, MediaSource, PlayRejection};
use super::live_edge::LiveEdgeTracker;
use super::quality::{apply_selection, QualityLadder};
use super::retry::{FailureNotice, MediaErrorCode, RetryContext, RetryDecision, RetryPlan, RetryPolicy};
use super::state::{transition, PlaybackState, StateEvent};
use crate::config::PlaybackConfig;
use crate::errors::PlaybackError;
use crate::models::{QualitySelection, StreamType, UserSettings};
use crate::relay::resolve_stream_type;

/// Tunables for a playback session
#[derive(Debug, Clone)]
pub struct PlaybackOptions {
    pub policy: RetryPolicy,
    pub live_edge_threshold: Duration,
    pub data_saver_max_height: u32,
    /// Path of the relay endpoint used for escalated retries
    pub relay_path: String,
}

impl PlaybackOptions {
    pub fn from_config(config: &PlaybackConfig, relay_path: impl Into<String>) -> Self {
        Self {
            policy: RetryPolicy::from_config(config),
            live_edge_threshold: config.live_edge_threshold,
            data_saver_max_height: config.data_saver_max_height,
            relay_path: relay_path.into(),
        }
    }
}

/// Consumer-facing view of the session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub epoch: u64,
    pub is_playing: bool,
    pub is_muted: bool,
    pub volume: f32,
    pub is_fullscreen: bool,
    /// Available heights, ascending
    pub qualities: Vec<u32>,
    pub selected_quality: QualitySelection,
    pub data_saver: bool,
    pub at_live_edge: bool,
    pub error: Option<FailureNotice>,
    pub last_error_code: Option<MediaErrorCode>,
    /// Retries issued for the current source
    pub attempt: u32,
    pub retry_pending: bool,
    pub current_url: Option<String>,
    pub current_type: Option<StreamType>,
    pub poster: Option<String>,
}

/// Source as requested by the consumer, before any retry rewriting
#[derive(Debug, Clone)]
struct SessionSource {
    original_url: String,
    explicit_type: Option<StreamType>,
    poster: Option<String>,
}

#[derive(Debug, Clone)]
struct PendingRetry {
    epoch: u64,
    deadline: Instant,
    plan: RetryPlan,
}

pub struct PlaybackSessionController<F: MediaEngineFactory, C: Clock> {
    factory: F,
    clock: C,
    options: PlaybackOptions,
    engine: Option<F::Engine>,
    state: PlaybackState,
    /// Bumped on every source change, manual retry and teardown
    epoch: u64,
    source: Option<SessionSource>,
    current: Option<MediaSource>,
    retry_count: u32,
    last_error: Option<MediaErrorCode>,
    notice: Option<FailureNotice>,
    pending_retry: Option<PendingRetry>,
    ladder: QualityLadder,
    preferred_quality: QualitySelection,
    selected_quality: QualitySelection,
    data_saver: bool,
    volume: f32,
    muted: bool,
    fullscreen: bool,
    live_edge: LiveEdgeTracker,
}

impl<F: MediaEngineFactory, C: Clock> PlaybackSessionController<F, C> {
    pub fn new(factory: F, clock: C, options: PlaybackOptions, settings: &UserSettings) -> Self {
        let live_edge = LiveEdgeTracker::new(options.live_edge_threshold);
        Self {
            factory,
            clock,
            options,
            engine: None,
            state: PlaybackState::Idle,
            epoch: 0,
            source: None,
            current: None,
            retry_count: 0,
            last_error: None,
            notice: None,
            pending_retry: None,
            ladder: QualityLadder::default(),
            preferred_quality: settings.quality,
            selected_quality: settings.quality,
            data_saver: settings.data_saver,
            volume: settings.volume,
            muted: settings.is_muted,
            fullscreen: false,
            live_edge,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn ladder(&self) -> &QualityLadder {
        &self.ladder
    }

    /// Deadline of the scheduled retry, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending_retry.as_ref().map(|p| p.deadline)
    }

    fn apply(&mut self, event: StateEvent) -> Result<(), PlaybackError> {
        let next = transition(self.state, event)?;
        if next != self.state {
            debug!(epoch = self.epoch, "Playback {:?} -> {:?} on {:?}", self.state, next, event);
        }
        self.state = next;
        Ok(())
    }

    /// Start playing a new source. An existing engine is reset and re-primed
    /// rather than replaced.
    pub fn load_source(
        &mut self,
        url: &str,
        stream_type: Option<StreamType>,
        poster: Option<String>,
    ) -> Result<(), PlaybackError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(PlaybackError::NoSource);
        }

        self.epoch += 1;
        self.clear_attempt_state();

        let resolved = resolve_stream_type(url, stream_type.as_ref());
        self.source = Some(SessionSource {
            original_url: url.to_string(),
            explicit_type: stream_type,
            poster,
        });

        match self.engine.as_mut() {
            Some(engine) => {
                debug!(epoch = self.epoch, "Re-priming existing media engine");
                engine.reset();
            }
            None => self.create_engine(),
        }

        info!(epoch = self.epoch, "Loading {} as {}", url, resolved);

        self.apply(StateEvent::Load)?;
        self.prime(MediaSource {
            url: url.to_string(),
            stream_type: resolved,
            epoch: self.epoch,
        });
        Ok(())
    }

    fn create_engine(&mut self) {
        let mut engine = self.factory.create();
        engine.set_volume(self.volume);
        engine.set_muted(self.muted);
        self.engine = Some(engine);
        debug!("Created media engine");
    }

    fn clear_attempt_state(&mut self) {
        self.pending_retry = None;
        self.retry_count = 0;
        self.last_error = None;
        self.notice = None;
        self.ladder = QualityLadder::default();
        self.live_edge.reset();
    }

    /// Hand a source to the engine, load it and try to start playback
    fn prime(&mut self, media: MediaSource) {
        if let Some(engine) = self.engine.as_mut() {
            if let Some(poster) = self.source.as_ref().and_then(|s| s.poster.as_deref()) {
                engine.set_poster(poster);
            }
            engine.set_source(&media);
            engine.load();
        }
        self.current = Some(media);
        self.attempt_play();
    }

    /// Play rejections never move the state machine
    fn attempt_play(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };

        match engine.play() {
            Ok(()) => {}
            Err(PlayRejection::Aborted) => {
                debug!(epoch = self.epoch, "Play request superseded");
            }
            Err(rejection) => {
                warn!(epoch = self.epoch, "Play request rejected: {:?}", rejection);
            }
        }
    }

    /// Apply an engine event. Events tagged with an old epoch are dropped.
    /// Returns whether the event was applied.
    pub fn handle_event(&mut self, epoch: u64, event: EngineEvent) -> bool {
        if epoch != self.epoch || self.engine.is_none() {
            debug!(
                epoch,
                current_epoch = self.epoch,
                "Dropping stale engine event {:?}",
                event
            );
            return false;
        }

        match event {
            EngineEvent::LoadedMetadata => {
                self.refresh_ladder();
                true
            }
            EngineEvent::Playing => self.on_playing(),
            EngineEvent::Pause => self.apply(StateEvent::Paused).is_ok(),
            EngineEvent::TimeUpdate => {
                self.update_live_edge();
                true
            }
            EngineEvent::Error { code } => self.on_error(code),
            EngineEvent::VolumeChange { volume, muted } => {
                self.volume = volume;
                self.muted = muted;
                true
            }
            EngineEvent::FullscreenChange { fullscreen } => {
                self.fullscreen = fullscreen;
                true
            }
        }
    }

    fn on_playing(&mut self) -> bool {
        if let Err(e) = self.apply(StateEvent::Playing) {
            debug!("Ignoring playing event: {}", e);
            return false;
        }

        if self.pending_retry.take().is_some() {
            info!(epoch = self.epoch, "Engine recovered during backoff, retry cancelled");
        }
        if self.retry_count > 0 {
            info!(
                epoch = self.epoch,
                "Playback recovered after {} retries", self.retry_count
            );
        }
        self.retry_count = 0;
        self.last_error = None;
        self.notice = None;
        true
    }

    fn on_error(&mut self, code: MediaErrorCode) -> bool {
        if self.current.is_none() {
            return false;
        }
        if !self.state.accepts_errors() {
            debug!(
                "Ignoring media error {} while {:?}",
                code.code(),
                self.state
            );
            return false;
        }

        warn!(
            epoch = self.epoch,
            retries = self.retry_count,
            "Media error {} ({:?})",
            code.code(),
            code
        );
        self.last_error = Some(code);
        if self.apply(StateEvent::Error).is_err() {
            return false;
        }

        let decision = match (&self.source, &self.current) {
            (Some(source), Some(current)) => {
                let ctx = RetryContext {
                    original_url: &source.original_url,
                    explicit_type: source.explicit_type.as_ref(),
                    current_type: &current.stream_type,
                    relay_path: &self.options.relay_path,
                };
                self.options.policy.decide(self.retry_count, code, &ctx)
            }
            _ => RetryDecision::Fail(FailureNotice::for_code(code)),
        };

        match decision {
            RetryDecision::Retry { plan, delay } => {
                self.retry_count += 1;
                info!(
                    epoch = self.epoch,
                    attempt = plan.attempt,
                    "Retrying via {:?} in {:?}",
                    plan.strategy,
                    delay
                );
                self.pending_retry = Some(PendingRetry {
                    epoch: self.epoch,
                    deadline: self.clock.now() + delay,
                    plan,
                });
                let _ = self.apply(StateEvent::ScheduleRetry);
            }
            RetryDecision::Fail(notice) => {
                warn!(
                    epoch = self.epoch,
                    "Giving up on stream: {} {}", notice.title, notice.subtitle
                );
                self.pending_retry = None;
                self.notice = Some(notice);
                let _ = self.apply(StateEvent::GiveUp);
            }
        }

        true
    }

    /// Fire the pending retry if its deadline has passed. Returns whether a
    /// reload was issued.
    pub fn poll_retry(&mut self) -> bool {
        let now = self.clock.now();
        if !matches!(&self.pending_retry, Some(p) if p.deadline <= now) {
            return false;
        }
        let Some(pending) = self.pending_retry.take() else {
            return false;
        };

        if pending.epoch != self.epoch || self.state != PlaybackState::Retrying {
            debug!(epoch = pending.epoch, "Discarding stale retry");
            return false;
        }

        let media = MediaSource {
            url: pending.plan.url,
            stream_type: pending.plan.stream_type,
            epoch: self.epoch,
        };
        if self.current.as_ref() == Some(&media) {
            debug!(epoch = self.epoch, "Reloading unchanged source");
        }

        info!(
            epoch = self.epoch,
            attempt = pending.plan.attempt,
            "Reloading {} as {}",
            media.url,
            media.stream_type
        );

        if self.apply(StateEvent::RetryFired).is_err() {
            return false;
        }
        self.ladder = QualityLadder::default();
        self.live_edge.reset();
        self.prime(media);
        true
    }

    fn refresh_ladder(&mut self) {
        let Some(reps) = self.engine.as_mut().and_then(|e| e.representations()) else {
            self.ladder = QualityLadder::default();
            return;
        };

        self.ladder = QualityLadder::from_representations(&reps.list());
        debug!("Quality ladder: {:?}", self.ladder.heights());
        self.apply_quality();
    }

    /// Data saver overrides the preferred quality while a ladder exists
    fn effective_quality(&self) -> QualitySelection {
        if self.data_saver {
            if let Some(height) = self
                .ladder
                .data_saver_height(self.options.data_saver_max_height)
            {
                return QualitySelection::Height(height);
            }
        }
        self.preferred_quality
    }

    fn apply_quality(&mut self) {
        let selection = self.effective_quality();
        self.selected_quality = selection;

        if self.ladder.is_empty() {
            return;
        }
        if let Some(reps) = self.engine.as_mut().and_then(|e| e.representations()) {
            let enabled = apply_selection(reps, selection);
            debug!("Quality {} enables {} representations", selection, enabled);
        }
    }

    fn update_live_edge(&mut self) {
        let Some(engine) = self.engine.as_ref() else {
            return;
        };
        let edge = engine.live_edge();
        let position = engine.current_time();
        self.live_edge.update(edge, position);
    }

    pub fn toggle_play(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        if engine.is_paused() {
            self.attempt_play();
        } else {
            engine.pause();
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(engine) = self.engine.as_mut() {
            engine.set_volume(self.volume);
        }
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
        if let Some(engine) = self.engine.as_mut() {
            engine.set_muted(self.muted);
        }
    }

    pub fn select_quality(&mut self, selection: QualitySelection) {
        self.preferred_quality = selection;
        self.apply_quality();
    }

    pub fn set_data_saver(&mut self, enabled: bool) {
        self.data_saver = enabled;
        self.apply_quality();
    }

    /// Seek to the live edge and resume
    pub fn jump_to_live(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        if let Some(edge) = engine.live_edge() {
            engine.seek(edge);
        }
        self.attempt_play();
        self.update_live_edge();
    }

    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen = !self.fullscreen;
        if let Some(engine) = self.engine.as_mut() {
            engine.set_fullscreen(self.fullscreen);
        }
    }

    /// Manual retry: clear counters and errors, reload the original source
    pub fn retry(&mut self) -> Result<(), PlaybackError> {
        let Some(source) = self.source.clone() else {
            return Err(PlaybackError::NoSource);
        };

        let event = match self.state {
            PlaybackState::Erroring | PlaybackState::Retrying | PlaybackState::Failed => {
                StateEvent::ManualRetry
            }
            _ => StateEvent::Load,
        };

        self.epoch += 1;
        self.clear_attempt_state();
        if self.engine.is_none() {
            self.create_engine();
        }

        let stream_type = resolve_stream_type(&source.original_url, source.explicit_type.as_ref());
        info!(epoch = self.epoch, "Manual retry of {}", source.original_url);

        self.apply(event)?;
        self.prime(MediaSource {
            url: source.original_url,
            stream_type,
            epoch: self.epoch,
        });
        Ok(())
    }

    /// Stop and release the engine. Safe to call repeatedly.
    pub fn end_session(&mut self) {
        self.pending_retry = None;
        let Some(mut engine) = self.engine.take() else {
            return;
        };

        engine.dispose();
        self.epoch += 1;
        self.clear_attempt_state();
        self.source = None;
        self.current = None;
        self.fullscreen = false;
        let _ = self.apply(StateEvent::Teardown);
        info!(epoch = self.epoch, "Playback session ended");
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            state: self.state,
            epoch: self.epoch,
            is_playing: self.state == PlaybackState::Playing,
            is_muted: self.muted,
            volume: self.volume,
            is_fullscreen: self.fullscreen,
            qualities: self.ladder.heights(),
            selected_quality: self.selected_quality,
            data_saver: self.data_saver,
            at_live_edge: self.live_edge.at_live_edge(),
            error: self.notice.clone(),
            last_error_code: self.last_error,
            attempt: self.retry_count,
            retry_pending: self.pending_retry.is_some(),
            current_url: self.current.as_ref().map(|m| m.url.clone()),
            current_type: self.current.as_ref().map(|m| m.stream_type.clone()),
            poster: self.source.as_ref().and_then(|s| s.poster.clone()),
        }
    }
}

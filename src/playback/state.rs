use serde::Serialize;

use crate::errors::PlaybackError;

/// Lifecycle of one playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PlaybackState {
    Idle,
    Loading,
    Playing,
    Paused,
    /// An engine error is being classified
    Erroring,
    /// A retry is scheduled and waiting for its deadline
    Retrying,
    /// Terminal until a manual retry or a new source
    Failed,
}

/// Inputs to the playback state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StateEvent {
    /// A new source was primed on the engine
    Load,
    /// Engine reports frames are being rendered
    Playing,
    /// Engine reports it paused
    Paused,
    /// Engine reported a media error
    Error,
    ScheduleRetry,
    GiveUp,
    /// The retry deadline passed and the source was reloaded
    RetryFired,
    ManualRetry,
    Teardown,
}

impl PlaybackState {
    /// States in which an engine error is classified
    pub fn accepts_errors(&self) -> bool {
        matches!(
            self,
            PlaybackState::Loading | PlaybackState::Playing | PlaybackState::Paused
        )
    }
}

/// Pure transition function
pub fn transition(from: PlaybackState, event: StateEvent) -> Result<PlaybackState, PlaybackError> {
    use PlaybackState::*;
    use StateEvent as E;

    let next = match (from, event) {
        (_, E::Load) => Loading,
        (_, E::Teardown) => Idle,

        // Engine may recover on its own during the backoff
        (Loading | Playing | Paused | Retrying, E::Playing) => Playing,
        (Loading | Playing | Paused, E::Paused) => Paused,
        (Loading | Playing | Paused, E::Error) => Erroring,

        (Erroring, E::ScheduleRetry) => Retrying,
        (Erroring, E::GiveUp) => Failed,
        (Retrying, E::RetryFired) => Loading,

        (Erroring | Retrying | Failed, E::ManualRetry) => Loading,

        (from, event) => return Err(PlaybackError::InvalidTransition { from, event }),
    };

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let s = transition(PlaybackState::Idle, StateEvent::Load).unwrap();
        let s = transition(s, StateEvent::Playing).unwrap();
        let s = transition(s, StateEvent::Paused).unwrap();
        assert_eq!(s, PlaybackState::Paused);
        assert_eq!(transition(s, StateEvent::Playing).unwrap(), PlaybackState::Playing);
    }

    #[test]
    fn test_error_retry_cycle() {
        let s = transition(PlaybackState::Playing, StateEvent::Error).unwrap();
        assert_eq!(s, PlaybackState::Erroring);
        let s = transition(s, StateEvent::ScheduleRetry).unwrap();
        assert_eq!(s, PlaybackState::Retrying);
        assert_eq!(transition(s, StateEvent::RetryFired).unwrap(), PlaybackState::Loading);
    }

    #[test]
    fn test_playing_during_backoff_recovers() {
        assert_eq!(
            transition(PlaybackState::Retrying, StateEvent::Playing).unwrap(),
            PlaybackState::Playing
        );
        assert!(transition(PlaybackState::Retrying, StateEvent::Paused).is_err());
    }

    #[test]
    fn test_failed_is_terminal_except_for_retry_and_load() {
        let failed = transition(PlaybackState::Erroring, StateEvent::GiveUp).unwrap();
        assert_eq!(failed, PlaybackState::Failed);

        for event in [StateEvent::Playing, StateEvent::Error, StateEvent::RetryFired] {
            assert_eq!(
                transition(failed, event),
                Err(PlaybackError::InvalidTransition { from: failed, event })
            );
        }
        assert_eq!(transition(failed, StateEvent::ManualRetry).unwrap(), PlaybackState::Loading);
        assert_eq!(transition(failed, StateEvent::Load).unwrap(), PlaybackState::Loading);
    }

    #[test]
    fn test_teardown_from_anywhere() {
        for state in [
            PlaybackState::Idle,
            PlaybackState::Loading,
            PlaybackState::Retrying,
            PlaybackState::Failed,
        ] {
            assert_eq!(transition(state, StateEvent::Teardown).unwrap(), PlaybackState::Idle);
        }
    }

    #[test]
    fn test_errors_only_classified_while_active() {
        assert!(transition(PlaybackState::Idle, StateEvent::Error).is_err());
        assert!(transition(PlaybackState::Retrying, StateEvent::Error).is_err());
        assert!(!PlaybackState::Failed.accepts_errors());
        assert!(PlaybackState::Paused.accepts_errors());
    }
}

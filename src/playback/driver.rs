//! Async driver for a playback session
//!
//! Serializes intents, engine events and retry timers onto one task that owns
//! the controller, and publishes a snapshot after every step.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::clock::Clock;
use super::controller::{PlaybackSessionController, PlaybackSnapshot};
use super::engine::{EngineEvent, MediaEngineFactory};
use crate::errors::PlaybackError;
use crate::models::{QualitySelection, StreamType};

const INPUT_BUFFER: usize = 64;

/// User intents forwarded to the controller
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerIntent {
    TogglePlay,
    SetVolume(f32),
    ToggleMute,
    SelectQuality(QualitySelection),
    SetDataSaver(bool),
    JumpToLive,
    Retry,
    ToggleFullscreen,
}

#[derive(Debug)]
pub enum PlayerInput {
    Load {
        url: String,
        stream_type: Option<StreamType>,
        poster: Option<String>,
    },
    Engine {
        epoch: u64,
        event: EngineEvent,
    },
    Intent(PlayerIntent),
    EndSession,
}

/// Cloneable handle to a running session
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    tx: mpsc::Sender<PlayerInput>,
    snapshots: watch::Receiver<PlaybackSnapshot>,
}

impl PlaybackHandle {
    async fn send(&self, input: PlayerInput) -> Result<(), PlaybackError> {
        self.tx
            .send(input)
            .await
            .map_err(|_| PlaybackError::SessionClosed)
    }

    pub async fn load(
        &self,
        url: impl Into<String>,
        stream_type: Option<StreamType>,
        poster: Option<String>,
    ) -> Result<(), PlaybackError> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(PlaybackError::NoSource);
        }
        self.send(PlayerInput::Load {
            url,
            stream_type,
            poster,
        })
        .await
    }

    /// Deliver an engine notification tagged with the epoch it was emitted for
    pub async fn engine_event(&self, epoch: u64, event: EngineEvent) -> Result<(), PlaybackError> {
        self.send(PlayerInput::Engine { epoch, event }).await
    }

    pub async fn intent(&self, intent: PlayerIntent) -> Result<(), PlaybackError> {
        self.send(PlayerInput::Intent(intent)).await
    }

    /// Tear down the engine and stop the driver. Safe to call repeatedly.
    pub async fn end_session(&self) {
        let _ = self.send(PlayerInput::EndSession).await;
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshots.clone()
    }
}

/// Move the controller onto its own task
pub fn spawn_session<F, C>(
    controller: PlaybackSessionController<F, C>,
) -> (PlaybackHandle, JoinHandle<()>)
where
    F: MediaEngineFactory + 'static,
    C: Clock + 'static,
{
    let (tx, rx) = mpsc::channel(INPUT_BUFFER);
    let (snapshot_tx, snapshots) = watch::channel(controller.snapshot());

    let task = tokio::spawn(run(controller, rx, snapshot_tx));
    (PlaybackHandle { tx, snapshots }, task)
}

async fn run<F, C>(
    mut controller: PlaybackSessionController<F, C>,
    mut rx: mpsc::Receiver<PlayerInput>,
    snapshots: watch::Sender<PlaybackSnapshot>,
) where
    F: MediaEngineFactory,
    C: Clock,
{
    debug!("Playback driver started");

    loop {
        let deadline = controller.next_deadline();

        tokio::select! {
            input = rx.recv() => match input {
                Some(PlayerInput::EndSession) | None => {
                    controller.end_session();
                    snapshots.send_replace(controller.snapshot());
                    break;
                }
                Some(input) => apply_input(&mut controller, input),
            },
            _ = sleep_until_deadline(deadline) => {
                controller.poll_retry();
            }
        }

        snapshots.send_replace(controller.snapshot());
    }

    debug!("Playback driver stopped");
}

fn apply_input<F: MediaEngineFactory, C: Clock>(
    controller: &mut PlaybackSessionController<F, C>,
    input: PlayerInput,
) {
    match input {
        PlayerInput::Load {
            url,
            stream_type,
            poster,
        } => {
            if let Err(e) = controller.load_source(&url, stream_type, poster) {
                warn!("Failed to load source: {}", e);
            }
        }
        PlayerInput::Engine { epoch, event } => {
            controller.handle_event(epoch, event);
        }
        PlayerInput::Intent(intent) => match intent {
            PlayerIntent::TogglePlay => controller.toggle_play(),
            PlayerIntent::SetVolume(volume) => controller.set_volume(volume),
            PlayerIntent::ToggleMute => controller.toggle_mute(),
            PlayerIntent::SelectQuality(selection) => controller.select_quality(selection),
            PlayerIntent::SetDataSaver(enabled) => controller.set_data_saver(enabled),
            PlayerIntent::JumpToLive => controller.jump_to_live(),
            PlayerIntent::Retry => {
                if let Err(e) = controller.retry() {
                    debug!("Manual retry ignored: {}", e);
                }
            }
            PlayerIntent::ToggleFullscreen => controller.toggle_fullscreen(),
        },
        PlayerInput::EndSession => controller.end_session(),
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::config::PlaybackConfig;
    use crate::models::UserSettings;
    use crate::playback::clock::SystemClock;
    use crate::playback::controller::tests::{Call, FakeFactory};
    use crate::playback::controller::PlaybackOptions;
    use crate::playback::retry::MediaErrorCode;
    use crate::playback::state::PlaybackState;

    const SNAPSHOT_WAIT: Duration = Duration::from_secs(30);

    fn spawn(factory: &FakeFactory) -> (PlaybackHandle, JoinHandle<()>) {
        let options = PlaybackOptions::from_config(&PlaybackConfig::default(), "/api/proxy");
        let controller = PlaybackSessionController::new(
            factory.clone(),
            SystemClock,
            options,
            &UserSettings::default(),
        );
        spawn_session(controller)
    }

    async fn wait_for(
        handle: &PlaybackHandle,
        predicate: impl FnMut(&PlaybackSnapshot) -> bool,
    ) -> PlaybackSnapshot {
        let mut rx = handle.subscribe();
        let snapshot = tokio::time::timeout(SNAPSHOT_WAIT, rx.wait_for(predicate))
            .await
            .expect("timed out waiting for snapshot")
            .expect("driver dropped");
        (*snapshot).clone()
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_fires_after_delay() {
        let factory = FakeFactory::new();
        let (handle, _task) = spawn(&factory);

        handle
            .load("https://cdn.example.com/live.m3u8", None, None)
            .await
            .unwrap();
        let loading = wait_for(&handle, |s| s.state == PlaybackState::Loading).await;

        handle
            .engine_event(
                loading.epoch,
                EngineEvent::Error {
                    code: MediaErrorCode::Network,
                },
            )
            .await
            .unwrap();
        wait_for(&handle, |s| s.state == PlaybackState::Retrying).await;

        let reloaded = wait_for(&handle, |s| {
            s.state == PlaybackState::Loading && s.attempt == 1
        })
        .await;
        assert!(!reloaded.retry_pending);
        assert_eq!(factory.sources().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_change_cancels_timer() {
        let factory = FakeFactory::new();
        let (handle, _task) = spawn(&factory);

        handle.load("https://a/live.m3u8", None, None).await.unwrap();
        let loading = wait_for(&handle, |s| s.state == PlaybackState::Loading).await;
        handle
            .engine_event(
                loading.epoch,
                EngineEvent::Error {
                    code: MediaErrorCode::Network,
                },
            )
            .await
            .unwrap();
        wait_for(&handle, |s| s.retry_pending).await;

        handle.load("https://b/live.m3u8", None, None).await.unwrap();
        wait_for(&handle, |s| s.current_url.as_deref() == Some("https://b/live.m3u8")).await;

        tokio::time::sleep(Duration::from_secs(10)).await;
        let urls: Vec<String> = factory.sources().into_iter().map(|s| s.url).collect();
        assert_eq!(urls, vec!["https://a/live.m3u8", "https://b/live.m3u8"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_session_stops_driver() {
        let factory = FakeFactory::new();
        let (handle, task) = spawn(&factory);

        handle.load("https://a/live.m3u8", None, None).await.unwrap();
        handle.end_session().await;
        task.await.unwrap();

        handle.end_session().await;
        assert_eq!(factory.count(&Call::Dispose), 1);
        assert_eq!(handle.snapshot().state, PlaybackState::Idle);
        assert_eq!(
            handle.intent(PlayerIntent::TogglePlay).await,
            Err(PlaybackError::SessionClosed)
        );
    }

    #[tokio::test]
    async fn test_empty_url_rejected_before_sending() {
        let factory = FakeFactory::new();
        let (handle, _task) = spawn(&factory);
        assert_eq!(
            handle.load("", None, None).await,
            Err(PlaybackError::NoSource)
        );
    }
}

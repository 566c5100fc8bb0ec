//! Retry classification and escalation
//!
//! Pure decision logic: given how many retries were already issued for the
//! current source and the error the engine reported, either produce the next
//! load to attempt or the notice to show when giving up.

use serde::Serialize;
use std::time::Duration;

use crate::config::PlaybackConfig;
use crate::models::StreamType;
use crate::relay::{relay_url, resolve_stream_type};

pub const FAILURE_TITLE: &str = "Stream Offline";

/// Media error codes reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MediaErrorCode {
    Aborted,
    Network,
    Decode,
    SrcNotSupported,
    Other(u16),
}

impl From<u16> for MediaErrorCode {
    fn from(code: u16) -> Self {
        match code {
            1 => MediaErrorCode::Aborted,
            2 => MediaErrorCode::Network,
            3 => MediaErrorCode::Decode,
            4 => MediaErrorCode::SrcNotSupported,
            other => MediaErrorCode::Other(other),
        }
    }
}

impl MediaErrorCode {
    pub fn code(&self) -> u16 {
        match self {
            MediaErrorCode::Aborted => 1,
            MediaErrorCode::Network => 2,
            MediaErrorCode::Decode => 3,
            MediaErrorCode::SrcNotSupported => 4,
            MediaErrorCode::Other(code) => *code,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MediaErrorCode::Network | MediaErrorCode::Decode | MediaErrorCode::SrcNotSupported
        )
    }

    /// Codes that suggest the declared container type is wrong
    pub fn is_format_error(&self) -> bool {
        matches!(self, MediaErrorCode::SrcNotSupported)
    }

    pub fn subtitle(&self) -> &'static str {
        match self {
            MediaErrorCode::SrcNotSupported => "Source unavailable or format not supported.",
            MediaErrorCode::Decode => "Playback decode error. Stream may be corrupt.",
            MediaErrorCode::Network => "Network connection failed.",
            _ => "Please try another channel.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RetryStrategy {
    /// Same URL, HLS and MP4 swapped
    TypeSwap,
    /// Original URL routed through the relay endpoint
    Relay,
    /// Same URL and type, reloaded to clear engine state
    Reload,
}

/// The next load to attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetryPlan {
    /// 1-based retry number within the current source
    pub attempt: u32,
    pub url: String,
    pub stream_type: StreamType,
    pub strategy: RetryStrategy,
}

/// User-facing terminal error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureNotice {
    pub title: String,
    pub subtitle: String,
    pub code: u16,
}

impl FailureNotice {
    pub fn for_code(code: MediaErrorCode) -> Self {
        Self {
            title: FAILURE_TITLE.to_string(),
            subtitle: code.subtitle().to_string(),
            code: code.code(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { plan: RetryPlan, delay: Duration },
    Fail(FailureNotice),
}

/// What the policy needs to know about the source being played
#[derive(Debug, Clone, Copy)]
pub struct RetryContext<'a> {
    /// URL the session was started with, never relay-wrapped
    pub original_url: &'a str,
    pub explicit_type: Option<&'a StreamType>,
    /// Type of the load that just failed
    pub current_type: &'a StreamType,
    pub relay_path: &'a str,
}

/// Bounded, flat-delay retry policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Load attempts per source, the initial load included
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&PlaybackConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &PlaybackConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            delay: config.retry_delay,
        }
    }

    /// Decide what follows an error, given `retries_issued` retries already
    /// scheduled for this source.
    ///
    /// Relay escalation takes precedence over the type swap from the second
    /// retry on.
    pub fn decide(
        &self,
        retries_issued: u32,
        code: MediaErrorCode,
        ctx: &RetryContext<'_>,
    ) -> RetryDecision {
        let attempt = retries_issued + 1;

        if !code.is_retryable() || attempt >= self.max_attempts {
            return RetryDecision::Fail(FailureNotice::for_code(code));
        }

        let plan = if attempt >= 2 {
            RetryPlan {
                attempt,
                url: relay_url(ctx.relay_path, ctx.original_url),
                stream_type: resolve_stream_type(ctx.original_url, ctx.explicit_type),
                strategy: RetryStrategy::Relay,
            }
        } else if code.is_format_error() {
            RetryPlan {
                attempt,
                url: ctx.original_url.to_string(),
                stream_type: swap_type(ctx.current_type),
                strategy: RetryStrategy::TypeSwap,
            }
        } else {
            RetryPlan {
                attempt,
                url: ctx.original_url.to_string(),
                stream_type: ctx.current_type.clone(),
                strategy: RetryStrategy::Reload,
            }
        };

        RetryDecision::Retry {
            plan,
            delay: self.delay,
        }
    }
}

/// HLS becomes MP4; anything else becomes HLS
pub fn swap_type(current: &StreamType) -> StreamType {
    match current {
        StreamType::Hls => StreamType::Mp4,
        _ => StreamType::Hls,
    }
}

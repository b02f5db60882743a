//! Provider lifecycle status
//!
//! ```text
//! unloaded ──▶ loading ──▶ ready ◀──▶ busy
//!     ▲           │          │          │
//!     │           ▼          ▼          ▼
//!     └──────── error ◀──────┴──────────┘
//! ```
//!
//! `busy` means at least one request is in flight. Concurrent requests to
//! the same provider are allowed, so `ready` is restored only when the last
//! in-flight request finishes.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;
use tracing::{debug, warn};

/// Lifecycle state of a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderState {
    /// Not loaded
    Unloaded,
    /// Loading model / opening client
    Loading,
    /// Idle and accepting requests
    Ready,
    /// Serving at least one request
    Busy,
    /// Last initialization or generation failed
    Error,
}

impl ProviderState {
    /// Whether the selector may route requests here
    #[must_use]
    pub fn is_routable(&self) -> bool {
        matches!(self, Self::Ready | Self::Busy)
    }

    /// Whether `self → next` is a legal transition
    #[must_use]
    pub fn can_transition_to(&self, next: ProviderState) -> bool {
        matches!(
            (self, next),
            (Self::Unloaded, Self::Loading)
                | (Self::Loading, Self::Ready)
                | (Self::Ready, Self::Busy)
                | (Self::Busy, Self::Ready)
                | (Self::Busy, Self::Busy)
                | (Self::Ready | Self::Loading | Self::Busy, Self::Error)
                | (Self::Ready | Self::Error, Self::Unloaded)
                | (Self::Error, Self::Loading)
        )
    }

    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unloaded => "unloaded",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Busy => "busy",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ProviderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a provider's mutable status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderStatus {
    /// Lifecycle state
    pub state: ProviderState,
    /// Requests currently in flight
    pub in_flight: u32,
    /// Last time a request completed (success or failure)
    pub last_used: Option<DateTime<Utc>>,
    /// Last failure message
    pub last_error: Option<String>,
    /// When the last failure happened
    pub last_error_at: Option<DateTime<Utc>>,
}

impl Default for ProviderStatus {
    fn default() -> Self {
        Self {
            state: ProviderState::Unloaded,
            in_flight: 0,
            last_used: None,
            last_error: None,
            last_error_at: None,
        }
    }
}

/// Interior-mutable status owned by exactly one provider
#[derive(Debug, Default)]
pub struct StatusCell {
    inner: Mutex<ProviderStatus>,
}

impl StatusCell {
    /// Create an `unloaded` status
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ProviderStatus> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Copy of the current status
    #[must_use]
    pub fn snapshot(&self) -> ProviderStatus {
        self.lock().clone()
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> ProviderState {
        self.lock().state
    }

    /// Apply a transition; illegal transitions are ignored and reported
    pub fn transition(&self, provider: &str, next: ProviderState) -> bool {
        let mut status = self.lock();
        if !status.state.can_transition_to(next) {
            warn!(
                provider,
                from = %status.state,
                to = %next,
                "Ignoring illegal provider state transition"
            );
            return false;
        }
        debug!(provider, from = %status.state, to = %next, "Provider state transition");
        status.state = next;
        if next == ProviderState::Unloaded {
            status.in_flight = 0;
        }
        true
    }

    /// Record a failure and move to `error`
    pub fn fail(&self, provider: &str, message: impl Into<String>) {
        let message = message.into();
        let mut status = self.lock();
        if status.state.can_transition_to(ProviderState::Error) {
            status.state = ProviderState::Error;
        }
        warn!(provider, error = %message, "Provider entered error state");
        status.last_error = Some(message);
        status.last_error_at = Some(Utc::now());
    }

    /// Admit a request: `ready|busy → busy`.
    ///
    /// `admit` runs only once readiness has been confirmed, under the status
    /// lock; its error rejects the request without a state change.
    pub fn begin_request<F>(&self, provider: &str, admit: F) -> Result<()>
    where
        F: FnOnce() -> Result<()>,
    {
        let mut status = self.lock();
        if !status.state.is_routable() {
            return Err(Error::NotReady {
                provider: provider.to_string(),
                state: status.state,
            });
        }
        admit()?;
        status.state = ProviderState::Busy;
        status.in_flight += 1;
        Ok(())
    }

    /// Finish a request admitted by [`begin_request`](Self::begin_request)
    pub fn finish_request<T>(&self, provider: &str, outcome: &Result<T>) {
        let mut status = self.lock();
        status.in_flight = status.in_flight.saturating_sub(1);
        status.last_used = Some(Utc::now());

        match outcome {
            Err(e) if e.marks_provider_failed() => {
                if status.state.can_transition_to(ProviderState::Error) {
                    status.state = ProviderState::Error;
                }
                status.last_error = Some(e.to_string());
                status.last_error_at = Some(Utc::now());
                warn!(provider, error = %e, "Generation failed");
            }
            _ => {
                if status.state == ProviderState::Busy && status.in_flight == 0 {
                    status.state = ProviderState::Ready;
                }
            }
        }
    }
}

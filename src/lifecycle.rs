//! Session lifecycle state machine.
//!
//! ```text
//! Uninitialized --initialize--> Initializing --ok--> Ready --shutdown--> ShuttingDown
//!                                    |                                         |
//!                                    +--failure--> Terminated <--exit sent-----+
//! ```
//!
//! Any state moves to `Terminated` when the transport fails. The current state
//! is published on a `watch` channel so callers can observe transitions.

use crate::error::{LspError, Result};
use crate::types::InitializeResult;
use std::fmt;
use std::sync::OnceLock;
use tokio::sync::watch;

/// Where a session is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Uninitialized,
    Initializing,
    Ready,
    ShuttingDown,
    Terminated,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Initializing => "initializing",
            SessionState::Ready => "ready",
            SessionState::ShuttingDown => "shutting down",
            SessionState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Owns the session state and the negotiated initialize result.
#[derive(Debug)]
pub struct Lifecycle {
    state: watch::Sender<SessionState>,
    initialize_result: OnceLock<InitializeResult>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::Uninitialized);
        Self {
            state,
            initialize_result: OnceLock::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Uninitialized -> Initializing. Any other state means initialize was
    /// already attempted.
    pub fn begin_initialize(&self) -> Result<()> {
        let mut moved = false;
        self.state.send_if_modified(|state| {
            if *state == SessionState::Uninitialized {
                *state = SessionState::Initializing;
                moved = true;
            }
            moved
        });

        if moved {
            log::info!("Session initializing");
            Ok(())
        } else {
            Err(LspError::AlreadyInitialized)
        }
    }

    /// Initializing -> Ready, recording what the server announced.
    ///
    /// Fails with `NotReady` if the session terminated while the handshake
    /// was in flight.
    pub fn finish_initialize(&self, result: InitializeResult) -> Result<()> {
        let server = result
            .server_info
            .as_ref()
            .map(|info| format!(" {} {}", info.name, info.version.as_deref().unwrap_or("")));
        // Published before the state so `Ready` observers always see it.
        // begin_initialize only succeeds once, so the cell is still empty.
        let _ = self.initialize_result.set(result);

        let mut current = SessionState::Initializing;
        self.state.send_if_modified(|state| {
            current = *state;
            if *state == SessionState::Initializing {
                *state = SessionState::Ready;
                true
            } else {
                false
            }
        });

        if current != SessionState::Initializing {
            return Err(LspError::NotReady(current));
        }

        log::info!("Session ready:{}", server.as_deref().unwrap_or(" unknown server"));
        Ok(())
    }

    /// Ready -> ShuttingDown.
    ///
    /// Returns `Ok(false)` when shutdown already started or the session is
    /// gone, and `NotReady` while the handshake has not completed.
    pub fn begin_shutdown(&self) -> Result<bool> {
        let mut current = SessionState::Ready;
        self.state.send_if_modified(|state| {
            current = *state;
            if *state == SessionState::Ready {
                *state = SessionState::ShuttingDown;
                true
            } else {
                false
            }
        });

        match current {
            SessionState::Ready => {
                log::info!("Session shutting down");
                Ok(true)
            }
            SessionState::ShuttingDown | SessionState::Terminated => Ok(false),
            other => Err(LspError::NotReady(other)),
        }
    }

    /// Move to `Terminated` from anywhere. Returns the previous state.
    pub fn terminate(&self) -> SessionState {
        let previous = self.state.send_replace(SessionState::Terminated);
        if previous != SessionState::Terminated {
            log::info!("Session terminated (was {})", previous);
        }
        previous
    }

    /// Facade calls are only legal while ready.
    pub fn ensure_ready(&self) -> Result<()> {
        match self.state() {
            SessionState::Ready => Ok(()),
            other => Err(LspError::NotReady(other)),
        }
    }

    pub fn initialize_result(&self) -> Option<&InitializeResult> {
        self.initialize_result.get()
    }
}

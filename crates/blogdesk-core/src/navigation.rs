//! Forced navigation of the hosting front end.
//!
//! The request pipeline redirects to the login entry point when the server
//! rejects a credential. What "redirect" means is up to the host: a terminal
//! front end prints a prompt, a web shell changes location.

use std::sync::{Mutex, PoisonError};

use tracing::warn;

/// Path of the login entry point.
pub const LOGIN_PATH: &str = "/login";

pub trait Navigator: Send + Sync {
    fn redirect(&self, path: &str);
}

/// Logs the redirect and remembers the most recent target.
#[derive(Debug, Default)]
pub struct LoggingNavigator {
    last: Mutex<Option<String>>,
}

impl LoggingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the pending redirect, if any, so the host can act on it once.
    pub fn take_pending(&self) -> Option<String> {
        self.last.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

impl Navigator for LoggingNavigator {
    fn redirect(&self, path: &str) {
        warn!(path = path, "Redirecting to login");
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(path.to_string());
    }
}

/// Records every redirect in order.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    history: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<String> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn count(&self) -> usize {
        self.history.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, path: &str) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_string());
    }
}

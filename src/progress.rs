// src/progress.rs

//! Status reporting for install runs
//!
//! The installer reports human-readable progress lines ("Backing up game.exe...",
//! "Installing base game files...", "Installation is complete!") through a
//! `StatusSink`. Sinks are fire-and-forget: nothing is returned and a sink can
//! never fail the install.
//!
//! Implementations:
//! - `SilentStatus`: drops everything (the default)
//! - `LogStatus`: forwards to tracing at info level
//! - `CallbackStatus`: calls a user-provided closure
//! - `RecordingStatus`: keeps every message in order for later inspection

use std::sync::Mutex;
use tracing::info;

/// Receiver for install progress messages
pub trait StatusSink: Send + Sync {
    /// Accept one message
    fn notify(&self, message: &str);
}

/// No-op sink
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentStatus;

impl StatusSink for SilentStatus {
    fn notify(&self, _message: &str) {}
}

/// Sink that logs each message through tracing
#[derive(Debug, Clone)]
pub struct LogStatus {
    name: String,
}

impl LogStatus {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl StatusSink for LogStatus {
    fn notify(&self, message: &str) {
        info!("{}: {}", self.name, message);
    }
}

/// Sink that hands each message to a closure
///
/// Useful for GUI front-ends or forwarding to a channel.
pub struct CallbackStatus<F>
where
    F: Fn(&str) + Send + Sync,
{
    callback: F,
}

impl<F> CallbackStatus<F>
where
    F: Fn(&str) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> StatusSink for CallbackStatus<F>
where
    F: Fn(&str) + Send + Sync,
{
    fn notify(&self, message: &str) {
        (self.callback)(message);
    }
}

/// Sink that records messages in arrival order
#[derive(Debug, Default)]
pub struct RecordingStatus {
    messages: Mutex<Vec<String>>,
}

impl RecordingStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all messages so far
    pub fn messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// The most recent message, if any
    pub fn last(&self) -> Option<String> {
        self.messages().pop()
    }
}

impl StatusSink for RecordingStatus {
    fn notify(&self, message: &str) {
        let mut guard = match self.messages.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(message.to_string());
    }
}

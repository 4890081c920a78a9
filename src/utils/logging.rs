//! Logging utilities
//!
//! Provides logging setup and message-keyed warning deduplication.

use std::collections::HashSet;

use log::warn;
use parking_lot::Mutex;

/// Setup logging for the server (`RUST_LOG` overrides the default `info` level)
pub fn setup_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

#[derive(Debug, Default)]
struct Emitted {
    seen: HashSet<String>,
    order: Vec<String>,
}

/// Shared record of warnings that have already been written to the log.
///
/// A message is keyed by its exact text. The check and the insert happen under
/// one lock, so two requests racing on the same violation log it once.
#[derive(Debug, Default)]
pub struct WarnOnce {
    emitted: Mutex<Emitted>,
}

impl WarnOnce {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log a warning unconditionally.
    pub fn warn(&self, message: &str) {
        warn!("{message}");
    }

    /// Log a warning unless the same message was already logged.
    ///
    /// Returns `true` if the message was written by this call.
    pub fn warn_once(&self, message: &str) -> bool {
        let mut emitted = self.emitted.lock();
        if !emitted.seen.insert(message.to_string()) {
            return false;
        }
        emitted.order.push(message.to_string());
        drop(emitted);

        warn!("{message}");
        true
    }

    /// Messages logged through `warn_once`, oldest first.
    pub fn emitted(&self) -> Vec<String> {
        self.emitted.lock().order.clone()
    }

    /// Forget every emitted message (server shutdown or restart).
    pub fn clear(&self) {
        let mut emitted = self.emitted.lock();
        emitted.seen.clear();
        emitted.order.clear();
    }
}

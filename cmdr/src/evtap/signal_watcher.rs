// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use miette::IntoDiagnostic;
use sbc_input::CancellationToken;
use signal_hook::{consts::{SIGINT, SIGTERM},
                  iterator::{Handle, Signals}};
use std::thread::JoinHandle;

pub const SIGNAL_WATCHER_THREAD_NAME: &str = "evtap-signals";

/// Cancels a [`CancellationToken`] on the first `SIGINT` or `SIGTERM`. The input core
/// never installs signal handlers itself, so the binary does it here.
#[derive(Debug)]
pub struct SignalWatcher {
    handle: Handle,
    thread: JoinHandle<()>,
}

impl SignalWatcher {
    /// # Errors
    ///
    /// Returns an error if the handlers can't be registered or the thread can't be
    /// spawned.
    pub fn try_start(cancellation: CancellationToken) -> miette::Result<Self> {
        let mut signals = Signals::new([SIGINT, SIGTERM]).into_diagnostic()?;
        let handle = signals.handle();
        let thread = std::thread::Builder::new()
            .name(SIGNAL_WATCHER_THREAD_NAME.into())
            .spawn(move || {
                // Ends when a signal arrives or the handle is closed.
                if let Some(signal) = signals.forever().next() {
                    tracing::info!(message = "evtap: signal received, cancelling", signal);
                    cancellation.cancel();
                }
            })
            .into_diagnostic()?;
        Ok(Self { handle, thread })
    }

    /// Unregister the handlers and wait for the thread.
    pub fn stop(self) {
        self.handle.close();
        if self.thread.join().is_err() {
            tracing::warn!(message = "evtap: signal watcher thread panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_without_a_signal_leaves_the_token_alone() {
        let token = CancellationToken::new();
        let watcher = SignalWatcher::try_start(token.clone()).unwrap();
        watcher.stop();
        assert!(!token.is_cancelled());
    }
}

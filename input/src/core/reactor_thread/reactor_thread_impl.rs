// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{LivenessState, TerminationGuard, ThreadLiveness};
use crate::Continuation;
use miette::{Context, IntoDiagnostic};
use std::{sync::Arc, thread::JoinHandle};

/// Work that runs on a dedicated thread, one blocking iteration at a time.
pub trait ReactorWorker: Send + 'static {
    /// Value handed back to whoever joins the thread.
    type Output: Send + 'static;

    /// Block until there is something to do, do it, and say whether to keep going.
    fn poll_once(&mut self) -> Continuation;

    /// Consume the worker after the loop stops.
    fn finish(self) -> Self::Output;
}

/// Drive `worker` until it asks to stop. The [`TerminationGuard`] marks `liveness`
/// terminated even if the worker panics.
pub fn run_worker_loop<W: ReactorWorker>(
    mut worker: W,
    liveness: Arc<ThreadLiveness>,
) -> W::Output {
    let _guard = TerminationGuard { liveness };
    while worker.poll_once() == Continuation::Continue {}
    worker.finish()
}

/// Handle to a running [`ReactorWorker`] thread.
#[derive(Debug)]
pub struct ReactorThread<T> {
    join_handle: JoinHandle<T>,
    liveness: Arc<ThreadLiveness>,
}

impl<T: Send + 'static> ReactorThread<T> {
    /// Move `worker` onto a new thread named `<name_prefix>-gen-<generation>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS refuses to create the thread.
    pub fn spawn<W>(name_prefix: &str, worker: W) -> miette::Result<Self>
    where
        W: ReactorWorker<Output = T>,
    {
        let liveness = Arc::new(ThreadLiveness::new());
        let liveness_clone = Arc::clone(&liveness);
        let join_handle = std::thread::Builder::new()
            .name(format!("{name_prefix}-gen-{}", liveness.generation))
            .spawn(move || run_worker_loop(worker, liveness_clone))
            .into_diagnostic()
            .context("Failed to spawn reactor thread")?;
        Ok(Self {
            join_handle,
            liveness,
        })
    }

    #[must_use]
    pub fn is_running(&self) -> LivenessState { self.liveness.is_running() }

    #[must_use]
    pub fn generation(&self) -> u8 { self.liveness.generation }

    /// Wait for the worker to finish and return its output.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread panicked.
    pub fn join(self) -> miette::Result<T> {
        self.join_handle
            .join()
            .map_err(|_| miette::miette!("Reactor thread panicked"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct CountDown {
        remaining: u32,
        iterations: u32,
    }

    impl ReactorWorker for CountDown {
        type Output = u32;

        fn poll_once(&mut self) -> Continuation {
            self.iterations += 1;
            if self.remaining == 0 {
                return Continuation::Stop;
            }
            self.remaining -= 1;
            Continuation::Continue
        }

        fn finish(self) -> u32 { self.iterations }
    }

    #[test]
    fn runs_until_stop_then_finishes() {
        let thread = ReactorThread::spawn(
            "test-reactor",
            CountDown {
                remaining: 3,
                iterations: 0,
            },
        )
        .unwrap();
        let iterations = thread.join().unwrap();
        assert_eq!(iterations, 4);
    }

    #[test]
    fn liveness_is_terminated_after_loop_exits() {
        let liveness = Arc::new(ThreadLiveness::new());
        let output = run_worker_loop(
            CountDown {
                remaining: 0,
                iterations: 0,
            },
            Arc::clone(&liveness),
        );
        assert_eq!(output, 1);
        assert_eq!(liveness.is_running(), LivenessState::Terminated);
    }
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{CancellationToken, Dispatcher, DispatcherHandle};
use crate::{CommonResult, Continuation, InputCoreError, LivenessState, ReactorThread,
            ReactorWorker};

/// Thread name prefix for [`Dispatcher::spawn()`].
pub const DISPATCHER_THREAD_NAME: &str = "sbc-input-dispatcher";

/// Drives a [`Dispatcher`] on a [`ReactorThread`], one [`run_once()`] per iteration.
///
/// [`run_once()`]: Dispatcher::run_once
#[allow(missing_debug_implementations)]
pub struct DispatcherWorker {
    dispatcher: Dispatcher,
    cancellation: CancellationToken,
    result: Result<(), InputCoreError>,
}

impl DispatcherWorker {
    #[must_use]
    pub fn new(dispatcher: Dispatcher, cancellation: CancellationToken) -> Self {
        Self {
            dispatcher,
            cancellation,
            result: Ok(()),
        }
    }
}

impl ReactorWorker for DispatcherWorker {
    type Output = Result<(), InputCoreError>;

    fn poll_once(&mut self) -> Continuation {
        if self.cancellation.is_cancelled() {
            return Continuation::Stop;
        }
        match self.dispatcher.run_once(None) {
            Ok(continuation) => continuation,
            Err(err) => {
                tracing::error!(message = "dispatcher: stopping on error", error = %err);
                self.result = Err(err);
                Continuation::Stop
            }
        }
    }

    fn finish(mut self) -> Self::Output {
        self.dispatcher.shutdown();
        self.result
    }
}

/// A [`Dispatcher`] running on its own thread.
#[derive(Debug)]
pub struct DispatcherThread {
    thread: ReactorThread<Result<(), InputCoreError>>,
    handle: DispatcherHandle,
    cancellation: CancellationToken,
}

impl DispatcherThread {
    #[must_use]
    pub fn handle(&self) -> DispatcherHandle { self.handle.clone() }

    #[must_use]
    pub fn is_running(&self) -> LivenessState { self.thread.is_running() }

    /// Cancel the loop; it finishes the current iteration, then shuts down.
    pub fn cancel(&self) { self.cancellation.cancel(); }

    /// Wait for the loop to end.
    ///
    /// # Errors
    ///
    /// The internal error that stopped the loop, or a report if the thread panicked.
    pub fn join(self) -> CommonResult<()> {
        self.thread.join()??;
        Ok(())
    }
}

impl Dispatcher {
    /// Move the dispatcher onto a dedicated thread and run it until `cancellation`
    /// fires or a shutdown is requested.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread can't be spawned.
    pub fn spawn(self, cancellation: CancellationToken) -> CommonResult<DispatcherThread> {
        cancellation.register_waker(self.poller_waker());
        let handle = self.handle();
        let thread = ReactorThread::spawn(
            DISPATCHER_THREAD_NAME,
            DispatcherWorker::new(self, cancellation.clone()),
        )?;
        Ok(DispatcherThread {
            thread,
            handle,
            cancellation,
        })
    }
}

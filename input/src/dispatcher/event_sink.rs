// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{CloseReason, ControlMessage, ControlSender, QueueStats, RecvError,
            SubscriptionId, SubscriptionQueue};
use crate::{Continuation, InputEvent, ReactorThread, ReactorWorker};
use std::sync::Arc;

/// Push style consumer. Runs on its own delivery thread, so a slow sink only fills its
/// own queue.
pub trait EventSink: Send + 'static {
    /// Handle one event. Return [`Continuation::Stop`] to unsubscribe.
    fn deliver(&mut self, event: Arc<InputEvent>) -> Continuation;

    /// Called once, after the last event.
    fn closed(&mut self, _reason: CloseReason) {}
}

impl<F> EventSink for F
where
    F: FnMut(Arc<InputEvent>) -> Continuation + Send + 'static,
{
    fn deliver(&mut self, event: Arc<InputEvent>) -> Continuation { self(event) }
}

/// Delivery loop for one sink subscription.
#[allow(missing_debug_implementations)]
pub struct SinkWorker<S: EventSink> {
    queue: Arc<SubscriptionQueue>,
    sink: S,
    control: ControlSender,
}

impl<S: EventSink> SinkWorker<S> {
    pub fn new(queue: Arc<SubscriptionQueue>, sink: S, control: ControlSender) -> Self {
        Self {
            queue,
            sink,
            control,
        }
    }
}

impl<S: EventSink> ReactorWorker for SinkWorker<S> {
    type Output = QueueStats;

    fn poll_once(&mut self) -> Continuation {
        match self.queue.pop_blocking(None) {
            Ok(event) => {
                if self.sink.deliver(event) == Continuation::Stop {
                    self.queue.close(CloseReason::Unsubscribed);
                    self.control
                        .send(ControlMessage::Unsubscribe(self.queue.id()));
                    self.sink.closed(CloseReason::Unsubscribed);
                    return Continuation::Stop;
                }
                Continuation::Continue
            }
            Err(RecvError::Closed(reason)) => {
                self.sink.closed(reason);
                Continuation::Stop
            }
            Err(RecvError::Empty | RecvError::Timeout) => Continuation::Continue,
        }
    }

    fn finish(self) -> QueueStats { self.queue.stats() }
}

/// A running sink subscription. Dropping it leaves the delivery thread running until
/// the subscription closes; use [`unsubscribe()`](Self::unsubscribe) to stop it.
#[derive(Debug)]
pub struct SinkSubscription {
    queue: Arc<SubscriptionQueue>,
    thread: ReactorThread<QueueStats>,
    control: ControlSender,
}

impl SinkSubscription {
    #[must_use]
    pub fn new(
        queue: Arc<SubscriptionQueue>,
        thread: ReactorThread<QueueStats>,
        control: ControlSender,
    ) -> Self {
        Self {
            queue,
            thread,
            control,
        }
    }

    #[must_use]
    pub fn id(&self) -> SubscriptionId { self.queue.id() }

    #[must_use]
    pub fn stats(&self) -> QueueStats { self.queue.stats() }

    /// Close the subscription and wait for the delivery thread. Events already queued
    /// are still delivered.
    ///
    /// # Errors
    ///
    /// Returns an error if the delivery thread panicked.
    pub fn unsubscribe(self) -> miette::Result<QueueStats> {
        if self.queue.close(CloseReason::Unsubscribed) {
            self.control
                .send(ControlMessage::Unsubscribe(self.queue.id()));
        }
        self.thread.join()
    }

    /// Wait for the subscription to close on its own (shutdown, overflow, sink stop).
    ///
    /// # Errors
    ///
    /// Returns an error if the delivery thread panicked.
    pub fn join(self) -> miette::Result<QueueStats> { self.thread.join() }
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{CloseReason, ControlMessage, ControlSender, QueueStats, RecvError,
            SubscriptionId, SubscriptionQueue};
use crate::InputEvent;
use std::{sync::Arc, time::Duration};

/// Receive side of a subscription. Dropping it unsubscribes.
///
/// Events are shared, immutable [`Arc<InputEvent>`]s: every matching subscription
/// receives the same allocation.
#[derive(Debug)]
pub struct SubscriptionHandle {
    queue: Arc<SubscriptionQueue>,
    control: ControlSender,
}

impl SubscriptionHandle {
    #[must_use]
    pub fn new(queue: Arc<SubscriptionQueue>, control: ControlSender) -> Self {
        Self { queue, control }
    }

    #[must_use]
    pub fn id(&self) -> SubscriptionId { self.queue.id() }

    /// Wait for the next event.
    ///
    /// # Errors
    ///
    /// [`RecvError::Closed`] once the subscription is closed and drained.
    pub async fn recv(&self) -> Result<Arc<InputEvent>, RecvError> { self.queue.pop().await }

    /// Block the calling thread until the next event.
    ///
    /// # Errors
    ///
    /// [`RecvError::Closed`] once the subscription is closed and drained.
    pub fn recv_blocking(&self) -> Result<Arc<InputEvent>, RecvError> {
        self.queue.pop_blocking(None)
    }

    /// # Errors
    ///
    /// [`RecvError::Timeout`] if nothing arrives within `timeout`, or
    /// [`RecvError::Closed`].
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Arc<InputEvent>, RecvError> {
        self.queue.pop_blocking(Some(timeout))
    }

    /// # Errors
    ///
    /// [`RecvError::Empty`] if nothing is queued, or [`RecvError::Closed`].
    pub fn try_recv(&self) -> Result<Arc<InputEvent>, RecvError> { self.queue.try_pop() }

    #[must_use]
    pub fn stats(&self) -> QueueStats { self.queue.stats() }

    #[must_use]
    pub fn close_reason(&self) -> Option<CloseReason> { self.queue.close_reason() }

    /// Explicit form of dropping the handle.
    pub fn unsubscribe(self) { drop(self); }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if self.queue.close(CloseReason::Unsubscribed) {
            self.control
                .send(ControlMessage::Unsubscribe(self.queue.id()));
        }
    }
}

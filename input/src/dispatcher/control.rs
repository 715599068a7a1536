// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{CancellationToken, CloseReason, EventSink, SinkSubscription, SinkWorker,
            SubscribeOptions, SubscriptionFilter, SubscriptionHandle, SubscriptionId,
            SubscriptionQueue};
use crate::{DispatcherConfig, ReactorThread};
use std::sync::{Arc,
                atomic::{AtomicU64, Ordering},
                mpsc::Sender};

/// Requests from other threads to the dispatcher's worker. Applied at the top of each
/// loop iteration, in the order sent.
#[derive(Debug)]
pub enum ControlMessage {
    Subscribe {
        queue: Arc<SubscriptionQueue>,
        filter: SubscriptionFilter,
        cancellation: Option<CancellationToken>,
    },
    Unsubscribe(SubscriptionId),
    Rescan,
    Shutdown,
}

/// Sends a [`ControlMessage`] and wakes the worker's poller so it is applied promptly.
#[derive(Debug, Clone)]
pub struct ControlSender {
    tx: Sender<ControlMessage>,
    waker: Arc<mio::Waker>,
}

impl ControlSender {
    #[must_use]
    pub fn new(tx: Sender<ControlMessage>, waker: Arc<mio::Waker>) -> Self {
        Self { tx, waker }
    }

    /// Returns `false` if the dispatcher is gone.
    pub fn send(&self, message: ControlMessage) -> bool {
        if self.tx.send(message).is_err() {
            return false;
        }
        // The receiver may be dropped between the send and the wake; that is fine.
        let _unused = self.waker.wake();
        true
    }
}

/// Cheap, cloneable, thread safe handle for talking to a [`Dispatcher`] that runs on
/// another thread.
///
/// [`Dispatcher`]: crate::Dispatcher
#[derive(Debug, Clone)]
pub struct DispatcherHandle {
    control: ControlSender,
    defaults: DispatcherConfig,
    next_id: Arc<AtomicU64>,
}

impl DispatcherHandle {
    #[must_use]
    pub fn new(control: ControlSender, defaults: DispatcherConfig) -> Self {
        Self {
            control,
            defaults,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    fn new_queue(&self, options: &SubscribeOptions) -> Arc<SubscriptionQueue> {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        Arc::new(SubscriptionQueue::new(
            id,
            options
                .capacity
                .unwrap_or(self.defaults.default_queue_capacity),
            options
                .overflow_policy
                .unwrap_or(self.defaults.default_overflow_policy),
        ))
    }

    fn register(
        &self,
        queue: &Arc<SubscriptionQueue>,
        filter: SubscriptionFilter,
        options: SubscribeOptions,
    ) {
        let sent = self.control.send(ControlMessage::Subscribe {
            queue: Arc::clone(queue),
            filter,
            cancellation: options.cancellation,
        });
        if !sent {
            queue.close(CloseReason::Shutdown);
        }
    }

    /// Register a receiver style subscription. It starts receiving events once the
    /// dispatcher applies the request (its next loop iteration). If the dispatcher is
    /// gone the handle comes back already closed with [`CloseReason::Shutdown`].
    #[must_use]
    pub fn subscribe(
        &self,
        filter: SubscriptionFilter,
        options: SubscribeOptions,
    ) -> SubscriptionHandle {
        let queue = self.new_queue(&options);
        self.register(&queue, filter, options);
        SubscriptionHandle::new(queue, self.control.clone())
    }

    /// Register a subscription whose events are pushed into `sink` on a dedicated
    /// delivery thread named `sink-<id>-gen-<n>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the delivery thread can't be spawned.
    pub fn subscribe_with_sink<S: EventSink>(
        &self,
        filter: SubscriptionFilter,
        options: SubscribeOptions,
        sink: S,
    ) -> miette::Result<SinkSubscription> {
        let queue = self.new_queue(&options);
        let id = queue.id();
        let worker = SinkWorker::new(Arc::clone(&queue), sink, self.control.clone());
        let thread = ReactorThread::spawn(&format!("sink-{}", id.0), worker)?;
        self.register(&queue, filter, options);
        Ok(SinkSubscription::new(queue, thread, self.control.clone()))
    }

    /// Remove a subscription by id. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.control.send(ControlMessage::Unsubscribe(id))
    }

    /// Ask the worker to re-enumerate devices.
    pub fn rescan(&self) -> bool { self.control.send(ControlMessage::Rescan) }

    /// Ask the worker to shut down. Returns `false` if it is already gone.
    pub fn shutdown(&self) -> bool { self.control.send(ControlMessage::Shutdown) }
}

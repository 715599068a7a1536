// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{OverflowPolicy, SubscriptionId};
use crate::{ErrorKind, InputEvent};
use serde::Serialize;
use std::{collections::VecDeque,
          sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
          time::{Duration, Instant}};
use tokio::sync::Notify;

/// Why a subscription stopped receiving events.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CloseReason {
    Unsubscribed,
    /// The queue was full under [`OverflowPolicy::Disconnect`].
    Overflow,
    /// The dispatcher shut down (or is gone).
    Shutdown,
    /// The subscription's own cancellation token fired.
    Cancelled,
}

/// Errors returned by the receive side of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum RecvError {
    #[error("No event is queued")]
    #[diagnostic(code(sbc_input::subscription::empty))]
    Empty,

    #[error("Timed out waiting for an event")]
    #[diagnostic(code(sbc_input::subscription::timeout))]
    Timeout,

    #[error("Subscription closed ({0})")]
    #[diagnostic(code(sbc_input::subscription::closed))]
    Closed(CloseReason),
}

impl RecvError {
    /// The error kind a closed subscription maps to; [`None`] while it is still open.
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Empty | Self::Timeout => None,
            Self::Closed(CloseReason::Overflow) => Some(ErrorKind::Overflow),
            Self::Closed(
                CloseReason::Cancelled | CloseReason::Shutdown | CloseReason::Unsubscribed,
            ) => Some(ErrorKind::Cancelled),
        }
    }
}

/// Delivery counters. Once a queue is drained, `delivered + dropped == emitted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct QueueStats {
    /// Events that matched the filter and were offered to the queue.
    pub emitted: u64,
    /// Events handed to the consumer.
    pub delivered: u64,
    /// Events evicted or refused because the queue was full.
    pub dropped: u64,
    /// Events waiting in the queue now.
    pub pending: usize,
}

/// What [`SubscriptionQueue::push()`] did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    /// Queued after evicting the oldest event.
    DroppedOldest,
    /// Refused; the queue kept its contents.
    DroppedNewest,
    /// Refused, and the queue is now closed with [`CloseReason::Overflow`].
    Overflowed,
    /// The queue was already closed.
    Closed,
}

#[derive(Debug, Default)]
struct QueueState {
    events: VecDeque<Arc<InputEvent>>,
    closed: Option<CloseReason>,
    stats: QueueStats,
}

/// Bounded FIFO shared by the dispatcher (producer, never blocks) and one consumer
/// (async, blocking, or a sink thread). Queued events are still delivered after the
/// queue closes; the close reason is reported once they run out.
#[derive(Debug)]
pub struct SubscriptionQueue {
    id: SubscriptionId,
    capacity: usize,
    policy: OverflowPolicy,
    state: Mutex<QueueState>,
    condvar: Condvar,
    notify: Notify,
}

impl SubscriptionQueue {
    #[must_use]
    pub fn new(id: SubscriptionId, capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            id,
            capacity,
            policy,
            state: Mutex::new(QueueState {
                events: VecDeque::with_capacity(capacity),
                ..Default::default()
            }),
            condvar: Condvar::new(),
            notify: Notify::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> SubscriptionId { self.id }

    #[must_use]
    pub fn capacity(&self) -> usize { self.capacity }

    #[must_use]
    pub fn policy(&self) -> OverflowPolicy { self.policy }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wake_consumer(&self) {
        self.condvar.notify_all();
        self.notify.notify_waiters();
    }

    /// Offer an event. Never blocks on the consumer.
    pub fn push(&self, event: Arc<InputEvent>) -> PushOutcome {
        let outcome = {
            let mut state = self.lock();
            if state.closed.is_some() {
                return PushOutcome::Closed;
            }
            state.stats.emitted += 1;
            if state.events.len() < self.capacity {
                state.events.push_back(event);
                PushOutcome::Queued
            } else {
                state.stats.dropped += 1;
                match self.policy {
                    OverflowPolicy::DropOldest => {
                        state.events.pop_front();
                        state.events.push_back(event);
                        PushOutcome::DroppedOldest
                    }
                    OverflowPolicy::DropNewest => PushOutcome::DroppedNewest,
                    OverflowPolicy::Disconnect => {
                        state.closed = Some(CloseReason::Overflow);
                        PushOutcome::Overflowed
                    }
                }
            }
        };
        if outcome != PushOutcome::DroppedNewest {
            self.wake_consumer();
        }
        outcome
    }

    /// Close the queue. Returns `false` if it was already closed (the first reason
    /// sticks).
    pub fn close(&self, reason: CloseReason) -> bool {
        let newly_closed = {
            let mut state = self.lock();
            if state.closed.is_some() {
                false
            } else {
                state.closed = Some(reason);
                true
            }
        };
        if newly_closed {
            self.wake_consumer();
        }
        newly_closed
    }

    #[must_use]
    pub fn close_reason(&self) -> Option<CloseReason> { self.lock().closed }

    #[must_use]
    pub fn stats(&self) -> QueueStats {
        let state = self.lock();
        QueueStats {
            pending: state.events.len(),
            ..state.stats
        }
    }

    fn pop_locked(state: &mut QueueState) -> Result<Arc<InputEvent>, RecvError> {
        if let Some(event) = state.events.pop_front() {
            state.stats.delivered += 1;
            return Ok(event);
        }
        match state.closed {
            Some(reason) => Err(RecvError::Closed(reason)),
            None => Err(RecvError::Empty),
        }
    }

    /// # Errors
    ///
    /// [`RecvError::Empty`] if nothing is queued, [`RecvError::Closed`] once the queue
    /// is closed and drained.
    pub fn try_pop(&self) -> Result<Arc<InputEvent>, RecvError> {
        Self::pop_locked(&mut self.lock())
    }

    /// Block the calling thread until an event arrives, the queue closes, or `timeout`
    /// passes ([`None`] waits indefinitely).
    ///
    /// # Errors
    ///
    /// [`RecvError::Timeout`] or [`RecvError::Closed`].
    pub fn pop_blocking(
        &self,
        timeout: Option<Duration>,
    ) -> Result<Arc<InputEvent>, RecvError> {
        let deadline = timeout.map(|it| Instant::now() + it);
        let mut state = self.lock();
        loop {
            match Self::pop_locked(&mut state) {
                Err(RecvError::Empty) => {}
                other => return other,
            }
            state = match deadline {
                None => self
                    .condvar
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(RecvError::Timeout);
                    }
                    self.condvar
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
    }

    /// Wait asynchronously for the next event.
    ///
    /// # Errors
    ///
    /// [`RecvError::Closed`] once the queue is closed and drained.
    pub async fn pop(&self) -> Result<Arc<InputEvent>, RecvError> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a push between the check and the await is
            // not missed.
            notified.as_mut().enable();
            match self.try_pop() {
                Err(RecvError::Empty) => notified.await,
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LifecycleEvent;
    use pretty_assertions::assert_eq;
    use std::time::SystemTime;

    fn tick(sequence: u64) -> Arc<InputEvent> {
        Arc::new(
            LifecycleEvent::Tick {
                sequence,
                at: SystemTime::UNIX_EPOCH,
            }
            .into(),
        )
    }

    fn sequence_of(event: &InputEvent) -> u64 {
        match event.as_lifecycle() {
            Some(LifecycleEvent::Tick { sequence, .. }) => *sequence,
            _ => panic!("not a tick: {event}"),
        }
    }

    fn drain(queue: &SubscriptionQueue) -> Vec<u64> {
        std::iter::from_fn(|| queue.try_pop().ok())
            .map(|it| sequence_of(&it))
            .collect()
    }

    #[test]
    fn drop_oldest_keeps_the_newest_events() {
        let queue = SubscriptionQueue::new(SubscriptionId(1), 4, OverflowPolicy::DropOldest);
        for sequence in 1..=6 {
            queue.push(tick(sequence));
        }
        assert_eq!(drain(&queue), vec![3, 4, 5, 6]);
        let stats = queue.stats();
        assert_eq!(stats.dropped, 2);
        assert_eq!(stats.delivered + stats.dropped, stats.emitted);
    }

    #[test]
    fn drop_newest_keeps_the_oldest_events() {
        let queue = SubscriptionQueue::new(SubscriptionId(1), 2, OverflowPolicy::DropNewest);
        let outcomes: Vec<PushOutcome> = (1..=3).map(|it| queue.push(tick(it))).collect();
        assert_eq!(
            outcomes,
            vec![PushOutcome::Queued, PushOutcome::Queued, PushOutcome::DroppedNewest]
        );
        assert_eq!(drain(&queue), vec![1, 2]);
        assert_eq!(queue.stats().dropped, 1);
    }

    #[test]
    fn disconnect_closes_with_overflow_after_draining() {
        let queue = SubscriptionQueue::new(SubscriptionId(1), 1, OverflowPolicy::Disconnect);
        assert_eq!(queue.push(tick(1)), PushOutcome::Queued);
        assert_eq!(queue.push(tick(2)), PushOutcome::Overflowed);
        assert_eq!(queue.push(tick(3)), PushOutcome::Closed);

        assert_eq!(sequence_of(&queue.try_pop().unwrap()), 1);
        let err = queue.try_pop().unwrap_err();
        assert_eq!(err, RecvError::Closed(CloseReason::Overflow));
        assert_eq!(err.kind(), Some(ErrorKind::Overflow));
    }

    #[test]
    fn first_close_reason_sticks() {
        let queue = SubscriptionQueue::new(SubscriptionId(1), 1, OverflowPolicy::DropOldest);
        assert!(queue.close(CloseReason::Cancelled));
        assert!(!queue.close(CloseReason::Shutdown));
        assert_eq!(queue.close_reason(), Some(CloseReason::Cancelled));
    }

    #[test]
    fn pop_blocking_times_out_then_sees_a_push() {
        let queue = Arc::new(SubscriptionQueue::new(
            SubscriptionId(1),
            4,
            OverflowPolicy::DropOldest,
        ));
        assert_eq!(
            queue.pop_blocking(Some(Duration::from_millis(10))).unwrap_err(),
            RecvError::Timeout
        );

        let producer = Arc::clone(&queue);
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            producer.push(tick(9));
        });
        let event = queue.pop_blocking(None).unwrap();
        handle.join().unwrap();
        assert_eq!(sequence_of(&event), 9);
    }

    #[tokio::test]
    async fn async_pop_wakes_on_close() {
        let queue = Arc::new(SubscriptionQueue::new(
            SubscriptionId(1),
            4,
            OverflowPolicy::DropOldest,
        ));
        let closer = Arc::clone(&queue);
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            closer.close(CloseReason::Shutdown);
        });
        let result = tokio::time::timeout(Duration::from_secs(2), queue.pop())
            .await
            .unwrap();
        assert_eq!(result.unwrap_err(), RecvError::Closed(CloseReason::Shutdown));
    }
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::sync::{Arc, Mutex, PoisonError,
                atomic::{AtomicBool, Ordering}};
use tokio::sync::Notify;

/// Cooperative cancellation shared between the host and the core. Cloning shares the
/// same flag. Cancelling wakes every registered [`mio::Waker`] (so a blocked
/// [`Poller::wait()`] returns) and every task awaiting [`cancelled()`].
///
/// The core never installs signal handlers; hosts call [`cancel()`] from their own.
///
/// [`Poller::wait()`]: crate::Poller::wait
/// [`cancel()`]: Self::cancel
/// [`cancelled()`]: Self::cancelled
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<CancellationInner>,
}

#[derive(Debug, Default)]
struct CancellationInner {
    is_cancelled: AtomicBool,
    wakers: Mutex<Vec<Arc<mio::Waker>>>,
    notify: Notify,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Idempotent.
    pub fn cancel(&self) {
        if self.inner.is_cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        let wakers = self
            .inner
            .wakers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for waker in wakers.iter() {
            if let Err(err) = waker.wake() {
                tracing::debug!(message = "cancellation: wake failed", error = %err);
            }
        }
        self.inner.notify.notify_waiters();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool { self.inner.is_cancelled.load(Ordering::Acquire) }

    /// Wake `waker` when this token is cancelled (right away if it already is).
    pub fn register_waker(&self, waker: Arc<mio::Waker>) {
        let mut wakers = self
            .inner
            .wakers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.is_cancelled() {
            let _unused = waker.wake();
        }
        wakers.push(waker);
    }

    /// Resolves once [`cancel()`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn clones_share_the_flag() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_resolves_after_cancel_from_another_thread() {
        let token = CancellationToken::new();
        let clone = token.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            clone.cancel();
        });
        tokio::time::timeout(Duration::from_secs(2), token.cancelled())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn cancelled_resolves_immediately_when_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        token.cancelled().await;
    }
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words EINTR

use super::{InterestMask, ReadinessMask, ReadyNotification, ReadySource};
use crate::{InputCoreError, PollerConfig};
use mio::{Events, Poll, Token, Waker, unix::SourceFd};
use rustc_hash::FxHashMap;
use std::{io::ErrorKind,
          os::fd::RawFd,
          sync::Arc,
          time::{Duration, Instant}};

/// Token of the poller's [`Waker`]. Descriptors use their own fd number as the token,
/// so this can never collide with one. `usize::MAX` itself is reserved by [`mio`].
pub const WAKER_TOKEN: Token = Token(usize::MAX - 1);

/// Single-threaded readiness multiplexer. Only the thread that owns it attaches,
/// detaches and waits; any thread may wake it through [`waker()`].
///
/// [`waker()`]: Self::waker
#[allow(missing_debug_implementations)]
pub struct Poller {
    poll_handle: Poll,
    ready_events_buffer: Events,
    interests: FxHashMap<RawFd, InterestMask>,
    /// Descriptors returned by the previous [`wait()`](Self::wait), re-armed before the
    /// next one.
    reported: Vec<RawFd>,
    waker: Arc<Waker>,
}

impl Poller {
    /// # Errors
    ///
    /// [`InputCoreError::Io`] if the epoll instance or the waker can't be created.
    pub fn new(config: PollerConfig) -> Result<Self, InputCoreError> {
        let poll_handle = Poll::new().map_err(|source| InputCoreError::Io {
            context: "Failed to create mio::Poll",
            source,
        })?;
        let waker = Waker::new(poll_handle.registry(), WAKER_TOKEN).map_err(|source| {
            InputCoreError::Io {
                context: "Failed to create mio::Waker",
                source,
            }
        })?;
        Ok(Self {
            poll_handle,
            ready_events_buffer: Events::with_capacity(config.batch_capacity.max(1)),
            interests: FxHashMap::default(),
            reported: Vec::new(),
            waker: Arc::new(waker),
        })
    }

    /// Shared handle that interrupts a blocked [`wait()`](Self::wait).
    #[must_use]
    pub fn waker(&self) -> Arc<Waker> { Arc::clone(&self.waker) }

    /// Add `mask` to the interest for `fd`, registering it if it is new.
    ///
    /// # Errors
    ///
    /// [`InputCoreError::Io`] if the registration fails (e.g. `fd` is a regular file).
    pub fn attach(&mut self, fd: RawFd, mask: InterestMask) -> Result<(), InputCoreError> {
        let previous = self.interests.get(&fd).copied();
        let merged = previous.unwrap_or_default() | mask;
        let Some(interest) = merged.to_mio_interest() else {
            return Ok(());
        };
        let registry = self.poll_handle.registry();
        let result = match previous {
            None => registry.register(&mut SourceFd(&fd), token_for(fd), interest),
            Some(_) => registry.reregister(&mut SourceFd(&fd), token_for(fd), interest),
        };
        result.map_err(|source| InputCoreError::Io {
            context: "Failed to register descriptor with mio",
            source,
        })?;
        self.interests.insert(fd, merged);
        Ok(())
    }

    /// Clear `mask` from the interest for `fd`. Once nothing is left the descriptor is
    /// removed entirely. Detaching an unknown descriptor does nothing.
    ///
    /// # Errors
    ///
    /// [`InputCoreError::Io`] if the reregistration fails.
    pub fn detach(&mut self, fd: RawFd, mask: InterestMask) -> Result<(), InputCoreError> {
        let Some(previous) = self.interests.get(&fd).copied() else {
            return Ok(());
        };
        let remaining = previous - mask;
        let registry = self.poll_handle.registry();
        match remaining.to_mio_interest() {
            None => {
                self.interests.remove(&fd);
                // The descriptor may already be closed, in which case epoll dropped it.
                if let Err(err) = registry.deregister(&mut SourceFd(&fd)) {
                    tracing::debug!(
                        message = "poller: deregister failed",
                        fd,
                        error = %err
                    );
                }
            }
            Some(interest) => {
                registry
                    .reregister(&mut SourceFd(&fd), token_for(fd), interest)
                    .map_err(|source| InputCoreError::Io {
                        context: "Failed to reregister descriptor with mio",
                        source,
                    })?;
                self.interests.insert(fd, remaining);
            }
        }
        Ok(())
    }

    /// Block until at least one descriptor is ready, the waker fires, or `timeout`
    /// passes. [`None`] waits indefinitely. At most `batch_capacity` notifications are
    /// returned; the rest come back on the next call.
    ///
    /// Readiness is level-triggered: a descriptor that is still readable because the
    /// caller did not read it is reported again by the next call.
    ///
    /// # Errors
    ///
    /// [`InputCoreError::Io`] for any poll failure other than `EINTR`.
    pub fn wait(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<Vec<ReadyNotification>, InputCoreError> {
        self.rearm_reported();
        let deadline = timeout.map(|it| Instant::now() + it);
        let mut remaining = timeout;
        loop {
            match self.poll_handle.poll(&mut self.ready_events_buffer, remaining) {
                Ok(()) => break,
                Err(err) if err.kind() == ErrorKind::Interrupted => {
                    remaining =
                        deadline.map(|it| it.saturating_duration_since(Instant::now()));
                }
                Err(source) => {
                    return Err(InputCoreError::Io {
                        context: "mio::Poll::poll failed",
                        source,
                    });
                }
            }
        }

        let mut acc = Vec::with_capacity(self.ready_events_buffer.iter().count());
        let mut woken = false;
        for event in &self.ready_events_buffer {
            let readiness = ReadinessMask::from_mio_event(event);
            if event.token() == WAKER_TOKEN {
                // Coalesce repeated wakes into one notification.
                if !woken {
                    woken = true;
                    acc.push(ReadyNotification {
                        source: ReadySource::Waker,
                        readiness,
                    });
                }
                continue;
            }
            let Ok(fd) = RawFd::try_from(event.token().0) else {
                continue;
            };
            let Some(interest) = self.interests.get(&fd) else {
                // Detached earlier in this batch.
                continue;
            };
            let readiness = readiness & interest_filter(*interest);
            if !readiness.is_empty() {
                acc.push(ReadyNotification {
                    source: ReadySource::Descriptor(fd),
                    readiness,
                });
            }
        }
        self.reported = acc
            .iter()
            .filter_map(|it| match it.source {
                ReadySource::Descriptor(fd) => Some(fd),
                ReadySource::Waker => None,
            })
            .collect();
        Ok(acc)
    }

    /// `EPOLL_CTL_MOD` on an edge-triggered registration puts the descriptor back on
    /// the ready list if it is still ready.
    fn rearm_reported(&mut self) {
        let registry = self.poll_handle.registry();
        for fd in self.reported.drain(..) {
            let Some(interest) =
                self.interests.get(&fd).copied().and_then(InterestMask::to_mio_interest)
            else {
                continue;
            };
            if let Err(err) =
                registry.reregister(&mut SourceFd(&fd), token_for(fd), interest)
            {
                tracing::debug!(message = "poller: rearm failed", fd, error = %err);
            }
        }
    }

    #[must_use]
    pub fn interest(&self, fd: RawFd) -> Option<InterestMask> {
        self.interests.get(&fd).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize { self.interests.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.interests.is_empty() }
}

#[allow(clippy::cast_sign_loss)]
fn token_for(fd: RawFd) -> Token { Token(fd as usize) }

/// Hangup and error are always reported; readable and writable only when asked for.
fn interest_filter(interest: InterestMask) -> ReadinessMask {
    let mut acc = ReadinessMask::HANGUP | ReadinessMask::ERROR;
    if interest.contains(InterestMask::READABLE) {
        acc |= ReadinessMask::READABLE;
    }
    if interest.contains(InterestMask::WRITABLE) {
        acc |= ReadinessMask::WRITABLE;
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EV_SYN, RawRecord, RecordFormat, SYN_REPORT, try_create_pipe_device};
    use pretty_assertions::assert_eq;
    use std::os::fd::AsRawFd;

    fn poller() -> Poller { Poller::new(PollerConfig::default()).unwrap() }

    fn syn() -> RawRecord { RawRecord::new(0, 0, EV_SYN, SYN_REPORT, 0) }

    #[test]
    fn wait_times_out_with_nothing_ready() {
        let mut poller = poller();
        let ready = poller.wait(Some(Duration::from_millis(10))).unwrap();
        assert!(ready.is_empty());
    }

    #[test]
    fn readable_pipe_is_reported() {
        let mut poller = poller();
        let (reader, writer) = try_create_pipe_device(RecordFormat::default()).unwrap();
        let fd = reader.as_raw_fd();
        poller.attach(fd, InterestMask::READABLE).unwrap();
        writer.write_records(&[syn()]).unwrap();

        let ready = poller.wait(Some(Duration::from_secs(1))).unwrap();
        assert_eq!(
            ready,
            vec![ReadyNotification {
                source: ReadySource::Descriptor(fd),
                readiness: ReadinessMask::READABLE,
            }]
        );
    }

    #[test]
    fn unread_descriptor_is_reported_again() {
        let mut poller = poller();
        let (reader, writer) = try_create_pipe_device(RecordFormat::default()).unwrap();
        let fd = reader.as_raw_fd();
        poller.attach(fd, InterestMask::READABLE).unwrap();
        writer.write_records(&[syn()]).unwrap();

        let first = poller.wait(Some(Duration::from_secs(1))).unwrap();
        let second = poller.wait(Some(Duration::from_millis(100))).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(second, first);

        let mut buffer = [0_u8; 64];
        assert!(rustix::io::read(&reader, &mut buffer).unwrap() > 0);
        let third = poller.wait(Some(Duration::from_millis(10))).unwrap();
        assert!(third.is_empty());
    }

    #[test]
    fn batch_bound_defers_the_rest_to_the_next_call() {
        let mut poller = Poller::new(PollerConfig { batch_capacity: 1 }).unwrap();
        let (first_reader, first_writer) =
            try_create_pipe_device(RecordFormat::default()).unwrap();
        let (second_reader, second_writer) =
            try_create_pipe_device(RecordFormat::default()).unwrap();
        for reader in [&first_reader, &second_reader] {
            poller.attach(reader.as_raw_fd(), InterestMask::READABLE).unwrap();
        }
        first_writer.write_records(&[syn()]).unwrap();
        second_writer.write_records(&[syn()]).unwrap();

        let mut seen = vec![];
        for _ in 0..2 {
            let ready = poller.wait(Some(Duration::from_secs(1))).unwrap();
            assert_eq!(ready.len(), 1);
            if let ReadySource::Descriptor(fd) = ready[0].source {
                seen.push(fd);
            }
        }
        seen.sort_unstable();
        let mut expected = vec![first_reader.as_raw_fd(), second_reader.as_raw_fd()];
        expected.sort_unstable();
        assert_eq!(seen, expected);
    }

    #[test]
    fn attach_merges_and_detach_removes_when_empty() {
        let mut poller = poller();
        let (reader, _writer) = try_create_pipe_device(RecordFormat::default()).unwrap();
        let fd = reader.as_raw_fd();

        poller.attach(fd, InterestMask::READABLE).unwrap();
        poller.attach(fd, InterestMask::HANGUP).unwrap();
        assert_eq!(
            poller.interest(fd),
            Some(InterestMask::READABLE | InterestMask::HANGUP)
        );

        poller.detach(fd, InterestMask::READABLE).unwrap();
        assert_eq!(poller.interest(fd), Some(InterestMask::HANGUP));

        poller.detach(fd, InterestMask::HANGUP).unwrap();
        assert_eq!(poller.interest(fd), None);
        assert!(poller.is_empty());

        // Unknown descriptor.
        poller.detach(fd, InterestMask::all()).unwrap();
    }

    #[test]
    fn closed_writer_reports_hangup_and_detached_fd_goes_quiet() {
        let mut poller = poller();
        let (reader, writer) = try_create_pipe_device(RecordFormat::default()).unwrap();
        let fd = reader.as_raw_fd();
        poller
            .attach(fd, InterestMask::READABLE | InterestMask::HANGUP)
            .unwrap();
        writer.write_records(&[syn()]).unwrap();
        writer.close();

        let ready = poller.wait(Some(Duration::from_secs(1))).unwrap();
        assert_eq!(ready.len(), 1);
        assert!(ready[0].readiness.contains(ReadinessMask::READABLE));
        assert!(ready[0].readiness.contains(ReadinessMask::HANGUP));

        poller.detach(fd, InterestMask::all()).unwrap();
        let ready = poller.wait(Some(Duration::from_millis(10))).unwrap();
        assert!(ready.is_empty());
    }

    #[test]
    fn waker_interrupts_an_indefinite_wait() {
        let mut poller = poller();
        let waker = poller.waker();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            waker.wake().unwrap();
            waker.wake().unwrap();
        });
        let ready = poller.wait(None).unwrap();
        handle.join().unwrap();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].source, ReadySource::Waker);
    }
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use bitflags::bitflags;
use mio::Interest;
use std::os::fd::RawFd;

bitflags! {
    /// What a caller wants to hear about for one descriptor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InterestMask: u8 {
        const READABLE = 1 << 0;
        const WRITABLE = 1 << 1;
        const HANGUP   = 1 << 2;
    }
}

bitflags! {
    /// What the kernel reported for one descriptor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ReadinessMask: u8 {
        const READABLE = 1 << 0;
        const WRITABLE = 1 << 1;
        const HANGUP   = 1 << 2;
        const ERROR    = 1 << 3;
    }
}

impl InterestMask {
    /// The [`mio`] interest for this mask. Hangup is always reported with read
    /// interest, so a hangup-only mask registers as readable. [`None`] for an empty
    /// mask.
    #[must_use]
    pub fn to_mio_interest(self) -> Option<Interest> {
        let read = self.intersects(Self::READABLE | Self::HANGUP);
        let write = self.contains(Self::WRITABLE);
        match (read, write) {
            (true, true) => Some(Interest::READABLE | Interest::WRITABLE),
            (true, false) => Some(Interest::READABLE),
            (false, true) => Some(Interest::WRITABLE),
            (false, false) => None,
        }
    }
}

impl ReadinessMask {
    #[must_use]
    pub fn from_mio_event(event: &mio::event::Event) -> Self {
        let mut acc = Self::empty();
        if event.is_readable() {
            acc |= Self::READABLE;
        }
        if event.is_writable() {
            acc |= Self::WRITABLE;
        }
        if event.is_read_closed() || event.is_write_closed() {
            acc |= Self::HANGUP;
        }
        if event.is_error() {
            acc |= Self::ERROR;
        }
        acc
    }

    /// Hangup or error: the descriptor should be drained and detached.
    #[must_use]
    pub fn is_terminal(self) -> bool { self.intersects(Self::HANGUP | Self::ERROR) }
}

/// Where a readiness notification came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadySource {
    Descriptor(RawFd),
    /// The poller's [`mio::Waker`] was woken from another thread.
    Waker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyNotification {
    pub source: ReadySource,
    pub readiness: ReadinessMask,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(InterestMask::empty(), None)]
    #[test_case(InterestMask::HANGUP, Some(Interest::READABLE))]
    #[test_case(InterestMask::READABLE | InterestMask::HANGUP, Some(Interest::READABLE))]
    #[test_case(InterestMask::WRITABLE, Some(Interest::WRITABLE))]
    #[test_case(InterestMask::all(), Some(Interest::READABLE | Interest::WRITABLE))]
    fn interest_maps_onto_mio(mask: InterestMask, expected: Option<Interest>) {
        assert_eq!(mask.to_mio_interest(), expected);
    }

    #[test]
    fn hangup_and_error_are_terminal() {
        assert!(!ReadinessMask::READABLE.is_terminal());
        assert!((ReadinessMask::READABLE | ReadinessMask::HANGUP).is_terminal());
        assert!(ReadinessMask::ERROR.is_terminal());
    }
}

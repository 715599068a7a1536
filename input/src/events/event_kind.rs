// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use bitflags::bitflags;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EventKind {
    Touch,
    Pointer,
    Key,
    Raw,
    /// Every lifecycle event except ticks.
    Lifecycle,
    Tick,
}

impl EventKind {
    #[must_use]
    pub const fn mask(self) -> EventKindMask {
        match self {
            Self::Touch => EventKindMask::TOUCH,
            Self::Pointer => EventKindMask::POINTER,
            Self::Key => EventKindMask::KEY,
            Self::Raw => EventKindMask::RAW,
            Self::Lifecycle => EventKindMask::LIFECYCLE,
            Self::Tick => EventKindMask::TICK,
        }
    }
}

bitflags! {
    /// Set of [`EventKind`]s a subscription wants. Ticks are opt in, so the default
    /// is everything but [`TICK`](Self::TICK).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventKindMask: u8 {
        const TOUCH     = 1 << 0;
        const POINTER   = 1 << 1;
        const KEY       = 1 << 2;
        const RAW       = 1 << 3;
        const LIFECYCLE = 1 << 4;
        const TICK      = 1 << 5;
    }
}

impl Default for EventKindMask {
    fn default() -> Self { Self::all().difference(Self::TICK) }
}

impl FromIterator<EventKind> for EventKindMask {
    fn from_iter<I: IntoIterator<Item = EventKind>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), |acc, kind| acc | kind.mask())
    }
}

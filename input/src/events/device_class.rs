// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Closed set of device classes. Each class has its own decoder.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DeviceClass {
    Touch,
    Mouse,
    Keyboard,
    Remote,
    Other,
}

impl DeviceClass {
    #[must_use]
    pub const fn mask(self) -> DeviceClassMask {
        match self {
            Self::Touch => DeviceClassMask::TOUCH,
            Self::Mouse => DeviceClassMask::MOUSE,
            Self::Keyboard => DeviceClassMask::KEYBOARD,
            Self::Remote => DeviceClassMask::REMOTE,
            Self::Other => DeviceClassMask::OTHER,
        }
    }
}

bitflags! {
    /// Set of [`DeviceClass`]es a subscription wants events from.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DeviceClassMask: u8 {
        const TOUCH    = 1 << 0;
        const MOUSE    = 1 << 1;
        const KEYBOARD = 1 << 2;
        const REMOTE   = 1 << 3;
        const OTHER    = 1 << 4;
    }
}

impl Default for DeviceClassMask {
    fn default() -> Self { Self::all() }
}

impl FromIterator<DeviceClass> for DeviceClassMask {
    fn from_iter<I: IntoIterator<Item = DeviceClass>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::empty(), |acc, class| acc | class.mask())
    }
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Kernel event time in microseconds, passed through unchanged from the record. No
/// monotonicity is assumed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    #[must_use]
    #[allow(clippy::cast_lossless)]
    pub const fn from_parts(seconds: u64, microseconds: u32) -> Self {
        Self(
            seconds
                .saturating_mul(1_000_000)
                .saturating_add(microseconds as u64),
        )
    }

    #[must_use]
    pub const fn as_micros(self) -> u64 { self.0 }

    #[must_use]
    pub const fn seconds(self) -> u64 { self.0 / 1_000_000 }

    #[must_use]
    pub const fn subsec_micros(self) -> u64 { self.0 % 1_000_000 }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:06}", self.seconds(), self.subsec_micros())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combines_seconds_and_micros() {
        let it = Timestamp::from_parts(12, 34);
        assert_eq!(it.as_micros(), 12_000_034);
        assert_eq!(it.to_string(), "12.000034");
    }
}

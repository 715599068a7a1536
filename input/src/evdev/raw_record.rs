// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{EV_SYN, SYN_DROPPED, SYN_REPORT, event_type_name};
use crate::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// One decoded `struct input_event`. Records between two `SYN_REPORT`s form a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawRecord {
    pub seconds: u64,
    pub microseconds: u32,
    /// `type` in the kernel struct.
    pub kind: u16,
    pub code: u16,
    pub value: i32,
}

impl RawRecord {
    #[must_use]
    pub const fn new(
        seconds: u64,
        microseconds: u32,
        kind: u16,
        code: u16,
        value: i32,
    ) -> Self {
        Self {
            seconds,
            microseconds,
            kind,
            code,
            value,
        }
    }

    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        Timestamp::from_parts(self.seconds, self.microseconds)
    }

    #[must_use]
    pub fn is_sync_report(&self) -> bool { self.kind == EV_SYN && self.code == SYN_REPORT }

    #[must_use]
    pub fn is_sync_dropped(&self) -> bool {
        self.kind == EV_SYN && self.code == SYN_DROPPED
    }
}

impl Display for RawRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}(0x{:02x}) code=0x{:03x} value={}",
            self.timestamp(),
            event_type_name(self.kind),
            self.kind,
            self.code,
            self.value
        )
    }
}

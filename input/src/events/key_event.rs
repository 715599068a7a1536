// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::Timestamp;
use crate::{KEY_VALUE_PRESS, KEY_VALUE_RELEASE, KEY_VALUE_REPEAT};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum KeyAction {
    Release,
    Press,
    Repeat,
}

impl KeyAction {
    #[must_use]
    pub const fn from_value(value: i32) -> Option<Self> {
        match value {
            KEY_VALUE_RELEASE => Some(Self::Release),
            KEY_VALUE_PRESS => Some(Self::Press),
            KEY_VALUE_REPEAT => Some(Self::Repeat),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub code: u16,
    pub action: KeyAction,
    /// Raw `MSC_SCAN` value seen in the same frame (remote receivers).
    pub scancode: Option<u32>,
    pub timestamp: Timestamp,
}

impl Display for KeyEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "key {} code={}", self.action, self.code)?;
        if let Some(scancode) = self.scancode {
            write!(f, " scan={scancode:#x}")?;
        }
        Ok(())
    }
}

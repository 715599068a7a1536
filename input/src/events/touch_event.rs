// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Device coordinates as reported by the kernel (no scaling).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self { Self { x, y } }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

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
pub enum TouchPhase {
    Begin,
    Move,
    End,
}

/// One contact's change in one frame. A contact is `Begin`, zero or more `Move`, then
/// `End`, all carrying the same `tracking_id` and `slot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouchEvent {
    pub slot: u16,
    pub tracking_id: i32,
    pub phase: TouchPhase,
    pub position: Position,
    pub previous: Position,
    pub timestamp: Timestamp,
}

impl Display for TouchEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "touch {} slot={} id={} at={} prev={}",
            self.phase, self.slot, self.tracking_id, self.position, self.previous
        )
    }
}

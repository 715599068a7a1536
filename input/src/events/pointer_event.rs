// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{Position, Timestamp};
use crate::{BTN_EXTRA, BTN_LEFT, BTN_MIDDLE, BTN_RIGHT, BTN_SIDE};
use bitflags::bitflags;
use serde::{Serialize, Serializer};
use std::fmt::{Display, Formatter};

bitflags! {
    /// Mouse buttons held down.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ButtonMask: u8 {
        const LEFT   = 1 << 0;
        const RIGHT  = 1 << 1;
        const MIDDLE = 1 << 2;
        const SIDE   = 1 << 3;
        const EXTRA  = 1 << 4;
    }
}

impl ButtonMask {
    /// Map an `EV_KEY` code to its button bit, if it is a mouse button.
    #[must_use]
    pub const fn from_key_code(code: u16) -> Option<Self> {
        match code {
            BTN_LEFT => Some(Self::LEFT),
            BTN_RIGHT => Some(Self::RIGHT),
            BTN_MIDDLE => Some(Self::MIDDLE),
            BTN_SIDE => Some(Self::SIDE),
            BTN_EXTRA => Some(Self::EXTRA),
            _ => None,
        }
    }
}

impl Serialize for ButtonMask {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.bits())
    }
}

/// Pointer state change for one frame (or one half of a split frame).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PointerEvent {
    pub dx: i32,
    pub dy: i32,
    pub wheel: i32,
    pub hwheel: i32,
    /// Set when the frame carried `ABS_X` / `ABS_Y`.
    pub absolute: Option<Position>,
    /// Running position after this event.
    pub position: Position,
    /// Buttons held after this event.
    pub buttons: ButtonMask,
    pub pressed: ButtonMask,
    pub released: ButtonMask,
    pub timestamp: Timestamp,
}

impl PointerEvent {
    /// Nothing moved and no button changed.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.dx == 0
            && self.dy == 0
            && self.wheel == 0
            && self.hwheel == 0
            && self.absolute.is_none()
            && self.pressed.is_empty()
            && self.released.is_empty()
    }
}

impl Display for PointerEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "pointer d=({}, {}) at={} buttons={:#04x}",
            self.dx,
            self.dy,
            self.position,
            self.buttons.bits()
        )?;
        if self.wheel != 0 || self.hwheel != 0 {
            write!(f, " wheel=({}, {})", self.wheel, self.hwheel)?;
        }
        if !self.pressed.is_empty() {
            write!(f, " down={:#04x}", self.pressed.bits())?;
        }
        if !self.released.is_empty() {
            write!(f, " up={:#04x}", self.released.bits())?;
        }
        Ok(())
    }
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{DeviceRef, EventKind, KeyEvent, LifecycleEvent, PointerEvent, TouchEvent};
use crate::RawRecord;
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Everything a subscription can receive.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InputEvent {
    Touch {
        device: DeviceRef,
        touch: TouchEvent,
    },
    Pointer {
        device: DeviceRef,
        pointer: PointerEvent,
    },
    Key {
        device: DeviceRef,
        key: KeyEvent,
    },
    /// Records from an `other` class device, passed through undecoded.
    Raw {
        device: DeviceRef,
        record: RawRecord,
    },
    Lifecycle {
        lifecycle: LifecycleEvent,
    },
}

impl InputEvent {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Touch { .. } => EventKind::Touch,
            Self::Pointer { .. } => EventKind::Pointer,
            Self::Key { .. } => EventKind::Key,
            Self::Raw { .. } => EventKind::Raw,
            Self::Lifecycle {
                lifecycle: LifecycleEvent::Tick { .. },
            } => EventKind::Tick,
            Self::Lifecycle { .. } => EventKind::Lifecycle,
        }
    }

    /// The device this event came from. [`None`] for ticks, shutdown, and errors that
    /// don't belong to one device.
    #[must_use]
    pub fn device(&self) -> Option<&DeviceRef> {
        match self {
            Self::Touch { device, .. }
            | Self::Pointer { device, .. }
            | Self::Key { device, .. }
            | Self::Raw { device, .. } => Some(device),
            Self::Lifecycle { lifecycle } => lifecycle.device(),
        }
    }

    #[must_use]
    pub fn as_touch(&self) -> Option<&TouchEvent> {
        match self {
            Self::Touch { touch, .. } => Some(touch),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_pointer(&self) -> Option<&PointerEvent> {
        match self {
            Self::Pointer { pointer, .. } => Some(pointer),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_key(&self) -> Option<&KeyEvent> {
        match self {
            Self::Key { key, .. } => Some(key),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_lifecycle(&self) -> Option<&LifecycleEvent> {
        match self {
            Self::Lifecycle { lifecycle } => Some(lifecycle),
            _ => None,
        }
    }
}

impl From<LifecycleEvent> for InputEvent {
    fn from(lifecycle: LifecycleEvent) -> Self { Self::Lifecycle { lifecycle } }
}

impl Display for InputEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Touch { device, touch } => write!(f, "{} {touch}", device.id),
            Self::Pointer { device, pointer } => write!(f, "{} {pointer}", device.id),
            Self::Key { device, key } => write!(f, "{} {key}", device.id),
            Self::Raw { device, record } => write!(f, "{} raw {record}", device.id),
            Self::Lifecycle { lifecycle } => write!(f, "{lifecycle}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DetachReason, DeviceClass, Position, Timestamp, TouchPhase};
    use pretty_assertions::assert_eq;

    fn touch_device() -> DeviceRef { DeviceRef::new("/dev/input/event0", DeviceClass::Touch) }

    #[test]
    fn tick_has_its_own_kind() {
        let tick: InputEvent = LifecycleEvent::Tick {
            sequence: 1,
            at: std::time::SystemTime::UNIX_EPOCH,
        }
        .into();
        assert_eq!(tick.kind(), EventKind::Tick);
        assert!(tick.device().is_none());

        let detached: InputEvent = LifecycleEvent::Detached {
            device: touch_device(),
            reason: DetachReason::Hangup,
        }
        .into();
        assert_eq!(detached.kind(), EventKind::Lifecycle);
        assert_eq!(detached.device(), Some(&touch_device()));
    }

    #[test]
    fn serializes_as_tagged_json() {
        let event = InputEvent::Touch {
            device: touch_device(),
            touch: TouchEvent {
                slot: 0,
                tracking_id: 5,
                phase: TouchPhase::Begin,
                position: Position::new(100, 200),
                previous: Position::new(100, 200),
                timestamp: Timestamp(1_000_000),
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "touch");
        assert_eq!(json["device"]["id"], "/dev/input/event0");
        assert_eq!(json["device"]["class"], "touch");
        assert_eq!(json["touch"]["phase"], "begin");
        assert_eq!(json["touch"]["position"]["x"], 100);
    }
}

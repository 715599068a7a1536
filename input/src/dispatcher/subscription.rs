// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::CancellationToken;
use crate::{DeviceClassMask, EventKindMask, InputEvent};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Unique within one dispatcher. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SubscriptionId(pub u64);

impl Display for SubscriptionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { write!(f, "sub-{}", self.0) }
}

/// What happens when an event arrives at a full queue.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum OverflowPolicy {
    /// Evict the oldest queued event to make room. Counted as a drop.
    #[default]
    DropOldest,
    /// Discard the incoming event. Counted as a drop.
    DropNewest,
    /// Close the subscription with an `overflow` error.
    Disconnect,
}

/// Pure predicate over events. Events that name no device (ticks, shutdown, core
/// level errors) pass the class check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubscriptionFilter {
    pub classes: DeviceClassMask,
    pub kinds: EventKindMask,
}

impl SubscriptionFilter {
    #[must_use]
    pub fn new(classes: DeviceClassMask, kinds: EventKindMask) -> Self {
        Self { classes, kinds }
    }

    #[must_use]
    pub fn with_classes(self, classes: DeviceClassMask) -> Self { Self { classes, ..self } }

    #[must_use]
    pub fn with_kinds(self, kinds: EventKindMask) -> Self { Self { kinds, ..self } }

    /// Opt in to idle ticks.
    #[must_use]
    pub fn with_ticks(self) -> Self {
        Self {
            kinds: self.kinds | EventKindMask::TICK,
            ..self
        }
    }

    #[must_use]
    pub fn matches(&self, event: &InputEvent) -> bool {
        self.kinds.contains(event.kind().mask())
            && event
                .device()
                .is_none_or(|device| self.classes.contains(device.class.mask()))
    }
}

/// Per subscription delivery options. Unset fields take the dispatcher's defaults.
#[derive(Debug, Clone, Default)]
pub struct SubscribeOptions {
    pub capacity: Option<usize>,
    pub overflow_policy: Option<OverflowPolicy>,
    /// Cancelling it closes the subscription on the next delivery attempt.
    pub cancellation: Option<CancellationToken>,
}

impl SubscribeOptions {
    #[must_use]
    pub fn with_capacity(self, capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..self
        }
    }

    #[must_use]
    pub fn with_overflow_policy(self, overflow_policy: OverflowPolicy) -> Self {
        Self {
            overflow_policy: Some(overflow_policy),
            ..self
        }
    }

    #[must_use]
    pub fn with_cancellation(self, cancellation: CancellationToken) -> Self {
        Self {
            cancellation: Some(cancellation),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DeviceClass, DeviceRef, EventKind, KeyAction, KeyEvent, LifecycleEvent,
                Timestamp};
    use pretty_assertions::assert_eq;
    use std::{str::FromStr, time::SystemTime};

    fn key_from(class: DeviceClass) -> InputEvent {
        InputEvent::Key {
            device: DeviceRef::new("/dev/input/event4", class),
            key: KeyEvent {
                code: 30,
                action: KeyAction::Press,
                scancode: None,
                timestamp: Timestamp(0),
            },
        }
    }

    #[test]
    fn class_filter_applies_to_device_events_only() {
        let filter = SubscriptionFilter::default().with_classes(DeviceClass::Remote.mask());
        assert!(filter.matches(&key_from(DeviceClass::Remote)));
        assert!(!filter.matches(&key_from(DeviceClass::Keyboard)));
        assert!(filter.matches(&LifecycleEvent::Shutdown.into()));
    }

    #[test]
    fn ticks_are_opt_in() {
        let tick: InputEvent = LifecycleEvent::Tick {
            sequence: 1,
            at: SystemTime::UNIX_EPOCH,
        }
        .into();
        assert!(!SubscriptionFilter::default().matches(&tick));
        assert!(SubscriptionFilter::default().with_ticks().matches(&tick));

        let ticks_only = SubscriptionFilter::default().with_kinds(EventKind::Tick.mask());
        assert!(ticks_only.matches(&tick));
        assert!(!ticks_only.matches(&LifecycleEvent::Shutdown.into()));
    }

    #[test]
    fn overflow_policy_names() {
        assert_eq!(OverflowPolicy::default(), OverflowPolicy::DropOldest);
        assert_eq!(OverflowPolicy::DropNewest.to_string(), "drop-newest");
        assert_eq!(
            OverflowPolicy::from_str("disconnect").unwrap(),
            OverflowPolicy::Disconnect
        );
        assert_eq!(SubscriptionId(7).to_string(), "sub-7");
    }
}

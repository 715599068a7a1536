// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::DeviceRef;
use crate::ErrorKind;
use serde::Serialize;
use std::{fmt::{Display, Formatter},
          time::SystemTime};

/// Why a device left the registry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DetachReason {
    /// The descriptor hung up or hit end-of-file (unplugged, writer closed).
    Hangup,
    /// A per-device error; an [`LifecycleEvent::Error`] precedes this.
    Error,
    /// The node vanished during a rescan.
    Vanished,
    /// The host closed it.
    Closed,
    /// The core is shutting down.
    Shutdown,
}

/// Device and core lifecycle notifications. These are first class events: they flow
/// through the same queues as input events and obey the same filters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum LifecycleEvent {
    Attached {
        device: DeviceRef,
        name: String,
    },
    Detached {
        device: DeviceRef,
        reason: DetachReason,
    },
    Error {
        device: Option<DeviceRef>,
        kind: ErrorKind,
        message: String,
    },
    /// Emitted when a tick interval elapses with no device activity.
    Tick {
        sequence: u64,
        at: SystemTime,
    },
    /// Last event any subscription sees before its queue closes.
    Shutdown,
}

impl LifecycleEvent {
    #[must_use]
    pub fn device(&self) -> Option<&DeviceRef> {
        match self {
            Self::Attached { device, .. } | Self::Detached { device, .. } => Some(device),
            Self::Error { device, .. } => device.as_ref(),
            Self::Tick { .. } | Self::Shutdown => None,
        }
    }
}

impl Display for LifecycleEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Attached { device, name } => write!(f, "attached {device} \"{name}\""),
            Self::Detached { device, reason } => {
                write!(f, "detached {device} ({reason})")
            }
            Self::Error {
                device: Some(device),
                kind,
                message,
            } => write!(f, "error {device} {kind}: {message}"),
            Self::Error {
                device: None,
                kind,
                message,
            } => write!(f, "error {kind}: {message}"),
            Self::Tick { sequence, .. } => write!(f, "tick #{sequence}"),
            Self::Shutdown => f.write_str("shutdown"),
        }
    }
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Error taxonomy for the input core.
//!
//! | Kind                  | Scope          | Recovery                                   |
//! | :-------------------- | :------------- | :----------------------------------------- |
//! | [`NotFound`]          | enumeration    | core runs with zero devices                |
//! | [`PermissionDenied`]  | one device     | lifecycle `error`, device skipped          |
//! | [`Unsupported`]       | one device     | device skipped                             |
//! | [`Decode`]            | one device     | lifecycle `error`, device detached         |
//! | [`Overflow`]          | one subscriber | subscription closed                        |
//! | [`Cancelled`]         | whole core     | graceful shutdown                          |
//! | [`Internal`]          | whole core     | propagated out of [`Dispatcher::run()`]    |
//! | [`Io`]                | whole core     | propagated out of [`Dispatcher::run()`]    |
//!
//! [`Cancelled`]: InputCoreError::Cancelled
//! [`Decode`]: InputCoreError::Decode
//! [`Dispatcher::run()`]: crate::Dispatcher::run
//! [`Internal`]: InputCoreError::Internal
//! [`Io`]: InputCoreError::Io
//! [`NotFound`]: InputCoreError::NotFound
//! [`Overflow`]: InputCoreError::Overflow
//! [`PermissionDenied`]: InputCoreError::PermissionDenied
//! [`Unsupported`]: InputCoreError::Unsupported

use crate::{DecodeError, DeviceId, SubscriptionId};
use serde::{Deserialize, Serialize};

/// Type alias to make it easy to work with [`miette::Result`] and [`miette::Report`] in
/// application level code (the `evtap` binary, test helpers).
pub type CommonResult<T> = miette::Result<T>;

/// Wrap the given value in `Ok`. Syntactic sugar that avoids writing `Ok(())`
/// repeatedly.
#[macro_export]
macro_rules! ok {
    // No args.
    () => {
        Ok(())
    };
    // With arg.
    ($value:expr) => {
        Ok($value)
    };
}

/// Errors produced by the input core.
///
/// Each variant maps onto one [`ErrorKind`] (see [`kind()`]). Per-device and
/// per-subscription variants are recovered locally by the [`Dispatcher`]; only
/// [`Internal`] and [`Io`] escape [`Dispatcher::run()`].
///
/// [`Dispatcher::run()`]: crate::Dispatcher::run
/// [`Dispatcher`]: crate::Dispatcher
/// [`Internal`]: Self::Internal
/// [`Io`]: Self::Io
/// [`kind()`]: Self::kind
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum InputCoreError {
    #[error("No input device matches `{pattern}`")]
    #[diagnostic(
        code(sbc_input::registry::not_found),
        help("Check the device glob and that the evdev driver for the device is loaded")
    )]
    NotFound { pattern: String },

    #[error("Permission denied opening input device `{device}`")]
    #[diagnostic(
        code(sbc_input::registry::permission_denied),
        help("Run as a user in the `input` group, or add a udev rule for the device")
    )]
    PermissionDenied {
        device: DeviceId,
        #[source]
        source: std::io::Error,
    },

    #[error("Input device `{device}` does not match any known device class")]
    #[diagnostic(
        code(sbc_input::registry::unsupported),
        help("Set `open_unclassified` to pass its records through as raw events")
    )]
    Unsupported { device: DeviceId },

    #[error("Failed to decode events from input device `{device}`")]
    #[diagnostic(code(sbc_input::decoder::decode_error))]
    Decode {
        device: DeviceId,
        #[source]
        source: DecodeError,
    },

    #[error("Subscription {subscription} overflowed its queue of {capacity} events")]
    #[diagnostic(
        code(sbc_input::dispatcher::overflow),
        help("Drain the subscription faster, raise its capacity, or use drop-oldest")
    )]
    Overflow {
        subscription: SubscriptionId,
        capacity: usize,
    },

    #[error("The input core was cancelled")]
    #[diagnostic(code(sbc_input::dispatcher::cancelled))]
    Cancelled,

    #[error("Internal invariant violated: {message}")]
    #[diagnostic(
        code(sbc_input::internal),
        help("This is a bug in the input core, please report it")
    )]
    Internal { message: String },

    #[error("{context}")]
    #[diagnostic(
        code(sbc_input::io),
        help(
            "Check OS resource limits - \
             use `ulimit -n` for file descriptors, \
             `cat /proc/sys/fs/file-max` for system-wide limit"
        )
    )]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl InputCoreError {
    /// Classify this error into the flat [`ErrorKind`] taxonomy that travels inside
    /// lifecycle events.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::Unsupported { .. } => ErrorKind::Unsupported,
            Self::Decode { .. } => ErrorKind::DecodeError,
            Self::Overflow { .. } => ErrorKind::Overflow,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Internal { .. } => ErrorKind::Internal,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// Whether the error is confined to a single device or subscription. Only
    /// non-local errors propagate out of the main loop.
    #[must_use]
    pub fn is_recoverable_locally(&self) -> bool {
        !matches!(self, Self::Internal { .. } | Self::Io { .. })
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Flat, copyable error classification. Carried by [`LifecycleEvent::Error`] and
/// [`RecvError`] since [`std::io::Error`] is not [`Clone`].
///
/// [`LifecycleEvent::Error`]: crate::LifecycleEvent::Error
/// [`RecvError`]: crate::RecvError
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
    strum_macros::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    Unsupported,
    DecodeError,
    Overflow,
    Cancelled,
    Internal,
    Io,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    #[test]
    fn error_kind_uses_kebab_case_names() {
        assert_eq!(ErrorKind::PermissionDenied.to_string(), "permission-denied");
        assert_eq!(ErrorKind::from_str("decode-error").unwrap(), ErrorKind::DecodeError);
        assert_eq!(
            serde_json::to_string(&ErrorKind::NotFound).unwrap(),
            "\"not-found\""
        );
    }

    #[test]
    fn only_internal_and_io_escape_the_main_loop() {
        let device = DeviceId::from("/dev/input/event0");
        assert!(InputCoreError::Unsupported { device }.is_recoverable_locally());
        assert!(InputCoreError::Cancelled.is_recoverable_locally());
        assert!(!InputCoreError::internal("slot out of range").is_recoverable_locally());
        assert!(
            !InputCoreError::Io {
                context: "poll",
                source: std::io::Error::other("boom"),
            }
            .is_recoverable_locally()
        );
    }
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words goodix ft5406 ads7846

//! Structural configuration for the whole core. Hosts build it in code or load it
//! from JSON; the core never reads the environment.
//!
//! ```json
//! {
//!   "registry": { "device_glob": "/dev/input/event*", "grab_exclusive": true },
//!   "dispatcher": { "tick_interval_ms": 500, "default_overflow_policy": "drop-newest" }
//! }
//! ```

use crate::{DeviceClass, OverflowPolicy, RecordFormat};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

pub const DEFAULT_DEVICE_GLOB: &str = "/dev/input/event*";
pub const DEFAULT_SYSFS_ROOT: &str = "/sys/class/input";
pub const DEFAULT_MAX_TOUCH_SLOTS: u16 = 16;
pub const DEFAULT_BATCH_CAPACITY: usize = 64;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputCoreConfig {
    pub registry: RegistryConfig,
    pub poller: PollerConfig,
    pub dispatcher: DispatcherConfig,
}

impl InputCoreConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not a valid configuration document.
    pub fn from_json(json: &str) -> miette::Result<Self> {
        serde_json::from_str(json)
            .map_err(|err| miette::miette!("Invalid input core config: {err}"))
    }
}

/// Case-insensitive substring of the device name, and the class it implies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamePattern {
    pub needle: String,
    pub class: DeviceClass,
}

impl NamePattern {
    pub fn new(needle: impl Into<String>, class: DeviceClass) -> Self {
        Self {
            needle: needle.into(),
            class,
        }
    }
}

#[must_use]
pub fn default_name_patterns() -> Vec<NamePattern> {
    vec![
        NamePattern::new("ft5406", DeviceClass::Touch),
        NamePattern::new("goodix", DeviceClass::Touch),
        NamePattern::new("ads7846", DeviceClass::Touch),
        NamePattern::new("touchscreen", DeviceClass::Touch),
        NamePattern::new("gpio_ir_recv", DeviceClass::Remote),
        NamePattern::new("ir receiver", DeviceClass::Remote),
        NamePattern::new("mouse", DeviceClass::Mouse),
        NamePattern::new("keyboard", DeviceClass::Keyboard),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Directory plus a file name pattern with at most one `*`.
    pub device_glob: String,
    pub sysfs_root: PathBuf,
    /// Checked in order before the capability fingerprint.
    pub name_patterns: Vec<NamePattern>,
    /// Open `other` devices and pass their records through raw. When `false` opening
    /// one fails with `unsupported`.
    pub open_unclassified: bool,
    /// `EVIOCGRAB` each device so no other reader sees its events. Off by default:
    /// a grab also hides the device from the console and any display server on the
    /// board, and a grab that fails leaves the device open and shared anyway.
    pub grab_exclusive: bool,
    pub max_touch_slots: u16,
    pub record_format: RecordFormat,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            device_glob: DEFAULT_DEVICE_GLOB.to_string(),
            sysfs_root: PathBuf::from(DEFAULT_SYSFS_ROOT),
            name_patterns: default_name_patterns(),
            open_unclassified: false,
            grab_exclusive: false,
            max_touch_slots: DEFAULT_MAX_TOUCH_SLOTS,
            record_format: RecordFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Most readiness notifications returned by one wait.
    pub batch_capacity: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            batch_capacity: DEFAULT_BATCH_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// [`None`] disables ticks.
    pub tick_interval_ms: Option<u64>,
    pub default_queue_capacity: usize,
    pub default_overflow_policy: OverflowPolicy,
}

impl DispatcherConfig {
    #[must_use]
    pub fn tick_interval(&self) -> Option<Duration> {
        self.tick_interval_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: Some(DEFAULT_TICK_INTERVAL_MS),
            default_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            default_overflow_policy: OverflowPolicy::default(),
        }
    }
}

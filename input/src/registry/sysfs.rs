// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words sysfs

use super::{Capabilities, CapabilityBitmap};
use std::path::{Path, PathBuf};

/// `<sysfs_root>/<node>/device`, e.g. `/sys/class/input/event3/device`.
#[must_use]
pub fn sysfs_device_dir(sysfs_root: &Path, node_name: &str) -> PathBuf {
    sysfs_root.join(node_name).join("device")
}

/// Read the `name` attribute. Missing or unreadable gives an empty name.
#[must_use]
pub fn read_device_name(device_dir: &Path) -> String {
    std::fs::read_to_string(device_dir.join("name"))
        .map(|it| it.trim().to_string())
        .unwrap_or_default()
}

/// Read `capabilities/{ev,key,rel,abs,msc}`. A missing file is an empty bitmap; a
/// malformed one is logged and treated as empty.
#[must_use]
pub fn read_capabilities(device_dir: &Path, word_bits: u32) -> Capabilities {
    let caps_dir = device_dir.join("capabilities");
    let read = |file_name: &str| -> CapabilityBitmap {
        let path = caps_dir.join(file_name);
        let Ok(text) = std::fs::read_to_string(&path) else {
            return CapabilityBitmap::default();
        };
        match CapabilityBitmap::parse(&text, word_bits) {
            Ok(bitmap) => bitmap,
            Err(err) => {
                tracing::warn!(
                    message = "registry: malformed capability bitmap",
                    path = %path.display(),
                    error = %err
                );
                CapabilityBitmap::default()
            }
        }
    };
    Capabilities {
        ev: read("ev"),
        key: read("key"),
        rel: read("rel"),
        abs: read("abs"),
        msc: read("msc"),
    }
}

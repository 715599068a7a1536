// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{Capabilities, classify, read_capabilities, read_device_name, sysfs_device_dir};
use crate::{DeviceClass, DeviceId, DeviceRef, RegistryConfig};
use std::path::{Path, PathBuf};

/// What enumeration learned about a device node, before it is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub id: DeviceId,
    /// [`None`] for adopted descriptors that have no node.
    pub path: Option<PathBuf>,
    pub name: String,
    pub class: DeviceClass,
    pub capabilities: Capabilities,
}

impl DeviceDescriptor {
    /// Describe the node at `path` from its sysfs attributes.
    #[must_use]
    pub fn describe(path: &Path, config: &RegistryConfig) -> Self {
        let node_name = path
            .file_name()
            .map(|it| it.to_string_lossy().into_owned())
            .unwrap_or_default();
        let device_dir = sysfs_device_dir(&config.sysfs_root, &node_name);
        let name = read_device_name(&device_dir);
        let capabilities =
            read_capabilities(&device_dir, config.record_format.layout.long_bits());
        let class = classify(&name, &capabilities, &config.name_patterns);
        Self {
            id: DeviceId::from(path),
            path: Some(path.to_path_buf()),
            name,
            class,
            capabilities,
        }
    }

    /// Descriptor for something that is already open (replay file, pipe, uinput). The
    /// class is given, not detected.
    pub fn adopted(id: impl Into<DeviceId>, name: impl Into<String>, class: DeviceClass) -> Self {
        Self {
            id: id.into(),
            path: None,
            name: name.into(),
            class,
            capabilities: Capabilities::default(),
        }
    }

    #[must_use]
    pub fn device_ref(&self) -> DeviceRef { DeviceRef::new(self.id.clone(), self.class) }
}

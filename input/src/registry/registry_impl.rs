// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{Device, DeviceDescriptor, expand_device_glob, set_exclusive_grab};
use crate::{DeviceClass, DeviceId, InputCoreError, RegistryConfig};
use rustc_hash::{FxHashMap, FxHashSet};
use rustix::{fs::{Mode, OFlags},
             io::Errno};
use std::{os::fd::{AsFd, AsRawFd, OwnedFd, RawFd},
          path::Path};

/// Devices that appeared or vanished since the previous enumeration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RescanDiff {
    /// Nodes that were not there before. Not opened yet.
    pub appeared: Vec<DeviceDescriptor>,
    /// Open devices whose node is gone. Still open; the caller closes them.
    pub vanished: Vec<DeviceId>,
}

impl RescanDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool { self.appeared.is_empty() && self.vanished.is_empty() }
}

/// Result of [`Registry::open_all()`]. One device failing never stops the rest.
#[derive(Debug, Default)]
pub struct OpenAllReport {
    pub opened: Vec<DeviceId>,
    pub failed: Vec<InputCoreError>,
}

/// Owns every open [`Device`], keyed by id and by descriptor.
#[derive(Debug)]
pub struct Registry {
    config: RegistryConfig,
    devices: FxHashMap<DeviceId, Device>,
    by_fd: FxHashMap<RawFd, DeviceId>,
    /// Node ids seen by the last enumeration that were not closed since. Keeps nodes
    /// that failed to open or are unclassified from being reported on every rescan.
    known: FxHashSet<DeviceId>,
}

impl Registry {
    #[must_use]
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            devices: FxHashMap::default(),
            by_fd: FxHashMap::default(),
            known: FxHashSet::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &RegistryConfig { &self.config }

    /// Scan the device glob and describe every node found.
    ///
    /// # Errors
    ///
    /// - [`InputCoreError::NotFound`] if no node matches. Callers treat this as "zero
    ///   devices", not as a failure.
    /// - [`InputCoreError::Io`] if the device directory can't be read.
    pub fn enumerate(&mut self) -> Result<Vec<DeviceDescriptor>, InputCoreError> {
        let descriptors = self.scan()?;
        self.known = descriptors.iter().map(|it| it.id.clone()).collect();
        if descriptors.is_empty() {
            return Err(InputCoreError::NotFound {
                pattern: self.config.device_glob.clone(),
            });
        }
        Ok(descriptors)
    }

    fn scan(&self) -> Result<Vec<DeviceDescriptor>, InputCoreError> {
        let paths = expand_device_glob(&self.config.device_glob).map_err(|source| {
            InputCoreError::Io {
                context: "Failed to read the input device directory",
                source,
            }
        })?;
        Ok(paths
            .iter()
            .map(|path| DeviceDescriptor::describe(path, &self.config))
            .collect())
    }

    /// Open the node named by `id` (its path). Opening an open device returns it as is.
    ///
    /// # Errors
    ///
    /// - [`InputCoreError::NotFound`] if the node does not exist.
    /// - [`InputCoreError::PermissionDenied`] if it can't be opened for reading.
    /// - [`InputCoreError::Unsupported`] if it classifies as `other` and
    ///   `open_unclassified` is off.
    pub fn open(&mut self, id: &DeviceId) -> Result<&Device, InputCoreError> {
        if !self.devices.contains_key(id) {
            let path = Path::new(id.as_str());
            if !path.exists() {
                return Err(InputCoreError::NotFound {
                    pattern: id.to_string(),
                });
            }
            let descriptor = DeviceDescriptor::describe(path, &self.config);
            self.open_descriptor(descriptor)?;
        }
        self.get(id)
            .ok_or_else(|| InputCoreError::internal(format!("{id}: missing after open")))
    }

    /// Open a device from a descriptor produced by [`enumerate()`](Self::enumerate).
    ///
    /// # Errors
    ///
    /// See [`open()`](Self::open).
    pub fn open_descriptor(
        &mut self,
        descriptor: DeviceDescriptor,
    ) -> Result<&Device, InputCoreError> {
        let id = descriptor.id.clone();
        if self.devices.contains_key(&id) {
            return self
                .get(&id)
                .ok_or_else(|| InputCoreError::internal(format!("{id}: index mismatch")));
        }
        if descriptor.class == DeviceClass::Other && !self.config.open_unclassified {
            return Err(InputCoreError::Unsupported { device: id });
        }
        let path = descriptor.path.clone().unwrap_or_else(|| id.as_str().into());

        let fd = rustix::fs::open(
            &path,
            OFlags::RDONLY | OFlags::NONBLOCK | OFlags::CLOEXEC,
            Mode::empty(),
        )
        .map_err(|errno| open_error(&id, errno))?;

        let grabbed = self.config.grab_exclusive && try_grab(&id, &fd);
        tracing::info!(
            message = "registry: opened device",
            device = %id,
            name = %descriptor.name,
            class = %descriptor.class,
            grabbed
        );
        Ok(self.insert(descriptor, fd, grabbed))
    }

    /// Register an already open descriptor (replay file, pipe, `uinput` node) as a
    /// device. The descriptor is switched to non-blocking mode.
    ///
    /// # Errors
    ///
    /// - [`InputCoreError::Io`] if the descriptor's flags can't be changed.
    /// - [`InputCoreError::Internal`] if `descriptor.id` is already registered.
    pub fn adopt(
        &mut self,
        descriptor: DeviceDescriptor,
        fd: impl Into<OwnedFd>,
    ) -> Result<&Device, InputCoreError> {
        let fd: OwnedFd = fd.into();
        if self.devices.contains_key(&descriptor.id) {
            return Err(InputCoreError::internal(format!(
                "{}: already registered",
                descriptor.id
            )));
        }
        let set_nonblocking = || -> rustix::io::Result<()> {
            let flags = rustix::fs::fcntl_getfl(&fd)?;
            rustix::fs::fcntl_setfl(&fd, flags | OFlags::NONBLOCK)
        };
        set_nonblocking().map_err(|errno| InputCoreError::Io {
            context: "Failed to make an adopted descriptor non-blocking",
            source: errno.into(),
        })?;
        tracing::info!(
            message = "registry: adopted descriptor",
            device = %descriptor.id,
            class = %descriptor.class
        );
        Ok(self.insert(descriptor, fd, false))
    }

    fn insert(&mut self, descriptor: DeviceDescriptor, fd: OwnedFd, grabbed: bool) -> &Device {
        let id = descriptor.id.clone();
        let device = Device::new(
            descriptor,
            fd,
            self.config.record_format,
            self.config.max_touch_slots,
            grabbed,
        );
        self.by_fd.insert(device.raw_fd(), id.clone());
        self.devices.entry(id).or_insert(device)
    }

    /// Enumerate and open everything. `unsupported` devices are skipped quietly unless
    /// `open_unclassified` is set; other failures are collected.
    pub fn open_all(&mut self) -> OpenAllReport {
        let mut report = OpenAllReport::default();
        let descriptors = match self.enumerate() {
            Ok(descriptors) => descriptors,
            Err(err) => {
                report.failed.push(err);
                return report;
            }
        };
        for descriptor in descriptors {
            let id = descriptor.id.clone();
            match self.open_descriptor(descriptor) {
                Ok(_) => report.opened.push(id),
                Err(InputCoreError::Unsupported { device }) => {
                    tracing::debug!(
                        message = "registry: skipping unclassified device",
                        device = %device
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        message = "registry: failed to open device",
                        device = %id,
                        error = %err
                    );
                    report.failed.push(err);
                }
            }
        }
        report
    }

    /// Drop the device, closing its descriptor. Closing an unknown id does nothing.
    ///
    /// The id is forgotten too, so if its node is still (or again) present the next
    /// [`rescan()`](Self::rescan) reports it as appeared.
    pub fn close(&mut self, id: &DeviceId) -> Option<Device> {
        let device = self.devices.remove(id)?;
        self.known.remove(id);
        self.by_fd.remove(&device.raw_fd());
        tracing::info!(message = "registry: closed device", device = %id);
        Some(device)
    }

    /// Close every device.
    pub fn close_all(&mut self) -> Vec<Device> {
        for id in self.devices.keys() {
            self.known.remove(id);
        }
        self.by_fd.clear();
        self.devices.drain().map(|(_, device)| device).collect()
    }

    /// Re-enumerate and diff against the previous enumeration. Adopted devices never
    /// vanish.
    ///
    /// # Errors
    ///
    /// [`InputCoreError::Io`] if the device directory can't be read.
    pub fn rescan(&mut self) -> Result<RescanDiff, InputCoreError> {
        let descriptors = self.scan()?;
        let current: FxHashSet<DeviceId> =
            descriptors.iter().map(|it| it.id.clone()).collect();

        let appeared = descriptors
            .into_iter()
            .filter(|it| !self.known.contains(&it.id) && !self.devices.contains_key(&it.id))
            .collect();
        let mut vanished: Vec<DeviceId> = self
            .devices
            .values()
            .filter(|device| device.descriptor().path.is_some())
            .map(|device| device.id().clone())
            .filter(|id| !current.contains(id))
            .collect();
        vanished.sort_by(|lhs, rhs| lhs.as_str().cmp(rhs.as_str()));

        self.known = current;
        Ok(RescanDiff { appeared, vanished })
    }

    #[must_use]
    pub fn get(&self, id: &DeviceId) -> Option<&Device> { self.devices.get(id) }

    pub fn get_mut(&mut self, id: &DeviceId) -> Option<&mut Device> {
        self.devices.get_mut(id)
    }

    #[must_use]
    pub fn id_for_fd(&self, fd: RawFd) -> Option<&DeviceId> { self.by_fd.get(&fd) }

    pub fn devices(&self) -> impl Iterator<Item = &Device> { self.devices.values() }

    /// Ids of open devices, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<DeviceId> {
        let mut acc: Vec<DeviceId> = self.devices.keys().cloned().collect();
        acc.sort_by(|lhs, rhs| lhs.as_str().cmp(rhs.as_str()));
        acc
    }

    #[must_use]
    pub fn len(&self) -> usize { self.devices.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.devices.is_empty() }
}

/// Map an `open(2)` failure onto the error taxonomy.
#[must_use]
pub fn open_error(id: &DeviceId, errno: Errno) -> InputCoreError {
    if errno == Errno::NOENT || errno == Errno::NODEV || errno == Errno::NXIO {
        InputCoreError::NotFound {
            pattern: id.to_string(),
        }
    } else if errno == Errno::ACCESS || errno == Errno::PERM {
        InputCoreError::PermissionDenied {
            device: id.clone(),
            source: errno.into(),
        }
    } else {
        InputCoreError::Io {
            context: "Failed to open input device",
            source: errno.into(),
        }
    }
}

/// A failed grab leaves the device open and shared.
fn try_grab(id: &DeviceId, fd: &OwnedFd) -> bool {
    match set_exclusive_grab(fd.as_fd(), true) {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(
                message = "registry: exclusive grab failed, device stays shared",
                device = %id,
                fd = fd.as_raw_fd(),
                error = %err
            );
            false
        }
    }
}

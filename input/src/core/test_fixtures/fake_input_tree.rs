// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words sysfs mknodat

use super::{PipeWriter, TempDir, try_create_temp_dir};
use crate::{ABS_MT_POSITION_X, ABS_MT_POSITION_Y, ABS_MT_SLOT, ABS_MT_TRACKING_ID,
            ABS_X, ABS_Y, BTN_LEFT, BTN_RIGHT, BTN_TOUCH, EV_ABS, EV_KEY, EV_LED,
            EV_MSC, EV_REL, EV_SYN, KEY_A, KEY_ESC, KEY_SPACE, MSC_SCAN, REL_WHEEL,
            REL_X, REL_Y, RecordFormat, RegistryConfig};
use miette::IntoDiagnostic;
use rustix::fs::{CWD, FileType, Mode, OFlags};
use std::path::PathBuf;

/// Name and capability bits of a device in a [`FakeInputTree`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FakeDevice {
    pub name: String,
    pub ev: Vec<u16>,
    pub key: Vec<u16>,
    pub rel: Vec<u16>,
    pub abs: Vec<u16>,
    pub msc: Vec<u16>,
}

impl FakeDevice {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn touch_panel(name: &str) -> Self {
        Self {
            ev: vec![EV_SYN, EV_KEY, EV_ABS],
            key: vec![BTN_TOUCH],
            abs: vec![
                ABS_X,
                ABS_Y,
                ABS_MT_SLOT,
                ABS_MT_POSITION_X,
                ABS_MT_POSITION_Y,
                ABS_MT_TRACKING_ID,
            ],
            ..Self::named(name)
        }
    }

    #[must_use]
    pub fn mouse(name: &str) -> Self {
        Self {
            ev: vec![EV_SYN, EV_KEY, EV_REL],
            key: vec![BTN_LEFT, BTN_RIGHT],
            rel: vec![REL_X, REL_Y, REL_WHEEL],
            ..Self::named(name)
        }
    }

    #[must_use]
    pub fn keyboard(name: &str) -> Self {
        Self {
            ev: vec![EV_SYN, EV_KEY, EV_MSC, EV_LED],
            key: vec![KEY_ESC, KEY_A, KEY_SPACE],
            msc: vec![MSC_SCAN],
            ..Self::named(name)
        }
    }

    #[must_use]
    pub fn ir_remote(name: &str) -> Self {
        Self {
            ev: vec![EV_SYN, EV_KEY, EV_MSC],
            key: vec![KEY_ESC, KEY_SPACE],
            msc: vec![MSC_SCAN],
            ..Self::named(name)
        }
    }
}

/// Format bits the way sysfs prints a capability bitmap: `word_bits` wide hex words,
/// most significant first, leading zero words omitted.
#[must_use]
pub fn format_capability_bitmap(bits: &[u16], word_bits: u32) -> String {
    let word_count = bits
        .iter()
        .map(|bit| u32::from(*bit) / word_bits + 1)
        .max()
        .unwrap_or(1);
    let mut words = vec![0_u64; word_count as usize];
    for bit in bits {
        let bit = u32::from(*bit);
        words[(bit / word_bits) as usize] |= 1_u64 << (bit % word_bits);
    }
    words
        .iter()
        .rev()
        .map(|word| format!("{word:x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// A temp dir laid out like `/dev/input` plus `/sys/class/input`. Device nodes are
/// FIFOs, so the core can open and poll them, and tests can feed records through
/// [`open_writer()`].
///
/// [`open_writer()`]: Self::open_writer
#[derive(Debug)]
pub struct FakeInputTree {
    pub root: TempDir,
    pub dev_dir: PathBuf,
    pub sysfs_root: PathBuf,
    pub format: RecordFormat,
}

impl FakeInputTree {
    /// # Errors
    ///
    /// Returns an error if the temp dir cannot be created.
    pub fn try_new() -> miette::Result<Self> {
        let root = try_create_temp_dir()?;
        let dev_dir = root.join("dev").join("input");
        let sysfs_root = root.join("sys").join("class").join("input");
        std::fs::create_dir_all(&dev_dir).into_diagnostic()?;
        std::fs::create_dir_all(&sysfs_root).into_diagnostic()?;
        Ok(Self {
            root,
            dev_dir,
            sysfs_root,
            format: RecordFormat::default(),
        })
    }

    /// Registry config pointing at this tree.
    #[must_use]
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            device_glob: self.dev_dir.join("event*").to_string_lossy().into_owned(),
            sysfs_root: self.sysfs_root.clone(),
            record_format: self.format,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn node_path(&self, node_name: &str) -> PathBuf { self.dev_dir.join(node_name) }

    /// Create `dev/input/<node_name>` and its sysfs attributes. Returns the node path.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be written.
    pub fn add_device(
        &self,
        node_name: &str,
        device: &FakeDevice,
    ) -> miette::Result<PathBuf> {
        let node_path = self.node_path(node_name);
        rustix::fs::mknodat(
            CWD,
            &node_path,
            FileType::Fifo,
            Mode::from_raw_mode(0o600),
            0,
        )
        .into_diagnostic()?;

        let device_dir = self.sysfs_root.join(node_name).join("device");
        let caps_dir = device_dir.join("capabilities");
        std::fs::create_dir_all(&caps_dir).into_diagnostic()?;
        std::fs::write(device_dir.join("name"), format!("{}\n", device.name))
            .into_diagnostic()?;

        let word_bits = self.format.layout.long_bits();
        for (file_name, bits) in [
            ("ev", &device.ev),
            ("key", &device.key),
            ("rel", &device.rel),
            ("abs", &device.abs),
            ("msc", &device.msc),
        ] {
            let text = format!("{}\n", format_capability_bitmap(bits, word_bits));
            std::fs::write(caps_dir.join(file_name), text).into_diagnostic()?;
        }
        Ok(node_path)
    }

    /// Remove a node, as if the device was unplugged.
    ///
    /// # Errors
    ///
    /// Returns an error if the node cannot be removed.
    pub fn remove_device(&self, node_name: &str) -> miette::Result<()> {
        std::fs::remove_file(self.node_path(node_name)).into_diagnostic()?;
        std::fs::remove_dir_all(self.sysfs_root.join(node_name)).into_diagnostic()
    }

    /// Open the write side of a node's FIFO. Only succeeds once the core has opened
    /// the read side.
    ///
    /// # Errors
    ///
    /// Returns the OS error, `ENXIO` if nobody has the node open for reading.
    pub fn open_writer(&self, node_name: &str) -> std::io::Result<PipeWriter> {
        let fd = rustix::fs::open(
            self.node_path(node_name),
            OFlags::WRONLY | OFlags::NONBLOCK | OFlags::CLOEXEC,
            Mode::empty(),
        )?;
        // Blocking writes from here on.
        rustix::fs::fcntl_setfl(&fd, OFlags::empty())?;
        Ok(PipeWriter::from_fd(fd, self.format))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bitmap_words_are_most_significant_first() {
        assert_eq!(format_capability_bitmap(&[], 32), "0");
        assert_eq!(format_capability_bitmap(&[0, 1, 3], 32), "b");
        assert_eq!(format_capability_bitmap(&[BTN_TOUCH], 64), "400 0 0 0 0 0");
        assert_eq!(format_capability_bitmap(&[0, 33], 32), "2 1");
    }

    #[test]
    fn add_device_writes_name_and_capabilities() {
        let tree = FakeInputTree::try_new().unwrap();
        let node = tree.add_device("event0", &FakeDevice::mouse("USB Optical")).unwrap();
        assert!(node.exists());
        let name =
            std::fs::read_to_string(tree.sysfs_root.join("event0/device/name")).unwrap();
        assert_eq!(name, "USB Optical\n");
        let rel = std::fs::read_to_string(
            tree.sysfs_root.join("event0/device/capabilities/rel"),
        )
        .unwrap();
        assert_eq!(rel, "103\n");
    }
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words timeval

use super::RawRecord;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Size of the `timeval` the kernel writes at the head of each record. It follows the
/// width of the kernel's `long`, so it also decides how wide the words in the sysfs
/// capability bitmaps are.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RecordLayout {
    /// 32 bit kernels: 4 byte seconds, 4 byte microseconds, 16 byte records.
    #[default]
    Timeval32,
    /// 64 bit kernels: 8 byte seconds, 8 byte microseconds, 24 byte records.
    Timeval64,
}

impl RecordLayout {
    #[must_use]
    pub const fn record_size(self) -> usize {
        match self {
            Self::Timeval32 => 16,
            Self::Timeval64 => 24,
        }
    }

    #[must_use]
    pub const fn timeval_field_size(self) -> usize {
        match self {
            Self::Timeval32 => 4,
            Self::Timeval64 => 8,
        }
    }

    /// Bits per word in `/sys/class/input/*/device/capabilities/*`.
    #[must_use]
    pub const fn long_bits(self) -> u32 {
        match self {
            Self::Timeval32 => 32,
            Self::Timeval64 => 64,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

/// Largest record any [`RecordLayout`] produces.
pub const MAX_RECORD_SIZE: usize = 24;

/// Encoded bytes of one record.
pub type RecordBytes = SmallVec<[u8; MAX_RECORD_SIZE]>;

/// How records are laid out on the wire: field widths and byte order.
///
/// ```text
/// timeval32  0        4        8     10     12        16
///            ┌────────┬────────┬──────┬──────┬─────────┐
///            │ sec    │ usec   │ type │ code │ value   │
///            └────────┴────────┴──────┴──────┴─────────┘
/// timeval64  0                 8                 16     18     20        24
///            ┌─────────────────┬─────────────────┬──────┬──────┬─────────┐
///            │ sec             │ usec            │ type │ code │ value   │
///            └─────────────────┴─────────────────┴──────┴──────┴─────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordFormat {
    pub layout: RecordLayout,
    pub byte_order: ByteOrder,
}

impl RecordFormat {
    #[must_use]
    pub const fn new(layout: RecordLayout, byte_order: ByteOrder) -> Self {
        Self { layout, byte_order }
    }

    #[must_use]
    pub const fn record_size(&self) -> usize { self.layout.record_size() }

    /// Decode exactly one record. Returns [`None`] if `bytes` is not exactly
    /// [`record_size()`] long.
    ///
    /// [`record_size()`]: Self::record_size
    #[must_use]
    pub fn decode(&self, bytes: &[u8]) -> Option<RawRecord> {
        if bytes.len() != self.record_size() {
            return None;
        }
        let tv = self.layout.timeval_field_size();
        let (seconds, microseconds) = match self.layout {
            RecordLayout::Timeval32 => (
                u64::from(self.read_u32(bytes, 0)),
                self.read_u32(bytes, tv),
            ),
            RecordLayout::Timeval64 => {
                let seconds = self.read_u64(bytes, 0);
                let microseconds = self.read_u64(bytes, tv);
                (
                    seconds,
                    u32::try_from(microseconds).unwrap_or(u32::MAX),
                )
            }
        };
        let base = 2 * tv;
        Some(RawRecord {
            seconds,
            microseconds,
            kind: self.read_u16(bytes, base),
            code: self.read_u16(bytes, base + 2),
            value: self.read_u32(bytes, base + 4).cast_signed(),
        })
    }

    /// Encode one record in this format. Used to synthesize device streams.
    #[must_use]
    pub fn encode(&self, record: &RawRecord) -> RecordBytes {
        let mut acc = RecordBytes::new();
        match self.layout {
            RecordLayout::Timeval32 => {
                #[allow(clippy::cast_possible_truncation)]
                let seconds = record.seconds as u32;
                self.push_u32(&mut acc, seconds);
                self.push_u32(&mut acc, record.microseconds);
            }
            RecordLayout::Timeval64 => {
                self.push_u64(&mut acc, record.seconds);
                self.push_u64(&mut acc, u64::from(record.microseconds));
            }
        }
        self.push_u16(&mut acc, record.kind);
        self.push_u16(&mut acc, record.code);
        self.push_u32(&mut acc, record.value.cast_unsigned());
        acc
    }

    fn read_u16(&self, bytes: &[u8], offset: usize) -> u16 {
        let mut buf = [0_u8; 2];
        buf.copy_from_slice(&bytes[offset..offset + 2]);
        match self.byte_order {
            ByteOrder::Little => u16::from_le_bytes(buf),
            ByteOrder::Big => u16::from_be_bytes(buf),
        }
    }

    fn read_u32(&self, bytes: &[u8], offset: usize) -> u32 {
        let mut buf = [0_u8; 4];
        buf.copy_from_slice(&bytes[offset..offset + 4]);
        match self.byte_order {
            ByteOrder::Little => u32::from_le_bytes(buf),
            ByteOrder::Big => u32::from_be_bytes(buf),
        }
    }

    fn read_u64(&self, bytes: &[u8], offset: usize) -> u64 {
        let mut buf = [0_u8; 8];
        buf.copy_from_slice(&bytes[offset..offset + 8]);
        match self.byte_order {
            ByteOrder::Little => u64::from_le_bytes(buf),
            ByteOrder::Big => u64::from_be_bytes(buf),
        }
    }

    fn push_u16(&self, acc: &mut RecordBytes, it: u16) {
        match self.byte_order {
            ByteOrder::Little => acc.extend_from_slice(&it.to_le_bytes()),
            ByteOrder::Big => acc.extend_from_slice(&it.to_be_bytes()),
        }
    }

    fn push_u32(&self, acc: &mut RecordBytes, it: u32) {
        match self.byte_order {
            ByteOrder::Little => acc.extend_from_slice(&it.to_le_bytes()),
            ByteOrder::Big => acc.extend_from_slice(&it.to_be_bytes()),
        }
    }

    fn push_u64(&self, acc: &mut RecordBytes, it: u64) {
        match self.byte_order {
            ByteOrder::Little => acc.extend_from_slice(&it.to_le_bytes()),
            ByteOrder::Big => acc.extend_from_slice(&it.to_be_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ABS_MT_TRACKING_ID, EV_ABS};
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_little_endian_timeval32_record() {
        // 1_700_000_000 s, 250_000 us, EV_ABS, ABS_MT_TRACKING_ID, -1.
        let bytes: [u8; 16] = [
            0x00, 0xf1, 0x53, 0x65, // seconds
            0x90, 0xd0, 0x03, 0x00, // microseconds
            0x03, 0x00, // type
            0x39, 0x00, // code
            0xff, 0xff, 0xff, 0xff, // value
        ];
        let record = RecordFormat::default().decode(&bytes).unwrap();
        assert_eq!(
            record,
            RawRecord::new(1_700_000_000, 250_000, EV_ABS, ABS_MT_TRACKING_ID, -1)
        );
    }

    #[test]
    fn rejects_wrong_length() {
        let format = RecordFormat::default();
        assert!(format.decode(&[0_u8; 15]).is_none());
        assert!(format.decode(&[0_u8; 24]).is_none());
    }

    #[test]
    fn big_endian_timeval64_layout_is_24_bytes() {
        let format = RecordFormat::new(RecordLayout::Timeval64, ByteOrder::Big);
        let record = RawRecord::new(42, 7, EV_ABS, ABS_MT_TRACKING_ID, 12);
        let bytes = format.encode(&record);
        assert_eq!(bytes.len(), 24);
        assert_eq!(&bytes[16..18], &[0x00, 0x03]);
        assert_eq!(&bytes[20..24], &[0x00, 0x00, 0x00, 0x0c]);
        assert_eq!(format.decode(&bytes), Some(record));
    }

    #[test]
    fn layout_names_are_kebab_case() {
        assert_eq!(RecordLayout::Timeval64.to_string(), "timeval64");
        assert_eq!(
            "timeval32".parse::<RecordLayout>().unwrap(),
            RecordLayout::Timeval32
        );
    }
}

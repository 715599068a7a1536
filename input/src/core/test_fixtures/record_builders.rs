// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{ABS_MT_POSITION_X, ABS_MT_POSITION_Y, ABS_MT_SLOT, ABS_MT_TRACKING_ID,
            BTN_LEFT, EV_ABS, EV_KEY, EV_MSC, EV_REL, EV_SYN, KEY_VALUE_PRESS,
            KEY_VALUE_RELEASE, REL_X, REL_Y, RawRecord, RecordFormat, SYN_DROPPED,
            SYN_REPORT};

/// Encode `records` back to back, the way the kernel hands them to `read(2)`.
#[must_use]
pub fn encode_records(format: RecordFormat, records: &[RawRecord]) -> Vec<u8> {
    let mut acc = Vec::with_capacity(records.len() * format.record_size());
    for record in records {
        acc.extend_from_slice(&format.encode(record));
    }
    acc
}

/// Builds a timestamped record stream one record at a time. Every record shares the
/// current time; [`syn()`] closes the frame and advances the clock by `frame_micros`.
///
/// ```
/// use sbc_input::{ABS_MT_POSITION_X, RecordScript};
/// let records = RecordScript::new(10_000)
///     .abs(ABS_MT_POSITION_X, 100)
///     .syn()
///     .build();
/// assert_eq!(records.len(), 2);
/// ```
///
/// [`syn()`]: Self::syn
#[derive(Debug, Clone, Default)]
pub struct RecordScript {
    now_micros: u64,
    frame_micros: u64,
    records: Vec<RawRecord>,
}

impl RecordScript {
    #[must_use]
    pub fn new(frame_micros: u64) -> Self {
        Self {
            now_micros: 0,
            frame_micros,
            records: vec![],
        }
    }

    #[must_use]
    pub fn starting_at(mut self, seconds: u64, microseconds: u32) -> Self {
        self.now_micros = seconds * 1_000_000 + u64::from(microseconds);
        self
    }

    #[must_use]
    pub fn record(mut self, kind: u16, code: u16, value: i32) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let microseconds = (self.now_micros % 1_000_000) as u32;
        self.records.push(RawRecord::new(
            self.now_micros / 1_000_000,
            microseconds,
            kind,
            code,
            value,
        ));
        self
    }

    #[must_use]
    pub fn abs(self, code: u16, value: i32) -> Self { self.record(EV_ABS, code, value) }

    #[must_use]
    pub fn rel(self, code: u16, value: i32) -> Self { self.record(EV_REL, code, value) }

    #[must_use]
    pub fn key(self, code: u16, value: i32) -> Self { self.record(EV_KEY, code, value) }

    #[must_use]
    pub fn msc(self, code: u16, value: i32) -> Self { self.record(EV_MSC, code, value) }

    /// One multitouch slot update: slot select, optional tracking id, position.
    #[must_use]
    pub fn contact(self, slot: i32, tracking_id: Option<i32>, x: i32, y: i32) -> Self {
        let acc = self.abs(ABS_MT_SLOT, slot);
        let acc = match tracking_id {
            Some(id) => acc.abs(ABS_MT_TRACKING_ID, id),
            None => acc,
        };
        acc.abs(ABS_MT_POSITION_X, x).abs(ABS_MT_POSITION_Y, y)
    }

    /// Lift the contact in `slot`.
    #[must_use]
    pub fn lift(self, slot: i32) -> Self {
        self.abs(ABS_MT_SLOT, slot).abs(ABS_MT_TRACKING_ID, -1)
    }

    /// `SYN_REPORT`, then advance the clock.
    #[must_use]
    pub fn syn(self) -> Self {
        let mut acc = self.record(EV_SYN, SYN_REPORT, 0);
        acc.now_micros += acc.frame_micros;
        acc
    }

    #[must_use]
    pub fn syn_dropped(self) -> Self { self.record(EV_SYN, SYN_DROPPED, 0) }

    #[must_use]
    pub fn build(self) -> Vec<RawRecord> { self.records }
}

/// One finger down at (100, 200) with tracking id 123, lifted 10 ms later.
#[must_use]
pub fn single_touch_tap_records() -> Vec<RawRecord> {
    RecordScript::new(10_000)
        .contact(0, Some(123), 100, 200)
        .syn()
        .abs(ABS_MT_TRACKING_ID, -1)
        .syn()
        .build()
}

/// Two fingers land, then each moves once: slot 0 (100,200) to (110,210), slot 1
/// (300,400) to (305,405) over two frames.
#[must_use]
pub fn two_finger_drag_records() -> Vec<RawRecord> {
    RecordScript::new(8_000)
        .contact(0, Some(7), 100, 200)
        .contact(1, Some(8), 300, 400)
        .syn()
        .contact(0, None, 105, 205)
        .contact(1, None, 302, 402)
        .syn()
        .contact(0, None, 110, 210)
        .contact(1, None, 305, 405)
        .syn()
        .lift(0)
        .lift(1)
        .syn()
        .build()
}

/// Motion (1, -1), then `BTN_LEFT` pressed and released, all in one frame.
#[must_use]
pub fn mouse_click_records() -> Vec<RawRecord> {
    RecordScript::new(1_000)
        .rel(REL_X, 1)
        .rel(REL_Y, -1)
        .key(BTN_LEFT, KEY_VALUE_PRESS)
        .key(BTN_LEFT, KEY_VALUE_RELEASE)
        .syn()
        .build()
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::Disposition;
use crate::{EV_KEY, EV_MSC, KeyAction, KeyEvent, MSC_SCAN, RawRecord};

/// Keyboards and remote receivers. Every `EV_KEY` record becomes a [`KeyEvent`] right
/// away. An `MSC_SCAN` earlier in the same frame is attached as the scancode, which is
/// how IR receivers report the raw button code.
#[derive(Debug, Default)]
pub struct KeyDecoder {
    frame_scancode: Option<u32>,
}

impl KeyDecoder {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    pub fn apply(&mut self, record: &RawRecord, out: &mut Vec<KeyEvent>) -> Disposition {
        match (record.kind, record.code) {
            (EV_MSC, MSC_SCAN) => {
                self.frame_scancode = Some(record.value.cast_unsigned());
                Disposition::Applied
            }
            (EV_KEY, code) => match KeyAction::from_value(record.value) {
                Some(action) => {
                    out.push(KeyEvent {
                        code,
                        action,
                        scancode: self.frame_scancode,
                        timestamp: record.timestamp(),
                    });
                    Disposition::Applied
                }
                None => Disposition::Unrecognized,
            },
            _ => Disposition::Unrecognized,
        }
    }

    /// End of frame: the scancode doesn't carry over.
    pub fn flush(&mut self) { self.frame_scancode = None; }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{KEY_A, Timestamp};
    use pretty_assertions::assert_eq;

    #[test]
    fn emits_each_key_record_immediately() {
        let mut decoder = KeyDecoder::new();
        let mut out = vec![];
        decoder.apply(&RawRecord::new(3, 5, EV_KEY, KEY_A, 1), &mut out);
        assert_eq!(out.len(), 1);
        decoder.apply(&RawRecord::new(3, 9, EV_KEY, KEY_A, 2), &mut out);
        decoder.apply(&RawRecord::new(3, 12, EV_KEY, KEY_A, 0), &mut out);
        let actions: Vec<_> = out.iter().map(|it| it.action).collect();
        assert_eq!(
            actions,
            vec![KeyAction::Press, KeyAction::Repeat, KeyAction::Release]
        );
        assert_eq!(out[0].timestamp, Timestamp(3_000_005));
        assert_eq!(out[0].scancode, None);
    }

    #[test]
    fn attaches_frame_scancode() {
        let mut decoder = KeyDecoder::new();
        let mut out = vec![];
        decoder.apply(&RawRecord::new(0, 0, EV_MSC, MSC_SCAN, 0x40), &mut out);
        decoder.apply(&RawRecord::new(0, 0, EV_KEY, KEY_A, 1), &mut out);
        decoder.flush();
        decoder.apply(&RawRecord::new(0, 1, EV_KEY, KEY_A, 0), &mut out);
        assert_eq!(out[0].scancode, Some(0x40));
        assert_eq!(out[1].scancode, None);
    }

    #[test]
    fn odd_key_value_is_unrecognized() {
        let mut decoder = KeyDecoder::new();
        let mut out = vec![];
        let disposition = decoder.apply(&RawRecord::new(0, 0, EV_KEY, KEY_A, 7), &mut out);
        assert_eq!(disposition, Disposition::Unrecognized);
        assert!(out.is_empty());
    }
}

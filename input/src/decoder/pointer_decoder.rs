// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words hwheel

use super::Disposition;
use crate::{ABS_X, ABS_Y, ButtonMask, EV_ABS, EV_KEY, EV_REL, KEY_VALUE_PRESS,
            KEY_VALUE_RELEASE, PointerEvent, Position, REL_HWHEEL, REL_HWHEEL_HI_RES,
            REL_WHEEL, REL_WHEEL_HI_RES, REL_X, REL_Y, RawRecord, Timestamp};
use smallvec::SmallVec;

/// Accumulated changes for one pointer event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PendingPointer {
    dx: i32,
    dy: i32,
    wheel: i32,
    hwheel: i32,
    abs_x: Option<i32>,
    abs_y: Option<i32>,
    pressed: ButtonMask,
    released: ButtonMask,
}

impl PendingPointer {
    fn touches(&self, bit: ButtonMask) -> bool { self.pressed.union(self.released).contains(bit) }

    fn apply_buttons(&self, buttons: ButtonMask) -> ButtonMask {
        buttons.union(self.pressed).difference(self.released)
    }
}

/// Mouse state machine. Relative motion, wheel and button changes accumulate until
/// `SYN_REPORT`, which emits one [`PointerEvent`]. If the same button changes twice in
/// one frame (a click inside one frame), the frame is split so that the press and the
/// release are separate events. Frames with nothing to report are dropped.
#[derive(Debug, Default)]
pub struct PointerDecoder {
    position: Position,
    buttons: ButtonMask,
    /// Earlier parts of a split frame.
    split: SmallVec<[PendingPointer; 2]>,
    pending: PendingPointer,
}

impl PointerDecoder {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    #[must_use]
    pub fn buttons(&self) -> ButtonMask { self.buttons }

    #[must_use]
    pub fn position(&self) -> Position { self.position }

    pub fn apply(&mut self, record: &RawRecord) -> Disposition {
        let value = record.value;
        let pending = &mut self.pending;
        match (record.kind, record.code) {
            (EV_REL, REL_X) => pending.dx = pending.dx.saturating_add(value),
            (EV_REL, REL_Y) => pending.dy = pending.dy.saturating_add(value),
            (EV_REL, REL_WHEEL) => pending.wheel = pending.wheel.saturating_add(value),
            (EV_REL, REL_HWHEEL) => pending.hwheel = pending.hwheel.saturating_add(value),
            // The kernel sends the low resolution codes alongside these.
            (EV_REL, REL_WHEEL_HI_RES | REL_HWHEEL_HI_RES) => {}
            (EV_ABS, ABS_X) => pending.abs_x = Some(value),
            (EV_ABS, ABS_Y) => pending.abs_y = Some(value),
            (EV_KEY, code) => match ButtonMask::from_key_code(code) {
                Some(bit) => self.apply_button(bit, value),
                None => return Disposition::Unrecognized,
            },
            _ => return Disposition::Unrecognized,
        }
        Disposition::Applied
    }

    fn apply_button(&mut self, bit: ButtonMask, value: i32) {
        let held = self.effective_buttons().contains(bit);
        let is_change = match value {
            KEY_VALUE_PRESS => !held,
            KEY_VALUE_RELEASE => held,
            _ => false,
        };
        if !is_change {
            return;
        }
        if self.pending.touches(bit) {
            self.split.push(std::mem::take(&mut self.pending));
        }
        if value == KEY_VALUE_PRESS {
            self.pending.pressed.insert(bit);
        } else {
            self.pending.released.insert(bit);
        }
    }

    /// Buttons held if the frame so far were applied.
    fn effective_buttons(&self) -> ButtonMask {
        self.split
            .iter()
            .chain(std::iter::once(&self.pending))
            .fold(self.buttons, |acc, part| part.apply_buttons(acc))
    }

    /// Emit the frame (one event, or two or more if split) stamped with `timestamp`.
    pub fn flush(&mut self, timestamp: Timestamp, out: &mut Vec<PointerEvent>) {
        let pending = std::mem::take(&mut self.pending);
        let parts = std::mem::take(&mut self.split);
        for part in parts.iter().chain(std::iter::once(&pending)) {
            self.buttons = part.apply_buttons(self.buttons);
            self.position.x = part
                .abs_x
                .unwrap_or_else(|| self.position.x.saturating_add(part.dx));
            self.position.y = part
                .abs_y
                .unwrap_or_else(|| self.position.y.saturating_add(part.dy));
            let event = PointerEvent {
                dx: part.dx,
                dy: part.dy,
                wheel: part.wheel,
                hwheel: part.hwheel,
                absolute: (part.abs_x.is_some() || part.abs_y.is_some())
                    .then_some(self.position),
                position: self.position,
                buttons: self.buttons,
                pressed: part.pressed,
                released: part.released,
                timestamp,
            };
            if !event.is_noop() {
                out.push(event);
            }
        }
    }

    /// Throw away everything since the last flush (after `SYN_DROPPED`).
    pub fn discard_frame(&mut self) {
        self.split.clear();
        self.pending = PendingPointer::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BTN_LEFT, BTN_RIGHT};
    use pretty_assertions::assert_eq;

    fn rel(code: u16, value: i32) -> RawRecord { RawRecord::new(0, 0, EV_REL, code, value) }

    fn key(code: u16, value: i32) -> RawRecord { RawRecord::new(0, 0, EV_KEY, code, value) }

    fn run_frame(decoder: &mut PointerDecoder, records: &[RawRecord]) -> Vec<PointerEvent> {
        for record in records {
            decoder.apply(record);
        }
        let mut out = vec![];
        decoder.flush(Timestamp(42), &mut out);
        out
    }

    #[test]
    fn accumulates_motion_into_one_event() {
        let mut decoder = PointerDecoder::new();
        let events = run_frame(
            &mut decoder,
            &[rel(REL_X, 3), rel(REL_Y, -2), rel(REL_X, 4), rel(REL_WHEEL, 1)],
        );
        assert_eq!(events.len(), 1);
        assert_eq!((events[0].dx, events[0].dy, events[0].wheel), (7, -2, 1));
        assert_eq!(events[0].position, Position::new(7, -2));
        assert_eq!(events[0].timestamp, Timestamp(42));
    }

    #[test]
    fn click_within_one_frame_splits_into_down_then_up() {
        let mut decoder = PointerDecoder::new();
        let events = run_frame(&mut decoder, &[key(BTN_LEFT, 1), key(BTN_LEFT, 0)]);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].pressed, ButtonMask::LEFT);
        assert_eq!(events[0].buttons, ButtonMask::LEFT);
        assert_eq!(events[1].released, ButtonMask::LEFT);
        assert_eq!(events[1].buttons, ButtonMask::empty());
        assert!(events.iter().all(|it| it.timestamp == Timestamp(42)));
    }

    #[test]
    fn different_buttons_share_one_event() {
        let mut decoder = PointerDecoder::new();
        let events = run_frame(&mut decoder, &[key(BTN_LEFT, 1), key(BTN_RIGHT, 1)]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].pressed, ButtonMask::LEFT | ButtonMask::RIGHT);
    }

    #[test]
    fn empty_and_redundant_frames_are_suppressed() {
        let mut decoder = PointerDecoder::new();
        assert!(run_frame(&mut decoder, &[rel(REL_X, 0)]).is_empty());
        run_frame(&mut decoder, &[key(BTN_LEFT, 1)]);
        // Already held.
        assert!(run_frame(&mut decoder, &[key(BTN_LEFT, 1)]).is_empty());
        assert_eq!(decoder.buttons(), ButtonMask::LEFT);
    }

    #[test]
    fn absolute_axes_set_position() {
        let mut decoder = PointerDecoder::new();
        let events = run_frame(
            &mut decoder,
            &[
                RawRecord::new(0, 0, EV_ABS, ABS_X, 640),
                RawRecord::new(0, 0, EV_ABS, ABS_Y, 480),
            ],
        );
        assert_eq!(events[0].absolute, Some(Position::new(640, 480)));
        assert_eq!(decoder.position(), Position::new(640, 480));
    }

    #[test]
    fn discard_frame_forgets_partial_changes() {
        let mut decoder = PointerDecoder::new();
        decoder.apply(&rel(REL_X, 10));
        decoder.apply(&key(BTN_LEFT, 1));
        decoder.discard_frame();
        assert!(run_frame(&mut decoder, &[]).is_empty());
        assert_eq!(decoder.buttons(), ButtonMask::empty());
    }
}

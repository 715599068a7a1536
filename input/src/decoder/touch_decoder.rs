// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words multitouch

use super::{DecodeError, DecoderFault, Disposition};
use crate::{ABS_MT_POSITION_X, ABS_MT_POSITION_Y, ABS_MT_SLOT, ABS_MT_TRACKING_ID, ABS_X,
            ABS_Y, BTN_TOUCH, EV_ABS, EV_KEY, KEY_VALUE_PRESS, KEY_VALUE_RELEASE,
            Position, RawRecord, Timestamp, TouchEvent, TouchPhase};
use smallvec::SmallVec;

/// A contact starting or stopping inside the current frame. A slot can see both in one
/// frame (released and re-pressed), so they are kept in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotTransition {
    Ended { tracking_id: i32, position: Position },
    Began { tracking_id: i32 },
}

#[derive(Debug, Clone, Default)]
struct Slot {
    /// Tracking id of the contact in this slot, if any.
    active: Option<i32>,
    position: Position,
    /// Position at the last emitted event; becomes `previous` of the next one.
    reported: Position,
    /// State as of the last flushed frame, restored when a frame is dropped.
    committed_active: Option<i32>,
    committed_position: Position,
    transitions: SmallVec<[SlotTransition; 2]>,
    moved: bool,
    synthetic: bool,
}

/// Multi-touch (type B, slotted) state machine with a single-touch fallback for
/// devices that only report `ABS_X` / `ABS_Y` / `BTN_TOUCH`.
///
/// Per frame:
/// - `ABS_MT_SLOT` selects the slot the following records apply to.
/// - `ABS_MT_TRACKING_ID >= 0` starts a contact in that slot, `< 0` ends it.
/// - `ABS_MT_POSITION_X/Y` move the contact in that slot.
/// - `ABS_X/Y` move slot 0, unless the device has sent any `ABS_MT_*` record (then
///   they are the kernel's pointer emulation and are ignored).
/// - `BTN_TOUCH` press with no active slot starts a synthetic contact in slot 0; the
///   matching release ends it.
///
/// `SYN_REPORT` flushes the frame in ascending slot order: a slot emits `End` and
/// `Begin` for each transition in arrival order, or `Move` if its contact moved.
#[derive(Debug)]
pub struct TouchDecoder {
    slots: Vec<Slot>,
    current_slot: usize,
    uses_multitouch: bool,
    next_synthetic_id: i32,
}

impl TouchDecoder {
    #[must_use]
    pub fn new(max_slots: u16) -> Self {
        Self {
            slots: vec![Slot::default(); usize::from(max_slots.max(1))],
            current_slot: 0,
            uses_multitouch: false,
            next_synthetic_id: 1,
        }
    }

    /// Tracking ids of the active contacts, by slot.
    #[must_use]
    pub fn active_contacts(&self) -> Vec<(u16, i32)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.active
                    .and_then(|id| u16::try_from(index).ok().map(|index| (index, id)))
            })
            .collect()
    }

    /// # Errors
    ///
    /// Returns [`DecodeError::SlotOutOfRange`] for a slot number outside the table.
    pub fn apply(&mut self, record: &RawRecord) -> Result<Disposition, DecoderFault> {
        match (record.kind, record.code) {
            (EV_ABS, ABS_MT_SLOT) => {
                self.uses_multitouch = true;
                self.current_slot = self.slot_index(record.value)?;
            }
            (EV_ABS, ABS_MT_TRACKING_ID) => {
                self.uses_multitouch = true;
                let slot = &mut self.slots[self.current_slot];
                if record.value >= 0 {
                    begin_contact(slot, record.value);
                } else {
                    end_contact(slot);
                }
            }
            (EV_ABS, ABS_MT_POSITION_X) => {
                self.uses_multitouch = true;
                move_contact(&mut self.slots[self.current_slot], Some(record.value), None);
            }
            (EV_ABS, ABS_MT_POSITION_Y) => {
                self.uses_multitouch = true;
                move_contact(&mut self.slots[self.current_slot], None, Some(record.value));
            }
            (EV_ABS, ABS_X) => {
                if !self.uses_multitouch {
                    move_contact(&mut self.slots[0], Some(record.value), None);
                }
            }
            (EV_ABS, ABS_Y) => {
                if !self.uses_multitouch {
                    move_contact(&mut self.slots[0], None, Some(record.value));
                }
            }
            (EV_KEY, BTN_TOUCH) => self.apply_btn_touch(record.value),
            _ => return Ok(Disposition::Unrecognized),
        }
        Ok(Disposition::Applied)
    }

    fn apply_btn_touch(&mut self, value: i32) {
        match value {
            KEY_VALUE_PRESS if self.slots.iter().all(|slot| slot.active.is_none()) => {
                let tracking_id = self.next_synthetic_id;
                self.next_synthetic_id = self.next_synthetic_id.wrapping_add(1).max(1);
                let slot = &mut self.slots[0];
                begin_contact(slot, tracking_id);
                slot.synthetic = true;
            }
            KEY_VALUE_RELEASE => {
                let slot = &mut self.slots[0];
                if slot.synthetic {
                    end_contact(slot);
                    slot.synthetic = false;
                }
            }
            _ => {}
        }
    }

    fn slot_index(&self, value: i32) -> Result<usize, DecodeError> {
        usize::try_from(value)
            .ok()
            .filter(|index| *index < self.slots.len())
            .ok_or(DecodeError::SlotOutOfRange {
                slot: value,
                max_slots: u16::try_from(self.slots.len()).unwrap_or(u16::MAX),
            })
    }

    /// Emit the frame's events in ascending slot order and commit the frame.
    ///
    /// # Errors
    ///
    /// Returns [`DecoderFault::Invariant`] if a slot's transitions don't alternate
    /// between ending and beginning a contact.
    pub fn flush(
        &mut self,
        timestamp: Timestamp,
        out: &mut Vec<TouchEvent>,
    ) -> Result<(), DecoderFault> {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let slot_number = u16::try_from(index).map_err(|_| {
                DecoderFault::Invariant(format!("slot index {index} does not fit in u16"))
            })?;
            verify_alternating(slot_number, &slot.transitions)?;

            let transitions = std::mem::take(&mut slot.transitions);
            for transition in &transitions {
                match *transition {
                    SlotTransition::Ended {
                        tracking_id,
                        position,
                    } => {
                        out.push(TouchEvent {
                            slot: slot_number,
                            tracking_id,
                            phase: TouchPhase::End,
                            position,
                            previous: slot.reported,
                            timestamp,
                        });
                        slot.reported = position;
                    }
                    SlotTransition::Began { tracking_id } => {
                        out.push(TouchEvent {
                            slot: slot_number,
                            tracking_id,
                            phase: TouchPhase::Begin,
                            position: slot.position,
                            previous: slot.position,
                            timestamp,
                        });
                        slot.reported = slot.position;
                    }
                }
            }

            match slot.active {
                Some(tracking_id) if transitions.is_empty() && slot.moved => {
                    out.push(TouchEvent {
                        slot: slot_number,
                        tracking_id,
                        phase: TouchPhase::Move,
                        position: slot.position,
                        previous: slot.reported,
                        timestamp,
                    });
                    slot.reported = slot.position;
                }
                _ => {}
            }

            slot.moved = false;
            slot.committed_active = slot.active;
            slot.committed_position = slot.position;
        }
        Ok(())
    }

    /// Throw away everything since the last flush (after `SYN_DROPPED`).
    pub fn discard_frame(&mut self) {
        for slot in &mut self.slots {
            slot.transitions.clear();
            slot.moved = false;
            slot.active = slot.committed_active;
            slot.position = slot.committed_position;
            if slot.active.is_none() {
                slot.synthetic = false;
            }
        }
    }
}

fn begin_contact(slot: &mut Slot, tracking_id: i32) {
    match slot.active {
        Some(current) if current == tracking_id => return,
        // A new id without a release in between replaces the old contact.
        Some(current) => slot.transitions.push(SlotTransition::Ended {
            tracking_id: current,
            position: slot.position,
        }),
        None => {}
    }
    slot.transitions.push(SlotTransition::Began { tracking_id });
    slot.active = Some(tracking_id);
    slot.synthetic = false;
}

/// Releases the contact but keeps the slot's last position. The kernel only reports
/// axes that changed, so a later contact in this slot that moves along one axis
/// inherits the other from here.
fn end_contact(slot: &mut Slot) {
    if let Some(tracking_id) = slot.active.take() {
        slot.transitions.push(SlotTransition::Ended {
            tracking_id,
            position: slot.position,
        });
    }
}

fn move_contact(slot: &mut Slot, x: Option<i32>, y: Option<i32>) {
    let before = slot.position;
    if let Some(x) = x {
        slot.position.x = x;
    }
    if let Some(y) = y {
        slot.position.y = y;
    }
    if slot.position != before {
        slot.moved = true;
    }
}

fn verify_alternating(
    slot: u16,
    transitions: &[SlotTransition],
) -> Result<(), DecoderFault> {
    let alternates = transitions.windows(2).all(|pair| {
        matches!(
            pair,
            [SlotTransition::Ended { .. }, SlotTransition::Began { .. }]
                | [SlotTransition::Began { .. }, SlotTransition::Ended { .. }]
        )
    });
    if alternates {
        Ok(())
    } else {
        Err(DecoderFault::Invariant(format!(
            "slot {slot} has non-alternating transitions {transitions:?}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EV_SYN, SYN_REPORT};
    use pretty_assertions::assert_eq;

    fn abs(code: u16, value: i32) -> RawRecord { RawRecord::new(0, 0, EV_ABS, code, value) }

    fn run_frame(decoder: &mut TouchDecoder, records: &[RawRecord]) -> Vec<TouchEvent> {
        for record in records {
            decoder.apply(record).unwrap();
        }
        let mut out = vec![];
        decoder.flush(Timestamp(7), &mut out).unwrap();
        out
    }

    fn phases(events: &[TouchEvent]) -> Vec<(u16, i32, TouchPhase)> {
        events
            .iter()
            .map(|it| (it.slot, it.tracking_id, it.phase))
            .collect()
    }

    #[test]
    fn begin_uses_final_frame_position() {
        let mut decoder = TouchDecoder::new(4);
        let events = run_frame(
            &mut decoder,
            &[
                abs(ABS_MT_SLOT, 0),
                abs(ABS_MT_TRACKING_ID, 9),
                abs(ABS_MT_POSITION_X, 10),
                abs(ABS_MT_POSITION_Y, 20),
            ],
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].phase, TouchPhase::Begin);
        assert_eq!(events[0].position, Position::new(10, 20));
        assert_eq!(events[0].previous, Position::new(10, 20));
    }

    #[test]
    fn release_and_repress_in_one_frame_emits_end_then_begin() {
        let mut decoder = TouchDecoder::new(4);
        run_frame(
            &mut decoder,
            &[
                abs(ABS_MT_TRACKING_ID, 1),
                abs(ABS_MT_POSITION_X, 5),
                abs(ABS_MT_POSITION_Y, 5),
            ],
        );
        let events = run_frame(
            &mut decoder,
            &[
                abs(ABS_MT_TRACKING_ID, -1),
                abs(ABS_MT_TRACKING_ID, 2),
                abs(ABS_MT_POSITION_X, 50),
            ],
        );
        assert_eq!(
            phases(&events),
            vec![(0, 1, TouchPhase::End), (0, 2, TouchPhase::Begin)]
        );
        assert_eq!(events[0].position, Position::new(5, 5));
        assert_eq!(events[1].position, Position::new(50, 5));
    }

    #[test]
    fn move_carries_previous_position() {
        let mut decoder = TouchDecoder::new(2);
        run_frame(
            &mut decoder,
            &[
                abs(ABS_MT_TRACKING_ID, 3),
                abs(ABS_MT_POSITION_X, 1),
                abs(ABS_MT_POSITION_Y, 1),
            ],
        );
        let events = run_frame(&mut decoder, &[abs(ABS_MT_POSITION_X, 4)]);
        assert_eq!(phases(&events), vec![(0, 3, TouchPhase::Move)]);
        assert_eq!(events[0].previous, Position::new(1, 1));
        assert_eq!(events[0].position, Position::new(4, 1));
    }

    #[test]
    fn released_slot_keeps_its_position_for_the_next_contact() {
        let mut decoder = TouchDecoder::new(2);
        run_frame(
            &mut decoder,
            &[
                abs(ABS_MT_TRACKING_ID, 3),
                abs(ABS_MT_POSITION_X, 40),
                abs(ABS_MT_POSITION_Y, 60),
            ],
        );
        run_frame(&mut decoder, &[abs(ABS_MT_TRACKING_ID, -1)]);
        assert!(decoder.active_contacts().is_empty());

        let events = run_frame(
            &mut decoder,
            &[abs(ABS_MT_TRACKING_ID, 4), abs(ABS_MT_POSITION_Y, 70)],
        );
        assert_eq!(phases(&events), vec![(0, 4, TouchPhase::Begin)]);
        assert_eq!(events[0].position, Position::new(40, 70));
    }

    #[test]
    fn frame_without_changes_is_silent() {
        let mut decoder = TouchDecoder::new(2);
        run_frame(&mut decoder, &[abs(ABS_MT_TRACKING_ID, 3)]);
        assert!(run_frame(&mut decoder, &[abs(ABS_MT_POSITION_X, 0)]).is_empty());
    }

    #[test]
    fn out_of_range_slot_is_a_decode_error() {
        let mut decoder = TouchDecoder::new(2);
        for value in [2, -1] {
            let fault = decoder.apply(&abs(ABS_MT_SLOT, value)).unwrap_err();
            assert!(matches!(
                fault,
                DecoderFault::Wire(DecodeError::SlotOutOfRange { slot, max_slots: 2 }) if slot == value
            ));
        }
    }

    #[test]
    fn btn_touch_synthesizes_contact_for_single_touch_devices() {
        let mut decoder = TouchDecoder::new(1);
        let press = run_frame(
            &mut decoder,
            &[
                abs(ABS_X, 100),
                abs(ABS_Y, 200),
                RawRecord::new(0, 0, EV_KEY, BTN_TOUCH, 1),
            ],
        );
        assert_eq!(phases(&press), vec![(0, 1, TouchPhase::Begin)]);
        assert_eq!(press[0].position, Position::new(100, 200));

        let release = run_frame(&mut decoder, &[RawRecord::new(0, 0, EV_KEY, BTN_TOUCH, 0)]);
        assert_eq!(phases(&release), vec![(0, 1, TouchPhase::End)]);

        let second = run_frame(&mut decoder, &[RawRecord::new(0, 0, EV_KEY, BTN_TOUCH, 1)]);
        assert_eq!(phases(&second), vec![(0, 2, TouchPhase::Begin)]);
    }

    #[test]
    fn abs_x_is_ignored_once_multitouch_is_seen() {
        let mut decoder = TouchDecoder::new(2);
        run_frame(
            &mut decoder,
            &[
                abs(ABS_MT_TRACKING_ID, 1),
                abs(ABS_MT_POSITION_X, 10),
                abs(ABS_X, 10),
            ],
        );
        let events = run_frame(&mut decoder, &[abs(ABS_X, 999)]);
        assert!(events.is_empty());
    }

    #[test]
    fn discard_frame_rolls_back_to_last_flush() {
        let mut decoder = TouchDecoder::new(2);
        run_frame(&mut decoder, &[abs(ABS_MT_TRACKING_ID, 1)]);
        decoder.apply(&abs(ABS_MT_TRACKING_ID, -1)).unwrap();
        decoder.apply(&abs(ABS_MT_POSITION_X, 77)).unwrap();
        decoder.discard_frame();
        assert_eq!(decoder.active_contacts(), vec![(0, 1)]);
        assert!(run_frame(&mut decoder, &[]).is_empty());
    }

    #[test]
    fn unrelated_records_are_unrecognized() {
        let mut decoder = TouchDecoder::new(2);
        let disposition = decoder
            .apply(&RawRecord::new(0, 0, EV_SYN, SYN_REPORT, 0))
            .unwrap();
        assert_eq!(disposition, Disposition::Unrecognized);
    }
}

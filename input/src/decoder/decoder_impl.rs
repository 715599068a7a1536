// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{DecoderFault, Disposition, KeyDecoder, PointerDecoder, TouchDecoder};
use crate::{DeviceClass, DeviceRef, InputCoreError, InputEvent, KeyEvent, PointerEvent,
            RawRecord, Timestamp, TouchEvent, WarnOnce, event_type_name};
use std::collections::VecDeque;

/// Per-class decoder state. Closed set, one variant per [`DeviceClass`] family.
#[derive(Debug)]
pub enum DecoderState {
    Touch(TouchDecoder),
    Pointer(PointerDecoder),
    Key(KeyDecoder),
    Raw,
}

impl DecoderState {
    #[must_use]
    pub fn for_class(class: DeviceClass, max_touch_slots: u16) -> Self {
        match class {
            DeviceClass::Touch => Self::Touch(TouchDecoder::new(max_touch_slots)),
            DeviceClass::Mouse => Self::Pointer(PointerDecoder::new()),
            DeviceClass::Keyboard | DeviceClass::Remote => Self::Key(KeyDecoder::new()),
            DeviceClass::Other => Self::Raw,
        }
    }
}

/// Decoder for one device. Feed it records with [`push_record()`], then drain the
/// semantic events by iterating it. Identical record sequences always produce identical
/// events, however the bytes were chunked on the way in.
///
/// [`push_record()`]: Self::push_record
#[derive(Debug)]
pub struct Decoder {
    device: DeviceRef,
    state: DecoderState,
    /// Set by `SYN_DROPPED`; records are ignored until the next `SYN_REPORT`.
    resyncing: bool,
    unrecognized: WarnOnce<(u16, u16)>,
    ready: VecDeque<InputEvent>,
    touch_scratch: Vec<TouchEvent>,
    pointer_scratch: Vec<PointerEvent>,
    key_scratch: Vec<KeyEvent>,
}

impl Decoder {
    #[must_use]
    pub fn new(device: DeviceRef, max_touch_slots: u16) -> Self {
        let state = DecoderState::for_class(device.class, max_touch_slots);
        Self {
            device,
            state,
            resyncing: false,
            unrecognized: WarnOnce::default(),
            ready: VecDeque::new(),
            touch_scratch: vec![],
            pointer_scratch: vec![],
            key_scratch: vec![],
        }
    }

    #[must_use]
    pub fn device(&self) -> &DeviceRef { &self.device }

    #[must_use]
    pub fn state(&self) -> &DecoderState { &self.state }

    /// # Errors
    ///
    /// - [`InputCoreError::Decode`] for bad input (fatal for this device).
    /// - [`InputCoreError::Internal`] if a state machine broke an invariant.
    pub fn push_record(&mut self, record: &RawRecord) -> Result<(), InputCoreError> {
        if matches!(self.state, DecoderState::Raw) {
            self.ready.push_back(InputEvent::Raw {
                device: self.device.clone(),
                record: *record,
            });
            return Ok(());
        }

        if record.is_sync_dropped() {
            tracing::debug!(
                message = "decoder: kernel dropped events, discarding frame",
                device = %self.device.id
            );
            self.resyncing = true;
            self.discard_frame();
            return Ok(());
        }

        if self.resyncing {
            if record.is_sync_report() {
                self.resyncing = false;
            }
            return Ok(());
        }

        if record.is_sync_report() {
            return self.flush(record.timestamp());
        }

        let disposition = match &mut self.state {
            DecoderState::Touch(touch) => match touch.apply(record) {
                Ok(disposition) => disposition,
                Err(fault) => return Err(self.to_error(fault)),
            },
            DecoderState::Pointer(pointer) => pointer.apply(record),
            DecoderState::Key(key) => {
                let disposition = key.apply(record, &mut self.key_scratch);
                let device = &self.device;
                self.ready
                    .extend(self.key_scratch.drain(..).map(|key| InputEvent::Key {
                        device: device.clone(),
                        key,
                    }));
                disposition
            }
            DecoderState::Raw => Disposition::Applied,
        };

        if disposition == Disposition::Unrecognized
            && self.unrecognized.first_time((record.kind, record.code))
        {
            tracing::warn!(
                message = "decoder: ignoring unrecognized record",
                device = %self.device.id,
                class = %self.device.class,
                kind = event_type_name(record.kind),
                code = record.code,
                value = record.value
            );
        }
        Ok(())
    }

    fn flush(&mut self, timestamp: Timestamp) -> Result<(), InputCoreError> {
        let device = &self.device;
        match &mut self.state {
            DecoderState::Touch(touch) => {
                if let Err(fault) = touch.flush(timestamp, &mut self.touch_scratch) {
                    self.touch_scratch.clear();
                    return Err(self.to_error(fault));
                }
                self.ready.extend(self.touch_scratch.drain(..).map(|touch| {
                    InputEvent::Touch {
                        device: device.clone(),
                        touch,
                    }
                }));
            }
            DecoderState::Pointer(pointer) => {
                pointer.flush(timestamp, &mut self.pointer_scratch);
                self.ready.extend(self.pointer_scratch.drain(..).map(|pointer| {
                    InputEvent::Pointer {
                        device: device.clone(),
                        pointer,
                    }
                }));
            }
            DecoderState::Key(key) => key.flush(),
            DecoderState::Raw => {}
        }
        Ok(())
    }

    fn discard_frame(&mut self) {
        match &mut self.state {
            DecoderState::Touch(touch) => touch.discard_frame(),
            DecoderState::Pointer(pointer) => pointer.discard_frame(),
            DecoderState::Key(key) => key.flush(),
            DecoderState::Raw => {}
        }
    }

    fn to_error(&self, fault: DecoderFault) -> InputCoreError {
        match fault {
            DecoderFault::Wire(source) => InputCoreError::Decode {
                device: self.device.id.clone(),
                source,
            },
            DecoderFault::Invariant(message) => {
                InputCoreError::internal(format!("{}: {message}", self.device.id))
            }
        }
    }

    /// Decode a whole record sequence and collect the events. Stops at the first error.
    ///
    /// # Errors
    ///
    /// See [`push_record()`](Self::push_record).
    pub fn decode_all<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a RawRecord>,
    ) -> Result<Vec<InputEvent>, InputCoreError> {
        for record in records {
            self.push_record(record)?;
        }
        Ok(self.by_ref().collect())
    }
}

impl Iterator for Decoder {
    type Item = InputEvent;

    fn next(&mut self) -> Option<Self::Item> { self.ready.pop_front() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ABS_MT_POSITION_X, ABS_MT_SLOT, ABS_MT_TRACKING_ID, BTN_LEFT, EV_ABS,
                EV_KEY, EV_MSC, EV_REL, EV_SYN, MSC_TIMESTAMP, REL_X, SYN_DROPPED,
                SYN_REPORT, TouchPhase};
    use pretty_assertions::assert_eq;

    fn device(class: DeviceClass) -> DeviceRef { DeviceRef::new("/dev/input/event9", class) }

    fn syn(usec: u32) -> RawRecord { RawRecord::new(1, usec, EV_SYN, SYN_REPORT, 0) }

    #[test]
    fn touch_events_are_stamped_with_sync_time() {
        let mut decoder = Decoder::new(device(DeviceClass::Touch), 4);
        let events = decoder
            .decode_all(&[
                RawRecord::new(1, 1, EV_ABS, ABS_MT_TRACKING_ID, 4),
                RawRecord::new(1, 2, EV_ABS, ABS_MT_POSITION_X, 9),
                syn(3),
            ])
            .unwrap();
        assert_eq!(events.len(), 1);
        let touch = events[0].as_touch().unwrap();
        assert_eq!(touch.phase, TouchPhase::Begin);
        assert_eq!(touch.timestamp, Timestamp(1_000_003));
        assert_eq!(events[0].device(), Some(&device(DeviceClass::Touch)));
    }

    #[test]
    fn nothing_is_emitted_before_sync() {
        let mut decoder = Decoder::new(device(DeviceClass::Mouse), 4);
        decoder
            .push_record(&RawRecord::new(0, 0, EV_REL, REL_X, 5))
            .unwrap();
        assert!(decoder.next().is_none());
        decoder.push_record(&syn(0)).unwrap();
        assert_eq!(decoder.next().unwrap().as_pointer().unwrap().dx, 5);
    }

    #[test]
    fn syn_dropped_discards_until_next_report() {
        let mut decoder = Decoder::new(device(DeviceClass::Mouse), 4);
        let events = decoder
            .decode_all(&[
                RawRecord::new(0, 0, EV_REL, REL_X, 5),
                RawRecord::new(0, 0, EV_SYN, SYN_DROPPED, 0),
                RawRecord::new(0, 0, EV_KEY, BTN_LEFT, 1),
                syn(1),
                RawRecord::new(0, 0, EV_REL, REL_X, 2),
                syn(2),
            ])
            .unwrap();
        assert_eq!(events.len(), 1);
        let pointer = events[0].as_pointer().unwrap();
        assert_eq!(pointer.dx, 2);
        assert!(pointer.buttons.is_empty());
    }

    #[test]
    fn out_of_range_slot_names_the_device() {
        let mut decoder = Decoder::new(device(DeviceClass::Touch), 2);
        let err = decoder
            .push_record(&RawRecord::new(0, 0, EV_ABS, ABS_MT_SLOT, 5))
            .unwrap_err();
        assert!(matches!(
            err,
            InputCoreError::Decode { ref device, .. } if device.as_str() == "/dev/input/event9"
        ));
        assert_eq!(err.kind(), crate::ErrorKind::DecodeError);
    }

    #[test]
    fn unrecognized_records_are_ignored() {
        let mut decoder = Decoder::new(device(DeviceClass::Touch), 2);
        let events = decoder
            .decode_all(&[
                RawRecord::new(0, 0, EV_MSC, MSC_TIMESTAMP, 1),
                RawRecord::new(0, 0, EV_MSC, MSC_TIMESTAMP, 2),
                syn(0),
            ])
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn other_devices_pass_records_through() {
        let mut decoder = Decoder::new(device(DeviceClass::Other), 2);
        let records = [RawRecord::new(0, 0, EV_MSC, MSC_TIMESTAMP, 1), syn(0)];
        let events = decoder.decode_all(&records).unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[1],
            InputEvent::Raw { record, .. } if record == records[1]
        ));
    }
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::DeviceDescriptor;
use crate::{DecodeError, Decoder, DeviceId, DeviceRef, InputCoreError, InputEvent,
            RawRecord, RecordFormat, RecordReader, Timestamp};
use rustix::io::Errno;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};

/// Size of the buffer one `read(2)` fills. A multiple of both record sizes.
pub const DEVICE_READ_BUFFER_SIZE: usize = 48 * 64;

/// How a read pass over a device ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The read would block; everything available was consumed.
    Drained,
    /// End-of-file or the device is gone.
    Hangup,
}

/// An open device: its descriptor, the partial record carry, and its decoder state.
/// Dropping it closes the descriptor, which also releases an exclusive grab.
#[derive(Debug)]
pub struct Device {
    descriptor: DeviceDescriptor,
    fd: OwnedFd,
    reader: RecordReader,
    decoder: Decoder,
    records: Vec<RawRecord>,
    last_activity: Option<Timestamp>,
    grabbed: bool,
}

impl Device {
    #[must_use]
    pub fn new(
        descriptor: DeviceDescriptor,
        fd: OwnedFd,
        format: RecordFormat,
        max_touch_slots: u16,
        grabbed: bool,
    ) -> Self {
        let decoder = Decoder::new(descriptor.device_ref(), max_touch_slots);
        Self {
            descriptor,
            fd,
            reader: RecordReader::new(format),
            decoder,
            records: vec![],
            last_activity: None,
            grabbed,
        }
    }

    #[must_use]
    pub fn id(&self) -> &DeviceId { &self.descriptor.id }

    #[must_use]
    pub fn descriptor(&self) -> &DeviceDescriptor { &self.descriptor }

    #[must_use]
    pub fn device_ref(&self) -> DeviceRef { self.descriptor.device_ref() }

    #[must_use]
    pub fn raw_fd(&self) -> RawFd { self.fd.as_raw_fd() }

    #[must_use]
    pub fn is_grabbed(&self) -> bool { self.grabbed }

    /// Kernel time of the last record read from this device.
    #[must_use]
    pub fn last_activity(&self) -> Option<Timestamp> { self.last_activity }

    #[must_use]
    pub fn decoder(&self) -> &Decoder { &self.decoder }

    /// Read until the descriptor would block (or hangs up), decoding as it goes.
    /// Events decoded before an error are still appended to `out`.
    ///
    /// # Errors
    ///
    /// - [`InputCoreError::Decode`] for a read error, a truncated record at end-of-file,
    ///   or bad input.
    /// - [`InputCoreError::Internal`] if the decoder broke an invariant.
    pub fn read_available(
        &mut self,
        scratch: &mut [u8],
        out: &mut Vec<InputEvent>,
    ) -> Result<ReadOutcome, InputCoreError> {
        loop {
            match rustix::io::read(&self.fd, &mut *scratch) {
                Ok(0) => {
                    let partial_len = self.reader.partial_len();
                    if partial_len > 0 {
                        return Err(self.decode_error(DecodeError::TruncatedRecord {
                            partial_len,
                            record_size: self.reader.format().record_size(),
                        }));
                    }
                    return Ok(ReadOutcome::Hangup);
                }
                Ok(bytes_read) => self.decode_bytes(&scratch[..bytes_read], out)?,
                Err(errno) if errno == Errno::INTR => {}
                Err(errno) if errno == Errno::AGAIN => return Ok(ReadOutcome::Drained),
                Err(errno) if errno == Errno::NODEV => return Ok(ReadOutcome::Hangup),
                Err(errno) => {
                    return Err(self.decode_error(DecodeError::Read {
                        source: errno.into(),
                    }));
                }
            }
        }
    }

    fn decode_bytes(
        &mut self,
        bytes: &[u8],
        out: &mut Vec<InputEvent>,
    ) -> Result<(), InputCoreError> {
        self.reader.feed(bytes, &mut self.records);
        if let Some(last) = self.records.last() {
            self.last_activity = Some(last.timestamp());
        }
        let mut result = Ok(());
        for record in self.records.drain(..) {
            if let Err(err) = self.decoder.push_record(&record) {
                result = Err(err);
                break;
            }
        }
        self.records.clear();
        out.extend(self.decoder.by_ref());
        result
    }

    fn decode_error(&self, source: DecodeError) -> InputCoreError {
        InputCoreError::Decode {
            device: self.descriptor.id.clone(),
            source,
        }
    }
}

impl AsFd for Device {
    fn as_fd(&self) -> BorrowedFd<'_> { self.fd.as_fd() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DeviceClass, ErrorKind, PipeWriter, encode_records,
                try_create_pipe_device, two_finger_drag_records};
    use pretty_assertions::assert_eq;

    fn pipe_touch_device() -> (Device, PipeWriter) {
        let format = RecordFormat::default();
        let (reader, writer) = try_create_pipe_device(format).unwrap();
        rustix::fs::fcntl_setfl(&reader, rustix::fs::OFlags::NONBLOCK).unwrap();
        let descriptor =
            DeviceDescriptor::adopted("pipe:touch", "replay", DeviceClass::Touch);
        (Device::new(descriptor, reader, format, 16, false), writer)
    }

    #[test]
    fn empty_pipe_is_drained_without_events() {
        let (mut device, _writer) = pipe_touch_device();
        let mut scratch = vec![0_u8; DEVICE_READ_BUFFER_SIZE];
        let mut events = vec![];
        assert_eq!(
            device.read_available(&mut scratch, &mut events).unwrap(),
            ReadOutcome::Drained
        );
        assert!(events.is_empty());
        assert_eq!(device.last_activity(), None);
    }

    #[test]
    fn tiny_scratch_buffer_gives_the_same_events() {
        let records = two_finger_drag_records();
        let (mut device, writer) = pipe_touch_device();
        writer.write_records(&records).unwrap();

        // 7 bytes per read never lines up with a record boundary.
        let mut scratch = [0_u8; 7];
        let mut events = vec![];
        device.read_available(&mut scratch, &mut events).unwrap();
        assert_eq!(events.len(), 8);
        assert!(device.last_activity().is_some());
    }

    #[test]
    fn eof_inside_a_record_is_a_decode_error() {
        let (mut device, writer) = pipe_touch_device();
        let bytes = encode_records(writer.format(), &two_finger_drag_records());
        writer.write_bytes(&bytes[..24]).unwrap();
        writer.close();

        let mut scratch = vec![0_u8; DEVICE_READ_BUFFER_SIZE];
        let mut events = vec![];
        let err = device.read_available(&mut scratch, &mut events).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeError);
        assert!(matches!(
            err,
            InputCoreError::Decode {
                source: DecodeError::TruncatedRecord {
                    partial_len: 8,
                    record_size: 16
                },
                ..
            }
        ));
    }
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{MAX_RECORD_SIZE, RawRecord, RecordFormat};
use smallvec::SmallVec;

/// Splits a byte stream into whole records. Reads from a device may end in the middle
/// of a record; the tail is carried and joined with the next read.
#[derive(Debug)]
pub struct RecordReader {
    format: RecordFormat,
    carry: SmallVec<[u8; MAX_RECORD_SIZE]>,
}

impl RecordReader {
    #[must_use]
    pub fn new(format: RecordFormat) -> Self {
        Self {
            format,
            carry: SmallVec::new(),
        }
    }

    #[must_use]
    pub fn format(&self) -> RecordFormat { self.format }

    /// Bytes of an incomplete record waiting for the next read.
    #[must_use]
    pub fn partial_len(&self) -> usize { self.carry.len() }

    /// Append every complete record in `carry + bytes` to `out`.
    pub fn feed(&mut self, mut bytes: &[u8], out: &mut Vec<RawRecord>) {
        let record_size = self.format.record_size();

        if !self.carry.is_empty() {
            let needed = record_size - self.carry.len();
            if bytes.len() < needed {
                self.carry.extend_from_slice(bytes);
                return;
            }
            self.carry.extend_from_slice(&bytes[..needed]);
            out.extend(self.format.decode(&self.carry));
            self.carry.clear();
            bytes = &bytes[needed..];
        }

        let chunks = bytes.chunks_exact(record_size);
        let remainder = chunks.remainder();
        out.extend(chunks.filter_map(|chunk| self.format.decode(chunk)));
        self.carry.extend_from_slice(remainder);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ABS_MT_POSITION_X, EV_ABS, EV_SYN, SYN_REPORT, encode_records};
    use pretty_assertions::assert_eq;

    fn sample() -> Vec<RawRecord> {
        vec![
            RawRecord::new(1, 10, EV_ABS, ABS_MT_POSITION_X, 300),
            RawRecord::new(1, 10, EV_SYN, SYN_REPORT, 0),
            RawRecord::new(1, 20, EV_ABS, ABS_MT_POSITION_X, 301),
        ]
    }

    #[test]
    fn whole_records_in_one_read() {
        let format = RecordFormat::default();
        let bytes = encode_records(format, &sample());
        let mut reader = RecordReader::new(format);
        let mut out = vec![];
        reader.feed(&bytes, &mut out);
        assert_eq!(out, sample());
        assert_eq!(reader.partial_len(), 0);
    }

    #[test]
    fn partial_trailing_record_is_held_then_joined() {
        let format = RecordFormat::default();
        let bytes = encode_records(format, &sample());
        let mut reader = RecordReader::new(format);
        let mut out = vec![];

        // 1.5 records, then the rest.
        reader.feed(&bytes[..24], &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(reader.partial_len(), 8);

        reader.feed(&bytes[24..], &mut out);
        assert_eq!(out, sample());
        assert_eq!(reader.partial_len(), 0);
    }

    #[test]
    fn byte_at_a_time() {
        let format = RecordFormat::default();
        let bytes = encode_records(format, &sample());
        let mut reader = RecordReader::new(format);
        let mut out = vec![];
        for byte in &bytes {
            reader.feed(std::slice::from_ref(byte), &mut out);
        }
        assert_eq!(out, sample());
    }
}

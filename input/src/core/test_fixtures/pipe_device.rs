// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::encode_records;
use crate::{RawRecord, RecordFormat};
use rustix::pipe::{PipeFlags, pipe_with};
use std::os::fd::OwnedFd;

/// Write end of a pipe that stands in for an `evdev` node. Hand the read end to
/// [`Registry::adopt()`] (or [`Dispatcher::adopt()`]), then write records here. Dropping
/// (or [`close()`]-ing) the writer makes the reader see end-of-file, which the core
/// treats as a hangup.
///
/// [`Dispatcher::adopt()`]: crate::Dispatcher::adopt
/// [`Registry::adopt()`]: crate::Registry::adopt
/// [`close()`]: Self::close
#[derive(Debug)]
pub struct PipeWriter {
    fd: OwnedFd,
    format: RecordFormat,
}

/// Create a pipe. The read end is returned as is; the core makes it non-blocking when
/// it adopts it.
///
/// # Errors
///
/// Returns the OS error if the pipe cannot be created.
pub fn try_create_pipe_device(
    format: RecordFormat,
) -> std::io::Result<(OwnedFd, PipeWriter)> {
    let (reader, writer) = pipe_with(PipeFlags::CLOEXEC)?;
    Ok((reader, PipeWriter { fd: writer, format }))
}

impl PipeWriter {
    #[must_use]
    pub fn from_fd(fd: OwnedFd, format: RecordFormat) -> Self { Self { fd, format } }

    /// # Errors
    ///
    /// Returns the OS error if the write fails (e.g. the read end is closed).
    pub fn write_records(&self, records: &[RawRecord]) -> std::io::Result<()> {
        self.write_bytes(&encode_records(self.format, records))
    }

    /// Write raw bytes, which may end mid-record.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the write fails.
    pub fn write_bytes(&self, mut bytes: &[u8]) -> std::io::Result<()> {
        while !bytes.is_empty() {
            match rustix::io::write(&self.fd, bytes) {
                Ok(written) => bytes = &bytes[written..],
                Err(errno) if errno == rustix::io::Errno::INTR => {}
                Err(errno) => return Err(errno.into()),
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn format(&self) -> RecordFormat { self.format }

    /// Close the write end, i.e. hang up the fake device.
    pub fn close(self) { drop(self); }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EV_SYN, SYN_REPORT};

    #[test]
    fn reader_sees_written_records_then_eof() {
        let format = RecordFormat::default();
        let (reader, writer) = try_create_pipe_device(format).unwrap();
        writer
            .write_records(&[RawRecord::new(0, 0, EV_SYN, SYN_REPORT, 0)])
            .unwrap();
        writer.close();

        let mut buf = [0_u8; 64];
        let read = rustix::io::read(&reader, &mut buf).unwrap();
        assert_eq!(read, format.record_size());
        assert_eq!(rustix::io::read(&reader, &mut buf).unwrap(), 0);
    }
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

/// Problems in the bytes a device sent. Fatal for that device only.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum DecodeError {
    #[error("Device closed with {partial_len} bytes of a {record_size} byte record pending")]
    #[diagnostic(
        code(sbc_input::decoder::truncated_record),
        help("The record layout may not match the kernel; try the other `record_format.layout`")
    )]
    TruncatedRecord {
        partial_len: usize,
        record_size: usize,
    },

    #[error("Multi-touch slot {slot} is outside the slot table of {max_slots}")]
    #[diagnostic(
        code(sbc_input::decoder::slot_out_of_range),
        help("Raise `max_touch_slots` in the registry config")
    )]
    SlotOutOfRange { slot: i32, max_slots: u16 },

    #[error("Failed to read from the device")]
    #[diagnostic(code(sbc_input::decoder::read))]
    Read {
        #[source]
        source: std::io::Error,
    },
}

/// What a per-class state machine reports when it can't apply a record.
#[derive(Debug)]
pub enum DecoderFault {
    /// Bad input from the device.
    Wire(DecodeError),
    /// The state machine broke one of its own invariants.
    Invariant(String),
}

impl From<DecodeError> for DecoderFault {
    fn from(it: DecodeError) -> Self { Self::Wire(it) }
}

/// Whether a state machine knew what to do with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Applied,
    Unrecognized,
}

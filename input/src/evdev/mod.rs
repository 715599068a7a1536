// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The kernel's `struct input_event` wire format and the type / code constants this
//! crate understands.

// Attach sources.
pub mod codes;
pub mod raw_record;
pub mod record_format;

// Re-export.
pub use codes::*;
pub use raw_record::*;
pub use record_format::*;

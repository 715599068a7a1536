// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Command line tools built on [`sbc_input`].
//!
//! - `evtap` - opens every detected `evdev` device and prints the decoded touch,
//!   pointer, key and lifecycle events. Try `evtap --help`, or `evtap --json --ticks`
//!   for JSON lines with a heartbeat. Pass `-l` to write a `log.txt` for debugging.

#![warn(clippy::all)]
#![warn(clippy::unwrap_in_result)]
#![warn(rust_2018_idioms)]
#![warn(clippy::doc_markdown)]
#![warn(clippy::redundant_closure)]
#![warn(clippy::redundant_closure_for_method_calls)]
#![warn(clippy::semicolon_if_nothing_returned)]
#![warn(clippy::must_use_candidate)]
#![warn(clippy::items_after_statements)]
#![warn(clippy::needless_return)]
#![warn(clippy::redundant_else)]
#![warn(clippy::manual_let_else)]
#![warn(clippy::unnecessary_wraps)]
#![warn(clippy::needless_pass_by_value)]

// Attach sources.
pub mod evtap;

// Re-export.
pub use evtap::*;

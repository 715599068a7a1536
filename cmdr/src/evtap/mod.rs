// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! `evtap` opens every detected input device and prints the decoded events, one per
//! line. Exit codes: `0` when the run ends normally (signal or shutdown), `1` for an
//! invalid invocation, `2` for a runtime failure.

// Attach sources.
pub mod clap_config;
pub mod event_printer;
pub mod launcher;
pub mod report_handler;
pub mod signal_watcher;
pub mod ui_str;

// Re-export.
pub use clap_config::*;
pub use event_printer::*;
pub use launcher::*;
pub use report_handler::*;
pub use signal_watcher::*;

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words evdev epoll sysfs

//! # sbc-input
//!
//! Input-event core for Raspberry-Pi-class boards. The crate watches Linux `evdev`
//! character devices (touchscreens, mice, keyboards, IR remote receivers) from a single
//! dedicated worker, decodes the kernel's fixed-size event records into semantic events,
//! and fans those events out to subscribers.
//!
//! ```text
//! ┌──────────┐ open  ┌────────┐ ready ┌─────────┐ events ┌────────────┐ queue ┌────────────┐
//! │ Registry ├───────▶ Poller ├───────▶ Decoder ├────────▶ Dispatcher ├───────▶ Subscriber │
//! └──────────┘       └────────┘       └─────────┘        └────────────┘       └────────────┘
//! ```
//!
//! | Component      | Module                 | Owns                                        |
//! | :------------- | :--------------------- | :------------------------------------------ |
//! | [`Registry`]   | [`mod@registry`]       | device descriptors and decoder state        |
//! | [`Poller`]     | [`mod@poller`]         | the [`mio::Poll`] instance and its interest |
//! | [`Decoder`]    | [`mod@decoder`]        | per-device frame state machines             |
//! | [`Dispatcher`] | [`mod@dispatcher`]     | the main loop and the subscription table    |
//!
//! The core never installs signal handlers and never reads environment variables. The
//! host passes an [`InputCoreConfig`] at construction and a [`CancellationToken`] to
//! [`Dispatcher::run()`].

// Skip rustfmt for rest of file.
// https://stackoverflow.com/a/75910283/2085356
#![cfg_attr(rustfmt, rustfmt_skip)]

// Enforce strict error handling in production library code only. Tests are allowed to
// use .unwrap() (workspace `Cargo.toml` config allows it).
#![cfg_attr(not(test), deny(clippy::unwrap_in_result))]

// Attach modules (re-exported below to provide clean public API).
pub mod config;
pub mod core;
pub mod decoder;
pub mod dispatcher;
pub mod events;
pub mod evdev;
pub mod poller;
pub mod registry;

// Re-export stable public API using glob imports for ergonomic, flat API surface.
#[allow(ambiguous_glob_reexports)]
pub use config::*;
#[allow(ambiguous_glob_reexports)]
pub use core::*;
#[allow(ambiguous_glob_reexports)]
pub use decoder::*;
#[allow(ambiguous_glob_reexports)]
pub use dispatcher::*;
#[allow(ambiguous_glob_reexports)]
pub use events::*;
#[allow(ambiguous_glob_reexports)]
pub use evdev::*;
#[allow(ambiguous_glob_reexports)]
pub use poller::*;
#[allow(ambiguous_glob_reexports)]
pub use registry::*;

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words epoll EINTR

//! Readiness multiplexer over the open device descriptors, built on [`mio`] (epoll on
//! Linux).
//!
//! ```text
//! ┌──────────────┐  attach(fd, READABLE)   ┌─────────────────────┐
//! │  Dispatcher  │ ──────────────────────▶ │ Poller (mio::Poll)  │
//! │   (worker)   │ ◀────────────────────── │  fd tokens + waker  │
//! └──────────────┘  wait() -> [Ready..]    └─────────────────────┘
//!                                                   ▲
//!                            Waker::wake() from any │ thread
//! ```
//!
//! # Level-triggered semantics on an edge-triggered backend
//!
//! [`mio`] registrations are edge-triggered. Every descriptor returned by one
//! [`Poller::wait()`] is re-registered before the next, which makes the kernel queue it
//! again if it is still ready. A caller that leaves bytes unread therefore hears about
//! the descriptor again. The [`Dispatcher`] reads each readable device until the read
//! would block, so for it the re-registration finds nothing. Readiness beyond the
//! batch bound stays on the kernel's ready list and is returned by the next call.
//!
//! # EINTR handling
//!
//! [`Poller::wait()`] retries `EINTR` internally, shortening the timeout by the time
//! already spent.
//!
//! [`Dispatcher`]: crate::Dispatcher

// Attach sources.
pub mod poller_impl;
pub mod readiness;

// Re-export.
pub use poller_impl::*;
pub use readiness::*;

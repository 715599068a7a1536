// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Dedicated worker thread plumbing used by [`Dispatcher::spawn()`].
//!
//! A [`ReactorWorker`] owns every OS resource it touches (poller, descriptors, queues)
//! and is moved onto a named thread. The thread calls [`poll_once()`] until it returns
//! [`Continuation::Stop`], then hands back [`finish()`]'s output through
//! [`ReactorThread::join()`].
//!
//! ```text
//! spawn() ──▶ [reactor-gen-N] run_worker_loop()
//!               ├─ TerminationGuard (marks liveness terminated on exit or panic)
//!               ├─ loop { poll_once() } until Stop
//!               └─ finish() ──▶ join()
//! ```
//!
//! [`Continuation::Stop`]: crate::Continuation::Stop
//! [`Dispatcher::spawn()`]: crate::Dispatcher::spawn
//! [`finish()`]: ReactorWorker::finish
//! [`poll_once()`]: ReactorWorker::poll_once

// Attach sources.
pub mod liveness;
pub mod reactor_thread_impl;
pub mod termination_guard;

// Re-export.
pub use liveness::*;
pub use reactor_thread_impl::*;
pub use termination_guard::*;

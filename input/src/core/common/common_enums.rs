// Copyright (c) 2023-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

/// Control flow signal for loops and threads.
///
/// A unified type for indicating whether a loop or thread should continue processing or
/// stop. Used across:
/// - The [`Dispatcher`] main loop ([`run_once()`]).
/// - Sink delivery workers ([`EventSink::deliver()`]).
/// - The generic [`run_worker_loop()`].
///
/// [`Dispatcher`]: crate::Dispatcher
/// [`EventSink::deliver()`]: crate::EventSink::deliver
/// [`run_once()`]: crate::Dispatcher::run_once
/// [`run_worker_loop()`]: crate::run_worker_loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Continuation {
    /// Continue to the next iteration.
    #[default]
    Continue,

    /// Stop processing and exit the loop/thread.
    Stop,
}


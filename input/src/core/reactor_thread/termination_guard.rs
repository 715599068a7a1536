// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::ThreadLiveness;
use std::sync::Arc;

/// [RAII] guard held by the worker thread for its whole lifetime. Dropping it (normal
/// return or unwinding) marks the thread as terminated.
///
/// [RAII]: https://en.wikipedia.org/wiki/Resource_acquisition_is_initialization
#[derive(Debug)]
pub struct TerminationGuard {
    pub liveness: Arc<ThreadLiveness>,
}

impl Drop for TerminationGuard {
    fn drop(&mut self) { self.liveness.mark_terminated(); }
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Process-wide counter so that each spawned worker gets a distinct generation, which
/// shows up in its thread name.
static THREAD_GENERATION: AtomicU8 = AtomicU8::new(0);

/// Shared between the worker thread and its [`ReactorThread`] handle.
///
/// [`ReactorThread`]: super::ReactorThread
#[derive(Debug)]
pub struct ThreadLiveness {
    pub is_running: AtomicBool,
    pub generation: u8,
}

impl ThreadLiveness {
    #[must_use]
    pub fn new() -> Self {
        Self {
            is_running: AtomicBool::new(true),
            generation: THREAD_GENERATION
                .fetch_add(1, Ordering::SeqCst)
                .wrapping_add(1),
        }
    }

    pub fn mark_terminated(&self) { self.is_running.store(false, Ordering::SeqCst); }

    #[must_use]
    pub fn is_running(&self) -> LivenessState {
        if self.is_running.load(Ordering::SeqCst) {
            LivenessState::Running
        } else {
            LivenessState::Terminated
        }
    }
}

impl Default for ThreadLiveness {
    fn default() -> Self { Self::new() }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessState {
    Running,
    Terminated,
}

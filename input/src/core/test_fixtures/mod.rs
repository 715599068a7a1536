// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words sysfs

//! Fixtures shared by the unit tests, the integration tests in `tests/`, and hosts that
//! want to exercise the core without real hardware: temp dirs, fake `/dev/input` +
//! sysfs trees, pipe-backed devices, and record builders.

// Attach sources.
pub mod fake_input_tree;
pub mod friendly_random_id;
pub mod pipe_device;
pub mod record_builders;
pub mod temp_dir;

// Re-export.
pub use fake_input_tree::*;
pub use friendly_random_id::*;
pub use pipe_device::*;
pub use record_builders::*;
pub use temp_dir::*;

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words sysfs

//! Device Registry: discovers `evdev` nodes, classifies them from their sysfs name and
//! capability bitmaps, and owns every open [`Device`] (descriptor, record reader,
//! decoder state).
//!
//! ```text
//! /dev/input/event*  ──glob──▶ node ──sysfs──▶ name + capabilities ──▶ DeviceClass
//!                                                                        │
//!                               open(O_RDONLY|O_NONBLOCK|O_CLOEXEC) ◀────┘
//! ```

// Attach sources.
pub mod capabilities;
pub mod classify;
pub mod device;
pub mod device_descriptor;
pub mod device_glob;
pub mod grab;
pub mod registry_impl;
pub mod sysfs;

// Re-export.
pub use capabilities::*;
pub use classify::*;
pub use device::*;
pub use device_descriptor::*;
pub use device_glob::*;
pub use grab::*;
pub use registry_impl::*;
pub use sysfs::*;

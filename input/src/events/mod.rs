// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Semantic events produced by the decoders and fanned out by the dispatcher. Every
//! event is immutable once emitted and is shared between subscribers as an
//! [`Arc<InputEvent>`](std::sync::Arc).

// Attach sources.
pub mod device_class;
pub mod device_id;
pub mod event_kind;
pub mod input_event;
pub mod key_event;
pub mod lifecycle_event;
pub mod pointer_event;
pub mod timestamp;
pub mod touch_event;

// Re-export.
pub use device_class::*;
pub use device_id::*;
pub use event_kind::*;
pub use input_event::*;
pub use key_event::*;
pub use lifecycle_event::*;
pub use pointer_event::*;
pub use timestamp::*;
pub use touch_event::*;

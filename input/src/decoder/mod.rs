// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Decoder: turns the raw record stream of one device into semantic events.
//!
//! Bytes go through a [`RecordReader`] (which carries partial records across reads),
//! then through the per-class state machine held by a [`Decoder`]. Frame oriented
//! classes (touch, mouse) only emit on `SYN_REPORT`, so a frame is never emitted in
//! halves.
//!
//! | Class              | State machine       | Emits                           |
//! | :----------------- | :------------------ | :------------------------------ |
//! | `touch`            | [`TouchDecoder`]    | [`TouchEvent`] per slot change  |
//! | `mouse`            | [`PointerDecoder`]  | [`PointerEvent`] per frame      |
//! | `keyboard`/`remote`| [`KeyDecoder`]      | [`KeyEvent`] per key record     |
//! | `other`            | none                | every record as `Raw`           |
//!
//! [`KeyEvent`]: crate::KeyEvent
//! [`PointerEvent`]: crate::PointerEvent
//! [`TouchEvent`]: crate::TouchEvent

// Attach sources.
pub mod decode_error;
pub mod decoder_impl;
pub mod key_decoder;
pub mod pointer_decoder;
pub mod record_reader;
pub mod touch_decoder;

// Re-export.
pub use decode_error::*;
pub use decoder_impl::*;
pub use key_decoder::*;
pub use pointer_decoder::*;
pub use record_reader::*;
pub use touch_decoder::*;

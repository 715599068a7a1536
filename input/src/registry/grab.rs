// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words eviocgrab

use rustix::ioctl::{IntegerSetter, Opcode, ioctl, opcode};
use std::{ffi::c_int, os::fd::BorrowedFd};

/// `_IOW('E', 0x90, int)` from `linux/input.h`.
pub const EVIOCGRAB: Opcode = opcode::write::<c_int>(b'E', 0x90);

/// Grab (or release) exclusive access to an evdev node. While grabbed, no other reader
/// (including the console) receives its events.
///
/// # Errors
///
/// Returns the OS error, e.g. `EBUSY` if another process holds the grab, or `EINVAL`
/// if the descriptor is not an evdev node.
pub fn set_exclusive_grab(fd: BorrowedFd<'_>, exclusive: bool) -> std::io::Result<()> {
    // SAFETY: EVIOCGRAB takes its argument by value and reads no user memory.
    unsafe { ioctl(fd, IntegerSetter::<EVIOCGRAB>::new_usize(usize::from(exclusive))) }
        .map_err(std::io::Error::from)
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words hwheel

//! Event type and code numbers from `linux/input-event-codes.h`. Only the subset the
//! decoders and the classifier use is listed.

// Event types.
pub const EV_SYN: u16 = 0x00;
pub const EV_KEY: u16 = 0x01;
pub const EV_REL: u16 = 0x02;
pub const EV_ABS: u16 = 0x03;
pub const EV_MSC: u16 = 0x04;

// Synchronization codes.
pub const SYN_REPORT: u16 = 0;
pub const SYN_CONFIG: u16 = 1;
pub const SYN_MT_REPORT: u16 = 2;
pub const SYN_DROPPED: u16 = 3;

// Relative axes.
pub const REL_X: u16 = 0x00;
pub const REL_Y: u16 = 0x01;
pub const REL_HWHEEL: u16 = 0x06;
pub const REL_WHEEL: u16 = 0x08;
pub const REL_WHEEL_HI_RES: u16 = 0x0b;
pub const REL_HWHEEL_HI_RES: u16 = 0x0c;

// Absolute axes.
pub const ABS_X: u16 = 0x00;
pub const ABS_Y: u16 = 0x01;
pub const ABS_PRESSURE: u16 = 0x18;
pub const ABS_MT_SLOT: u16 = 0x2f;
pub const ABS_MT_TOUCH_MAJOR: u16 = 0x30;
pub const ABS_MT_POSITION_X: u16 = 0x35;
pub const ABS_MT_POSITION_Y: u16 = 0x36;
pub const ABS_MT_TRACKING_ID: u16 = 0x39;
pub const ABS_MT_PRESSURE: u16 = 0x3a;

// Misc.
pub const MSC_SCAN: u16 = 0x04;
pub const MSC_TIMESTAMP: u16 = 0x05;

// Keys and buttons.
pub const KEY_ESC: u16 = 1;
pub const KEY_A: u16 = 30;
pub const KEY_SPACE: u16 = 57;
pub const BTN_MISC: u16 = 0x100;
pub const BTN_LEFT: u16 = 0x110;
pub const BTN_RIGHT: u16 = 0x111;
pub const BTN_MIDDLE: u16 = 0x112;
pub const BTN_SIDE: u16 = 0x113;
pub const BTN_EXTRA: u16 = 0x114;
pub const BTN_TOOL_FINGER: u16 = 0x145;
pub const BTN_TOUCH: u16 = 0x14a;

/// Key code values in an `EV_KEY` record.
pub const KEY_VALUE_RELEASE: i32 = 0;
pub const KEY_VALUE_PRESS: i32 = 1;
pub const KEY_VALUE_REPEAT: i32 = 2;

/// Codes below this are keyboard keys; `BTN_*` codes start here.
pub const FIRST_BUTTON_CODE: u16 = BTN_MISC;

/// Human readable name for an event type, used in log lines and raw event output.
#[must_use]
pub fn event_type_name(kind: u16) -> &'static str {
    match kind {
        EV_SYN => "SYN",
        EV_KEY => "KEY",
        EV_REL => "REL",
        EV_ABS => "ABS",
        EV_MSC => "MSC",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(EV_SYN, "SYN")]
    #[test_case(EV_KEY, "KEY")]
    #[test_case(EV_REL, "REL")]
    #[test_case(EV_ABS, "ABS")]
    #[test_case(EV_MSC, "MSC")]
    #[test_case(0x15, "UNKNOWN")]
    fn names_event_types(kind: u16, expected: &str) {
        assert_eq!(event_type_name(kind), expected);
    }
}

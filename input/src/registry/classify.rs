// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::Capabilities;
use crate::{DeviceClass, NamePattern};

/// Deterministic classification: the first name pattern that matches wins, otherwise
/// the capability fingerprint decides.
///
/// | Fingerprint                                  | Class      |
/// | :------------------------------------------- | :--------- |
/// | `ABS_MT_POSITION_X` + `ABS_MT_POSITION_Y`    | `touch`    |
/// | `ABS_X` + `ABS_Y` + `BTN_TOUCH`              | `touch`    |
/// | `REL_X` + `REL_Y`                            | `mouse`    |
/// | `MSC_SCAN` + keys, no LEDs                   | `remote`   |
/// | keyboard key codes                           | `keyboard` |
/// | anything else                                | `other`    |
#[must_use]
pub fn classify(
    name: &str,
    capabilities: &Capabilities,
    name_patterns: &[NamePattern],
) -> DeviceClass {
    classify_by_name(name, name_patterns)
        .unwrap_or_else(|| classify_by_capabilities(capabilities))
}

#[must_use]
pub fn classify_by_name(name: &str, name_patterns: &[NamePattern]) -> Option<DeviceClass> {
    let name = name.to_ascii_lowercase();
    name_patterns
        .iter()
        .find(|pattern| name.contains(&pattern.needle.to_ascii_lowercase()))
        .map(|pattern| pattern.class)
}

#[must_use]
pub fn classify_by_capabilities(capabilities: &Capabilities) -> DeviceClass {
    if capabilities.has_multitouch_position() || capabilities.has_single_touch() {
        DeviceClass::Touch
    } else if capabilities.has_relative_xy() {
        DeviceClass::Mouse
    } else if capabilities.has_scan_codes()
        && capabilities.has_any_keys()
        && !capabilities.has_leds()
    {
        DeviceClass::Remote
    } else if capabilities.has_keyboard_keys() {
        DeviceClass::Keyboard
    } else {
        DeviceClass::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CapabilityBitmap, default_name_patterns};
    use test_case::test_case;

    fn caps(ev: &str, key: &str, rel: &str, abs: &str, msc: &str) -> Capabilities {
        let parse = |text: &str| CapabilityBitmap::parse(text, 32).unwrap();
        Capabilities {
            ev: parse(ev),
            key: parse(key),
            rel: parse(rel),
            abs: parse(abs),
            msc: parse(msc),
        }
    }

    // ABS_MT_POSITION_X/Y are bits 53 and 54: word 1, bits 21 and 22.
    #[test_case(caps("b", "0", "0", "600000 3", "0"), DeviceClass::Touch ; "multitouch")]
    // BTN_TOUCH (330) is word 10, bit 10.
    #[test_case(caps("b", "400 0 0 0 0 0 0 0 0 0 0", "0", "3", "0"), DeviceClass::Touch ; "single touch")]
    #[test_case(caps("7", "70000 0 0 0 0 0 0 0 0", "103", "0", "0"), DeviceClass::Mouse ; "mouse")]
    #[test_case(caps("13", "fffffffe", "0", "0", "10"), DeviceClass::Remote ; "remote")]
    // EV_LED (0x11) is set, so MSC_SCAN doesn't make it a remote.
    #[test_case(caps("120013", "fffffffe", "0", "0", "10"), DeviceClass::Keyboard ; "usb keyboard")]
    #[test_case(caps("3", "0", "0", "0", "0"), DeviceClass::Other ; "nothing")]
    fn classifies_by_fingerprint(capabilities: Capabilities, expected: DeviceClass) {
        assert_eq!(classify("Unnamed", &capabilities, &[]), expected);
    }

    #[test]
    fn name_pattern_wins_over_fingerprint() {
        let mouse_caps = caps("7", "70000 0 0 0 0 0 0 0 0", "103", "0", "0");
        assert_eq!(
            classify("FT5406 memory based driver", &mouse_caps, &default_name_patterns()),
            DeviceClass::Touch
        );
        assert_eq!(
            classify("Logitech USB Optical Mouse", &Capabilities::default(), &default_name_patterns()),
            DeviceClass::Mouse
        );
    }
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{ABS_MT_POSITION_X, ABS_MT_POSITION_Y, ABS_X, ABS_Y, BTN_TOUCH,
            FIRST_BUTTON_CODE, MSC_SCAN, REL_X, REL_Y};
use smallvec::SmallVec;
use std::num::ParseIntError;

/// Event type bit for LEDs in the `ev` bitmap. Keyboards have it, remote receivers
/// don't.
pub const EV_LED: u16 = 0x11;

/// A sysfs capability bitmap such as `120013` or `3 0 0 fffffffe`. Words are printed
/// most significant first, each `long` wide.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CapabilityBitmap {
    /// Least significant word first.
    words: SmallVec<[u64; 8]>,
    word_bits: u32,
}

impl CapabilityBitmap {
    /// # Errors
    ///
    /// Returns an error if a word is not hexadecimal.
    pub fn parse(text: &str, word_bits: u32) -> Result<Self, ParseIntError> {
        let mut words = text
            .split_whitespace()
            .map(|word| u64::from_str_radix(word, 16))
            .collect::<Result<SmallVec<[u64; 8]>, _>>()?;
        words.reverse();
        Ok(Self { words, word_bits })
    }

    #[must_use]
    pub fn contains(&self, bit: u16) -> bool {
        if self.word_bits == 0 {
            return false;
        }
        let bit = u32::from(bit);
        let index = (bit / self.word_bits) as usize;
        let offset = bit % self.word_bits;
        self.words
            .get(index)
            .is_some_and(|word| word & (1_u64 << offset) != 0)
    }

    /// True if any bit in `range` is set.
    #[must_use]
    pub fn any_in(&self, range: std::ops::Range<u16>) -> bool {
        range.into_iter().any(|bit| self.contains(bit))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.words.iter().all(|word| *word == 0) }
}

/// The capability bitmaps the classifier looks at.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub ev: CapabilityBitmap,
    pub key: CapabilityBitmap,
    pub rel: CapabilityBitmap,
    pub abs: CapabilityBitmap,
    pub msc: CapabilityBitmap,
}

impl Capabilities {
    #[must_use]
    pub fn has_multitouch_position(&self) -> bool {
        self.abs.contains(ABS_MT_POSITION_X) && self.abs.contains(ABS_MT_POSITION_Y)
    }

    #[must_use]
    pub fn has_single_touch(&self) -> bool {
        self.abs.contains(ABS_X) && self.abs.contains(ABS_Y) && self.key.contains(BTN_TOUCH)
    }

    #[must_use]
    pub fn has_relative_xy(&self) -> bool {
        self.rel.contains(REL_X) && self.rel.contains(REL_Y)
    }

    #[must_use]
    pub fn has_scan_codes(&self) -> bool { self.msc.contains(MSC_SCAN) }

    #[must_use]
    pub fn has_keyboard_keys(&self) -> bool { self.key.any_in(1..FIRST_BUTTON_CODE) }

    #[must_use]
    pub fn has_any_keys(&self) -> bool { !self.key.is_empty() }

    #[must_use]
    pub fn has_leds(&self) -> bool { self.ev.contains(EV_LED) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("0", 32, 0, false)]
    #[test_case("1", 32, 0, true)]
    #[test_case("120013", 32, 4, true)]
    #[test_case("120013", 32, 5, false)]
    #[test_case("400 0", 32, 42, true)]
    #[test_case("400 0", 64, 42, false)]
    #[test_case("400 0", 64, 74, true)]
    fn tests_bits(text: &str, word_bits: u32, bit: u16, expected: bool) {
        let bitmap = CapabilityBitmap::parse(text, word_bits).unwrap();
        assert_eq!(bitmap.contains(bit), expected);
    }

    #[test]
    fn btn_touch_in_multi_word_key_bitmap() {
        // BTN_TOUCH is 0x14a = 330 = word 10, bit 10 with 32 bit words.
        let text = "400 0 0 0 0 0 0 0 0 0 0";
        let bitmap = CapabilityBitmap::parse(text, 32).unwrap();
        assert!(bitmap.contains(BTN_TOUCH));
        assert!(!bitmap.any_in(1..FIRST_BUTTON_CODE));
    }

    #[test]
    fn rejects_non_hex() {
        assert!(CapabilityBitmap::parse("12 zz", 32).is_err());
    }
}

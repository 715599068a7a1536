// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use rustc_hash::FxHashSet;
use std::hash::Hash;

/// Remembers which keys have already been reported so a noisy condition is logged once
/// instead of once per record.
#[derive(Debug, Clone)]
pub struct WarnOnce<K: Eq + Hash> {
    seen: FxHashSet<K>,
}

impl<K: Eq + Hash> Default for WarnOnce<K> {
    fn default() -> Self {
        Self {
            seen: FxHashSet::default(),
        }
    }
}

impl<K: Eq + Hash> WarnOnce<K> {
    /// Returns `true` the first time `key` is seen, `false` afterwards.
    pub fn first_time(&mut self, key: K) -> bool { self.seen.insert(key) }

    #[must_use]
    pub fn len(&self) -> usize { self.seen.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.seen.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_each_key_once() {
        let mut warn_once = WarnOnce::<(u16, u16)>::default();
        assert!(warn_once.first_time((3, 0x30)));
        assert!(!warn_once.first_time((3, 0x30)));
        assert!(warn_once.first_time((4, 0x30)));
        assert_eq!(warn_once.len(), 2);
    }
}

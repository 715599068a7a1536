// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use rand::{Rng, rngs::ThreadRng};

const PET_NAMES: [&str; 20] = [
    "buddy", "max", "bella", "charlie", "lucy", "daisy", "molly", "lola", "sadie",
    "maggie", "bailey", "sophie", "chloe", "duke", "lily", "rocky", "jack", "cooper",
    "riley", "zoey",
];

const FRUIT_NAMES: [&str; 20] = [
    "apple",
    "banana",
    "orange",
    "pear",
    "peach",
    "strawberry",
    "grape",
    "kiwi",
    "mango",
    "pineapple",
    "watermelon",
    "cherry",
    "blueberry",
    "raspberry",
    "lemon",
    "lime",
    "grapefruit",
    "plum",
    "apricot",
    "pomegranate",
];

#[must_use]
pub fn generate_friendly_random_id() -> String {
    let mut rng: ThreadRng = rand::rng();

    let pet = PET_NAMES[rng.random_range(0..PET_NAMES.len())];
    let fruit = FRUIT_NAMES[rng.random_range(0..FRUIT_NAMES.len())];
    let number: u32 = rng.random_range(0..1_000_000);

    format!("{pet}-{fruit}-{number:06}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_has_three_dash_separated_parts() {
        let id = generate_friendly_random_id();
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert!(PET_NAMES.contains(&parts[0]));
        assert!(FRUIT_NAMES.contains(&parts[1]));
        assert_eq!(parts[2].len(), 6);
    }
}

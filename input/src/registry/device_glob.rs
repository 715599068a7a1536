// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{io::ErrorKind,
          path::{Path, PathBuf}};

/// Expand a device glob such as `/dev/input/event*`. The directory part is literal; the
/// file name part may use `*` and `?`. Results are sorted so that `event2` comes before
/// `event10`. A missing directory yields no matches.
///
/// # Errors
///
/// Returns an error if the directory exists but can't be read.
pub fn expand_device_glob(pattern: &str) -> std::io::Result<Vec<PathBuf>> {
    let pattern_path = Path::new(pattern);
    let (dir, file_pattern) = match (pattern_path.parent(), pattern_path.file_name()) {
        (Some(dir), Some(file_pattern)) => (dir, file_pattern.to_string_lossy()),
        _ => return Ok(vec![]),
    };
    let dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(vec![]),
        Err(err) => return Err(err),
    };

    let mut acc = vec![];
    for entry in entries {
        let entry = entry?;
        let file_name = entry.file_name();
        if wildcard_match(&file_pattern, &file_name.to_string_lossy()) {
            acc.push(entry.path());
        }
    }
    acc.sort_by(|lhs, rhs| natural_key(lhs).cmp(&natural_key(rhs)));
    Ok(acc)
}

/// Glob match supporting `*` (any run) and `?` (one char).
#[must_use]
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star_p, star_t)) => {
                    p = star_p + 1;
                    t = star_t + 1;
                    backtrack = Some((star_p, star_t + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|c| *c == '*')
}

/// `event10` sorts as `("event", 10)`.
fn natural_key(path: &Path) -> (String, u64) {
    let name = path
        .file_name()
        .map(|it| it.to_string_lossy().into_owned())
        .unwrap_or_default();
    let digits_start = name
        .char_indices()
        .rev()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(0, |(index, c)| index + c.len_utf8());
    let number = name[digits_start..].parse().unwrap_or(0);
    (name[..digits_start].to_string(), number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::try_create_temp_dir;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("event*", "event0", true)]
    #[test_case("event*", "event12", true)]
    #[test_case("event*", "mouse0", false)]
    #[test_case("event?", "event3", true)]
    #[test_case("event?", "event13", false)]
    #[test_case("*0", "event10", true)]
    #[test_case("ev*t*", "event7", true)]
    #[test_case("event3", "event3", true)]
    fn matches_wildcards(pattern: &str, text: &str, expected: bool) {
        assert_eq!(wildcard_match(pattern, text), expected);
    }

    #[test]
    fn expands_and_sorts_naturally() {
        let dir = try_create_temp_dir().unwrap();
        for name in ["event10", "event2", "mouse0", "event0"] {
            std::fs::write(dir.join(name), b"").unwrap();
        }
        let pattern = dir.join("event*");
        let found = expand_device_glob(pattern.to_str().unwrap()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|it| it.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["event0", "event2", "event10"]);
    }

    #[test]
    fn missing_directory_is_empty() {
        let found = expand_device_glob("/definitely/not/here/event*").unwrap();
        assert!(found.is_empty());
    }
}

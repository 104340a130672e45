use std::collections::HashSet;

use unicode_normalization::UnicodeNormalization;

use super::is_combining_mark;

/// Turns a title into a URL-safe identifier.
///
/// Lowercases, strips diacritics, drops everything outside `[a-z0-9\s-]`,
/// trims, then joins whitespace runs and repeated hyphens into a single `-`.
/// A title made only of disallowed characters yields an empty string.
#[must_use]
pub fn generate_slug(title: &str) -> String {
    let filtered: String = title
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .collect();

    let mut slug = String::with_capacity(filtered.len());
    let mut prev_dash = false;
    for c in filtered.trim().chars() {
        if c.is_whitespace() || c == '-' {
            if !prev_dash {
                slug.push('-');
                prev_dash = true;
            }
        } else {
            slug.push(c);
            prev_dash = false;
        }
    }
    slug
}

/// Returns `base` if unused, otherwise the first of `base-1`, `base-2`, ...
/// that is not in `taken`.
#[must_use]
pub fn unique_slug(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }

    let mut counter: u64 = 1;
    loop {
        let candidate = format!("{base}-{counter}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

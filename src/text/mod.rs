//! Pure text helpers: slugs and the normalized keys used for duplicate detection.

mod normalize;
mod slug;

pub use normalize::{DateInput, normalize_date, normalize_text, parse_date, parse_timestamp};
pub use slug::{generate_slug, unique_slug};

/// Combining diacritical marks block stripped after NFD decomposition.
fn is_combining_mark(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}

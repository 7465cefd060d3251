//! Text canonicalization for name comparison.
//!
//! Every name comparison in the engine goes through [`normalize`] on
//! both sides, so "Farfetch'd", "FARFETCH’D" and "farfetch’d" all land
//! on the same key. Non-Latin scripts pass through untouched apart
//! from trimming; case folding is a no-op there.

/// Canonical form of a name or search term.
///
/// Trims surrounding whitespace, lowercases, and folds the typographic
/// apostrophe and double-quote variants to one form each. Symbols that
/// distinguish real names (`♂`, `♀`, `?`, `!`) are kept as-is.
/// Idempotent: applying it twice changes nothing.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.trim().chars() {
        match ch {
            '\'' | '`' | 'ʼ' | '‘' => out.push('’'),
            '“' | '”' => out.push('"'),
            _ => out.extend(ch.to_lowercase()),
        }
    }
    out
}

//! Search-artifact layer.
//!
//! - **[`tantivy`]**: artifact schema, tokenizer registration, and the
//!   writer side used when (re)building the artifact.
//! - **[`query`]**: read-only adapter serving exact, prefix and fuzzy
//!   queries; fails fast when the artifact is absent.

pub mod query;
pub mod tantivy;

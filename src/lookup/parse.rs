//! The query mini-language: `[ qualifiers ] [ ':' term ]`.
//!
//! Qualifiers are a comma-separated list of `@<lang>` and `<table>`
//! tokens before the first `:`. A query without a `:` is all term. A
//! bare leading `:` asks for resolution through the search artifact.
//! Unknown qualifier tokens are dropped, never rejected — a malformed
//! qualifier degrades the scope, it does not fail the lookup.

use std::collections::BTreeSet;

use tracing::debug;

use crate::model::TableKind;

/// Effective search scope. `None` per dimension means unrestricted;
/// `Some(empty)` means nothing is permitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    pub tables: Option<BTreeSet<TableKind>>,
    pub languages: Option<BTreeSet<String>>,
}

impl Scope {
    pub fn allows_table(&self, table: TableKind) -> bool {
        self.tables.as_ref().map_or(true, |t| t.contains(&table))
    }

    pub fn allows_language(&self, language: &str) -> bool {
        self.languages.as_ref().map_or(true, |l| l.contains(language))
    }

    /// Permitted tables in priority order.
    pub fn tables(&self) -> Vec<TableKind> {
        match &self.tables {
            Some(set) => set.iter().copied().collect(),
            None => TableKind::ALL.to_vec(),
        }
    }

    /// Per-dimension intersection: a dimension narrowed by both sides
    /// keeps only the overlap; narrowed by one side, that side wins.
    pub fn intersect(self, other: Scope) -> Scope {
        Scope {
            tables: match (self.tables, other.tables) {
                (Some(a), Some(b)) => Some(a.intersection(&b).copied().collect()),
                (a, b) => a.or(b),
            },
            languages: match (self.languages, other.languages) {
                (Some(a), Some(b)) => Some(a.intersection(&b).cloned().collect()),
                (a, b) => a.or(b),
            },
        }
    }
}

/// A parsed lookup query; lives for one call.
#[derive(Debug, Clone)]
pub struct Query {
    pub raw: String,
    pub scope: Scope,
    pub term: String,
    pub force_index: bool,
}

/// Builds a scope from qualifier tokens (`@<lang>` or `<table>`).
/// Language tokens are validated against the languages actually
/// present in the catalog; table tokens against the closed table set.
pub fn scope_from_tokens<'a, I>(tokens: I, known_languages: &BTreeSet<String>) -> Scope
where
    I: IntoIterator<Item = &'a str>,
{
    let mut tables = BTreeSet::new();
    let mut languages = BTreeSet::new();
    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if let Some(lang) = token.strip_prefix('@') {
            let lang = lang.to_lowercase();
            if known_languages.contains(&lang) {
                languages.insert(lang);
            } else {
                debug!(token, "dropping unknown language qualifier");
            }
        } else if let Some(table) = TableKind::parse(token) {
            tables.insert(table);
        } else {
            debug!(token, "dropping unknown table qualifier");
        }
    }
    Scope {
        tables: (!tables.is_empty()).then_some(tables),
        languages: (!languages.is_empty()).then_some(languages),
    }
}

/// Splits a raw query on its first `:` into qualifiers and term.
pub fn parse(raw: &str, known_languages: &BTreeSet<String>) -> Query {
    let (qualifiers, term) = match raw.find(':') {
        Some(pos) => (&raw[..pos], &raw[pos + 1..]),
        None => ("", raw),
    };
    let force_index = raw.contains(':') && qualifiers.trim().is_empty();
    Query {
        raw: raw.to_string(),
        scope: scope_from_tokens(qualifiers.split(','), known_languages),
        term: term.trim().to_string(),
        force_index,
    }
}

//! The immutable in-memory candidate index.
//!
//! Built once from the catalog, then only read: exact-name, ID,
//! wildcard and random resolution all run against these maps without
//! touching the on-disk search artifact. Rows are shared as
//! `Arc<Row>` so concurrent lookups never copy or lock.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use rand::seq::SliceRandom;
use regex::Regex;
use tracing::debug;

use crate::lookup::parse::Scope;
use crate::model::{NameRef, Row, TableKind, DEFAULT_LANGUAGE};
use crate::normalize::normalize;

pub struct CandidateIndex {
    tables: BTreeMap<TableKind, BTreeMap<u32, Arc<Row>>>,
    by_name: HashMap<String, Vec<NameRef>>,
    languages: BTreeSet<String>,
}

impl CandidateIndex {
    pub fn build(rows: Vec<Row>) -> Self {
        let mut tables: BTreeMap<TableKind, BTreeMap<u32, Arc<Row>>> = BTreeMap::new();
        let mut by_name: HashMap<String, Vec<NameRef>> = HashMap::new();
        let mut languages = BTreeSet::new();
        let mut entries = 0usize;

        for row in rows {
            let row = Arc::new(row);
            for (language, name) in &row.names {
                languages.insert(language.clone());
                by_name.entry(normalize(name)).or_default().push(NameRef {
                    table: row.table,
                    id: row.id,
                    language: language.clone(),
                });
                entries += 1;
            }
            tables.entry(row.table).or_default().insert(row.id, row);
        }

        debug!(
            rows = tables.values().map(|t| t.len()).sum::<usize>(),
            entries,
            languages = languages.len(),
            "candidate index built"
        );
        Self {
            tables,
            by_name,
            languages,
        }
    }

    pub fn get(&self, table: TableKind, id: u32) -> Option<&Arc<Row>> {
        self.tables.get(&table).and_then(|t| t.get(&id))
    }

    /// Language codes observed in the catalog; qualifier validation
    /// checks against this set.
    pub fn languages(&self) -> &BTreeSet<String> {
        &self.languages
    }

    /// Every name entry equal to the normalized term, across all
    /// permitted tables and languages. Collisions are the point: this
    /// never stops at the first hit.
    pub fn lookup_exact(&self, term: &str, scope: &Scope) -> Vec<(Arc<Row>, String)> {
        let entries = match self.by_name.get(&normalize(term)) {
            Some(entries) => entries,
            None => return Vec::new(),
        };
        let mut hits: Vec<(Arc<Row>, String)> = Vec::new();
        for entry in entries {
            if !scope.allows_table(entry.table) || !scope.allows_language(&entry.language) {
                continue;
            }
            if let Some(row) = self.get(entry.table, entry.id) {
                push_hit(&mut hits, row, &entry.language);
            }
        }
        hits.sort_by_key(|(row, _)| (row.table, row.id));
        hits
    }

    /// At most one row per permitted table whose id equals the
    /// all-digit term, in table priority order.
    pub fn lookup_id(&self, term: &str, scope: &Scope) -> Vec<Arc<Row>> {
        let id: u32 = match term.parse() {
            Ok(id) => id,
            Err(_) => return Vec::new(),
        };
        scope
            .tables()
            .into_iter()
            .filter_map(|table| self.get(table, id))
            .map(Arc::clone)
            .collect()
    }

    /// Glob lookup: `*` matches any run, `?` one character, both over
    /// normalized names. The full match set comes back ordered by
    /// `(table priority, id)`.
    pub fn lookup_wildcard(&self, pattern: &str, scope: &Scope) -> Vec<(Arc<Row>, String)> {
        let re = match glob_regex(&normalize(pattern)) {
            Some(re) => re,
            None => return Vec::new(),
        };
        let mut hits: Vec<(Arc<Row>, String)> = Vec::new();
        for (text, entries) in &self.by_name {
            if !re.is_match(text) {
                continue;
            }
            for entry in entries {
                if !scope.allows_table(entry.table) || !scope.allows_language(&entry.language) {
                    continue;
                }
                if let Some(row) = self.get(entry.table, entry.id) {
                    push_hit(&mut hits, row, &entry.language);
                }
            }
        }
        hits.sort_by_key(|(row, _)| (row.table, row.id));
        hits
    }

    /// One uniform draw over the permitted tables' rows. An empty
    /// permitted universe yields `None`, not an error.
    pub fn random(&self, scope: &Scope) -> Option<Arc<Row>> {
        let pool: Vec<&Arc<Row>> = scope
            .tables()
            .iter()
            .filter_map(|table| self.tables.get(table))
            .flat_map(|rows| rows.values())
            .collect();
        let mut rng = rand::thread_rng();
        pool.choose(&mut rng).map(|row| Arc::clone(row))
    }
}

/// One hit per row. A row whose default-language name and translated
/// name both match keeps the default-language tag.
fn push_hit(hits: &mut Vec<(Arc<Row>, String)>, row: &Arc<Row>, language: &str) {
    if let Some(existing) = hits
        .iter_mut()
        .find(|(r, _)| r.table == row.table && r.id == row.id)
    {
        if language == DEFAULT_LANGUAGE {
            existing.1 = language.to_string();
        }
        return;
    }
    hits.push((Arc::clone(row), language.to_string()));
}

fn glob_regex(pattern: &str) -> Option<Regex> {
    let mut re = String::with_capacity(pattern.len() + 2);
    re.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            _ => re.push_str(&regex::escape(&ch.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::parse::scope_from_tokens;

    fn row(table: TableKind, id: u32, names: &[(&str, &str)]) -> Row {
        Row {
            table,
            id,
            names: names
                .iter()
                .map(|(l, n)| (l.to_string(), n.to_string()))
                .collect(),
        }
    }

    fn index() -> CandidateIndex {
        CandidateIndex::build(vec![
            row(TableKind::Species, 133, &[("en", "Eevee"), ("fr", "Evoli")]),
            row(TableKind::Species, 5, &[("en", "Charmeleon")]),
            row(TableKind::Move, 33, &[("en", "Tackle"), ("fr", "Charge")]),
            row(TableKind::Move, 268, &[("en", "Charge")]),
            row(TableKind::Move, 1, &[("en", "Pound")]),
            row(TableKind::Item, 1, &[("en", "Master Ball")]),
            row(TableKind::Type, 1, &[("en", "Normal")]),
        ])
    }

    fn scope(tokens: &[&str], idx: &CandidateIndex) -> Scope {
        scope_from_tokens(tokens.iter().copied(), idx.languages())
    }

    #[test]
    fn exact_returns_every_collision() {
        let idx = index();
        let hits = idx.lookup_exact("charge", &Scope::default());
        assert_eq!(hits.len(), 2);
        // ordered by (table priority, id): Tackle (33) before Charge (268)
        assert_eq!(hits[0].0.name(), "Tackle");
        assert_eq!(hits[0].1, "fr");
        assert_eq!(hits[1].0.name(), "Charge");
        assert_eq!(hits[1].1, "en");
    }

    #[test]
    fn exact_honors_language_scope() {
        let idx = index();
        let s = scope(&["@fr"], &idx);
        let hits = idx.lookup_exact("charge", &s);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0.name(), "Tackle");
    }

    #[test]
    fn id_lookup_spans_permitted_tables() {
        let idx = index();
        let hits = idx.lookup_id("1", &Scope::default());
        let tables: Vec<TableKind> = hits.iter().map(|r| r.table).collect();
        assert_eq!(tables, vec![TableKind::Move, TableKind::Item, TableKind::Type]);

        let s = scope(&["item"], &idx);
        let hits = idx.lookup_id("1", &s);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name(), "Master Ball");
    }

    #[test]
    fn wildcard_matches_normalized_names() {
        let idx = index();
        let hits = idx.lookup_wildcard("*meleon", &Scope::default());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0.name(), "Charmeleon");

        let hits = idx.lookup_wildcard("ee?ee", &Scope::default());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0.name(), "Eevee");
    }

    #[test]
    fn random_draws_from_the_scoped_table() {
        let idx = index();
        let s = scope(&["move"], &idx);
        for _ in 0..10 {
            let row = idx.random(&s).unwrap();
            assert_eq!(row.table, TableKind::Move);
        }
    }

    #[test]
    fn random_over_empty_universe_is_none() {
        let idx = index();
        let s = scope(&["move"], &idx).intersect(scope(&["item"], &idx));
        assert!(idx.random(&s).is_none());
    }
}

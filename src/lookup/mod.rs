//! Lookup facade: parse → strategy dispatch → rank.
//!
//! This module orchestrates the whole resolution pipeline:
//!
//! - **[`parse`]**: the `[qualifiers][':'term]` query mini-language.
//! - **[`candidate`]**: the in-memory index behind exact/ID/wildcard/
//!   random strategies.
//! - [`LookupEngine`]: strategy selection, artifact fallback, and the
//!   two-tier ordering (exact before fuzzy).

pub mod candidate;
pub mod parse;

use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::error::LookupError;
use crate::model::{Row, DEFAULT_LANGUAGE};
use crate::normalize::normalize;
use crate::search::query::{NameHit, SearchIndex};

use self::candidate::CandidateIndex;
use self::parse::{parse, scope_from_tokens, Scope};

/// Cap on candidates pulled from the search artifact per query.
const SEARCH_LIMIT: usize = 20;

/// One resolved candidate.
#[derive(Debug, Clone)]
pub struct LookupResult {
    pub row: Arc<Row>,
    /// Set when the match came through a non-default-language name.
    pub language: Option<String>,
    /// Direct normalized-name or id equality, as opposed to a
    /// similarity-ranked hit.
    pub exact: bool,
    /// Rank key: 1.0 for exact hits, similarity in (0, 1] for fuzzy.
    pub score: f32,
}

impl LookupResult {
    pub fn name(&self) -> &str {
        self.row.name()
    }

    fn exact_by_id(row: Arc<Row>) -> Self {
        Self {
            row,
            language: None,
            exact: true,
            score: 1.0,
        }
    }

    fn exact_by_name(row: Arc<Row>, language: String) -> Self {
        Self {
            language: (language != DEFAULT_LANGUAGE).then_some(language),
            row,
            exact: true,
            score: 1.0,
        }
    }
}

/// The resolution engine.
///
/// Holds the immutable candidate index and the location of the
/// on-disk search artifact. The artifact is opened once, on the first
/// index-dependent call; lookups never mutate anything, so arbitrarily
/// many may run concurrently.
pub struct LookupEngine {
    index: CandidateIndex,
    artifact_dir: PathBuf,
    search: OnceLock<SearchIndex>,
}

impl LookupEngine {
    pub fn new(rows: Vec<Row>, artifact_dir: impl Into<PathBuf>) -> Self {
        Self {
            index: CandidateIndex::build(rows),
            artifact_dir: artifact_dir.into(),
            search: OnceLock::new(),
        }
    }

    /// Resolves a raw query to an ordered list of candidates.
    ///
    /// `valid_types` narrows the search the same way in-string
    /// qualifiers do (`@<lang>` or table tokens); when both restrict a
    /// dimension, the intersection wins. Zero matches is `Ok(vec![])`;
    /// the only error is a missing artifact on an index-dependent
    /// path.
    pub fn lookup(
        &self,
        raw: &str,
        valid_types: &[&str],
    ) -> Result<Vec<LookupResult>, LookupError> {
        let query = parse(raw, self.index.languages());
        let caller_scope = scope_from_tokens(valid_types.iter().copied(), self.index.languages());
        let scope = query.scope.clone().intersect(caller_scope);
        let term = query.term.as_str();

        if term.eq_ignore_ascii_case("random") {
            return Ok(self
                .index
                .random(&scope)
                .into_iter()
                .map(LookupResult::exact_by_id)
                .collect());
        }

        if !term.is_empty() && term.chars().all(|c| c.is_ascii_digit()) {
            let hits = self.index.lookup_id(term, &scope);
            if !hits.is_empty() {
                return Ok(hits.into_iter().map(LookupResult::exact_by_id).collect());
            }
            debug!(term, "no row carries this id; falling through");
        }

        if term.contains('*') || term.contains('?') {
            return Ok(self
                .index
                .lookup_wildcard(term, &scope)
                .into_iter()
                .map(|(row, language)| LookupResult::exact_by_name(row, language))
                .collect());
        }

        if query.force_index {
            return self.lookup_via_artifact(term, &scope);
        }

        let hits = self.index.lookup_exact(term, &scope);
        if !hits.is_empty() {
            return Ok(hits
                .into_iter()
                .map(|(row, language)| LookupResult::exact_by_name(row, language))
                .collect());
        }

        let hits = self.artifact()?.fuzzy_search(term, &scope, SEARCH_LIMIT)?;
        Ok(self.rank_fuzzy(term, hits))
    }

    /// Prefix completion through the search artifact, most relevant
    /// first. A prefix with no matches yields an empty list; guarding
    /// an index into it is the caller's job.
    pub fn prefix_lookup(&self, prefix: &str) -> Result<Vec<LookupResult>, LookupError> {
        let hits = self.artifact()?.prefix_search(prefix, SEARCH_LIMIT)?;
        let mut results: Vec<LookupResult> = Vec::new();
        for hit in hits {
            let row = match self.index.get(hit.table, hit.row_id) {
                Some(row) => row,
                None => continue,
            };
            if results
                .iter()
                .any(|r| r.row.table == hit.table && r.row.id == hit.row_id)
            {
                continue;
            }
            results.push(LookupResult {
                row: Arc::clone(row),
                language: (hit.language != DEFAULT_LANGUAGE).then_some(hit.language),
                exact: false,
                score: hit.score,
            });
        }
        Ok(results)
    }

    /// The bare-leading-`:` path: resolve through the artifact even
    /// though the term would normally hit the in-memory index. Must
    /// agree with the in-memory result when the artifact exists, and
    /// fail fast when it does not.
    fn lookup_via_artifact(
        &self,
        term: &str,
        scope: &Scope,
    ) -> Result<Vec<LookupResult>, LookupError> {
        let search = self.artifact()?;
        let exact = search.exact_search(term, scope, SEARCH_LIMIT)?;
        if !exact.is_empty() {
            let mut results: Vec<LookupResult> = Vec::new();
            for hit in exact {
                let row = match self.index.get(hit.table, hit.row_id) {
                    Some(row) => row,
                    None => continue,
                };
                if let Some(existing) = results
                    .iter_mut()
                    .find(|r| r.row.table == hit.table && r.row.id == hit.row_id)
                {
                    if hit.language == DEFAULT_LANGUAGE {
                        existing.language = None;
                    }
                    continue;
                }
                results.push(LookupResult {
                    row: Arc::clone(row),
                    language: (hit.language != DEFAULT_LANGUAGE).then_some(hit.language),
                    exact: true,
                    score: 1.0,
                });
            }
            results.sort_by_key(|r| (r.row.table, r.row.id));
            return Ok(results);
        }
        let hits = search.fuzzy_search(term, scope, SEARCH_LIMIT)?;
        Ok(self.rank_fuzzy(term, hits))
    }

    /// Re-ranks artifact candidates by similarity to the term, one
    /// result per row keeping its best-scoring name.
    fn rank_fuzzy(&self, term: &str, hits: Vec<NameHit>) -> Vec<LookupResult> {
        let canonical = normalize(term);
        let mut results: Vec<LookupResult> = Vec::new();
        for hit in hits {
            let row = match self.index.get(hit.table, hit.row_id) {
                Some(row) => row,
                None => continue,
            };
            let score = similarity(&canonical, &normalize(&hit.name));
            match results
                .iter_mut()
                .find(|r| r.row.table == hit.table && r.row.id == hit.row_id)
            {
                Some(existing) => {
                    if score > existing.score {
                        existing.score = score;
                        existing.language =
                            (hit.language != DEFAULT_LANGUAGE).then_some(hit.language);
                    }
                }
                None => results.push(LookupResult {
                    row: Arc::clone(row),
                    language: (hit.language != DEFAULT_LANGUAGE).then_some(hit.language),
                    exact: false,
                    score,
                }),
            }
        }
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| (a.row.table, a.row.id).cmp(&(b.row.table, b.row.id)))
        });
        results
    }

    /// The artifact handle, opened on first use. Absence surfaces as
    /// the distinguished error rather than an empty result.
    fn artifact(&self) -> Result<&SearchIndex, LookupError> {
        if let Some(search) = self.search.get() {
            return Ok(search);
        }
        let opened = SearchIndex::open(&self.artifact_dir)?;
        Ok(self.search.get_or_init(|| opened))
    }
}

/// Normalized Levenshtein similarity in (0, 1].
fn similarity(a: &str, b: &str) -> f32 {
    if a == b {
        return 1.0;
    }
    let len = a.chars().count().max(b.chars().count());
    if len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f32 / len as f32
}

/// Plain dynamic-programming edit distance over characters.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

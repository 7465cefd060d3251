//! Read-only adapter over the pre-built name-search artifact.
//!
//! Opens the artifact once and serves concurrent exact, prefix and
//! fuzzy queries against it. A missing artifact is a failed
//! precondition, not an empty result: [`SearchIndex::open`] returns
//! [`LookupError::MissingArtifact`] and callers propagate it.

use std::collections::HashSet;
use std::path::Path;

use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, FuzzyTermQuery, Occur, Query, TermQuery};
use tantivy::schema::{IndexRecordOption, Term, Value};
use tantivy::{Index, IndexReader, TantivyDocument};
use tracing::debug;

use crate::error::LookupError;
use crate::lookup::parse::Scope;
use crate::model::TableKind;
use crate::normalize::normalize;
use crate::search::tantivy::{fields_from_schema, Fields};

/// Maximum edit distance for fuzzy candidates.
const FUZZY_DISTANCE: u8 = 2;

/// One name entry pulled back out of the artifact.
#[derive(Debug, Clone)]
pub struct NameHit {
    pub table: TableKind,
    pub row_id: u32,
    pub language: String,
    pub name: String,
    pub score: f32,
}

pub struct SearchIndex {
    reader: IndexReader,
    fields: Fields,
}

impl SearchIndex {
    /// Opens the artifact at `path`. Absence is fatal for the calling
    /// path — the artifact is built out-of-band and a lookup that
    /// needs it cannot proceed without it.
    pub fn open(path: &Path) -> Result<Self, LookupError> {
        if !path.join("meta.json").exists() {
            return Err(LookupError::MissingArtifact {
                path: path.to_path_buf(),
            });
        }
        let index = Index::open_in_dir(path)?;
        let fields = fields_from_schema(&index.schema())?;
        let reader = index.reader()?;
        Ok(Self { reader, fields })
    }

    /// Name entries whose normalized text equals the term.
    pub fn exact_search(
        &self,
        term: &str,
        scope: &Scope,
        limit: usize,
    ) -> Result<Vec<NameHit>, LookupError> {
        let canonical = normalize(term);
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = vec![(
            Occur::Must,
            Box::new(TermQuery::new(
                Term::from_field_text(self.fields.name_exact, &canonical),
                IndexRecordOption::Basic,
            )),
        )];
        clauses.extend(self.scope_clauses(scope));
        self.run(Box::new(BooleanQuery::new(clauses)), limit)
    }

    /// Typo-tolerant candidates within edit distance 2 of the term,
    /// best first per the artifact's scoring.
    pub fn fuzzy_search(
        &self,
        term: &str,
        scope: &Scope,
        limit: usize,
    ) -> Result<Vec<NameHit>, LookupError> {
        let canonical = normalize(term);
        let fuzzy = FuzzyTermQuery::new(
            Term::from_field_text(self.fields.name_exact, &canonical),
            FUZZY_DISTANCE,
            true,
        );
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = vec![(Occur::Must, Box::new(fuzzy))];
        clauses.extend(self.scope_clauses(scope));
        self.run(Box::new(BooleanQuery::new(clauses)), limit)
    }

    /// Name entries with a word starting with the prefix, most
    /// relevant first. No match is an empty sequence, not an error.
    pub fn prefix_search(&self, prefix: &str, limit: usize) -> Result<Vec<NameHit>, LookupError> {
        let canonical = normalize(prefix);
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for token in canonical
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.chars().count() >= 2)
        {
            clauses.push((
                Occur::Must,
                Box::new(TermQuery::new(
                    Term::from_field_text(self.fields.name_prefix, token),
                    IndexRecordOption::Basic,
                )),
            ));
        }
        if clauses.is_empty() {
            debug!(prefix, "prefix below the ngram floor");
            return Ok(Vec::new());
        }
        self.run(Box::new(BooleanQuery::new(clauses)), limit)
    }

    /// Table and language restrictions as Must-of-Should term clauses.
    fn scope_clauses(&self, scope: &Scope) -> Vec<(Occur, Box<dyn Query>)> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        if let Some(tables) = &scope.tables {
            let terms = tables
                .iter()
                .map(|table| {
                    (
                        Occur::Should,
                        Box::new(TermQuery::new(
                            Term::from_field_text(self.fields.table, table.tag()),
                            IndexRecordOption::Basic,
                        )) as Box<dyn Query>,
                    )
                })
                .collect();
            clauses.push((Occur::Must, Box::new(BooleanQuery::new(terms))));
        }
        if let Some(languages) = &scope.languages {
            let terms = languages
                .iter()
                .map(|language| {
                    (
                        Occur::Should,
                        Box::new(TermQuery::new(
                            Term::from_field_text(self.fields.language, language),
                            IndexRecordOption::Basic,
                        )) as Box<dyn Query>,
                    )
                })
                .collect();
            clauses.push((Occur::Must, Box::new(BooleanQuery::new(terms))));
        }
        clauses
    }

    fn run(&self, query: Box<dyn Query>, limit: usize) -> Result<Vec<NameHit>, LookupError> {
        let searcher = self.reader.searcher();
        let top_docs = searcher.search(&query, &TopDocs::with_limit(limit))?;
        let mut hits = Vec::new();
        let mut seen = HashSet::new();
        for (score, addr) in top_docs {
            let doc: TantivyDocument = searcher.doc(addr)?;
            let table = doc
                .get_first(self.fields.table)
                .and_then(|v| v.as_str())
                .and_then(TableKind::parse);
            let table = match table {
                Some(table) => table,
                None => continue,
            };
            let row_id = doc
                .get_first(self.fields.row_id)
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as u32;
            let language = doc
                .get_first(self.fields.language)
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            let name = doc
                .get_first(self.fields.name)
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            if !seen.insert((table, row_id, language.clone())) {
                continue;
            }
            hits.push(NameHit {
                table,
                row_id,
                language,
                name,
                score,
            });
        }
        Ok(hits)
    }
}

//! Schema and writer side of the name-search artifact.
//!
//! The artifact holds one document per name entry `(table, row id,
//! language, text)`. The engine only ever reads it — through
//! [`crate::search::query::SearchIndex`] — and treats absence as
//! fatal; this module is used by the `index` subcommand and test
//! fixtures to build it.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use tantivy::schema::*;
use tantivy::{doc, Index, IndexWriter};
use tracing::info;

use crate::model::Row;
use crate::normalize::normalize;

const SCHEMA_VERSION: &str = "v1";

// Bump when the schema or tokenizer changes. Used to trigger rebuilds.
pub const SCHEMA_HASH: &str = "name-index-v1-edge-ngram";

#[derive(Clone, Copy)]
pub struct Fields {
    pub table: Field,
    pub row_id: Field,
    pub language: Field,
    pub name: Field,
    pub name_exact: Field,
    pub name_prefix: Field,
}

pub struct NameIndexWriter {
    pub index: Index,
    writer: IndexWriter,
    fields: Fields,
}

impl NameIndexWriter {
    pub fn open_or_create(path: &Path) -> Result<Self> {
        let schema = build_schema();
        std::fs::create_dir_all(path)?;

        let meta_path = path.join("schema_hash.json");
        let mut needs_rebuild = true;
        if meta_path.exists() {
            let meta = std::fs::read_to_string(&meta_path)?;
            if meta.contains(SCHEMA_HASH) {
                needs_rebuild = false;
            }
        }

        if needs_rebuild {
            // Recreate the directory completely to avoid stale lock files.
            let _ = std::fs::remove_dir_all(path);
            std::fs::create_dir_all(path)?;
        }

        let mut index = if path.join("meta.json").exists() && !needs_rebuild {
            Index::open_in_dir(path)?
        } else {
            Index::create_in_dir(path, schema.clone())?
        };

        ensure_tokenizer(&mut index);

        std::fs::write(
            &meta_path,
            format!("{{\"schema_hash\":\"{}\"}}", SCHEMA_HASH),
        )?;

        let writer = index
            .writer(50_000_000)
            .map_err(|e| anyhow!("create index writer: {e:?}"))?;
        let fields = fields_from_schema(&schema)?;
        Ok(Self {
            index,
            writer,
            fields,
        })
    }

    pub fn delete_all(&mut self) -> Result<()> {
        self.writer.delete_all_documents()?;
        Ok(())
    }

    /// One document per name entry of the row.
    pub fn add_row(&mut self, row: &Row) -> Result<()> {
        for (language, name) in &row.names {
            let canonical = normalize(name);
            let mut d = doc! {
                self.fields.table => row.table.tag(),
                self.fields.row_id => row.id as u64,
                self.fields.language => language.clone(),
                self.fields.name => name.clone(),
                self.fields.name_exact => canonical.clone(),
            };
            d.add_text(self.fields.name_prefix, generate_edge_ngrams(&canonical));
            self.writer.add_document(d)?;
        }
        Ok(())
    }

    pub fn commit(&mut self) -> Result<()> {
        self.writer.commit()?;
        info!("name index committed");
        Ok(())
    }
}

fn generate_edge_ngrams(text: &str) -> String {
    let mut ngrams = String::with_capacity(text.len() * 2);
    // Split by non-alphanumeric characters to identify words
    for word in text.split(|c: char| !c.is_alphanumeric()) {
        let chars: Vec<char> = word.chars().collect();
        if chars.len() < 2 {
            continue;
        }
        for len in 2..=chars.len().min(20) {
            if !ngrams.is_empty() {
                ngrams.push(' ');
            }
            ngrams.extend(chars[0..len].iter());
        }
    }
    ngrams
}

pub fn build_schema() -> Schema {
    let mut schema_builder = Schema::builder();

    let prefix_opts = TextOptions::default().set_indexing_options(
        TextFieldIndexing::default()
            .set_tokenizer("name_prefix")
            .set_index_option(IndexRecordOption::WithFreqs),
    );

    schema_builder.add_text_field("table", STRING | STORED);
    schema_builder.add_u64_field("row_id", INDEXED | STORED);
    schema_builder.add_text_field("language", STRING | STORED);
    schema_builder.add_text_field("name", STORED);
    schema_builder.add_text_field("name_exact", STRING | STORED);
    schema_builder.add_text_field("name_prefix", prefix_opts);
    schema_builder.build()
}

pub fn fields_from_schema(schema: &Schema) -> tantivy::Result<Fields> {
    Ok(Fields {
        table: schema.get_field("table")?,
        row_id: schema.get_field("row_id")?,
        language: schema.get_field("language")?,
        name: schema.get_field("name")?,
        name_exact: schema.get_field("name_exact")?,
        name_prefix: schema.get_field("name_prefix")?,
    })
}

pub fn index_dir(base: &Path) -> PathBuf {
    base.join("index").join(SCHEMA_VERSION)
}

pub fn ensure_tokenizer(index: &mut Index) {
    use tantivy::tokenizer::{LowerCaser, RemoveLongFilter, SimpleTokenizer, TextAnalyzer};
    let analyzer = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(LowerCaser)
        .filter(RemoveLongFilter::limit(40))
        .build();
    index.tokenizers().register("name_prefix", analyzer);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_ngrams_cover_word_prefixes() {
        let ngrams = generate_edge_ngrams("poké ball");
        let tokens: Vec<&str> = ngrams.split(' ').collect();
        assert!(tokens.contains(&"po"));
        assert!(tokens.contains(&"poké"));
        assert!(tokens.contains(&"ba"));
        assert!(tokens.contains(&"ball"));
        assert!(!tokens.contains(&"é"));
    }

    #[test]
    fn single_char_words_produce_no_ngrams() {
        assert_eq!(generate_edge_ngrams("x"), "");
    }
}

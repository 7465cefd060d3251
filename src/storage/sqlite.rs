use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};
use tracing::{debug, warn};

use super::Dataset;
use crate::model::{Row, TableKind};

/// Catalog stored in SQLite. One table holds every name entry:
///
/// ```sql
/// CREATE TABLE row_names (
///     table_tag TEXT NOT NULL,
///     row_id    INTEGER NOT NULL,
///     language  TEXT NOT NULL,
///     name      TEXT NOT NULL,
///     PRIMARY KEY (table_tag, row_id, language)
/// );
/// ```
pub struct SqliteDataset {
    conn: Connection,
}

impl SqliteDataset {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("open catalog db {}", path.display()))?;
        Ok(Self { conn })
    }
}

impl Dataset for SqliteDataset {
    fn load_rows(&self) -> Result<Vec<Row>> {
        let mut stmt = self
            .conn
            .prepare("SELECT table_tag, row_id, language, name FROM row_names")?;
        let entries = stmt.query_map([], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, i64>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
            ))
        })?;

        let mut grouped: BTreeMap<(TableKind, u32), BTreeMap<String, String>> = BTreeMap::new();
        let mut dropped = 0usize;
        for entry in entries {
            let (tag, id, language, name) = entry?;
            match TableKind::parse(&tag) {
                Some(table) => {
                    grouped
                        .entry((table, id as u32))
                        .or_default()
                        .insert(language, name);
                }
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            warn!(dropped, "skipped name entries with unknown table tags");
        }

        let rows: Vec<Row> = grouped
            .into_iter()
            .map(|((table, id), names)| Row { table, id, names })
            .collect();
        debug!(rows = rows.len(), "catalog loaded");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seed(path: &Path) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE row_names (
                table_tag TEXT NOT NULL,
                row_id    INTEGER NOT NULL,
                language  TEXT NOT NULL,
                name      TEXT NOT NULL,
                PRIMARY KEY (table_tag, row_id, language)
            );
            INSERT INTO row_names VALUES
                ('pokemon_species', 133, 'en', 'Eevee'),
                ('pokemon_species', 133, 'fr', 'Evoli'),
                ('moves', 33, 'en', 'Tackle'),
                ('not_a_table', 1, 'en', 'Ghost entry');
            "#,
        )
        .unwrap();
    }

    #[test]
    fn loads_rows_grouped_by_table_and_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.db");
        seed(&path);

        let rows = SqliteDataset::open(&path).unwrap().load_rows().unwrap();
        assert_eq!(rows.len(), 2);

        let eevee = rows
            .iter()
            .find(|r| r.table == TableKind::Species && r.id == 133)
            .unwrap();
        assert_eq!(eevee.name(), "Eevee");
        assert_eq!(eevee.names.get("fr").unwrap(), "Evoli");
    }
}

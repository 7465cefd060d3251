pub mod error;
pub mod lookup;
pub mod model;
pub mod normalize;
pub mod search;
pub mod storage;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use lookup::LookupEngine;
use search::tantivy::{index_dir, NameIndexWriter};
use storage::sqlite::SqliteDataset;
use storage::Dataset;

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "dex-search",
    version,
    about = "Typo-tolerant multilingual lookup over the game-entity catalog"
)]
pub struct Cli {
    /// Path to the catalog SQLite database (defaults to platform data dir)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Directory holding the search artifact (defaults to platform data dir)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a query string to catalog rows
    Lookup {
        query: String,

        /// Restrict results to these tables / @languages
        #[arg(long = "type")]
        types: Vec<String>,
    },
    /// Complete a name prefix through the search artifact
    Prefix { prefix: String },
    /// (Re)build the search artifact from the catalog
    Index,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let db_path = cli.db.unwrap_or_else(default_db_path);
    let artifact = index_dir(&cli.data_dir.unwrap_or_else(default_data_dir));

    match cli.command {
        Commands::Lookup { query, types } => {
            let engine = load_engine(&db_path, artifact)?;
            let types: Vec<&str> = types.iter().map(String::as_str).collect();
            // A missing artifact propagates out of here and exits the
            // process nonzero; the engine itself never terminates.
            for result in engine.lookup(&query, &types)? {
                println!(
                    "{}\t{}\t{}\t{}",
                    result.row.table.tag(),
                    result.row.id,
                    result.name(),
                    if result.exact { "exact" } else { "fuzzy" },
                );
            }
            Ok(())
        }
        Commands::Prefix { prefix } => {
            let engine = load_engine(&db_path, artifact)?;
            for result in engine.prefix_lookup(&prefix)? {
                println!(
                    "{}\t{}\t{}",
                    result.row.table.tag(),
                    result.row.id,
                    result.name()
                );
            }
            Ok(())
        }
        Commands::Index => build_artifact(&db_path, &artifact),
    }
}

fn load_engine(db_path: &Path, artifact: PathBuf) -> Result<LookupEngine> {
    let rows = SqliteDataset::open(db_path)?.load_rows()?;
    Ok(LookupEngine::new(rows, artifact))
}

fn build_artifact(db_path: &Path, artifact: &Path) -> Result<()> {
    let rows = SqliteDataset::open(db_path)?.load_rows()?;
    let mut writer = NameIndexWriter::open_or_create(artifact)?;
    writer.delete_all()?;
    for row in &rows {
        writer.add_row(row)?;
    }
    writer.commit()?;
    tracing::info!(
        rows = rows.len(),
        dir = %artifact.display(),
        "search artifact built"
    );
    Ok(())
}

fn default_db_path() -> PathBuf {
    default_data_dir().join("catalog.db")
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "dex-search", "dex-search")
        .expect("project dirs available")
        .data_dir()
        .to_path_buf()
}

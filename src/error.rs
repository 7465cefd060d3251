use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the lookup engine.
///
/// Zero matches is never an error — every strategy returns an empty
/// result list for that. The distinguished unrecoverable condition is
/// a missing search artifact on an index-dependent call path: the
/// artifact is a build-time precondition, not a transient state, so
/// the error propagates instead of degrading to "not found". Whether
/// it terminates the process is the outer boundary's call.
#[derive(Debug, Error)]
pub enum LookupError {
    /// An index-dependent operation ran but the on-disk artifact does
    /// not exist.
    #[error("search artifact missing at {} (run `dex-search index` to build it)", path.display())]
    MissingArtifact { path: PathBuf },

    /// The artifact exists but reading or querying it failed.
    #[error(transparent)]
    Search(#[from] tantivy::TantivyError),
}

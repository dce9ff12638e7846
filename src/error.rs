//! Error types for name resolution.
//!
//! Per-row failures are classified by what the row driver should persist:
//! an empty name produces the fixed "Empty row" outcome, and a failed search
//! is recorded as an error outcome for that row only — it never aborts the
//! run. Run-level failures (store, missing input) live with their owners
//! (`store::StoreError`, the CLI).

use thiserror::Error;

/// Errors that can occur while resolving a single row.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The input name contained no usable tokens.
    #[error("empty name")]
    EmptyName,

    /// An external search query failed.
    #[error("search failed: {0}")]
    Search(String),
}

impl From<crate::search::SearchError> for ResolveError {
    fn from(err: crate::search::SearchError) -> Self {
        ResolveError::Search(err.to_string())
    }
}

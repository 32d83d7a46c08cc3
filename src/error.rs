//! Error type shared by every stage of the mirror.
//!
//! Sync and startup errors are fatal to the run. Search callers only ever see
//! `Storage` or `SearchTimeout`; per-row decode failures are absorbed inside
//! the search engine and never surface here.

use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A table or index could not be created.
    #[error("failed to provision {object}: {source}")]
    Schema {
        object: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// A catalog item without an external id; rejects the whole batch.
    #[error("catalog item #{index} ({name:?}) has no external id")]
    MissingId { index: usize, name: String },

    /// A prepared upsert failed for a reason other than a benign conflict.
    #[error("failed to write song {song_id}: {source}")]
    Write {
        song_id: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("catalog fetch failed: {0}")]
    Fetch(String),

    #[error("catalog fetch timed out after {0:?}")]
    FetchTimeout(Duration),

    #[error("malformed catalog response: {0}")]
    MalformedCatalog(#[from] serde_json::Error),

    #[error("search for {query:?} exceeded {timeout:?}")]
    SearchTimeout { query: String, timeout: Duration },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

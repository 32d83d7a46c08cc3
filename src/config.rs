//! Runtime tunables with their defaults.
//!
//! The CLI fills these from flags and environment variables; library callers
//! usually start from `Settings::default()`.

use std::time::Duration;

/// Database file used when neither `--db` nor `JELLYFIN_INDEX_DB` is given.
pub const DEFAULT_DB_FILE: &str = "search.db";

/// Songs written per transaction. Each transaction holds whole songs only.
pub const DEFAULT_BATCH_SIZE: usize = 500;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite VM instructions between search-timeout checks.
pub const PROGRESS_CHECK_OPS: i32 = 1_000;

#[derive(Debug, Clone)]
pub struct Settings {
    /// Upper bound on the whole catalog fetch, including the body read.
    pub fetch_timeout: Duration,
    /// Upper bound on one search query execution.
    pub search_timeout: Duration,
    /// How long a connection waits on a lock held by another connection.
    pub busy_timeout: Duration,
    pub batch_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            search_timeout: DEFAULT_SEARCH_TIMEOUT,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

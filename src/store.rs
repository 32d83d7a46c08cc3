//! File-backed catalog store.
//!
//! A `Store` holds only the database path and settings. Every operation opens
//! its own connection and drops it on return, so concurrent searches never
//! share a statement or connection, and the single sync writer holds its
//! connection only for the length of the run.

use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use crate::config::Settings;
use crate::error::Result;
use crate::models::{CatalogCounts, CatalogEntry, SearchOutcome, SyncStats};
use crate::normalize::normalize_batch;
use crate::progress::{create_spinner, format_duration};
use crate::schema::{ensure_schema, CONNECTION_PRAGMAS};
use crate::scoring::{Scorer, SubstringScorer};
use crate::search::search_with_timeout;
use crate::source::CatalogSource;
use crate::sync::sync_catalog;

#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    settings: Settings,
}

impl Store {
    /// Open (creating if needed) the database at `path` and provision the schema.
    /// Any failure here is fatal: nothing works without the schema.
    pub fn open(path: impl AsRef<Path>, settings: Settings) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let store = Self { path, settings };
        let conn = store.connect()?;
        ensure_schema(&conn)?;
        info!(db = %store.path.display(), "schema ready");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// A fresh connection with the shared pragmas applied.
    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(self.settings.busy_timeout)?;
        conn.execute_batch(CONNECTION_PRAGMAS)?;
        Ok(conn)
    }

    /// Write already-normalized entries.
    pub fn sync(&self, entries: &[CatalogEntry]) -> Result<SyncStats> {
        let mut conn = self.connect()?;
        sync_catalog(&mut conn, entries, self.settings.batch_size)
    }

    /// One full synchronization run: fetch, normalize, write.
    pub fn sync_from(&self, source: &dyn CatalogSource) -> Result<SyncStats> {
        let start = Instant::now();

        let spinner = create_spinner(&format!("Fetching catalog from {}", source.describe()));
        let fetched = source.fetch();
        spinner.finish_and_clear();
        let items = fetched?;

        let entries = normalize_batch(&items)?;
        let stats = self.sync(&entries)?;

        info!(
            source = %source.describe(),
            items = items.len(),
            elapsed = %format_duration(start.elapsed()),
            "sync run complete"
        );
        Ok(stats)
    }

    /// Search with the default substring scorer.
    pub fn search(&self, query: &str) -> Result<SearchOutcome> {
        self.search_with(query, &SubstringScorer)
    }

    pub fn search_with(&self, query: &str, scorer: &dyn Scorer) -> Result<SearchOutcome> {
        let conn = self.connect()?;
        search_with_timeout(&conn, query, scorer, self.settings.search_timeout)
    }

    pub fn counts(&self) -> Result<CatalogCounts> {
        let conn = self.connect()?;
        let count = |table: &str| -> rusqlite::Result<i64> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        };
        Ok(CatalogCounts {
            songs: count("songs")?,
            artists: count("artists")?,
            song_artists: count("song_artists")?,
        })
    }
}

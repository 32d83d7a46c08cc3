//! Core data models for the catalog mirror.
//!
//! This module contains the raw catalog shapes as Jellyfin serves them, the
//! normalized entities written to SQLite, and the records returned by search.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ============================================================================
// Catalog Models (wire shape)
// ============================================================================

/// One audio item from the Jellyfin `/Items` endpoint.
/// Every field is optional on the wire; the normalizer decides what a gap means.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawItem {
    pub name: Option<String>,
    pub id: Option<String>,
    pub premiere_date: Option<String>, // e.g. "2006-01-02T15:04:05.0000000Z"
    pub album: Option<String>,
    pub artists: Option<Vec<String>>,
}

/// Top-level `/Items` response. A body without an item list is malformed.
#[derive(Debug, Deserialize)]
pub struct CatalogResponse {
    #[serde(rename = "Items", alias = "items")]
    pub items: Vec<RawItem>,
}

// ============================================================================
// Normalized Models (what sync writes)
// ============================================================================

/// A row of the `songs` table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Song {
    pub id: String,
    pub name: String,
    pub premiere_date: DateTime<Utc>,
    pub album: String,
}

/// A normalized song plus the artist names credited on it.
#[derive(Clone, Debug)]
pub struct CatalogEntry {
    pub song: Song,
    pub artists: Vec<String>, // Deduplicated, source order, no blanks
    pub date_fallback: bool,  // true when the epoch sentinel replaced an unparseable date
}

// ============================================================================
// Search Models
// ============================================================================

/// Per-field relevance of one search hit. Higher is better.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FieldScores {
    pub name: i64,
    pub artists: i64,
    pub album: i64,
}

/// One ranked search hit. Serializes with the same field names Jellyfin uses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchResult {
    pub id: String,
    pub name: String,
    pub album: String,
    pub artists: Vec<String>,
    #[serde(skip)]
    pub scores: FieldScores,
}

impl SearchResult {
    /// Artist names joined the way the search filter sees them.
    pub fn artists_joined(&self) -> String {
        self.artists.join(", ")
    }
}

/// Result of one search call. `skipped_rows` counts rows dropped because they
/// could not be decoded; a non-zero value means the result set is degraded.
#[derive(Clone, Debug, Default)]
pub struct SearchOutcome {
    pub results: Vec<SearchResult>,
    pub skipped_rows: usize,
}

// ============================================================================
// Statistics (Instrumentation)
// ============================================================================

/// Counters for one synchronization run.
#[derive(Default, Debug, Clone, Serialize)]
pub struct SyncStats {
    pub items: usize,
    pub songs_upserted: usize,
    pub artists_created: usize,
    pub links_created: usize,
    pub date_fallbacks: usize,
    pub songs_without_artists: usize,
    pub transactions: usize,
    pub elapsed_seconds: f64,
}

impl SyncStats {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Log stats as one `info` event carrying the compact JSON.
    pub fn log_phase(&self, phase: &str) {
        match self.to_json() {
            Ok(json) => info!(phase, stats = %json, "sync stats"),
            Err(e) => warn!(phase, error = %e, "could not serialize sync stats"),
        }
    }

    /// Write stats to a JSON file
    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Row counts of the persisted schema, for inspection between runs.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogCounts {
    pub songs: i64,
    pub artists: i64,
    pub song_artists: i64,
}

//! Catalog normalization: raw Jellyfin items into the entities sync writes.
//!
//! Recoverable gaps (bad date, missing name/album/artists) are patched and
//! logged. A missing external id is not recoverable: the id is the key the
//! whole schema hangs off, so it rejects the batch before anything is written.

use chrono::{DateTime, NaiveDateTime, Utc};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use tracing::warn;

use crate::error::{Error, Result};
use crate::models::{CatalogEntry, RawItem, Song};

/// Jellyfin premiere date layout, e.g. `2006-01-02T15:04:05.0000000Z`.
/// `%.f` accepts any fraction width, including none.
pub const PREMIERE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Timestamp stored when a premiere date is missing or unparseable.
pub fn epoch_sentinel() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

pub fn parse_premiere_date(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim(), PREMIERE_DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Drop blank names and exact repeats, keeping the first occurrence order.
/// Names are stored as given: artist identity is the exact display name.
pub fn dedupe_artists(artists: &[String]) -> Vec<String> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    artists
        .iter()
        .filter(|a| !a.trim().is_empty() && seen.insert(a.as_str()))
        .cloned()
        .collect()
}

/// Normalize one item. `index` is its position in the source batch and only
/// feeds error messages and logs.
pub fn normalize_item(index: usize, raw: &RawItem) -> Result<CatalogEntry> {
    let name = raw.name.clone().unwrap_or_default();

    // Whitespace only decides blankness; the id is the source's key verbatim.
    let id = match raw.id.as_deref() {
        Some(id) if !id.trim().is_empty() => id.to_string(),
        _ => return Err(Error::MissingId { index, name }),
    };

    let raw_date = raw.premiere_date.as_deref().unwrap_or("");
    let (premiere_date, date_fallback) = match parse_premiere_date(raw_date) {
        Some(date) => (date, false),
        None => {
            warn!(
                song = %name,
                id = %id,
                premiere_date = raw_date,
                "unparseable premiere date, storing epoch"
            );
            (epoch_sentinel(), true)
        }
    };

    let artists = raw
        .artists
        .as_deref()
        .map(dedupe_artists)
        .unwrap_or_default();

    Ok(CatalogEntry {
        song: Song {
            id,
            name,
            premiere_date,
            album: raw.album.clone().unwrap_or_default(),
        },
        artists,
        date_fallback,
    })
}

/// Normalize a whole batch, preserving source order.
/// Fails if any item lacks an id, so a partial batch is never synced; the
/// error always names the earliest such item.
pub fn normalize_batch(items: &[RawItem]) -> Result<Vec<CatalogEntry>> {
    let normalized: Vec<Result<CatalogEntry>> = items
        .par_iter()
        .enumerate()
        .map(|(index, raw)| normalize_item(index, raw))
        .collect();
    normalized.into_iter().collect()
}

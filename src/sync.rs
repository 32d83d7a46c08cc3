//! Upsert synchronizer: merges normalized catalog entries into the schema.
//!
//! Every write is an upsert, so replaying a batch changes nothing. Songs are
//! last-write-wins on their id; artists and links are insert-if-absent.
//! Entries are committed in transactions of whole songs, so a crash mid-run
//! leaves some songs not yet synced but never a torn song row.

use rusqlite::{params, Connection, Transaction};
use std::time::Instant;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{CatalogEntry, SyncStats};
use crate::progress::{create_progress_bar, log_progress};

const UPSERT_SONG: &str = "INSERT INTO songs (Id, Name, PremiereDate, Album)
     VALUES (?1, ?2, ?3, ?4)
     ON CONFLICT(Id) DO UPDATE SET
        Name = excluded.Name,
        PremiereDate = excluded.PremiereDate,
        Album = excluded.Album";

const INSERT_ARTIST: &str = "INSERT INTO artists (Name) VALUES (?1)
     ON CONFLICT(Name) DO NOTHING";

const INSERT_SONG_ARTIST: &str = "INSERT INTO song_artists (SongId, Artist) VALUES (?1, ?2)
     ON CONFLICT(SongId, Artist) DO NOTHING";

const LOG_INTERVAL: u64 = 1_000;

/// Write one entry inside an open transaction. Returns (artists created, links created).
fn upsert_entry(tx: &Transaction<'_>, entry: &CatalogEntry) -> Result<(usize, usize)> {
    let song = &entry.song;
    let write_err = |source: rusqlite::Error| Error::Write {
        song_id: song.id.clone(),
        source,
    };

    tx.prepare_cached(UPSERT_SONG)
        .and_then(|mut stmt| {
            stmt.execute(params![
                song.id,
                song.name,
                song.premiere_date.timestamp(),
                song.album
            ])
        })
        .map_err(write_err)?;

    let mut artists_created = 0;
    let mut links_created = 0;
    for artist in &entry.artists {
        artists_created += tx
            .prepare_cached(INSERT_ARTIST)
            .and_then(|mut stmt| stmt.execute(params![artist]))
            .map_err(write_err)?;
        links_created += tx
            .prepare_cached(INSERT_SONG_ARTIST)
            .and_then(|mut stmt| stmt.execute(params![song.id, artist]))
            .map_err(write_err)?;
    }

    debug!(
        id = %song.id,
        name = %song.name,
        artists = entry.artists.len(),
        "song upserted"
    );
    Ok((artists_created, links_created))
}

/// Merge `entries` into the schema, in order, `batch_size` songs per transaction.
///
/// Any storage failure aborts the run; transactions committed before it stay.
pub fn sync_catalog(
    conn: &mut Connection,
    entries: &[CatalogEntry],
    batch_size: usize,
) -> Result<SyncStats> {
    let start = Instant::now();
    let mut stats = SyncStats {
        items: entries.len(),
        ..Default::default()
    };

    let total = entries.len() as u64;
    let pb = create_progress_bar(total, "Writing catalog");
    let mut written: u64 = 0;

    for chunk in entries.chunks(batch_size.max(1)) {
        let tx = conn.transaction()?;
        for entry in chunk {
            let (artists_created, links_created) = upsert_entry(&tx, entry)?;
            stats.songs_upserted += 1;
            stats.artists_created += artists_created;
            stats.links_created += links_created;
            if entry.date_fallback {
                stats.date_fallbacks += 1;
            }
            if entry.artists.is_empty() {
                stats.songs_without_artists += 1;
            }
            written += 1;
            pb.inc(1);
            log_progress("sync", written, total, LOG_INTERVAL);
        }
        tx.commit()?;
        stats.transactions += 1;
    }

    stats.elapsed_seconds = start.elapsed().as_secs_f64();
    pb.finish_with_message(format!("Wrote {} songs", stats.songs_upserted));
    info!(
        songs = stats.songs_upserted,
        artists_created = stats.artists_created,
        links_created = stats.links_created,
        date_fallbacks = stats.date_fallbacks,
        "catalog synchronized"
    );
    Ok(stats)
}

//! Schema provisioning for the mirror database.
//!
//! Pure create-if-absent DDL: safe against a database that already holds some
//! or all of these objects, and never drops or alters anything.

use rusqlite::Connection;
use tracing::debug;

use crate::error::{Error, Result};

/// Pragmas applied to every connection, writer or reader.
pub const CONNECTION_PRAGMAS: &str = "PRAGMA journal_mode = WAL;
     PRAGMA synchronous = NORMAL;
     PRAGMA temp_store = MEMORY;";

/// (object, DDL) in creation order. The object name is reported on failure.
const SCHEMA_OBJECTS: &[(&str, &str)] = &[
    (
        "songs table",
        "CREATE TABLE IF NOT EXISTS songs (
            Id TEXT PRIMARY KEY NOT NULL,
            Name TEXT NOT NULL,
            PremiereDate INTEGER NOT NULL,
            Album TEXT NOT NULL DEFAULT ''
        )",
    ),
    (
        "artists table",
        "CREATE TABLE IF NOT EXISTS artists (
            Name TEXT PRIMARY KEY NOT NULL
        )",
    ),
    (
        "song_artists table",
        "CREATE TABLE IF NOT EXISTS song_artists (
            SongId TEXT NOT NULL,
            Artist TEXT NOT NULL,
            UNIQUE(SongId, Artist)
        )",
    ),
    (
        "idx_songs_id",
        "CREATE INDEX IF NOT EXISTS idx_songs_id ON songs(Id)",
    ),
    (
        "idx_songs_name",
        "CREATE INDEX IF NOT EXISTS idx_songs_name ON songs(Name)",
    ),
    (
        "idx_songs_album",
        "CREATE INDEX IF NOT EXISTS idx_songs_album ON songs(Album)",
    ),
    (
        "idx_artists_name",
        "CREATE INDEX IF NOT EXISTS idx_artists_name ON artists(Name)",
    ),
    (
        "idx_song_artists_artist",
        "CREATE INDEX IF NOT EXISTS idx_song_artists_artist ON song_artists(Artist)",
    ),
    (
        "idx_song_artists_song_id",
        "CREATE INDEX IF NOT EXISTS idx_song_artists_song_id ON song_artists(SongId)",
    ),
];

/// Names of the six indexes `ensure_schema` maintains.
pub const INDEX_NAMES: [&str; 6] = [
    "idx_songs_id",
    "idx_songs_name",
    "idx_songs_album",
    "idx_artists_name",
    "idx_song_artists_artist",
    "idx_song_artists_song_id",
];

/// Create the three tables and six indexes if they are missing.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    for &(object, ddl) in SCHEMA_OBJECTS {
        conn.execute_batch(ddl)
            .map_err(|source| Error::Schema { object, source })?;
        debug!(object, "schema object ready");
    }
    Ok(())
}

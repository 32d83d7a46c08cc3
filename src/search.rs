//! Ranked substring search over the mirrored catalog.
//!
//! SQLite does the join and the filter: one row per song with its artists in
//! first-credited order, kept when the query occurs in the name, the album or
//! the `", "`-joined artist string. Scoring and ordering happen here, through
//! a [`Scorer`], so the ranking strategy can change without touching SQL.

use rusqlite::{params, Connection, ErrorCode, Row};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::PROGRESS_CHECK_OPS;
use crate::error::{Error, Result};
use crate::models::{FieldScores, SearchOutcome, SearchResult};
use crate::scoring::{rank_order, Scorer};

/// One row per song. `artists` is what the filter matches against;
/// `artists_json` carries the same names as an exact list.
const SEARCH_SQL: &str = r"WITH catalog AS (
    SELECT s.Id AS id,
           s.Name AS name,
           s.Album AS album,
           COALESCE(group_concat(sa.Artist, ', ' ORDER BY sa.rowid), '') AS artists,
           COALESCE(
               json_group_array(sa.Artist ORDER BY sa.rowid) FILTER (WHERE sa.Artist IS NOT NULL),
               '[]'
           ) AS artists_json
    FROM songs s
    LEFT JOIN song_artists sa ON sa.SongId = s.Id
    GROUP BY s.Id
)
SELECT id, name, album, artists_json
FROM catalog
WHERE name LIKE ?1 ESCAPE '\'
   OR album LIKE ?1 ESCAPE '\'
   OR artists LIKE ?1 ESCAPE '\'";

/// Escape `LIKE` metacharacters so user text matches literally.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[derive(Debug, thiserror::Error)]
enum RowError {
    #[error("column: {0}")]
    Column(#[from] rusqlite::Error),
    #[error("artist list: {0}")]
    Artists(#[from] serde_json::Error),
}

fn decode_row(row: &Row<'_>) -> std::result::Result<SearchResult, RowError> {
    let artists_json: String = row.get(3)?;
    Ok(SearchResult {
        id: row.get(0)?,
        name: row.get(1)?,
        album: row.get(2)?,
        artists: serde_json::from_str(&artists_json)?,
        scores: FieldScores::default(),
    })
}

/// Run one search. An empty query matches every song.
///
/// Rows that fail to decode are skipped and counted in `skipped_rows`; a
/// failure executing the query itself is returned as an error.
pub fn search(conn: &Connection, query: &str, scorer: &dyn Scorer) -> Result<SearchOutcome> {
    let pattern = format!("%{}%", escape_like(query));
    let mut stmt = conn.prepare_cached(SEARCH_SQL)?;
    let mut rows = stmt.query(params![pattern])?;

    let mut outcome = SearchOutcome::default();
    while let Some(row) = rows.next()? {
        match decode_row(row) {
            Ok(mut hit) => {
                hit.scores = scorer.score(query, &hit);
                outcome.results.push(hit);
            }
            Err(err) => {
                outcome.skipped_rows += 1;
                warn!(query, error = %err, "skipping undecodable search row");
            }
        }
    }

    outcome.results.sort_by(rank_order);

    if outcome.skipped_rows > 0 {
        warn!(
            query,
            skipped = outcome.skipped_rows,
            returned = outcome.results.len(),
            "search returned a degraded result set"
        );
    }
    debug!(query, hits = outcome.results.len(), "search complete");
    Ok(outcome)
}

/// [`search`] with an upper bound on execution time. SQLite checks the
/// deadline every few thousand VM instructions and interrupts the statement.
pub fn search_with_timeout(
    conn: &Connection,
    query: &str,
    scorer: &dyn Scorer,
    timeout: Duration,
) -> Result<SearchOutcome> {
    let started = Instant::now();
    conn.progress_handler(
        PROGRESS_CHECK_OPS,
        Some(move || started.elapsed() >= timeout),
    );
    let result = search(conn, query, scorer);
    conn.progress_handler(0, None::<fn() -> bool>);

    match result {
        Err(Error::Storage(rusqlite::Error::SqliteFailure(err, _)))
            if err.code == ErrorCode::OperationInterrupted =>
        {
            Err(Error::SearchTimeout {
                query: query.to_string(),
                timeout,
            })
        }
        other => other,
    }
}

//! End-to-end runs against a file-backed database: load a saved catalog,
//! sync it, and search it from several connections at once.

use jellyfin_index::models::CatalogCounts;
use jellyfin_index::source::{CatalogSource, JsonFileSource};
use jellyfin_index::{Error, Settings, Store};
use std::path::Path;
use tempfile::TempDir;

const CATALOG: &str = r#"{
    "Items": [
        {"Name": "Blue Moon", "Id": "1", "PremiereDate": "1961-01-01T00:00:00.0000000Z",
         "Album": "Covers", "Artists": ["Sam Cooke"]},
        {"Name": "Cupid", "Id": "2", "PremiereDate": "1961-05-01T00:00:00.0000000Z",
         "Album": "Cupid", "Artists": ["Sam Cooke", "Lou Rawls", "Sam Cooke"]},
        {"Name": "Moonlight Interlude", "Id": "3", "PremiereDate": "n/a", "Album": "Night"},
        {"Name": "Love Me", "Id": "4", "PremiereDate": "1970-01-01T00:00:00.0000000Z",
         "Album": "Love Letters", "Artists": ["Lou Rawls"]}
    ]
}"#;

fn write_catalog(dir: &Path, name: &str, body: &str) -> JsonFileSource {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    JsonFileSource::new(path)
}

fn open_store(dir: &TempDir) -> Store {
    Store::open(dir.path().join("data").join("search.db"), Settings::default()).unwrap()
}

#[test]
fn test_sync_and_search_roundtrip() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let source = write_catalog(dir.path(), "catalog.json", CATALOG);

    let stats = store.sync_from(&source).unwrap();
    assert_eq!(stats.items, 4);
    assert_eq!(stats.date_fallbacks, 1);
    assert_eq!(stats.songs_without_artists, 1);

    assert_eq!(
        store.counts().unwrap(),
        CatalogCounts {
            songs: 4,
            artists: 2,
            song_artists: 4,
        }
    );

    let moon = store.search("moon").unwrap();
    let ids: Vec<&str> = moon.results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "3"]);
    assert!(moon.results[1].artists.is_empty());

    let cupid = store.search("cupid").unwrap();
    assert_eq!(cupid.results[0].artists, vec!["Sam Cooke", "Lou Rawls"]);
}

#[test]
fn test_resync_is_idempotent_on_disk() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let source = write_catalog(dir.path(), "catalog.json", CATALOG);

    store.sync_from(&source).unwrap();
    let before = store.counts().unwrap();
    let everything = store.search("").unwrap().results;

    let second = store.sync_from(&source).unwrap();
    assert_eq!(second.artists_created, 0);
    assert_eq!(second.links_created, 0);
    assert_eq!(store.counts().unwrap(), before);
    assert_eq!(store.search("").unwrap().results, everything);
}

#[test]
fn test_reopen_keeps_existing_data() {
    let dir = TempDir::new().unwrap();
    let source = write_catalog(dir.path(), "catalog.json", CATALOG);
    open_store(&dir).sync_from(&source).unwrap();

    let reopened = open_store(&dir);
    assert_eq!(reopened.counts().unwrap().songs, 4);
}

#[test]
fn test_later_run_overwrites_reused_id() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    store
        .sync_from(&write_catalog(dir.path(), "first.json", CATALOG))
        .unwrap();

    let second = write_catalog(
        dir.path(),
        "second.json",
        r#"{"Items": [{"Name": "Blue Moon (Remastered)", "Id": "1",
            "PremiereDate": "1961-01-01T00:00:00.0000000Z", "Album": "Covers (2011)",
            "Artists": ["Sam Cooke"]}]}"#,
    );
    store.sync_from(&second).unwrap();

    let hits = store.search("blue moon").unwrap().results;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Blue Moon (Remastered)");
    assert_eq!(hits[0].album, "Covers (2011)");
}

#[test]
fn test_padded_ids_and_artists_stay_distinct() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let source = write_catalog(
        dir.path(),
        "padded.json",
        r#"{"Items": [
            {"Name": "Padded", "Id": " 1", "Album": "A", "Artists": ["Sam Cooke "]},
            {"Name": "Plain", "Id": "1", "Album": "A", "Artists": ["Sam Cooke"]}
        ]}"#,
    );

    store.sync_from(&source).unwrap();
    assert_eq!(
        store.counts().unwrap(),
        CatalogCounts {
            songs: 2,
            artists: 2,
            song_artists: 2,
        }
    );

    let padded = store.search("padded").unwrap().results;
    assert_eq!(padded[0].id, " 1");
    assert_eq!(padded[0].artists, vec!["Sam Cooke "]);
    let plain = store.search("plain").unwrap().results;
    assert_eq!(plain[0].id, "1");
    assert_eq!(plain[0].artists, vec!["Sam Cooke"]);
}

#[test]
fn test_missing_id_rejects_batch_without_writing() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let source = write_catalog(
        dir.path(),
        "broken.json",
        r#"{"Items": [{"Name": "Fine", "Id": "1"}, {"Name": "No Id"}]}"#,
    );

    let err = store.sync_from(&source).unwrap_err();
    assert!(matches!(err, Error::MissingId { index: 1, .. }));
    assert_eq!(store.counts().unwrap().songs, 0);
}

#[test]
fn test_malformed_catalog_is_fatal() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let source = write_catalog(dir.path(), "bad.json", r#"{"Items": "nope"}"#);

    assert!(matches!(
        store.sync_from(&source),
        Err(Error::MalformedCatalog(_))
    ));
}

struct FailingSource;

impl CatalogSource for FailingSource {
    fn describe(&self) -> String {
        "unreachable".to_string()
    }

    fn fetch(&self) -> jellyfin_index::Result<Vec<jellyfin_index::models::RawItem>> {
        Err(Error::Fetch("connection refused".to_string()))
    }
}

#[test]
fn test_fetch_failure_is_fatal() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    assert!(matches!(store.sync_from(&FailingSource), Err(Error::Fetch(_))));
    assert_eq!(store.counts().unwrap().songs, 0);
}

#[test]
fn test_concurrent_searches_use_separate_connections() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    store
        .sync_from(&write_catalog(dir.path(), "catalog.json", CATALOG))
        .unwrap();

    let expected = store.search("sam").unwrap().results;
    assert_eq!(expected.len(), 2);

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| store.search("sam").unwrap().results))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_search_during_sync_sees_whole_songs() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let items: Vec<String> = (0..500)
        .map(|i| {
            format!(
                r#"{{"Name": "Track {i}", "Id": "{i:04}", "Album": "Box Set",
                    "PremiereDate": "2001-01-01T00:00:00.0000000Z", "Artists": ["A{i}", "B{i}"]}}"#
            )
        })
        .collect();
    let body = format!(r#"{{"Items": [{}]}}"#, items.join(","));
    let source = write_catalog(dir.path(), "big.json", &body);

    std::thread::scope(|scope| {
        let writer = scope.spawn(|| store.sync_from(&source).unwrap());
        for _ in 0..20 {
            let outcome = store.search("track").unwrap();
            // Batches commit whole songs: every visible song has both artists.
            assert!(outcome.results.iter().all(|r| r.artists.len() == 2));
        }
        writer.join().unwrap();
    });

    assert_eq!(store.search("box set").unwrap().results.len(), 500);
}

use bookpedia_core::db::{open_db, open_db_in_memory};
use bookpedia_core::repo::{FavoriteBookRecord, FavoriteBookStore, SqliteFavoriteBookStore};
use futures_util::StreamExt;
use std::time::Duration;

fn record(id: &str, title: &str) -> FavoriteBookRecord {
    FavoriteBookRecord {
        id: id.to_string(),
        title: title.to_string(),
        description: Some(format!("About {title}.")),
        image_url: format!("https://covers.example.org/b/id/{id}-L.jpg"),
        languages: vec!["eng".to_string()],
        authors: vec!["Frank Herbert".to_string()],
        first_publish_year: Some("1965".to_string()),
        ratings_average: Some(4.3),
        ratings_count: Some(1200),
        num_pages_median: Some(604),
        num_editions: 12,
    }
}

fn memory_store() -> SqliteFavoriteBookStore {
    SqliteFavoriteBookStore::try_new(open_db_in_memory().unwrap()).unwrap()
}

#[tokio::test]
async fn upsert_same_id_twice_keeps_one_fully_overwritten_record() {
    let store = memory_store();

    store.upsert(record("OL1W", "Dune")).await.unwrap();
    let mut replacement = record("OL1W", "Dune (Deluxe)");
    replacement.description = None;
    replacement.languages = Vec::new();
    store.upsert(replacement.clone()).await.unwrap();

    let mut favorites = store.get_all();
    let snapshot = favorites.next().await.unwrap();
    assert_eq!(snapshot, vec![replacement.clone()]);
    assert_eq!(store.get_by_id("OL1W").await.unwrap(), Some(replacement));
}

#[tokio::test]
async fn get_all_replays_current_snapshot_and_follows_writes_in_insertion_order() {
    let store = memory_store();
    store.upsert(record("OL2W", "Dune Messiah")).await.unwrap();

    let mut favorites = store.get_all();
    let first = favorites.next().await.unwrap();
    assert_eq!(first.len(), 1);

    store.upsert(record("OL1W", "Dune")).await.unwrap();
    let second = favorites.next().await.unwrap();
    let ids: Vec<&str> = second.iter().map(|favorite| favorite.id.as_str()).collect();
    assert_eq!(ids, vec!["OL2W", "OL1W"]);

    store.delete_by_id("OL2W").await.unwrap();
    let third = favorites.next().await.unwrap();
    assert_eq!(third.len(), 1);
    assert_eq!(third[0].id, "OL1W");
}

#[tokio::test]
async fn deleting_missing_id_succeeds_without_emission() {
    let store = memory_store();
    store.upsert(record("OL1W", "Dune")).await.unwrap();

    let mut favorites = store.get_all();
    favorites.next().await.unwrap();

    store.delete_by_id("OL404W").await.unwrap();

    let next = tokio::time::timeout(Duration::from_millis(100), favorites.next()).await;
    assert!(next.is_err(), "unexpected emission after no-op delete");
    assert!(store.get_by_id("OL1W").await.unwrap().is_some());
}

#[tokio::test]
async fn get_by_id_misses_return_none() {
    let store = memory_store();
    assert_eq!(store.get_by_id("OL1W").await.unwrap(), None);
}

#[tokio::test]
async fn favorites_survive_reopening_the_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("book.db");

    let store = SqliteFavoriteBookStore::try_new(open_db(&path).unwrap()).unwrap();
    store.upsert(record("OL1W", "Dune")).await.unwrap();
    drop(store);

    let reopened = SqliteFavoriteBookStore::try_new(open_db(&path).unwrap()).unwrap();
    let snapshot = reopened.get_all().next().await.unwrap();
    assert_eq!(snapshot, vec![record("OL1W", "Dune")]);
}

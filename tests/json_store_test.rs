//! Integration tests for JsonFileStore against a real temp directory.

use std::fs;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tempfile::TempDir;

use mindtree::domain::{MapId, MindMap};
use mindtree::infrastructure::traits::{MapStore, RealFileSystem};
use mindtree::infrastructure::JsonFileStore;
use mindtree::util::testing;

fn store_in(dir: &TempDir) -> JsonFileStore {
    testing::init_test_setup();
    JsonFileStore::new(Arc::new(RealFileSystem), dir.path().join("maps"))
}

#[test]
fn given_saved_map_when_loading_then_returns_same_content() {
    // Arrange
    let tmp = TempDir::new().unwrap();
    let store = store_in(&tmp);
    let mut map = MindMap::new("Plans", Utc::now());

    // Act
    store.save(&mut map).unwrap();
    let loaded = store.load(&map.id).unwrap().unwrap();

    // Assert
    assert_eq!(loaded, map);
    assert!(tmp
        .path()
        .join("maps")
        .join(format!("{}.json", map.id))
        .exists());
}

#[test]
fn given_missing_directory_when_listing_then_empty() {
    let tmp = TempDir::new().unwrap();
    let store = store_in(&tmp);

    assert!(store.list().unwrap().is_empty());
    assert!(store.load(&MapId::new("map-nope")).unwrap().is_none());
}

#[test]
fn given_save_when_writing_then_refreshes_updated_at_and_leaves_no_temp_file() {
    let tmp = TempDir::new().unwrap();
    let store = store_in(&tmp);
    let mut map = MindMap::new("Plans", Utc::now() - Duration::hours(2));
    let before = map.updated_at;

    store.save(&mut map).unwrap();

    assert!(map.updated_at > before);
    let names: Vec<String> = fs::read_dir(store.dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec![format!("{}.json", map.id)]);
}

#[test]
fn given_several_maps_when_listing_then_most_recent_first() {
    // Arrange
    let tmp = TempDir::new().unwrap();
    let store = store_in(&tmp);
    let mut older = MindMap::new("Older", Utc::now());
    let mut newer = MindMap::new("Newer", Utc::now());
    store.save(&mut older).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(5));
    store.save(&mut newer).unwrap();

    // Act
    let names: Vec<String> = store.list().unwrap().into_iter().map(|m| m.name).collect();

    // Assert
    assert_eq!(names, vec!["Newer", "Older"]);
}

#[test]
fn given_corrupt_file_when_loading_then_invalid_data_error() {
    let tmp = TempDir::new().unwrap();
    let store = store_in(&tmp);
    fs::create_dir_all(store.dir()).unwrap();
    fs::write(store.dir().join("map-broken.json"), "{ not json").unwrap();

    let err = store.load(&MapId::new("map-broken")).unwrap_err();

    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
}

#[test]
fn given_corrupt_file_when_checking_existence_then_present() {
    let tmp = TempDir::new().unwrap();
    let store = store_in(&tmp);
    fs::create_dir_all(store.dir()).unwrap();
    fs::write(store.dir().join("map-broken.json"), "{ not json").unwrap();

    assert!(store.exists(&MapId::new("map-broken")).unwrap());
    assert!(!store.exists(&MapId::new("map-other")).unwrap());
}

#[test]
fn given_corrupt_file_next_to_valid_one_when_listing_then_skips_it() {
    let tmp = TempDir::new().unwrap();
    let store = store_in(&tmp);
    let mut map = MindMap::new("Good", Utc::now());
    store.save(&mut map).unwrap();
    fs::write(store.dir().join("map-broken.json"), "[]").unwrap();
    fs::write(store.dir().join("notes.txt"), "ignored").unwrap();

    let maps = store.list().unwrap();

    assert_eq!(maps.len(), 1);
    assert_eq!(maps[0].id, map.id);
}

#[test]
fn given_stored_map_when_deleting_then_gone_and_second_delete_ok() {
    let tmp = TempDir::new().unwrap();
    let store = store_in(&tmp);
    let mut map = MindMap::new("Plans", Utc::now());
    store.save(&mut map).unwrap();

    store.delete(&map.id).unwrap();

    assert!(store.load(&map.id).unwrap().is_none());
    assert!(store.delete(&map.id).is_ok());
}

#[test]
fn given_stored_map_when_duplicating_then_independent_copy() {
    // Arrange
    let tmp = TempDir::new().unwrap();
    let store = store_in(&tmp);
    let mut map = MindMap::new("Plans", Utc::now());
    store.save(&mut map).unwrap();

    // Act
    let mut copy = store.duplicate(&map.id).unwrap().unwrap();
    copy.nodes[0].text = "Changed".to_string();
    store.save(&mut copy).unwrap();

    // Assert
    assert_eq!(copy.name, "Plans (copy)");
    assert_ne!(copy.id, map.id);
    let original = store.load(&map.id).unwrap().unwrap();
    assert_eq!(original.nodes[0].text, "Plans");
    assert_eq!(store.list().unwrap().len(), 2);
}

#[test]
fn given_unknown_id_when_duplicating_then_none() {
    let tmp = TempDir::new().unwrap();
    let store = store_in(&tmp);

    assert!(store.duplicate(&MapId::new("map-nope")).unwrap().is_none());
}

#[test]
fn given_saved_map_when_reading_file_then_uses_camel_case_keys() {
    let tmp = TempDir::new().unwrap();
    let store = store_in(&tmp);
    let mut map = MindMap::new("Plans", Utc::now());
    store.save(&mut map).unwrap();

    let raw = fs::read_to_string(store.dir().join(format!("{}.json", map.id))).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert!(value.get("createdAt").is_some());
    assert!(value.get("updatedAt").is_some());
    assert_eq!(value["nodes"][0]["text"], "Plans");
    assert!(value["edges"].as_array().unwrap().is_empty());
}

//! Test fixture creation

use super::constants::*;
use anyhow::Result;
use serde_json::{json, Value};
use songpin_server::member::MemberManager;
use songpin_server::SongPinStore;
use std::path::PathBuf;
use tempfile::TempDir;

/// Creates a temporary database with the two test members.
/// Returns (temp_dir, db_path)
pub fn create_test_db_with_members() -> Result<(TempDir, PathBuf)> {
    let dir = TempDir::new()?;
    let db_path = dir.path().join("songpin.db");

    let store = SongPinStore::new(&db_path)?;
    let manager = MemberManager::new(store);
    manager.signup(TEST_USER, "Tester", TEST_PASS)?;
    manager.signup(OTHER_USER, "Other", OTHER_PASS)?;

    Ok((dir, db_path))
}

/// Body of a pin creation request. The song title and the place name are
/// derived from the given references.
pub fn pin_request(
    track_code: &str,
    place_id: i64,
    place_name: &str,
    genre_name: &str,
    listened_date: &str,
    visibility: &str,
) -> Value {
    json!({
        "song": {
            "provider_track_code": track_code,
            "title": format!("Title of {}", track_code),
            "artist": "Test Artist",
            "img_path": null
        },
        "place": {
            "provider_address_id": place_id,
            "place_name": place_name,
            "address": "Seoul",
            "latitude": 37.55,
            "longitude": 126.99
        },
        "genre_name": genre_name,
        "listened_date": listened_date,
        "memo": "e2e memo",
        "visibility": visibility
    })
}

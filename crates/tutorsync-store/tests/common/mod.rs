use std::path::PathBuf;

use tempfile::TempDir;
use tutorsync_core::model::{Match, Person, Role};
use tutorsync_store::db::open_shared;
use tutorsync_store::SharedConnection;

/// Migrated on-disk database inside a fresh temp dir
///
/// Keep the `TempDir` alive for as long as the connection is used.
#[allow(dead_code)]
pub fn setup_disk_db() -> (TempDir, PathBuf, SharedConnection) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("nested").join("store.db");
    let conn = open_shared(&path).expect("open database");
    (dir, path, conn)
}

#[allow(dead_code)]
pub fn sample_match(id: &str) -> Match {
    let mut m = Match::new([
        Person::new("u1").with_name("Ada").with_roles([Role::Tutor]),
        Person::new("u2").with_name("Grace").with_roles([Role::Tutee]),
    ]);
    m.id = id.to_string();
    m.org = "o1".to_string();
    m.subjects = vec!["math".to_string()];
    m
}

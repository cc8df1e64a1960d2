// Integration tests for the migration framework

use rusqlite::Connection;

fn get_table_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

#[test]
fn test_apply_migrations_on_empty_db() {
    let mut conn = Connection::open_in_memory().expect("in-memory database");

    let result = tutorsync_store::migrations::apply_migrations(&mut conn);
    assert!(result.is_ok(), "Migrations should succeed: {:?}", result.err());

    let tables = get_table_names(&conn);
    for expected in [
        "schema_version",
        "users",
        "orgs",
        "matches",
        "meetings",
        "search_objects",
        "search_tasks",
    ] {
        assert!(
            tables.iter().any(|t| t == expected),
            "missing table {} in {:?}",
            expected,
            tables
        );
    }
}

#[test]
fn test_migrations_recorded_in_order() {
    let mut conn = Connection::open_in_memory().unwrap();
    tutorsync_store::migrations::apply_migrations(&mut conn).unwrap();
    tutorsync_store::migrations::apply_migrations(&mut conn).unwrap();

    let applied = tutorsync_store::migrations::applied_migrations(&conn).unwrap();
    assert_eq!(applied, vec!["001_records", "002_search_objects"]);
}

#[test]
fn test_tampered_checksum_is_rejected() {
    let mut conn = Connection::open_in_memory().unwrap();
    tutorsync_store::migrations::apply_migrations(&mut conn).unwrap();

    conn.execute(
        "UPDATE schema_version SET checksum = 'deadbeef' WHERE migration_id = '001_records'",
        [],
    )
    .unwrap();

    let err = tutorsync_store::migrations::apply_migrations(&mut conn).unwrap_err();
    assert_eq!(err.op(), Some("migration_checksum"));
    assert!(err.message().contains("001_records"));
}

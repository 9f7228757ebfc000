use eduledger_core::db::migrations::latest_version;
use eduledger_core::db::{open_state_db, open_state_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_state_db_in_memory_applies_all_migrations() {
    let conn = open_state_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "ledger_entries");
    assert_index_exists(&conn, "idx_ledger_entries_kind");
    assert_index_exists(&conn, "idx_ledger_entries_kind_owner");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("eduledger.db");

    let conn_first = open_state_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_state_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "ledger_entries");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_state_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn migrated_database_accepts_json_documents() {
    let conn = open_state_db_in_memory().unwrap();

    conn.execute(
        "INSERT INTO ledger_entries (record_key, doc) VALUES (?1, ?2);",
        [
            "Evaluation-eval_x",
            r#"{"docType":"Evaluation","Evaluation_ID":"eval_x","User_ID":"u1"}"#,
        ],
    )
    .unwrap();

    let kind: String = conn
        .query_row(
            "SELECT json_extract(doc, '$.docType') FROM ledger_entries
             WHERE record_key = 'Evaluation-eval_x';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(kind, "Evaluation");
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}

fn assert_index_exists(conn: &Connection, index_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'index' AND name = ?1
            );",
            [index_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "index {index_name} does not exist");
}

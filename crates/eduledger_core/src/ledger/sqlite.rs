//! SQLite-backed ledger adapter.
//!
//! # Responsibility
//! - Serve the gateway contract from the embedded state database.
//! - Push selector predicates down to SQL served by the expression indexes.
//!
//! # Invariants
//! - Construction verifies schema readiness; data access never runs against
//!   an unmigrated connection.
//! - Documents are stored as JSON text; `put` rejects non-UTF-8 values.
//! - Returned scans hold no SQLite state: rows are drained while the
//!   statement is alive.

use super::{LedgerError, LedgerGateway, LedgerResult, Scan, Selector};
use crate::db::migrations::latest_version;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};

/// Ledger adapter over a migrated [`Connection`].
pub struct SqliteLedger<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLedger<'conn> {
    /// Creates an adapter from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> LedgerResult<Self> {
        ensure_ledger_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl LedgerGateway for SqliteLedger<'_> {
    fn get(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT doc FROM ledger_entries WHERE record_key = ?1;")?;
        let mut rows = stmt.query([key])?;
        if let Some(row) = rows.next()? {
            let doc: String = row.get(0)?;
            return Ok(Some(doc.into_bytes()));
        }
        Ok(None)
    }

    fn put(&self, key: &str, value: &[u8]) -> LedgerResult<()> {
        let doc = std::str::from_utf8(value).map_err(|_| {
            LedgerError::Backend(format!("value for key `{key}` is not valid UTF-8"))
        })?;

        self.conn.execute(
            "INSERT INTO ledger_entries (record_key, doc)
             VALUES (?1, ?2)
             ON CONFLICT(record_key) DO UPDATE SET doc = excluded.doc;",
            params![key, doc],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> LedgerResult<()> {
        self.conn
            .execute("DELETE FROM ledger_entries WHERE record_key = ?1;", [key])?;
        Ok(())
    }

    fn query(&self, selector: &Selector) -> LedgerResult<Scan> {
        // Predicate text must stay identical to the indexed expressions in
        // the schema, or SQLite falls back to a full scan.
        let mut sql = String::from(
            "SELECT doc FROM ledger_entries WHERE json_extract(doc, '$.docType') = ?",
        );
        let mut bind_values: Vec<Value> = vec![Value::Text(selector.kind().name().to_string())];

        if let Some(owner) = selector.owner() {
            sql.push_str(" AND json_extract(doc, '$.User_ID') = ?");
            bind_values.push(Value::Text(owner.to_string()));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut docs: Vec<LedgerResult<Vec<u8>>> = Vec::new();
        while let Some(row) = rows.next()? {
            let doc: String = row.get(0)?;
            docs.push(Ok(doc.into_bytes()));
        }

        // The statement itself is the cursor; it is fully drained above, so
        // the scan handed out carries no open SQLite state to leak.
        Ok(Scan::new(Box::new(docs.into_iter())))
    }
}

fn ensure_ledger_connection_ready(conn: &Connection) -> LedgerResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(LedgerError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "ledger_entries")? {
        return Err(LedgerError::MissingRequiredTable("ledger_entries"));
    }

    for column in ["record_key", "doc"] {
        if !table_has_column(conn, "ledger_entries", column)? {
            return Err(LedgerError::MissingRequiredColumn {
                table: "ledger_entries",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> LedgerResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> LedgerResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

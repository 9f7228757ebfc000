//! Ledger gateway abstraction and storage adapters.
//!
//! # Responsibility
//! - Define the key-value plus rich-query contract the record store consumes.
//! - Keep adapter details (in-memory map, SQLite) out of store logic.
//!
//! # Invariants
//! - `put` is an upsert and `delete` is unconditional; record lifecycle rules
//!   live in the store, not here.
//! - Scan order is unspecified; callers must not rely on it.
//! - Dropping a `Scan` releases its backing cursor on every exit path,
//!   including early error returns.

use crate::db::DbError;
use crate::model::record::{RecordKind, DOC_TYPE_FIELD, OWNER_FIELD};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryLedger;
pub use sqlite::SqliteLedger;

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Gateway-layer error for adapter construction and state access.
#[derive(Debug)]
pub enum LedgerError {
    Db(DbError),
    /// Connection handed to an adapter before migrations ran.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Adapter failure outside the SQLite error space.
    Backend(String),
}

impl Display for LedgerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "ledger connection is not migrated: schema version {actual_version}, expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
            Self::Backend(message) => write!(f, "ledger backend failure: {message}"),
        }
    }
}

impl Error for LedgerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::MissingRequiredColumn { .. } => None,
            Self::Backend(_) => None,
        }
    }
}

impl From<DbError> for LedgerError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Equality filter over the discriminator and, optionally, the owner field.
///
/// This is the only query shape the store ever issues; adapters may push it
/// down (SQL) or apply [`Selector::matches`] per candidate (memory).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    kind: RecordKind,
    owner: Option<String>,
}

impl Selector {
    /// Selects every record of `kind`, regardless of owner.
    pub fn for_kind(kind: RecordKind) -> Self {
        Self { kind, owner: None }
    }

    /// Selects records of `kind` whose owner field equals `owner`.
    pub fn owned_by(kind: RecordKind, owner: impl Into<String>) -> Self {
        Self {
            kind,
            owner: Some(owner.into()),
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// True when `doc` satisfies every equality predicate.
    ///
    /// Non-object documents and documents missing a filtered field never
    /// match.
    pub fn matches(&self, doc: &Value) -> bool {
        if doc.get(DOC_TYPE_FIELD).and_then(Value::as_str) != Some(self.kind.name()) {
            return false;
        }
        match &self.owner {
            Some(owner) => doc.get(OWNER_FIELD).and_then(Value::as_str) == Some(owner.as_str()),
            None => true,
        }
    }

    /// Renders the rich-query wire shape used by CouchDB-style backends.
    ///
    /// Field order is fixed with the discriminator first so the rendered
    /// selector is byte-stable across runs.
    pub fn to_couchdb_json(&self) -> String {
        let kind = Value::String(self.kind.name().to_string());
        match &self.owner {
            Some(owner) => {
                let owner = Value::String(owner.clone());
                format!(
                    "{{\"selector\":{{\"{DOC_TYPE_FIELD}\":{kind},\"{OWNER_FIELD}\":{owner}}}}}"
                )
            }
            None => format!("{{\"selector\":{{\"{DOC_TYPE_FIELD}\":{kind}}}}}"),
        }
    }
}

/// Open-cursor accounting token; decrements the shared counter on drop.
#[derive(Debug)]
pub struct ScanGuard {
    open_scans: Arc<AtomicUsize>,
}

impl ScanGuard {
    /// Registers one open cursor against `open_scans`.
    pub fn register(open_scans: Arc<AtomicUsize>) -> Self {
        open_scans.fetch_add(1, Ordering::SeqCst);
        Self { open_scans }
    }
}

impl Drop for ScanGuard {
    fn drop(&mut self) {
        self.open_scans.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Explicit query cursor over raw record values.
///
/// Each item is one serialized record. The backing cursor is released when
/// the scan is dropped, whether or not it was drained.
pub struct Scan {
    items: Box<dyn Iterator<Item = LedgerResult<Vec<u8>>> + Send>,
    _guard: Option<ScanGuard>,
}

impl Scan {
    /// Wraps an adapter-produced item sequence with no cursor accounting.
    pub fn new(items: Box<dyn Iterator<Item = LedgerResult<Vec<u8>>> + Send>) -> Self {
        Self {
            items,
            _guard: None,
        }
    }

    /// Wraps an item sequence together with its cursor accounting token.
    pub fn with_guard(
        items: Box<dyn Iterator<Item = LedgerResult<Vec<u8>>> + Send>,
        guard: ScanGuard,
    ) -> Self {
        Self {
            items,
            _guard: Some(guard),
        }
    }
}

impl Iterator for Scan {
    type Item = LedgerResult<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.items.next()
    }
}

impl Debug for Scan {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scan").finish_non_exhaustive()
    }
}

/// Key-value and rich-query contract of the host ledger.
///
/// The store holds exactly one gateway, passed in at construction; adapters
/// must not assume anything about key contents beyond UTF-8.
pub trait LedgerGateway {
    /// Reads the value at `key`, if present.
    fn get(&self, key: &str) -> LedgerResult<Option<Vec<u8>>>;

    /// Writes `value` at `key`, replacing any existing value.
    fn put(&self, key: &str, value: &[u8]) -> LedgerResult<()>;

    /// Removes `key`; succeeds whether or not the key exists.
    fn delete(&self, key: &str) -> LedgerResult<()>;

    /// Opens a scan over values matching `selector`.
    ///
    /// Result order is unspecified and may differ between adapters.
    fn query(&self, selector: &Selector) -> LedgerResult<Scan>;

    /// Presence probe built on [`get`](Self::get).
    fn exists(&self, key: &str) -> LedgerResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::Selector;
    use crate::model::record::RecordKind;
    use serde_json::json;

    #[test]
    fn selector_matches_on_kind_alone() {
        let selector = Selector::for_kind(RecordKind::Evaluation);
        assert!(selector.matches(&json!({ "docType": "Evaluation", "User_ID": "u1" })));
        assert!(selector.matches(&json!({ "docType": "Evaluation" })));
        assert!(!selector.matches(&json!({ "docType": "TestResult", "User_ID": "u1" })));
        assert!(!selector.matches(&json!({ "User_ID": "u1" })));
        assert!(!selector.matches(&json!("Evaluation")));
    }

    #[test]
    fn selector_matches_on_kind_and_owner() {
        let selector = Selector::owned_by(RecordKind::Judgement, "u2");
        assert!(selector.matches(&json!({ "docType": "Judgement", "User_ID": "u2" })));
        assert!(!selector.matches(&json!({ "docType": "Judgement", "User_ID": "u3" })));
        assert!(!selector.matches(&json!({ "docType": "Judgement" })));
    }

    #[test]
    fn couchdb_rendering_is_byte_stable() {
        assert_eq!(
            Selector::for_kind(RecordKind::TestResult).to_couchdb_json(),
            r#"{"selector":{"docType":"TestResult"}}"#
        );
        assert_eq!(
            Selector::owned_by(RecordKind::Evaluation, "user_001").to_couchdb_json(),
            r#"{"selector":{"docType":"Evaluation","User_ID":"user_001"}}"#
        );
    }

    #[test]
    fn couchdb_rendering_escapes_owner_values() {
        let selector = Selector::owned_by(RecordKind::Evaluation, "u\"1");
        assert_eq!(
            selector.to_couchdb_json(),
            r#"{"selector":{"docType":"Evaluation","User_ID":"u\"1"}}"#
        );
    }
}

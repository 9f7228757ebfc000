//! Record lifecycle orchestration over a ledger gateway.
//!
//! # Responsibility
//! - Enforce create/update lifecycle rules and duplicate checks.
//! - Apply ownership policy on owner-scoped point reads.
//! - Build selectors for owner-scoped and kind-wide scans.
//!
//! # Invariants
//! - `docType` is stamped from the record kind on every write path.
//! - The duplicate check in `create` and the existence check in `update` run
//!   before any write; `update` checks existence before decoding the
//!   payload.
//! - `delete` is unconditional: no existence check, no ownership check.

use crate::ledger::{LedgerError, LedgerGateway, Selector};
use crate::model::record::{
    Evaluation, Judgement, LedgerRecord, RecordKind, RecordValidationError, TestResult,
};
use crate::store::access::ensure_owner;
use chrono::{SecondsFormat, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level error for record lifecycle and query operations.
#[derive(Debug)]
pub enum StoreError {
    Validation(RecordValidationError),
    /// Payload could not be decoded into the expected record shape.
    Deserialization(serde_json::Error),
    /// Record could not be encoded for persistence.
    Serialization(serde_json::Error),
    AlreadyExists { kind: RecordKind, id: String },
    NotFound { kind: RecordKind, id: String },
    /// Requesting owner does not match the record's owner field.
    Forbidden { kind: RecordKind, id: String },
    /// Kind string outside the closed set, from the operation surface.
    UnsupportedKind(String),
    Ledger(LedgerError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Deserialization(err) => write!(f, "cannot decode record payload: {err}"),
            Self::Serialization(err) => write!(f, "cannot encode record: {err}"),
            Self::AlreadyExists { kind, id } => write!(f, "{kind} `{id}` already exists"),
            Self::NotFound { kind, id } => write!(f, "{kind} `{id}` does not exist"),
            Self::Forbidden { kind, id } => {
                write!(f, "{kind} `{id}` is not owned by the requesting user")
            }
            Self::UnsupportedKind(value) => write!(f, "unsupported record kind `{value}`"),
            Self::Ledger(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Deserialization(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::AlreadyExists { .. } => None,
            Self::NotFound { .. } => None,
            Self::Forbidden { .. } => None,
            Self::UnsupportedKind(_) => None,
            Self::Ledger(err) => Some(err),
        }
    }
}

impl From<RecordValidationError> for StoreError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<LedgerError> for StoreError {
    fn from(value: LedgerError) -> Self {
        Self::Ledger(value)
    }
}

/// Record store over one ledger gateway.
///
/// Holds exactly one gateway for its whole lifetime; all operations are
/// synchronous and fail fast with no internal retries.
pub struct RecordStore<L: LedgerGateway> {
    ledger: L,
}

impl<L: LedgerGateway> RecordStore<L> {
    /// Creates a store using the provided gateway.
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    /// Shared access to the underlying gateway.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Creates `record` under its composite key.
    ///
    /// Fails with `AlreadyExists` when the key is occupied; the existing
    /// value is left byte-identical.
    pub fn create<R: LedgerRecord>(&self, record: R) -> StoreResult<()> {
        record.validate()?;
        let key = record.composite_key();
        if self.ledger.exists(&key)? {
            return Err(StoreError::AlreadyExists {
                kind: R::KIND,
                id: record.record_id().to_string(),
            });
        }
        self.put_stamped(&key, record)
    }

    /// Replaces the record at `id` with the decoded `payload_json`.
    ///
    /// A missing target wins over a malformed payload: the existence check
    /// runs first. The payload may not carry an identifier other than `id`;
    /// every other field, the owner included, is replaced as supplied.
    pub fn update<R: LedgerRecord>(&self, id: &str, payload_json: &[u8]) -> StoreResult<()> {
        let key = R::KIND.composite_key(id);
        if !self.ledger.exists(&key)? {
            return Err(StoreError::NotFound {
                kind: R::KIND,
                id: id.to_string(),
            });
        }

        let record: R =
            serde_json::from_slice(payload_json).map_err(StoreError::Deserialization)?;
        if record.record_id() != id {
            return Err(StoreError::Validation(
                RecordValidationError::IdentifierMismatch {
                    kind: R::KIND,
                    expected: id.to_string(),
                    found: record.record_id().to_string(),
                },
            ));
        }
        self.put_stamped(&key, record)
    }

    /// Reads the record at `id` with no ownership check.
    ///
    /// Basis of the deliberately unrestricted point reads on the operation
    /// surface.
    pub fn get<R: LedgerRecord>(&self, id: &str) -> StoreResult<R> {
        let key = R::KIND.composite_key(id);
        let Some(value) = self.ledger.get(&key)? else {
            return Err(StoreError::NotFound {
                kind: R::KIND,
                id: id.to_string(),
            });
        };
        serde_json::from_slice(&value).map_err(StoreError::Deserialization)
    }

    /// Reads the record at `id`, enforcing that `requesting_owner_id` owns
    /// it.
    pub fn get_owned<R: LedgerRecord>(
        &self,
        id: &str,
        requesting_owner_id: &str,
    ) -> StoreResult<R> {
        let record: R = self.get(id)?;
        ensure_owner(&record, requesting_owner_id)?;
        Ok(record)
    }

    /// Lists records of kind `R` owned by `owner_id`, in unspecified order.
    ///
    /// Ownership filtering happens inside the query selector; no record is
    /// re-checked after the scan.
    pub fn list_by_owner<R: LedgerRecord>(&self, owner_id: &str) -> StoreResult<Vec<R>> {
        self.collect(Selector::owned_by(R::KIND, owner_id))
    }

    /// Lists every record of kind `R`, regardless of owner.
    ///
    /// Administrative surface; intentionally carries no access restriction.
    pub fn list_all<R: LedgerRecord>(&self) -> StoreResult<Vec<R>> {
        self.collect(Selector::for_kind(R::KIND))
    }

    /// Removes the record of `kind` at `id`.
    ///
    /// Succeeds whether or not the record exists and checks no ownership.
    pub fn delete(&self, kind: RecordKind, id: &str) -> StoreResult<()> {
        let key = kind.composite_key(id);
        self.ledger.delete(&key)?;
        Ok(())
    }

    /// Seeds one sample record per kind for non-production setups.
    ///
    /// Raw upserts: existing records under the seed keys are replaced, so
    /// repeating the call succeeds.
    pub fn bootstrap(&self) -> StoreResult<()> {
        let evaluation = Evaluation::new(
            "eval_001",
            "user_001",
            "A",
            "Excellent performance in all aspects",
        );
        let test_result = TestResult::new(
            "test_001",
            "user_001",
            "98",
            "2023-FINAL-01",
            "Correct answers for all questions",
        );
        let judgement = Judgement::new(
            "judge_001",
            "user_002",
            "None",
            "eval_001",
            "5",
            "Very fair evaluation",
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        );

        self.put_stamped(&evaluation.composite_key(), evaluation)?;
        self.put_stamped(&test_result.composite_key(), test_result)?;
        self.put_stamped(&judgement.composite_key(), judgement)?;
        Ok(())
    }

    fn collect<R: LedgerRecord>(&self, selector: Selector) -> StoreResult<Vec<R>> {
        let scan = self.ledger.query(&selector)?;
        let mut records = Vec::new();
        // An early return here drops the scan and releases its cursor.
        for item in scan {
            let value = item?;
            let record: R = serde_json::from_slice(&value).map_err(StoreError::Deserialization)?;
            records.push(record);
        }
        Ok(records)
    }

    fn put_stamped<R: LedgerRecord>(&self, key: &str, record: R) -> StoreResult<()> {
        let stamped = record.with_discriminator();
        let value = serde_json::to_vec(&stamped).map_err(StoreError::Serialization)?;
        self.ledger.put(key, &value)?;
        Ok(())
    }
}

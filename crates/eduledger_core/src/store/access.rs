//! Ownership policy for point reads.
//!
//! # Responsibility
//! - Decide whether a requesting owner may read a given record.
//!
//! # Invariants
//! - Owner comparison is exact string equality; no normalization.
//! - Scan paths filter by owner inside the query selector and never call
//!   into this module.

use crate::model::record::LedgerRecord;
use crate::store::record_store::{StoreError, StoreResult};

/// Fails with [`StoreError::Forbidden`] unless `requesting_owner_id` equals
/// the record's owner field.
///
/// The requesting owner is trusted caller input; identity verification is
/// the transport layer's concern.
pub fn ensure_owner<R: LedgerRecord>(record: &R, requesting_owner_id: &str) -> StoreResult<()> {
    if record.owner_id() != requesting_owner_id {
        return Err(StoreError::Forbidden {
            kind: R::KIND,
            id: record.record_id().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::ensure_owner;
    use crate::model::record::{Evaluation, RecordKind};
    use crate::store::record_store::StoreError;

    #[test]
    fn matching_owner_passes() {
        let record = Evaluation::new("eval_1", "u1", "A", "ok");
        assert!(ensure_owner(&record, "u1").is_ok());
    }

    #[test]
    fn mismatched_owner_is_forbidden() {
        let record = Evaluation::new("eval_1", "u1", "A", "ok");
        let err = ensure_owner(&record, "u2").unwrap_err();
        assert!(matches!(
            err,
            StoreError::Forbidden {
                kind: RecordKind::Evaluation,
                ..
            }
        ));
    }

    #[test]
    fn comparison_is_exact() {
        let record = Evaluation::new("eval_1", "u1", "A", "ok");
        assert!(ensure_owner(&record, "U1").is_err());
        assert!(ensure_owner(&record, "u1 ").is_err());
    }
}

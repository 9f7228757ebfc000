//! Core record-store logic for EduLedger.
//! This crate is the single source of truth for ledger record invariants.

pub mod contract;
pub mod db;
pub mod ledger;
pub mod logging;
pub mod model;
pub mod store;

pub use contract::{ContractError, ContractResult, RecordContract};
pub use ledger::{
    LedgerError, LedgerGateway, LedgerResult, MemoryLedger, Scan, ScanGuard, Selector,
    SqliteLedger,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::record::{
    Evaluation, Judgement, LedgerRecord, RecordKind, RecordValidationError, TestResult,
};
pub use store::access::ensure_owner;
pub use store::record_store::{RecordStore, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

//! In-memory ledger adapter.
//!
//! # Responsibility
//! - Stand in for the host ledger in tests and embedded development.
//! - Make cursor release observable through an open-scan counter.
//!
//! # Invariants
//! - Clone handles share one map; dropping a handle never drops state.
//! - Scan filtering is lazy: one JSON parse plus predicate per `next()`.
//! - Values that are not valid JSON never satisfy an equality selector.

use super::{LedgerGateway, LedgerResult, Scan, ScanGuard, Selector};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared in-memory key-value ledger.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    entries: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
    open_scans: Arc<AtomicUsize>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_entries().is_empty()
    }

    /// Number of scans opened and not yet dropped.
    pub fn open_scans(&self) -> usize {
        self.open_scans.load(Ordering::SeqCst)
    }

    fn lock_entries(&self) -> MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        // A poisoned mutex only means another handle panicked mid-access;
        // the map itself is still consistent after any single operation.
        self.entries.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl LedgerGateway for MemoryLedger {
    fn get(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        Ok(self.lock_entries().get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> LedgerResult<()> {
        self.lock_entries().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> LedgerResult<()> {
        self.lock_entries().remove(key);
        Ok(())
    }

    fn query(&self, selector: &Selector) -> LedgerResult<Scan> {
        // Snapshot candidate values while holding the lock, then filter
        // lazily so each `next()` pays one parse plus predicate.
        let snapshot: Vec<Vec<u8>> = self.lock_entries().values().cloned().collect();
        let selector = selector.clone();
        let items = snapshot
            .into_iter()
            .filter_map(
                move |value| match serde_json::from_slice::<serde_json::Value>(&value) {
                    Ok(doc) if selector.matches(&doc) => Some(Ok(value)),
                    _ => None,
                },
            );
        let guard = ScanGuard::register(Arc::clone(&self.open_scans));
        Ok(Scan::with_guard(Box::new(items), guard))
    }
}

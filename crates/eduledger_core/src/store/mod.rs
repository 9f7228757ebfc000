//! Record store orchestration above the ledger gateway.
//!
//! # Responsibility
//! - Enforce record lifecycle rules and ownership policy.
//! - Keep key construction, stamping and (de)serialization in one code path.
//!
//! # Invariants
//! - Every write validates its input and stamps `docType` before `put`.
//! - The gateway is injected at construction, never reached through global
//!   state.

pub mod access;
pub mod record_store;

//! Domain model for ledger-backed evaluative records.
//!
//! # Responsibility
//! - Define the canonical record shapes shared by store and contract layers.
//! - Keep wire-field naming and key construction in one place.
//!
//! # Invariants
//! - Every persisted record carries a `docType` discriminator equal to its
//!   kind name.
//! - Record identity is `kind + identifier`; both are opaque strings.

pub mod record;

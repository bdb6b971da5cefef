//! Outcome types for idempotent datastore operations.
//!
//! Duplicate chain deliveries and gateway callback retries are expected traffic, so "the row was
//! already there" and "the conditional update matched nothing" are successful results, not errors.
use crate::db_types::Payment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertPropertyResult {
    Inserted,
    /// The property was already known; mutable fields were overwritten (the chain is
    /// authoritative).
    Updated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertAgreementResult {
    Inserted,
    /// Duplicate delivery of an already-signed agreement. Nothing to update.
    AlreadyExists,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertPaymentResult {
    Inserted(String),
    AlreadyExists(String),
}

/// Result of the guarded `Pending → {Completed, Failed}` transition.
#[derive(Debug, Clone)]
pub enum SettlementResult {
    /// This call won the race: the row was Pending and is now terminal.
    Settled(Payment),
    /// The conditional update matched no rows: the payment is unknown or already terminal.
    /// Duplicate callbacks land here and are absorbed silently.
    NoOp,
}

use std::fmt::Display;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconciliationError {
    #[error("Backend storage error: {0}")]
    DatabaseError(String),
    #[error("Payment provider rejected the request: {0}")]
    ProviderRejected(String),
    #[error("Payment [{0}] not found")]
    PaymentNotFound(String),
}

impl ReconciliationError {
    /// Wrap a backend error. The concrete backend error type varies with `B::Error`, so it is
    /// carried as its rendered message.
    pub fn db<E: Display>(e: E) -> Self {
        ReconciliationError::DatabaseError(e.to_string())
    }
}

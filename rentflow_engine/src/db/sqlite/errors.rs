use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Payment {0} disappeared mid-transaction. This is a bug.")]
    PaymentVanished(String),
    #[error("Refusing to settle payment {payment_id} to non-terminal status {status}")]
    NonTerminalSettlement { payment_id: String, status: String },
    #[error("Block number {0} cannot be represented in the cursor table")]
    BlockNumberOverflow(u64),
}

use log::{debug, trace};
use rf_common::WalletAddress;
use sqlx::SqliteConnection;

use crate::{
    db::{
        common::{InsertPaymentResult, SettlementResult},
        sqlite::SqliteDatabaseError,
    },
    db_types::{NewPayment, Payment, PaymentHistory, PaymentStatus},
};

const PAYMENT_COLUMNS: &str =
    "payment_id, payer_address, property_id, amount, currency, method, status, receipt, created_at, updated_at";

/// Insert a payment keyed by its correlation id (or chain id). A duplicate key reports
/// `AlreadyExists` and leaves the existing row untouched.
pub async fn idempotent_insert(
    payment: NewPayment,
    conn: &mut SqliteConnection,
) -> Result<InsertPaymentResult, SqliteDatabaseError> {
    let payment_id = payment.payment_id.clone();
    let result = sqlx::query(
        r#"
            INSERT INTO payments (payment_id, payer_address, property_id, amount, currency, method, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7);
        "#,
    )
    .bind(&payment.payment_id)
    .bind(payment.payer_address.as_str())
    .bind(payment.property_id)
    .bind(payment.amount)
    .bind(&payment.currency)
    .bind(payment.method.to_string())
    .bind(payment.status.to_string())
    .execute(conn)
    .await;
    match result {
        Ok(_) => Ok(InsertPaymentResult::Inserted(payment_id)),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(InsertPaymentResult::AlreadyExists(payment_id)),
        Err(e) => Err(SqliteDatabaseError::from(e)),
    }
}

/// The guarded terminal transition. The WHERE clause carries the expected current state, so of any
/// number of concurrent attempts exactly one affects a row; the rest observe `NoOp`.
pub async fn settle(
    payment_id: &str,
    status: PaymentStatus,
    receipt: Option<String>,
    conn: &mut SqliteConnection,
) -> Result<SettlementResult, SqliteDatabaseError> {
    if !status.is_terminal() {
        return Err(SqliteDatabaseError::NonTerminalSettlement {
            payment_id: payment_id.to_string(),
            status: status.to_string(),
        });
    }
    let result = sqlx::query(
        r#"
            UPDATE payments
            SET status = $1, receipt = COALESCE($2, receipt), updated_at = CURRENT_TIMESTAMP
            WHERE payment_id = $3 AND status = 'Pending';
        "#,
    )
    .bind(status.to_string())
    .bind(receipt)
    .bind(payment_id)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 0 {
        trace!("🗃️ Payment [{payment_id}] was not Pending (or is unknown). Settlement is a no-op.");
        return Ok(SettlementResult::NoOp);
    }
    let payment =
        fetch_payment(payment_id, conn).await?.ok_or_else(|| SqliteDatabaseError::PaymentVanished(payment_id.into()))?;
    debug!("🗃️ Payment [{payment_id}] settled as {status}");
    Ok(SettlementResult::Settled(payment))
}

pub async fn fetch_payment(
    payment_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, SqliteDatabaseError> {
    let payment =
        sqlx::query_as::<_, Payment>(&format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE payment_id = $1"))
            .bind(payment_id)
            .fetch_optional(conn)
            .await?;
    Ok(payment)
}

pub async fn history(
    payer: &WalletAddress,
    limit: i64,
    offset: i64,
    conn: &mut SqliteConnection,
) -> Result<PaymentHistory, SqliteDatabaseError> {
    let payments = sqlx::query_as::<_, Payment>(&format!(
        r#"
            SELECT {PAYMENT_COLUMNS} FROM payments
            WHERE payer_address = $1
            ORDER BY created_at DESC, payment_id DESC
            LIMIT $2 OFFSET $3;
        "#
    ))
    .bind(payer.as_str())
    .bind(limit)
    .bind(offset)
    .fetch_all(&mut *conn)
    .await?;
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE payer_address = $1")
        .bind(payer.as_str())
        .fetch_one(conn)
        .await?;
    Ok(PaymentHistory { payments, total, limit, offset })
}

use sqlx::SqliteConnection;

use crate::{
    db::{common::InsertAgreementResult, sqlite::SqliteDatabaseError},
    db_types::{Agreement, NewAgreement},
};

/// Insert the agreement, or report `AlreadyExists` when this chain id has been delivered before.
/// The row already reflects the signed state, so there is nothing to update on conflict.
pub async fn idempotent_insert(
    agreement: NewAgreement,
    conn: &mut SqliteConnection,
) -> Result<InsertAgreementResult, SqliteDatabaseError> {
    let result = sqlx::query(
        r#"
            INSERT INTO agreements
                (agreement_id, tenant_address, landlord_address, property_id, starts_at, ends_at, rent_amount)
            VALUES ($1, $2, $3, $4, $5, $6, $7);
        "#,
    )
    .bind(agreement.agreement_id)
    .bind(agreement.tenant_address.as_str())
    .bind(agreement.landlord_address.as_str())
    .bind(agreement.property_id)
    .bind(agreement.starts_at)
    .bind(agreement.ends_at)
    .bind(agreement.rent_amount)
    .execute(conn)
    .await;
    match result {
        Ok(_) => Ok(InsertAgreementResult::Inserted),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(InsertAgreementResult::AlreadyExists),
        Err(e) => Err(SqliteDatabaseError::from(e)),
    }
}

pub async fn fetch_agreement(
    agreement_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Agreement>, SqliteDatabaseError> {
    let agreement = sqlx::query_as::<_, Agreement>(
        r#"
            SELECT agreement_id, tenant_address, landlord_address, property_id, starts_at, ends_at,
                   rent_amount, status, signed_at
            FROM agreements
            WHERE agreement_id = $1;
        "#,
    )
    .bind(agreement_id)
    .fetch_optional(conn)
    .await?;
    Ok(agreement)
}

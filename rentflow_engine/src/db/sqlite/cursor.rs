use sqlx::SqliteConnection;

use crate::db::sqlite::SqliteDatabaseError;

/// The single cursor stream for the rental contract's event log.
pub const CHAIN_STREAM: &str = "chain-events";

pub async fn last_block(stream: &str, conn: &mut SqliteConnection) -> Result<Option<u64>, SqliteDatabaseError> {
    let block: Option<i64> = sqlx::query_scalar("SELECT last_block FROM chain_cursor WHERE stream = $1")
        .bind(stream)
        .fetch_optional(conn)
        .await?;
    #[allow(clippy::cast_sign_loss)]
    Ok(block.map(|b| b as u64))
}

/// Record a fully-processed block. MAX() keeps the cursor monotonic even if a replayed older
/// event is processed after a newer one.
pub async fn record_block(stream: &str, block: u64, conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    let block = i64::try_from(block).map_err(|_| SqliteDatabaseError::BlockNumberOverflow(block))?;
    sqlx::query(
        r#"
            INSERT INTO chain_cursor (stream, last_block) VALUES ($1, $2)
            ON CONFLICT (stream) DO UPDATE SET
                last_block = MAX(last_block, excluded.last_block),
                updated_at = CURRENT_TIMESTAMP;
        "#,
    )
    .bind(stream)
    .bind(block)
    .execute(conn)
    .await?;
    Ok(())
}

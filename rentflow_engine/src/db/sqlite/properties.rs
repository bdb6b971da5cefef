use log::trace;
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db::{common::UpsertPropertyResult, sqlite::SqliteDatabaseError},
    db_types::{NewProperty, Property},
};

/// Insert or overwrite the property row. The ON CONFLICT clause is a single atomic statement, so
/// concurrent duplicate deliveries of the same event cannot interleave. The lifecycle `status`
/// column is deliberately left alone on update.
pub async fn upsert(
    property: NewProperty,
    conn: &mut SqliteConnection,
) -> Result<UpsertPropertyResult, SqliteDatabaseError> {
    // Only used to report Inserted vs Updated for logging; the write below is atomic either way.
    let existing = property_exists(property.property_id, conn).await?;
    sqlx::query(
        r#"
            INSERT INTO properties (property_id, owner_address, title, location, price, image_urls)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (property_id) DO UPDATE SET
                owner_address = excluded.owner_address,
                title = excluded.title,
                location = excluded.location,
                price = excluded.price,
                image_urls = excluded.image_urls,
                updated_at = CURRENT_TIMESTAMP;
        "#,
    )
    .bind(property.property_id)
    .bind(property.owner_address.as_str())
    .bind(&property.title)
    .bind(&property.location)
    .bind(property.price)
    .bind(Json(&property.image_urls))
    .execute(conn)
    .await?;
    let result = if existing { UpsertPropertyResult::Updated } else { UpsertPropertyResult::Inserted };
    trace!("🗃️ Property #{} upserted ({result:?})", property.property_id);
    Ok(result)
}

pub async fn fetch_property(
    property_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Property>, SqliteDatabaseError> {
    let property = sqlx::query_as::<_, Property>(
        r#"
            SELECT property_id, owner_address, title, location, price, image_urls, status, created_at, updated_at
            FROM properties
            WHERE property_id = $1;
        "#,
    )
    .bind(property_id)
    .fetch_optional(conn)
    .await?;
    Ok(property)
}

async fn property_exists(property_id: i64, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM properties WHERE property_id = $1)")
        .bind(property_id)
        .fetch_one(conn)
        .await?;
    Ok(exists)
}

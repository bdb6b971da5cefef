use rf_common::WalletAddress;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{NewNotification, Notification, NotificationPage},
};

const NOTIFICATION_COLUMNS: &str = "id, recipient, title, message, category, read, created_at";

pub async fn insert(
    notification: NewNotification,
    conn: &mut SqliteConnection,
) -> Result<Notification, SqliteDatabaseError> {
    let row = sqlx::query_as::<_, Notification>(&format!(
        r#"
            INSERT INTO notifications (recipient, title, message, category)
            VALUES ($1, $2, $3, $4)
            RETURNING {NOTIFICATION_COLUMNS};
        "#
    ))
    .bind(notification.recipient.as_str())
    .bind(&notification.title)
    .bind(&notification.message)
    .bind(&notification.category)
    .fetch_one(conn)
    .await?;
    Ok(row)
}

/// One page, newest first, with the total and unread counts for the recipient.
pub async fn fetch_page(
    recipient: &WalletAddress,
    limit: i64,
    offset: i64,
    conn: &mut SqliteConnection,
) -> Result<NotificationPage, SqliteDatabaseError> {
    let notifications = sqlx::query_as::<_, Notification>(&format!(
        r#"
            SELECT {NOTIFICATION_COLUMNS} FROM notifications
            WHERE recipient = $1
            ORDER BY id DESC
            LIMIT $2 OFFSET $3;
        "#
    ))
    .bind(recipient.as_str())
    .bind(limit)
    .bind(offset)
    .fetch_all(&mut *conn)
    .await?;
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE recipient = $1")
        .bind(recipient.as_str())
        .fetch_one(&mut *conn)
        .await?;
    let unread = unread_count(recipient, conn).await?;
    Ok(NotificationPage { notifications, total, unread })
}

pub async fn unread_count(recipient: &WalletAddress, conn: &mut SqliteConnection) -> Result<i64, SqliteDatabaseError> {
    let unread: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE recipient = $1 AND read = 0")
        .bind(recipient.as_str())
        .fetch_one(conn)
        .await?;
    Ok(unread)
}

/// Recipient-scoped: an id that belongs to someone else, or is already read, matches nothing.
pub async fn mark_read(
    id: i64,
    recipient: &WalletAddress,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query("UPDATE notifications SET read = 1 WHERE id = $1 AND recipient = $2 AND read = 0")
        .bind(id)
        .bind(recipient.as_str())
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn mark_all_read(recipient: &WalletAddress, conn: &mut SqliteConnection) -> Result<u64, SqliteDatabaseError> {
    let result = sqlx::query("UPDATE notifications SET read = 1 WHERE recipient = $1 AND read = 0")
        .bind(recipient.as_str())
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

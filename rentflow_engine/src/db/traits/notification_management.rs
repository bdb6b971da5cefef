use rf_common::WalletAddress;

use crate::db_types::{NewNotification, Notification, NotificationPage};

/// Datastore contract for durable notifications.
///
/// A notification exists once this trait says so; the live push that may follow is best-effort
/// and carries no durability. Clients that were offline catch up via
/// [`NotificationManagement::fetch_notifications`].
#[allow(async_fn_in_trait)]
pub trait NotificationManagement: Clone {
    type Error: std::error::Error;

    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, Self::Error>;

    /// One page, newest first, plus total and unread counts.
    async fn fetch_notifications(
        &self,
        recipient: &WalletAddress,
        limit: i64,
        offset: i64,
    ) -> Result<NotificationPage, Self::Error>;

    async fn unread_count(&self, recipient: &WalletAddress) -> Result<i64, Self::Error>;

    /// Returns `true` if a row was flipped to read. Scoped to the recipient: an id belonging to
    /// another recipient, or one that is already read, matches nothing and returns `false`.
    async fn mark_notification_read(&self, id: i64, recipient: &WalletAddress) -> Result<bool, Self::Error>;

    /// Returns the number of notifications flipped to read.
    async fn mark_all_read(&self, recipient: &WalletAddress) -> Result<u64, Self::Error>;
}

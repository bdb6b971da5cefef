use log::*;
use rf_common::WalletAddress;
use serde_json::Value;

use crate::{
    db_types::{NewNotification, Notification, NotificationPage},
    live::{ConnectionRegistry, PushMessage},
    rfe_api::ReconciliationError,
    traits::NotificationManagement,
};

/// Durable record-keeping of notifications plus best-effort real-time push.
///
/// The ordering contract is durability before delivery: [`NotificationHub::notify`] fails if the
/// row cannot be persisted, and only then attempts the live push. A notification that exists only
/// as a transient push frame is not acceptable; one that exists only as a row is fine, because the
/// client discovers it on its next poll.
#[derive(Clone)]
pub struct NotificationHub<B> {
    db: B,
    registry: ConnectionRegistry,
}

impl<B> NotificationHub<B> {
    pub fn new(db: B) -> Self {
        Self { db, registry: ConnectionRegistry::new() }
    }

    /// The registry is shared with the transport layer, which registers and unregisters handles
    /// as clients identify and disconnect.
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }
}

impl<B> NotificationHub<B>
where B: NotificationManagement
{
    /// Persist a notification for the recipient and push it to their live connection, if any.
    ///
    /// Persistence failure fails the whole call. Push failure (no connection, disconnected
    /// mid-push, backlogged client) does not: the row is already durable.
    pub async fn notify(
        &self,
        recipient: &WalletAddress,
        title: &str,
        message: &str,
        category: &str,
    ) -> Result<Notification, ReconciliationError> {
        let notification = NewNotification::new(recipient.clone(), title, message).with_category(category);
        let notification = self.db.insert_notification(notification).await.map_err(ReconciliationError::db)?;
        let pushed = self.registry.push(recipient, PushMessage::from_notification(&notification));
        debug!("📬️ '{title}' recorded for {recipient} (live push: {pushed})");
        Ok(notification)
    }

    /// Push an event to every live connection, persisting nothing. Only for non-critical events
    /// that clients can discover by other means.
    pub fn broadcast(&self, event: &str, payload: Value) {
        let delivered = self.registry.broadcast(PushMessage::new(event, payload));
        debug!("📬️ Broadcast '{event}' to {delivered} live clients");
    }

    pub async fn list_notifications(
        &self,
        recipient: &WalletAddress,
        limit: i64,
        offset: i64,
    ) -> Result<NotificationPage, ReconciliationError> {
        self.db.fetch_notifications(recipient, limit, offset).await.map_err(ReconciliationError::db)
    }

    pub async fn unread_count(&self, recipient: &WalletAddress) -> Result<i64, ReconciliationError> {
        self.db.unread_count(recipient).await.map_err(ReconciliationError::db)
    }

    /// Scoped to the recipient: marking someone else's notification id affects nothing and
    /// returns `false`.
    pub async fn mark_read(&self, id: i64, recipient: &WalletAddress) -> Result<bool, ReconciliationError> {
        self.db.mark_notification_read(id, recipient).await.map_err(ReconciliationError::db)
    }

    pub async fn mark_all_read(&self, recipient: &WalletAddress) -> Result<u64, ReconciliationError> {
        self.db.mark_all_read(recipient).await.map_err(ReconciliationError::db)
    }
}

use std::fmt::Debug;

use log::*;
use rf_common::WalletAddress;
use sqlx::SqlitePool;

use crate::{
    db::{
        common::{InsertAgreementResult, InsertPaymentResult, SettlementResult, UpsertPropertyResult},
        sqlite::{agreements, cursor, db_url, new_pool, notifications, payments, properties, SqliteDatabaseError},
        traits::{ChainEventDatabase, NotificationManagement, PaymentManagement},
    },
    db_types::{
        Agreement,
        NewAgreement,
        NewNotification,
        NewPayment,
        NewProperty,
        Notification,
        NotificationPage,
        Payment,
        PaymentHistory,
        PaymentStatus,
        Property,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL from the environment.
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Applies any outstanding schema migrations.
    pub async fn run_migrations(&self) -> Result<(), SqliteDatabaseError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    pub async fn fetch_agreement(&self, agreement_id: i64) -> Result<Option<Agreement>, SqliteDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        agreements::fetch_agreement(agreement_id, &mut conn).await
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl ChainEventDatabase for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn upsert_property(&self, property: NewProperty) -> Result<UpsertPropertyResult, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let id = property.property_id;
        let result = properties::upsert(property, &mut conn).await?;
        debug!("🗃️ Property #{id} saved ({result:?})");
        Ok(result)
    }

    async fn insert_agreement(&self, agreement: NewAgreement) -> Result<InsertAgreementResult, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let id = agreement.agreement_id;
        let result = agreements::idempotent_insert(agreement, &mut conn).await?;
        match result {
            InsertAgreementResult::Inserted => debug!("🗃️ Agreement #{id} saved"),
            InsertAgreementResult::AlreadyExists => {
                debug!("🗃️ Agreement #{id} was delivered before. Nothing to do.")
            },
        }
        Ok(result)
    }

    async fn insert_onchain_payment(&self, payment: NewPayment) -> Result<InsertPaymentResult, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let result = payments::idempotent_insert(payment, &mut conn).await?;
        if let InsertPaymentResult::AlreadyExists(id) = &result {
            debug!("🗃️ On-chain payment [{id}] was delivered before. Nothing to do.");
        }
        Ok(result)
    }

    async fn fetch_property(&self, property_id: i64) -> Result<Option<Property>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        properties::fetch_property(property_id, &mut conn).await
    }

    async fn last_processed_block(&self) -> Result<Option<u64>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        cursor::last_block(cursor::CHAIN_STREAM, &mut conn).await
    }

    async fn record_processed_block(&self, block: u64) -> Result<(), Self::Error> {
        let mut conn = self.pool.acquire().await?;
        cursor::record_block(cursor::CHAIN_STREAM, block, &mut conn).await
    }
}

impl PaymentManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn insert_pending_payment(&self, payment: NewPayment) -> Result<InsertPaymentResult, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let result = payments::idempotent_insert(payment, &mut conn).await?;
        if let InsertPaymentResult::Inserted(id) = &result {
            debug!("🗃️ Pending payment [{id}] saved");
        }
        Ok(result)
    }

    async fn settle_payment(
        &self,
        payment_id: &str,
        status: PaymentStatus,
        receipt: Option<String>,
    ) -> Result<SettlementResult, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        payments::settle(payment_id, status, receipt, &mut conn).await
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<Option<Payment>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        payments::fetch_payment(payment_id, &mut conn).await
    }

    async fn payment_history(
        &self,
        payer: &WalletAddress,
        limit: i64,
        offset: i64,
    ) -> Result<PaymentHistory, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        payments::history(payer, limit, offset, &mut conn).await
    }
}

impl NotificationManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        notifications::insert(notification, &mut conn).await
    }

    async fn fetch_notifications(
        &self,
        recipient: &WalletAddress,
        limit: i64,
        offset: i64,
    ) -> Result<NotificationPage, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        notifications::fetch_page(recipient, limit, offset, &mut conn).await
    }

    async fn unread_count(&self, recipient: &WalletAddress) -> Result<i64, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        notifications::unread_count(recipient, &mut conn).await
    }

    async fn mark_notification_read(&self, id: i64, recipient: &WalletAddress) -> Result<bool, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        notifications::mark_read(id, recipient, &mut conn).await
    }

    async fn mark_all_read(&self, recipient: &WalletAddress) -> Result<u64, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        notifications::mark_all_read(recipient, &mut conn).await
    }
}

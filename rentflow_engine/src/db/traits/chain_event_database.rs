use crate::{
    db::common::{InsertAgreementResult, InsertPaymentResult, UpsertPropertyResult},
    db_types::{NewAgreement, NewPayment, NewProperty, Property},
};

/// Datastore contract for the event ingester.
///
/// Every write here is an atomic, conditional operation (insert-or-no-op, upsert), never a
/// read-modify-write: that is what makes concurrent duplicate deliveries from the chain node safe.
#[allow(async_fn_in_trait)]
pub trait ChainEventDatabase: Clone {
    type Error: std::error::Error;

    /// Insert or overwrite the property row for this chain-assigned id. Mutable fields
    /// (title/location/price/images/owner) are overwritten unconditionally; the chain is
    /// authoritative. Lifecycle status is not touched on update.
    async fn upsert_property(&self, property: NewProperty) -> Result<UpsertPropertyResult, Self::Error>;

    /// Insert the agreement in `Active` status, or report `AlreadyExists` on duplicate delivery.
    async fn insert_agreement(&self, agreement: NewAgreement) -> Result<InsertAgreementResult, Self::Error>;

    /// Insert an on-chain payment (already `Completed`), or report `AlreadyExists`.
    async fn insert_onchain_payment(&self, payment: NewPayment) -> Result<InsertPaymentResult, Self::Error>;

    async fn fetch_property(&self, property_id: i64) -> Result<Option<Property>, Self::Error>;

    /// The last block this ingester is certain it fully processed, if any. The subscription
    /// resumes from the next block after a reconnect.
    async fn last_processed_block(&self) -> Result<Option<u64>, Self::Error>;

    /// Durably record a fully-processed block. Never moves the cursor backwards.
    async fn record_processed_block(&self, block: u64) -> Result<(), Self::Error>;
}

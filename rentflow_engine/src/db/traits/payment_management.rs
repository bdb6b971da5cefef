use rf_common::WalletAddress;

use crate::{
    db::common::{InsertPaymentResult, SettlementResult},
    db_types::{NewPayment, Payment, PaymentHistory, PaymentStatus},
};

/// Datastore contract for the mobile-money payment lifecycle.
///
/// The state machine is `none → Pending → {Completed, Failed}` and the correlation id is the sole
/// idempotency key. [`PaymentManagement::settle_payment`] is the only way out of `Pending`, and it
/// is expressed as a conditional update so that concurrent callback deliveries race safely: the
/// loser observes `SettlementResult::NoOp`.
#[allow(async_fn_in_trait)]
pub trait PaymentManagement: Clone {
    type Error: std::error::Error;

    /// Insert a `Pending` payment keyed by the gateway's correlation id.
    async fn insert_pending_payment(&self, payment: NewPayment) -> Result<InsertPaymentResult, Self::Error>;

    /// Transition the payment to the given terminal state, only if it is currently `Pending`.
    /// Passing a non-terminal status is a programming error and returns `Err`.
    async fn settle_payment(
        &self,
        payment_id: &str,
        status: PaymentStatus,
        receipt: Option<String>,
    ) -> Result<SettlementResult, Self::Error>;

    async fn fetch_payment(&self, payment_id: &str) -> Result<Option<Payment>, Self::Error>;

    /// The payer's payments, newest first.
    async fn payment_history(
        &self,
        payer: &WalletAddress,
        limit: i64,
        offset: i64,
    ) -> Result<PaymentHistory, Self::Error>;
}

use log::*;
use rf_common::WalletAddress;

use crate::{
    db::common::{InsertPaymentResult, SettlementResult},
    db_types::{NewPayment, Payment, PaymentHistory, PaymentStatus},
    rfe_api::{
        payment_provider::{PushPaymentProvider, PushPaymentRequest},
        NotificationHub,
        ReconciliationError,
    },
    traits::{ChainEventDatabase, NotificationManagement, PaymentManagement},
};

/// The settled half of a gateway callback, after the transport layer has parsed and validated the
/// wire format. Malformed payloads never get this far.
#[derive(Debug, Clone)]
pub struct CallbackOutcome {
    pub correlation_id: String,
    pub status: CallbackStatus,
}

#[derive(Debug, Clone)]
pub enum CallbackStatus {
    Success { receipt: String },
    Failure { reason: String },
}

/// What a callback application did.
#[derive(Debug, Clone)]
pub enum CallbackResult {
    /// This delivery won the race and moved the payment to a terminal state.
    Settled(Payment),
    /// Duplicate or unknown correlation id; nothing changed and nobody was notified.
    Ignored,
}

/// Drives the mobile-money payment lifecycle.
///
/// The lifecycle spans two uncorrelated network calls: the initiation request this engine makes,
/// and a callback the remote gateway makes later — possibly never, possibly more than once. The
/// correlation id links them and is the sole idempotency key; payload ordering and retry counts
/// are never trusted.
pub struct PaymentGateway<B, P> {
    db: B,
    provider: P,
    hub: NotificationHub<B>,
}

impl<B, P> PaymentGateway<B, P> {
    pub fn new(db: B, provider: P, hub: NotificationHub<B>) -> Self {
        Self { db, provider, hub }
    }
}

impl<B, P> PaymentGateway<B, P>
where
    B: PaymentManagement + ChainEventDatabase + NotificationManagement,
    P: PushPaymentProvider,
{
    /// Start a push payment. The provider call comes first: if the gateway rejects the request,
    /// nothing is persisted — there must be no pending row for a payment that was never accepted.
    /// On acceptance the `Pending` row is keyed by the gateway's correlation id.
    pub async fn initiate(
        &self,
        payer: &WalletAddress,
        amount: i64,
        property_id: i64,
        phone_number: &str,
    ) -> Result<Payment, ReconciliationError> {
        let request = PushPaymentRequest {
            phone_number: phone_number.to_string(),
            amount,
            account_reference: format!("RENT-{property_id}"),
            description: format!("Rent payment for property {property_id}"),
        };
        let correlation_id = self
            .provider
            .request_push(request)
            .await
            .map_err(|e| ReconciliationError::ProviderRejected(e.to_string()))?;
        info!("💰️ Push payment accepted by the gateway. Correlation id [{correlation_id}]");

        let payment = NewPayment::mpesa(correlation_id.clone(), payer.clone(), property_id, amount);
        if let InsertPaymentResult::AlreadyExists(id) =
            self.db.insert_pending_payment(payment).await.map_err(ReconciliationError::db)?
        {
            // The gateway is supposed to mint fresh correlation ids. If it re-issues one, the
            // existing row already tracks this payment.
            warn!("💰️ Correlation id [{id}] was already tracked. Gateway re-issued an id?");
        }
        let payment = self
            .db
            .fetch_payment(&correlation_id)
            .await
            .map_err(ReconciliationError::db)?
            .ok_or_else(|| ReconciliationError::PaymentNotFound(correlation_id.clone()))?;

        self.notify_quietly(
            payer,
            "Payment Initiated",
            &format!("M-Pesa payment of KES {amount} initiated. Please complete the payment on your phone."),
        )
        .await;
        Ok(payment)
    }

    /// Apply a parsed callback as a guarded state transition.
    ///
    /// The conditional update succeeds only while the payment is `Pending`. A second delivery of
    /// the same outcome — or a delivery for an id we never issued — affects zero rows, and that
    /// `Ignored` result is the expected concurrent-idempotence path, not an error. Notifications
    /// are sent only by the delivery that actually transitioned the row, so duplicate callbacks
    /// can never duplicate them.
    pub async fn apply_callback(&self, outcome: CallbackOutcome) -> Result<CallbackResult, ReconciliationError> {
        let id = outcome.correlation_id.as_str();
        match outcome.status {
            CallbackStatus::Success { receipt } => {
                let settled = self
                    .db
                    .settle_payment(id, PaymentStatus::Completed, Some(receipt.clone()))
                    .await
                    .map_err(ReconciliationError::db)?;
                match settled {
                    SettlementResult::Settled(payment) => {
                        info!("💰️ Payment [{id}] completed. Receipt {receipt}");
                        self.notify_success(&payment, &receipt).await;
                        Ok(CallbackResult::Settled(payment))
                    },
                    SettlementResult::NoOp => {
                        debug!("💰️ Success callback for [{id}] was a no-op (duplicate or unknown). Absorbed.");
                        Ok(CallbackResult::Ignored)
                    },
                }
            },
            CallbackStatus::Failure { reason } => {
                let settled = self
                    .db
                    .settle_payment(id, PaymentStatus::Failed, None)
                    .await
                    .map_err(ReconciliationError::db)?;
                match settled {
                    SettlementResult::Settled(payment) => {
                        info!("💰️ Payment [{id}] failed: {reason}");
                        self.notify_quietly(
                            &payment.payer_address,
                            "Payment Failed",
                            &format!("Your M-Pesa payment failed. Reason: {reason}"),
                        )
                        .await;
                        Ok(CallbackResult::Settled(payment))
                    },
                    SettlementResult::NoOp => {
                        debug!("💰️ Failure callback for [{id}] was a no-op (duplicate or unknown). Absorbed.");
                        Ok(CallbackResult::Ignored)
                    },
                }
            },
        }
    }

    pub async fn payment_by_correlation_id(&self, correlation_id: &str) -> Result<Option<Payment>, ReconciliationError> {
        self.db.fetch_payment(correlation_id).await.map_err(ReconciliationError::db)
    }

    pub async fn payment_history(
        &self,
        payer: &WalletAddress,
        limit: i64,
        offset: i64,
    ) -> Result<PaymentHistory, ReconciliationError> {
        self.db.payment_history(payer, limit, offset).await.map_err(ReconciliationError::db)
    }

    async fn notify_success(&self, payment: &Payment, receipt: &str) {
        let (payer_msg, owner) = match self.db.fetch_property(payment.property_id).await {
            Ok(Some(property)) => (
                format!(
                    "Your M-Pesa payment of KES {} for {} was successful. Receipt: {receipt}",
                    payment.amount, property.title
                ),
                Some((property.owner_address.clone(), property.title)),
            ),
            Ok(None) => (
                format!(
                    "Your M-Pesa payment of KES {} for property {} was successful. Receipt: {receipt}",
                    payment.amount, payment.property_id
                ),
                None,
            ),
            Err(e) => {
                warn!("💰️ Property lookup after settlement failed: {e}. Sending degraded notifications.");
                (
                    format!(
                        "Your M-Pesa payment of KES {} for property {} was successful. Receipt: {receipt}",
                        payment.amount, payment.property_id
                    ),
                    None,
                )
            },
        };
        self.notify_quietly(&payment.payer_address, "Payment Successful", &payer_msg).await;
        if let Some((owner_address, title)) = owner {
            self.notify_quietly(
                &owner_address,
                "Rent Payment Received",
                &format!("Tenant paid KES {} via M-Pesa for {title}. Receipt: {receipt}", payment.amount),
            )
            .await;
        }
    }

    /// The payment row is already committed when notifications go out; a delivery failure here
    /// never rolls back or fails the originating operation.
    async fn notify_quietly(&self, recipient: &WalletAddress, title: &str, message: &str) {
        if let Err(e) = self.hub.notify(recipient, title, message, "payment").await {
            error!("💰️ Could not notify {recipient} ('{title}'): {e}");
        }
    }
}

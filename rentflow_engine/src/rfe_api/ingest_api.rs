use log::*;
use rf_common::WalletAddress;
use serde_json::json;

use crate::{
    db::common::{InsertAgreementResult, InsertPaymentResult},
    db_types::{NewAgreement, NewPayment, NewProperty},
    events::{
        AgreementSignedEvent,
        ChainEvent,
        DepositReleasedEvent,
        PaymentReceivedEvent,
        PropertyListedEvent,
    },
    rfe_api::{NotificationHub, ReconciliationError},
    traits::{ChainEventDatabase, NotificationManagement},
};

/// Projects on-chain facts into the datastore and notifies the affected parties.
///
/// The chain node delivers at-least-once: duplicates and replays after a reconnect are expected
/// traffic, and every handler is idempotent via the datastore's conditional writes. The error
/// contract matters here: a persistence failure propagates as `Err`, which tells the subscription
/// loop not to advance its cursor past the event, so it is retried on reconnect. A notification
/// failure after the write committed is logged and swallowed — the state change already happened
/// and is not rolled back for a downstream delivery problem.
pub struct EventIngester<B> {
    db: B,
    hub: NotificationHub<B>,
}

impl<B> EventIngester<B> {
    pub fn new(db: B, hub: NotificationHub<B>) -> Self {
        Self { db, hub }
    }
}

impl<B> EventIngester<B>
where B: ChainEventDatabase + NotificationManagement
{
    pub async fn handle_event(&self, event: ChainEvent) -> Result<(), ReconciliationError> {
        trace!("⛓️ {} event at block {}", event.kind(), event.block_number());
        match event {
            ChainEvent::PropertyListed(ev) => self.property_listed(ev).await,
            ChainEvent::AgreementSigned(ev) => self.agreement_signed(ev).await,
            ChainEvent::PaymentReceived(ev) => self.payment_received(ev).await,
            ChainEvent::DepositReleased(ev) => self.deposit_released(ev).await,
        }
    }

    /// The chain is authoritative: a listing for a known id overwrites the mutable fields
    /// unconditionally. The broadcast is not persisted per-recipient; listings are discoverable
    /// through search.
    async fn property_listed(&self, ev: PropertyListedEvent) -> Result<(), ReconciliationError> {
        let property = NewProperty {
            property_id: ev.property_id,
            owner_address: ev.landlord.clone(),
            title: ev.title.clone(),
            location: ev.location.clone(),
            price: ev.price,
            image_urls: ev.images.clone(),
        };
        let result = self.db.upsert_property(property).await.map_err(ReconciliationError::db)?;
        debug!("⛓️ Property #{} listed by {} ({result:?})", ev.property_id, ev.landlord);
        self.hub.broadcast(
            "newProperty",
            json!({
                "propertyId": ev.property_id,
                "landlord": ev.landlord,
                "title": ev.title,
                "location": ev.location,
                "price": ev.price,
                "images": ev.images,
            }),
        );
        Ok(())
    }

    /// Insert-or-no-op on the chain-assigned id. Only a fresh insert notifies: a replayed event
    /// must not produce a second round of notifications.
    async fn agreement_signed(&self, ev: AgreementSignedEvent) -> Result<(), ReconciliationError> {
        let agreement = NewAgreement {
            agreement_id: ev.agreement_id,
            tenant_address: ev.tenant.clone(),
            landlord_address: ev.landlord.clone(),
            property_id: ev.property_id,
            starts_at: ev.starts_at,
            ends_at: ev.ends_at,
            rent_amount: ev.rent_amount,
        };
        let result = self.db.insert_agreement(agreement).await.map_err(ReconciliationError::db)?;
        if result == InsertAgreementResult::AlreadyExists {
            return Ok(());
        }
        debug!("⛓️ Agreement #{} signed between {} and {}", ev.agreement_id, ev.tenant, ev.landlord);
        self.notify_after_commit(
            &ev.landlord,
            "Agreement Signed",
            &format!("Tenant {} signed agreement for property {}", ev.tenant.abbreviated(), ev.property_id),
            "agreement",
        )
        .await;
        self.notify_after_commit(
            &ev.tenant,
            "Agreement Confirmed",
            &format!("Your rental agreement for property {} has been signed", ev.property_id),
            "agreement",
        )
        .await;
        Ok(())
    }

    /// On-chain payments have no pending phase: the event is the proof of completion, so the row
    /// is inserted directly in `Completed`, keyed by the chain-assigned payment id.
    async fn payment_received(&self, ev: PaymentReceivedEvent) -> Result<(), ReconciliationError> {
        let payment = NewPayment::on_chain(
            ev.payment_id.clone(),
            ev.tenant.clone(),
            ev.property_id,
            ev.amount,
            ev.currency.clone(),
        );
        let result = self.db.insert_onchain_payment(payment).await.map_err(ReconciliationError::db)?;
        if let InsertPaymentResult::AlreadyExists(_) = result {
            return Ok(());
        }
        debug!("⛓️ Payment [{}] of {} {} received from {}", ev.payment_id, ev.amount, ev.currency, ev.tenant);
        match self.db.fetch_property(ev.property_id).await.map_err(ReconciliationError::db)? {
            Some(property) => {
                self.notify_after_commit(
                    &ev.tenant,
                    "Payment Confirmed",
                    &format!("Your payment of {} {} for {} was received", ev.amount, ev.currency, property.title),
                    "payment",
                )
                .await;
                self.notify_after_commit(
                    &property.owner_address,
                    "Rent Payment Received",
                    &format!(
                        "Tenant {} paid {} {} for {}",
                        ev.tenant.abbreviated(),
                        ev.amount,
                        ev.currency,
                        property.title
                    ),
                    "payment",
                )
                .await;
            },
            // Unknown property: degraded, not fatal. The payer still hears about their own money.
            None => {
                warn!("⛓️ Payment [{}] references unknown property #{}", ev.payment_id, ev.property_id);
                self.notify_after_commit(
                    &ev.tenant,
                    "Payment Confirmed",
                    &format!(
                        "Your payment of {} {} for property {} was received",
                        ev.amount, ev.currency, ev.property_id
                    ),
                    "payment",
                )
                .await;
            },
        }
        Ok(())
    }

    /// Nothing is persisted for a deposit release; the event purely fans out two notifications.
    /// A failed property lookup degrades to a generic message referencing the raw id.
    async fn deposit_released(&self, ev: DepositReleasedEvent) -> Result<(), ReconciliationError> {
        let title = match self.db.fetch_property(ev.property_id).await {
            Ok(Some(property)) => property.title,
            Ok(None) => format!("Property {}", ev.property_id),
            Err(e) => {
                warn!("⛓️ Property lookup for deposit release failed: {e}. Using the raw id.");
                format!("Property {}", ev.property_id)
            },
        };
        debug!("⛓️ Deposit of {} released for property #{}", ev.amount, ev.property_id);
        self.notify_after_commit(
            &ev.tenant,
            "Deposit Released",
            &format!("Your deposit of {} USDT for {title} has been released. Reason: {}", ev.amount, ev.reason),
            "deposit",
        )
        .await;
        self.notify_after_commit(
            &ev.landlord,
            "Deposit Released",
            &format!(
                "Deposit of {} USDT for {title} has been released to tenant. Reason: {}",
                ev.amount, ev.reason
            ),
            "deposit",
        )
        .await;
        Ok(())
    }

    /// Persistence has already committed when this runs, so a notification failure must not bubble
    /// up and make the subscription loop retry (and double-apply) the event.
    async fn notify_after_commit(&self, recipient: &WalletAddress, title: &str, message: &str, category: &str) {
        if let Err(e) = self.hub.notify(recipient, title, message, category).await {
            error!("⛓️ Could not notify {recipient} ('{title}') after commit: {e}");
        }
    }
}

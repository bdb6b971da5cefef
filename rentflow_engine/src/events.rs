//! Typed chain events.
//!
//! The transport layer (whatever speaks to the node) decodes raw logs into these types and feeds
//! them to [`crate::EventIngester::handle_event`]. Delivery is at-least-once: the node may replay
//! or reorder events after a reconnect, so every handler downstream of this module is idempotent.
use chrono::{DateTime, Utc};
use rf_common::WalletAddress;

#[derive(Debug, Clone)]
pub struct PropertyListedEvent {
    pub property_id: i64,
    pub landlord: WalletAddress,
    pub title: String,
    pub location: String,
    pub price: i64,
    pub images: Vec<String>,
    pub block_number: u64,
}

#[derive(Debug, Clone)]
pub struct AgreementSignedEvent {
    pub agreement_id: i64,
    pub tenant: WalletAddress,
    pub landlord: WalletAddress,
    pub property_id: i64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub rent_amount: i64,
    pub block_number: u64,
}

#[derive(Debug, Clone)]
pub struct PaymentReceivedEvent {
    /// Chain-assigned payment id, rendered to a string so it shares a keyspace with M-Pesa
    /// correlation ids.
    pub payment_id: String,
    pub tenant: WalletAddress,
    pub property_id: i64,
    pub amount: i64,
    pub currency: String,
    pub block_number: u64,
}

#[derive(Debug, Clone)]
pub struct DepositReleasedEvent {
    pub tenant: WalletAddress,
    pub landlord: WalletAddress,
    pub property_id: i64,
    pub amount: i64,
    pub reason: String,
    pub block_number: u64,
}

#[derive(Debug, Clone)]
pub enum ChainEvent {
    PropertyListed(PropertyListedEvent),
    AgreementSigned(AgreementSignedEvent),
    PaymentReceived(PaymentReceivedEvent),
    DepositReleased(DepositReleasedEvent),
}

impl ChainEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ChainEvent::PropertyListed(_) => "PropertyListed",
            ChainEvent::AgreementSigned(_) => "AgreementSigned",
            ChainEvent::PaymentReceived(_) => "PaymentReceived",
            ChainEvent::DepositReleased(_) => "DepositReleased",
        }
    }

    pub fn block_number(&self) -> u64 {
        match self {
            ChainEvent::PropertyListed(ev) => ev.block_number,
            ChainEvent::AgreementSigned(ev) => ev.block_number,
            ChainEvent::PaymentReceived(ev) => ev.block_number,
            ChainEvent::DepositReleased(ev) => ev.block_number,
        }
    }
}

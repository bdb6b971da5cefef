use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use rf_common::WalletAddress;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid status value: {0}")]
pub struct ConversionError(String);

//--------------------------------------   PropertyStatus   ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PropertyStatus {
    /// The property is listed and available for rent.
    Active,
    /// The owner has withdrawn the listing.
    Inactive,
    /// A tenant currently occupies the property.
    Rented,
}

impl Display for PropertyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyStatus::Active => write!(f, "Active"),
            PropertyStatus::Inactive => write!(f, "Inactive"),
            PropertyStatus::Rented => write!(f, "Rented"),
        }
    }
}

impl FromStr for PropertyStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(Self::Active),
            "Inactive" => Ok(Self::Inactive),
            "Rented" => Ok(Self::Rented),
            s => Err(ConversionError(format!("Invalid property status: {s}"))),
        }
    }
}

//--------------------------------------   AgreementStatus   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum AgreementStatus {
    Active,
    /// The end date has passed. Set only by the external expiry sweep, never by the ingester.
    Expired,
    Completed,
    Cancelled,
}

impl Display for AgreementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgreementStatus::Active => write!(f, "Active"),
            AgreementStatus::Expired => write!(f, "Expired"),
            AgreementStatus::Completed => write!(f, "Completed"),
            AgreementStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for AgreementStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(Self::Active),
            "Expired" => Ok(Self::Expired),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid agreement status: {s}"))),
        }
    }
}

//--------------------------------------   PaymentMethod   -----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Paid on-chain. The chain event is the proof of completion, so there is no pending phase.
    OnChain,
    /// Paid via M-Pesa STK push. Starts Pending and settles when the callback arrives.
    Mpesa,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::OnChain => write!(f, "OnChain"),
            PaymentMethod::Mpesa => write!(f, "Mpesa"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OnChain" => Ok(Self::OnChain),
            "Mpesa" => Ok(Self::Mpesa),
            s => Err(ConversionError(format!("Invalid payment method: {s}"))),
        }
    }
}

//--------------------------------------   PaymentStatus   -----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    /// Terminal states admit no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Completed | PaymentStatus::Failed)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Completed => write!(f, "Completed"),
            PaymentStatus::Failed => write!(f, "Failed"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------      Property      ----------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Property {
    /// Chain-assigned id. The natural key; the chain is authoritative for every mutable field.
    pub property_id: i64,
    pub owner_address: WalletAddress,
    pub title: String,
    pub location: String,
    pub price: i64,
    pub image_urls: Json<Vec<String>>,
    pub status: PropertyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProperty {
    pub property_id: i64,
    pub owner_address: WalletAddress,
    pub title: String,
    pub location: String,
    pub price: i64,
    pub image_urls: Vec<String>,
}

//--------------------------------------      Agreement      ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Agreement {
    /// Chain-assigned id.
    pub agreement_id: i64,
    pub tenant_address: WalletAddress,
    pub landlord_address: WalletAddress,
    /// Weak reference to [`Property::property_id`]; no foreign key is enforced.
    pub property_id: i64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub rent_amount: i64,
    pub status: AgreementStatus,
    pub signed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAgreement {
    pub agreement_id: i64,
    pub tenant_address: WalletAddress,
    pub landlord_address: WalletAddress,
    pub property_id: i64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub rent_amount: i64,
}

//--------------------------------------      Payment      -----------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    /// The correlation id for M-Pesa payments (Daraja's CheckoutRequestID), or the chain-assigned
    /// payment id rendered as a string for on-chain payments.
    pub payment_id: String,
    pub payer_address: WalletAddress,
    pub property_id: i64,
    pub amount: i64,
    pub currency: String,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// External receipt number, e.g. the M-Pesa receipt. Only present once settled.
    pub receipt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub payment_id: String,
    pub payer_address: WalletAddress,
    pub property_id: i64,
    pub amount: i64,
    pub currency: String,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
}

impl NewPayment {
    /// An on-chain payment. The chain event is the proof of completion, so the row is created
    /// directly in `Completed`.
    pub fn on_chain(payment_id: String, payer: WalletAddress, property_id: i64, amount: i64, currency: String) -> Self {
        Self {
            payment_id,
            payer_address: payer,
            property_id,
            amount,
            currency,
            method: PaymentMethod::OnChain,
            status: PaymentStatus::Completed,
        }
    }

    /// An M-Pesa payment awaiting its callback. Created in `Pending`, keyed by the correlation id.
    pub fn mpesa(correlation_id: String, payer: WalletAddress, property_id: i64, amount: i64) -> Self {
        Self {
            payment_id: correlation_id,
            payer_address: payer,
            property_id,
            amount,
            currency: "KES".to_string(),
            method: PaymentMethod::Mpesa,
            status: PaymentStatus::Pending,
        }
    }
}

//--------------------------------------     Notification     --------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    /// Store-assigned sequence id.
    pub id: i64,
    pub recipient: WalletAddress,
    pub title: String,
    pub message: String,
    pub category: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient: WalletAddress,
    pub title: String,
    pub message: String,
    pub category: String,
}

impl NewNotification {
    pub fn new<S1: Into<String>, S2: Into<String>>(recipient: WalletAddress, title: S1, message: S2) -> Self {
        Self { recipient, title: title.into(), message: message.into(), category: "info".to_string() }
    }

    pub fn with_category<S: Into<String>>(mut self, category: S) -> Self {
        self.category = category.into();
        self
    }
}

/// One page of a recipient's notifications, newest first, with the counts a client needs to render
/// a badge and paginate.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationPage {
    pub notifications: Vec<Notification>,
    pub total: i64,
    pub unread: i64,
}

/// One page of a payer's payment history, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentHistory {
    pub payments: Vec<Payment>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn statuses_round_trip_through_strings() {
        for status in [PaymentStatus::Pending, PaymentStatus::Completed, PaymentStatus::Failed] {
            assert_eq!(status.to_string().parse::<PaymentStatus>().unwrap(), status);
        }
        for status in
            [AgreementStatus::Active, AgreementStatus::Expired, AgreementStatus::Completed, AgreementStatus::Cancelled]
        {
            assert_eq!(status.to_string().parse::<AgreementStatus>().unwrap(), status);
        }
        assert!("pending".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn terminal_states() {
        assert!(!PaymentStatus::Pending.is_terminal());
        assert!(PaymentStatus::Completed.is_terminal());
        assert!(PaymentStatus::Failed.is_terminal());
    }
}

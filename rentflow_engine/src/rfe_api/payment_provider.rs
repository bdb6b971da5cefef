use thiserror::Error;

/// The outbound half of a mobile-money payment: ask the provider to push a payment prompt to the
/// customer's phone.
#[derive(Debug, Clone)]
pub struct PushPaymentRequest {
    pub phone_number: String,
    pub amount: i64,
    /// Shown on the customer's statement, e.g. `RENT-42`.
    pub account_reference: String,
    pub description: String,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider processed the request and said no. No prompt was shown; no callback will
    /// arrive.
    #[error("{0}")]
    Rejected(String),
    /// The provider could not be reached at all.
    #[error("Payment provider unreachable: {0}")]
    Unreachable(String),
}

/// Seam between the engine and a concrete mobile-money gateway client.
///
/// Implementations make one network call and return the gateway's correlation id. Every later
/// callback for the payment carries that id; it is the engine's sole idempotency key.
#[allow(async_fn_in_trait)]
pub trait PushPaymentProvider {
    async fn request_push(&self, request: PushPaymentRequest) -> Result<String, ProviderError>;
}

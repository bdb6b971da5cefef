//! The engine's public API surface.
//!
//! Each API struct is generic over the datastore traits it needs, so backends other than SQLite
//! can slot in underneath, and tests can drive the real flows end to end.
pub mod errors;
pub mod ingest_api;
pub mod notification_api;
pub mod payment_flow_api;
pub mod payment_provider;

pub use errors::ReconciliationError;
pub use ingest_api::EventIngester;
pub use notification_api::NotificationHub;
pub use payment_flow_api::{CallbackOutcome, CallbackResult, CallbackStatus, PaymentGateway};
pub use payment_provider::{ProviderError, PushPaymentProvider, PushPaymentRequest};

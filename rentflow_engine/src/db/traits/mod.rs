mod chain_event_database;
mod notification_management;
mod payment_management;

pub use chain_event_database::ChainEventDatabase;
pub use notification_management::NotificationManagement;
pub use payment_management::PaymentManagement;

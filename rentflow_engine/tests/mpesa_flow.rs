//! The mobile-money lifecycle end to end: initiation, callback settlement, and the guarantees
//! around duplicate and late callbacks.
mod support;

use rentflow_engine::{
    db_types::{NewProperty, PaymentStatus},
    CallbackOutcome,
    CallbackResult,
    CallbackStatus,
    ChainEventDatabase,
    NotificationHub,
    NotificationManagement,
    PaymentGateway,
    PaymentManagement,
    ProviderError,
    PushPaymentProvider,
    PushPaymentRequest,
    ReconciliationError,
    SqliteDatabase,
};
use support::{prepare_test_env, random_db_path, wallet};

/// Stands in for the Daraja client: hands out a fixed correlation id, or rejects everything.
#[derive(Clone)]
struct FakeProvider {
    correlation_id: String,
    reject: bool,
}

impl FakeProvider {
    fn accepting(correlation_id: &str) -> Self {
        Self { correlation_id: correlation_id.to_string(), reject: false }
    }

    fn rejecting() -> Self {
        Self { correlation_id: String::new(), reject: true }
    }
}

impl PushPaymentProvider for FakeProvider {
    async fn request_push(&self, request: PushPaymentRequest) -> Result<String, ProviderError> {
        assert!(request.account_reference.starts_with("RENT-"));
        if self.reject {
            Err(ProviderError::Rejected("The service request failed".to_string()))
        } else {
            Ok(self.correlation_id.clone())
        }
    }
}

async fn new_gateway(url: &str, provider: FakeProvider) -> (SqliteDatabase, PaymentGateway<SqliteDatabase, FakeProvider>) {
    prepare_test_env(url).await;
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating database");
    let hub = NotificationHub::new(db.clone());
    let gateway = PaymentGateway::new(db.clone(), provider, hub);
    (db, gateway)
}

async fn seed_property(db: &SqliteDatabase, property_id: i64, owner_tail: u8) {
    let property = NewProperty {
        property_id,
        owner_address: wallet(owner_tail),
        title: "Kilimani 2BR".to_string(),
        location: "Nairobi".to_string(),
        price: 500,
        image_urls: vec![],
    };
    db.upsert_property(property).await.expect("Error seeding property");
}

fn success(correlation_id: &str, receipt: &str) -> CallbackOutcome {
    CallbackOutcome {
        correlation_id: correlation_id.to_string(),
        status: CallbackStatus::Success { receipt: receipt.to_string() },
    }
}

fn failure(correlation_id: &str, reason: &str) -> CallbackOutcome {
    CallbackOutcome {
        correlation_id: correlation_id.to_string(),
        status: CallbackStatus::Failure { reason: reason.to_string() },
    }
}

#[tokio::test]
async fn stk_push_settles_exactly_once() {
    let url = random_db_path();
    let (db, gateway) = new_gateway(&url, FakeProvider::accepting("ws_CO_001")).await;
    let payer = wallet(0xb2);
    let owner = wallet(0xa1);
    seed_property(&db, 1, 0xa1).await;

    let payment = gateway.initiate(&payer, 500, 1, "+254700000000").await.unwrap();
    assert_eq!(payment.payment_id, "ws_CO_001");
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert!(payment.receipt.is_none());
    assert_eq!(db.unread_count(&payer).await.unwrap(), 1); // Payment Initiated

    let result = gateway.apply_callback(success("ws_CO_001", "QAX123")).await.unwrap();
    let settled = match result {
        CallbackResult::Settled(p) => p,
        CallbackResult::Ignored => panic!("first callback must settle"),
    };
    assert_eq!(settled.status, PaymentStatus::Completed);
    assert_eq!(settled.receipt.as_deref(), Some("QAX123"));

    let payer_page = db.fetch_notifications(&payer, 10, 0).await.unwrap();
    assert_eq!(payer_page.total, 2);
    assert_eq!(payer_page.notifications[0].title, "Payment Successful");
    assert!(payer_page.notifications[0].message.contains("QAX123"));
    let owner_page = db.fetch_notifications(&owner, 10, 0).await.unwrap();
    assert_eq!(owner_page.total, 1);
    assert_eq!(owner_page.notifications[0].title, "Rent Payment Received");

    // The gateway redelivers the same callback. Nothing changes, nobody hears about it again.
    let replay = gateway.apply_callback(success("ws_CO_001", "QAX123")).await.unwrap();
    assert!(matches!(replay, CallbackResult::Ignored));
    assert_eq!(db.fetch_notifications(&payer, 10, 0).await.unwrap().total, 2);
    assert_eq!(db.fetch_notifications(&owner, 10, 0).await.unwrap().total, 1);
    db.close().await;
}

#[tokio::test]
async fn failed_payment_is_terminal() {
    let url = random_db_path();
    let (db, gateway) = new_gateway(&url, FakeProvider::accepting("ws_CO_002")).await;
    let payer = wallet(0xb2);
    seed_property(&db, 1, 0xa1).await;

    gateway.initiate(&payer, 500, 1, "+254700000000").await.unwrap();
    let result = gateway.apply_callback(failure("ws_CO_002", "Request cancelled by user")).await.unwrap();
    assert!(matches!(result, CallbackResult::Settled(_)));

    let payment = db.fetch_payment("ws_CO_002").await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Failed);
    assert!(payment.receipt.is_none());
    let page = db.fetch_notifications(&payer, 10, 0).await.unwrap();
    assert_eq!(page.notifications[0].title, "Payment Failed");
    assert!(page.notifications[0].message.contains("Request cancelled by user"));

    // A success callback arriving after the failure loses the race and is absorbed.
    let late = gateway.apply_callback(success("ws_CO_002", "QAX999")).await.unwrap();
    assert!(matches!(late, CallbackResult::Ignored));
    let payment = db.fetch_payment("ws_CO_002").await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Failed);
    db.close().await;
}

#[tokio::test]
async fn rejected_initiation_persists_nothing() {
    let url = random_db_path();
    let (db, gateway) = new_gateway(&url, FakeProvider::rejecting()).await;
    let payer = wallet(0xb2);
    seed_property(&db, 1, 0xa1).await;

    let err = gateway.initiate(&payer, 500, 1, "+254700000000").await.unwrap_err();
    assert!(matches!(err, ReconciliationError::ProviderRejected(_)));

    // No pending row and no notification for a payment that was never accepted.
    assert_eq!(gateway.payment_history(&payer, 10, 0).await.unwrap().total, 0);
    assert_eq!(db.unread_count(&payer).await.unwrap(), 0);
    db.close().await;
}

#[tokio::test]
async fn callback_for_unknown_correlation_id_is_absorbed() {
    let url = random_db_path();
    let (db, gateway) = new_gateway(&url, FakeProvider::accepting("ws_CO_003")).await;

    let result = gateway.apply_callback(success("ws_CO_never_issued", "QAX123")).await.unwrap();
    assert!(matches!(result, CallbackResult::Ignored));
    assert!(db.fetch_payment("ws_CO_never_issued").await.unwrap().is_none());
    db.close().await;
}

#[tokio::test]
async fn payment_history_is_newest_first() {
    let url = random_db_path();
    let (db, gateway) = new_gateway(&url, FakeProvider::accepting("ws_CO_004")).await;
    let payer = wallet(0xb2);
    seed_property(&db, 1, 0xa1).await;

    gateway.initiate(&payer, 500, 1, "+254700000000").await.unwrap();
    gateway.apply_callback(success("ws_CO_004", "QAX124")).await.unwrap();

    let history = gateway.payment_history(&payer, 10, 0).await.unwrap();
    assert_eq!(history.total, 1);
    assert_eq!(history.payments[0].payment_id, "ws_CO_004");
    assert_eq!(history.payments[0].status, PaymentStatus::Completed);

    let looked_up = gateway.payment_by_correlation_id("ws_CO_004").await.unwrap().unwrap();
    assert_eq!(looked_up.receipt.as_deref(), Some("QAX124"));
    db.close().await;
}

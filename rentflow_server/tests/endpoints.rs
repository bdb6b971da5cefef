//! Endpoint behavior that does not need a live Daraja or chain node: health, callback
//! acknowledgement, and lookups against an empty store.
use actix_web::{test, web, App};
use mpesa_tools::MpesaConfig;
use rentflow_engine::{NotificationHub, PaymentGateway, SqliteDatabase};
use rentflow_server::{
    integrations::mpesa::MpesaProvider,
    routes::{health, mpesa_callback, notifications, payment_by_id, unread_count},
};
use serde_json::Value;

async fn test_db() -> SqliteDatabase {
    let path = std::env::temp_dir().join(format!(
        "rentflow_server_test_{}_{}.db",
        std::process::id(),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating database");
    db.run_migrations().await.expect("Error running migrations");
    db
}

fn test_state(db: &SqliteDatabase) -> (web::Data<NotificationHub<SqliteDatabase>>, web::Data<PaymentGateway<SqliteDatabase, MpesaProvider>>) {
    let hub = NotificationHub::new(db.clone());
    let provider = MpesaProvider::new(MpesaConfig::new_from_env_or_default()).expect("Error creating provider");
    let gateway = PaymentGateway::new(db.clone(), provider, hub.clone());
    (web::Data::new(hub), web::Data::new(gateway))
}

#[actix_web::test]
async fn health_check() {
    let app = test::init_service(App::new().service(health)).await;
    let req = test::TestRequest::get().uri("/health").to_request();
    let res = test::call_service(&app, req).await;
    assert!(res.status().is_success());
}

#[actix_web::test]
async fn malformed_callback_is_acknowledged_without_state_changes() {
    let db = test_db().await;
    let (hub, gateway) = test_state(&db);
    let app = test::init_service(
        App::new().app_data(hub).app_data(gateway).service(web::scope("/api").service(mpesa_callback)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/payments/mpesa-callback")
        .set_payload(r#"{"unexpected": "shape"}"#)
        .insert_header(("content-type", "application/json"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert!(res.status().is_success());
    let body: Value = test::read_body_json(res).await;
    // Daraja only understands a ResultCode 0 acknowledgement.
    assert_eq!(body["ResultCode"], 0);
    assert!(body["ResultDesc"].as_str().unwrap().contains("malformed"));
    db.close().await;
}

#[actix_web::test]
async fn callback_for_unknown_payment_is_acknowledged() {
    let db = test_db().await;
    let (hub, gateway) = test_state(&db);
    let app = test::init_service(
        App::new().app_data(hub).app_data(gateway).service(web::scope("/api").service(mpesa_callback)),
    )
    .await;

    let payload = r#"{
        "Body": {
            "stkCallback": {
                "MerchantRequestID": "29115-34620561-1",
                "CheckoutRequestID": "ws_CO_never_issued",
                "ResultCode": 0,
                "ResultDesc": "The service request is processed successfully.",
                "CallbackMetadata": {
                    "Item": [
                        { "Name": "Amount", "Value": 500.0 },
                        { "Name": "MpesaReceiptNumber", "Value": "QAX123" },
                        { "Name": "TransactionDate", "Value": 20240601101500 },
                        { "Name": "PhoneNumber", "Value": 254700000000 }
                    ]
                }
            }
        }
    }"#;
    let req = test::TestRequest::post()
        .uri("/api/payments/mpesa-callback")
        .set_payload(payload)
        .insert_header(("content-type", "application/json"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert!(res.status().is_success());
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["ResultCode"], 0);
    db.close().await;
}

#[actix_web::test]
async fn missing_payment_is_a_404() {
    let db = test_db().await;
    let (hub, gateway) = test_state(&db);
    let app = test::init_service(
        App::new().app_data(hub).app_data(gateway).service(web::scope("/api").service(payment_by_id)),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/payments/ws_CO_missing").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status().as_u16(), 404);
    db.close().await;
}

#[actix_web::test]
async fn empty_notification_page_for_new_address() {
    let db = test_db().await;
    let (hub, gateway) = test_state(&db);
    let app = test::init_service(
        App::new()
            .app_data(hub)
            .app_data(gateway)
            .service(web::scope("/api").service(notifications).service(unread_count)),
    )
    .await;

    let address = "0x00000000219ab540356cbb839cbe05303d7705fa";
    let req = test::TestRequest::get().uri(&format!("/api/notifications/{address}")).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total"], 0);
    assert_eq!(body["notifications"].as_array().unwrap().len(), 0);

    let req = test::TestRequest::get().uri(&format!("/api/notifications/{address}/unread")).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["unread"], 0);
    db.close().await;
}

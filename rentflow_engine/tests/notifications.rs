//! Durability and read-state guarantees for the notification hub, including the interaction with
//! live connections.
mod support;

use rentflow_engine::{live::PushMessage, NotificationHub, SqliteDatabase};
use support::{prepare_test_env, random_db_path, wallet};
use tokio::sync::mpsc;

async fn new_hub(url: &str) -> (SqliteDatabase, NotificationHub<SqliteDatabase>) {
    prepare_test_env(url).await;
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating database");
    let hub = NotificationHub::new(db.clone());
    (db, hub)
}

#[tokio::test]
async fn notifications_are_durable_without_a_live_connection() {
    let url = random_db_path();
    let (db, hub) = new_hub(&url).await;
    let alice = wallet(0x01);

    hub.notify(&alice, "Agreement Signed", "Tenant 0xb200…0000 signed agreement for property 1", "agreement")
        .await
        .unwrap();

    let page = hub.list_notifications(&alice, 10, 0).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.unread, 1);
    assert_eq!(page.notifications[0].category, "agreement");
    assert!(!page.notifications[0].read);
    db.close().await;
}

#[tokio::test]
async fn live_push_goes_to_the_latest_connection_only() {
    let url = random_db_path();
    let (db, hub) = new_hub(&url).await;
    let alice = wallet(0x01);

    let (tx_old, mut rx_old) = mpsc::channel::<PushMessage>(8);
    let (tx_new, mut rx_new) = mpsc::channel::<PushMessage>(8);
    hub.registry().register(alice.clone(), tx_old);
    // Alice reconnects; the old handle is superseded.
    hub.registry().register(alice.clone(), tx_new);

    hub.notify(&alice, "Deposit Released", "Your deposit of 200 USDT has been released", "deposit").await.unwrap();

    let frame = rx_new.try_recv().expect("latest connection should receive the push");
    assert_eq!(frame.event, "notification");
    assert_eq!(frame.payload["title"], "Deposit Released");
    assert!(rx_old.try_recv().is_err());

    // The row is durable regardless of which socket heard about it.
    assert_eq!(hub.unread_count(&alice).await.unwrap(), 1);
    db.close().await;
}

#[tokio::test]
async fn mark_read_is_scoped_to_the_recipient() {
    let url = random_db_path();
    let (db, hub) = new_hub(&url).await;
    let alice = wallet(0x01);
    let bob = wallet(0x02);

    let a = hub.notify(&alice, "Payment Confirmed", "Your payment was received", "payment").await.unwrap();
    let b = hub.notify(&bob, "Rent Payment Received", "Tenant paid rent", "payment").await.unwrap();

    // Alice cannot mark Bob's notification.
    assert!(!hub.mark_read(b.id, &alice).await.unwrap());
    assert_eq!(hub.unread_count(&bob).await.unwrap(), 1);

    assert!(hub.mark_read(a.id, &alice).await.unwrap());
    assert_eq!(hub.unread_count(&alice).await.unwrap(), 0);
    // Marking an already-read notification matches nothing.
    assert!(!hub.mark_read(a.id, &alice).await.unwrap());
    db.close().await;
}

#[tokio::test]
async fn mark_all_read_reports_how_many_were_flipped() {
    let url = random_db_path();
    let (db, hub) = new_hub(&url).await;
    let alice = wallet(0x01);

    for i in 0..3 {
        hub.notify(&alice, "Payment Confirmed", &format!("Payment {i} received"), "payment").await.unwrap();
    }
    assert_eq!(hub.unread_count(&alice).await.unwrap(), 3);
    assert_eq!(hub.mark_all_read(&alice).await.unwrap(), 3);
    assert_eq!(hub.unread_count(&alice).await.unwrap(), 0);
    assert_eq!(hub.mark_all_read(&alice).await.unwrap(), 0);
    db.close().await;
}

#[tokio::test]
async fn pages_are_newest_first() {
    let url = random_db_path();
    let (db, hub) = new_hub(&url).await;
    let alice = wallet(0x01);

    for i in 0..5 {
        hub.notify(&alice, &format!("Notice {i}"), "something happened", "info").await.unwrap();
    }
    let page = hub.list_notifications(&alice, 2, 0).await.unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.notifications.len(), 2);
    assert_eq!(page.notifications[0].title, "Notice 4");
    assert_eq!(page.notifications[1].title, "Notice 3");

    let next = hub.list_notifications(&alice, 2, 2).await.unwrap();
    assert_eq!(next.notifications[0].title, "Notice 2");
    db.close().await;
}

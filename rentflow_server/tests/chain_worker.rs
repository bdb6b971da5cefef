//! Worker lifecycle behavior that does not need a live chain node.
use std::time::Duration;

use ethers::types::Address;
use rentflow_engine::{EventIngester, NotificationHub, SqliteDatabase};
use rentflow_server::{chain_worker::start_chain_worker, config::ChainConfig};
use tokio::sync::watch;

async fn test_db() -> SqliteDatabase {
    let path = std::env::temp_dir().join(format!(
        "rentflow_worker_test_{}_{}.db",
        std::process::id(),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating database");
    db.run_migrations().await.expect("Error running migrations");
    db
}

#[tokio::test]
async fn shutdown_stops_the_worker_during_reconnect_backoff() {
    let db = test_db().await;
    let hub = NotificationHub::new(db.clone());
    let ingester = EventIngester::new(db.clone(), hub);
    // Nothing listens on this port, so the worker fails to connect and sits in its backoff
    // sleep. The shutdown signal must still be honored there.
    let config = ChainConfig { rpc_url: "ws://127.0.0.1:1".to_string(), contract_address: Address::zero() };
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = start_chain_worker(db.clone(), ingester, config, shutdown_rx);

    tokio::time::sleep(Duration::from_millis(200)).await;
    shutdown_tx.send(true).expect("The worker exited before shutdown was signalled");
    tokio::time::timeout(Duration::from_secs(5), worker)
        .await
        .expect("The worker did not honor the shutdown signal")
        .expect("The worker panicked");
    db.close().await;
}

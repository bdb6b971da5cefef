use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use rentflow_engine::{EventIngester, NotificationHub, PaymentGateway, SqliteDatabase};
use tokio::sync::watch;

use crate::{
    chain_worker::start_chain_worker,
    config::ServerConfig,
    errors::ServerError,
    integrations::mpesa::MpesaProvider,
    routes::{
        health,
        initiate_payment,
        mark_all_read,
        mark_read,
        mpesa_callback,
        notifications,
        payment_by_id,
        payment_history,
        unread_count,
    },
    ws,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let srv = create_server_instance(config, db, shutdown_rx)?;
    let result = srv.await.map_err(|e| ServerError::Unspecified(e.to_string()));
    let _ = shutdown_tx.send(true);
    result
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    shutdown: watch::Receiver<bool>,
) -> Result<Server, ServerError> {
    // One hub for the whole process: the HTTP handlers, the websocket sessions and the chain
    // worker must all see the same connection registry.
    let hub = NotificationHub::new(db.clone());
    let provider =
        MpesaProvider::new(config.mpesa.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = PaymentGateway::new(db.clone(), provider, hub.clone());
    match config.chain.clone() {
        Some(chain) => {
            let ingester = EventIngester::new(db.clone(), hub.clone());
            start_chain_worker(db.clone(), ingester, chain, shutdown);
        },
        None => warn!("🚀️ Chain subscription is not configured. On-chain events will not be ingested."),
    }

    let hub = web::Data::new(hub);
    let gateway = web::Data::new(gateway);
    let srv = HttpServer::new(move || {
        let api_scope = web::scope("/api")
            .service(initiate_payment)
            .service(mpesa_callback)
            .service(payment_history)
            .service(payment_by_id)
            .service(notifications)
            .service(unread_count)
            .service(mark_read)
            .service(mark_all_read);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("rfs::access_log"))
            .app_data(hub.clone())
            .app_data(gateway.clone())
            .service(health)
            .service(api_scope)
            .route("/ws", web::get().to(ws::websocket))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

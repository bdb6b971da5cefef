//! The chain subscription worker.
//!
//! Subscribes to the marketplace contract's logs over WebSocket and feeds decoded events to the
//! engine's ingester. The node connection is assumed to be flaky: every error path funnels back
//! to a reconnect with capped exponential backoff, and the durable block cursor makes the replay
//! after a reconnect safe.
use std::time::Duration;

use ethers::{
    providers::{Middleware, Provider, StreamExt, Ws},
    types::{Address, BlockNumber, Filter},
};
use log::*;
use rentflow_engine::{traits::ChainEventDatabase, EventIngester, SqliteDatabase};
use tokio::{sync::watch, task::JoinHandle};

use crate::{config::ChainConfig, integrations::evm::decode_event};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Starts the chain worker. It runs until the shutdown signal flips to `true`. Shutdown is only
/// acted on between events: once a log has been dequeued, its handler runs to completion before
/// the worker exits, so a half-applied event is never left behind.
pub fn start_chain_worker(
    db: SqliteDatabase,
    ingester: EventIngester<SqliteDatabase>,
    config: ChainConfig,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("⛓️ Chain event worker started for contract {:#x}", config.contract_address);
        let mut backoff = INITIAL_BACKOFF;
        loop {
            match run_subscription(&db, &ingester, &config, &mut shutdown).await {
                Ok(SessionEnd::ShuttingDown) => break,
                Ok(SessionEnd::StreamClosed) => {
                    warn!("⛓️ Chain subscription ended. Reconnecting.");
                    backoff = INITIAL_BACKOFF;
                },
                Err(e) => {
                    error!("⛓️ Chain subscription failed: {e}. Reconnecting in {}s", backoff.as_secs());
                    if wait_or_shutdown(backoff, &mut shutdown).await {
                        break;
                    }
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                },
            }
        }
        info!("⛓️ Chain event worker shut down");
    })
}

/// Sleeps for `delay`. Returns `true` if shutdown was signalled before the delay elapsed.
async fn wait_or_shutdown(delay: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(delay) => false,
        result = shutdown.changed() => result.is_err() || *shutdown.borrow(),
    }
}

/// The log filter for one subscription session: resume one past the recorded cursor, or from the
/// latest block on a cold start.
fn subscription_filter(contract: Address, last_processed: Option<u64>) -> Filter {
    let filter = Filter::new().address(contract);
    match last_processed {
        Some(block) => filter.from_block(block + 1),
        None => filter.from_block(BlockNumber::Latest),
    }
}

enum SessionEnd {
    /// The node closed the stream. The caller should reconnect.
    StreamClosed,
    /// Shutdown was signalled. The caller must not reconnect.
    ShuttingDown,
}

/// One subscription session, from connect to stream end. Returns `Err` for connection and
/// subscription failures; a handler failure also ends the session so that the event is replayed
/// after the reconnect, since the cursor was not advanced past it.
async fn run_subscription(
    db: &SqliteDatabase,
    ingester: &EventIngester<SqliteDatabase>,
    config: &ChainConfig,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<SessionEnd, ChainWorkerError> {
    let provider =
        Provider::<Ws>::connect(&config.rpc_url).await.map_err(|e| ChainWorkerError::Connect(e.to_string()))?;
    let cursor = db.last_processed_block().await.map_err(|e| ChainWorkerError::Cursor(e.to_string()))?;
    match cursor {
        Some(block) => info!("⛓️ Resuming subscription from block {}", block + 1),
        None => info!("⛓️ No cursor yet. Subscribing from the latest block."),
    }
    let filter = subscription_filter(config.contract_address, cursor);
    let mut stream =
        provider.subscribe_logs(&filter).await.map_err(|e| ChainWorkerError::Subscribe(e.to_string()))?;
    info!("⛓️ Subscribed to contract logs at {}", config.rpc_url);

    loop {
        // Shutdown is only checked while waiting for the next log. A dequeued event's handler
        // always runs to completion, so the row, its notifications and the cursor stay
        // consistent across a restart.
        let log = tokio::select! {
            maybe_log = stream.next() => match maybe_log {
                Some(log) => log,
                None => return Ok(SessionEnd::StreamClosed),
            },
            result = shutdown.changed() => {
                if result.is_err() || *shutdown.borrow() {
                    info!("⛓️ Shutdown signalled. Closing the chain subscription.");
                    return Ok(SessionEnd::ShuttingDown);
                }
                continue;
            },
        };
        let block = log.block_number.map(|b| b.as_u64());
        let event = match decode_event(&log) {
            Ok(Some(event)) => event,
            // A log from the contract that we do not track, or junk. Skip it.
            Ok(None) => continue,
            Err(e) => {
                warn!("⛓️ Skipping undecodable log in block {block:?}: {e}");
                continue;
            },
        };
        let kind = event.kind();
        if let Err(e) = ingester.handle_event(event).await {
            // Cursor untouched, so the event is redelivered on the next session.
            return Err(ChainWorkerError::Ingest(format!("{kind} event failed: {e}")));
        }
        if let Some(block) = block {
            if let Err(e) = db.record_processed_block(block).await {
                warn!("⛓️ Could not record cursor at block {block}: {e}");
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum ChainWorkerError {
    #[error("Could not connect to the chain node. {0}")]
    Connect(String),
    #[error("Could not read the block cursor. {0}")]
    Cursor(String),
    #[error("Could not subscribe to contract logs. {0}")]
    Subscribe(String),
    #[error("Event ingestion failed. {0}")]
    Ingest(String),
}

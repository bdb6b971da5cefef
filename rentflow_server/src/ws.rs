//! The WebSocket endpoint for real-time push.
//!
//! A fresh connection is anonymous and receives nothing. The client claims an address by sending
//! `{"identify": "0x..."}`; from then on the connection receives that address's notification
//! frames and broadcasts. Re-identifying (or a second connection identifying as the same address)
//! supersedes the previous registration. Everything here is best-effort; durability lives in the
//! notifications table.
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_ws::Message;
use futures::StreamExt;
use log::*;
use rentflow_engine::{
    live::{ConnectionRegistry, LiveHandleId, PushMessage},
    NotificationHub,
    SqliteDatabase,
};
use rf_common::WalletAddress;
use serde::Deserialize;
use tokio::sync::mpsc;

/// Buffered frames per connection. A client that falls further behind starts losing pushes, which
/// is acceptable: the durable rows are still there.
const PUSH_BUFFER: usize = 32;

#[derive(Deserialize)]
struct ClientCommand {
    identify: WalletAddress,
}

pub async fn websocket(
    req: HttpRequest,
    body: web::Payload,
    hub: web::Data<NotificationHub<SqliteDatabase>>,
) -> Result<HttpResponse, Error> {
    let (response, session, msg_stream) = actix_ws::handle(&req, body)?;
    let registry = hub.registry().clone();
    actix_web::rt::spawn(client_session(session, msg_stream, registry));
    Ok(response)
}

async fn client_session(
    mut session: actix_ws::Session,
    mut msg_stream: actix_ws::MessageStream,
    registry: ConnectionRegistry,
) {
    let (tx, mut rx) = mpsc::channel::<PushMessage>(PUSH_BUFFER);
    let mut handle: Option<LiveHandleId> = None;
    trace!("📡️ New websocket connection");
    loop {
        tokio::select! {
            Some(msg) = msg_stream.next() => {
                match msg {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ClientCommand>(&text) {
                        Ok(cmd) => {
                            // A re-identification from this same socket abandons its old mapping.
                            if let Some(old) = handle.take() {
                                registry.unregister(old);
                            }
                            handle = Some(registry.register(cmd.identify, tx.clone()));
                        },
                        Err(e) => debug!("📡️ Ignoring unrecognised client message: {e}"),
                    },
                    Ok(Message::Ping(bytes)) => {
                        if session.pong(&bytes).await.is_err() {
                            break;
                        }
                    },
                    Ok(Message::Close(_)) | Err(_) => break,
                    Ok(_) => {},
                }
            },
            Some(push) = rx.recv() => {
                let frame = match serde_json::to_string(&push) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!("📡️ Could not serialize push frame: {e}");
                        continue;
                    },
                };
                if session.text(frame).await.is_err() {
                    break;
                }
            },
            else => break,
        }
    }
    if let Some(id) = handle {
        registry.unregister(id);
    }
    let _ = session.close(None).await;
    trace!("📡️ Websocket connection closed");
}

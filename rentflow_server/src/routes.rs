//! Request handler definitions
//!
//! Define each route and its handler here. Handlers that are more than a line or two MUST go into
//! a separate module. Keep this module neat and tidy 🙏
//!
//! Handlers are `async` and never block the worker thread; all I/O (database, Daraja) is awaited.
use actix_web::{get, post, web, HttpResponse, Responder};
use log::*;
use mpesa_tools::StkCallbackDocument;
use rentflow_engine::{CallbackResult, NotificationHub, PaymentGateway, ReconciliationError, SqliteDatabase};
use rf_common::WalletAddress;
use serde_json::json;

use crate::{
    data_objects::{InitiatePaymentRequest, JsonResponse, Pagination},
    errors::ServerError,
    integrations::mpesa::{outcome_from_summary, MpesaProvider},
};

pub type Gateway = PaymentGateway<SqliteDatabase, MpesaProvider>;
pub type Hub = NotificationHub<SqliteDatabase>;

#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------  Payments  ----------------------------------------------------

/// Starts an M-Pesa STK push for rent on a property. The response carries the `Pending` payment,
/// including the correlation id the client can poll on.
#[post("/payments")]
pub async fn initiate_payment(
    body: web::Json<InitiatePaymentRequest>,
    api: web::Data<Gateway>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    debug!("💻️ POST initiate_payment for property {} by {}", request.property_id, request.payer);
    let payment = api
        .initiate(&request.payer, request.amount, request.property_id, &request.phone_number)
        .await
        .map_err(|e| match e {
            ReconciliationError::ProviderRejected(msg) => ServerError::PaymentProviderError(msg),
            other => ServerError::BackendError(other.to_string()),
        })?;
    Ok(HttpResponse::Ok().json(payment))
}

/// Daraja's STK callback endpoint.
///
/// Daraja retries deliveries it considers failed, so this handler acknowledges every request it
/// managed to read, in the response shape Daraja expects. Duplicate deliveries are absorbed by
/// the engine; a malformed body is acknowledged without touching any state, since retrying it
/// would produce the same garbage.
#[post("/payments/mpesa-callback")]
pub async fn mpesa_callback(body: web::Bytes, api: web::Data<Gateway>) -> HttpResponse {
    let summary = serde_json::from_slice::<StkCallbackDocument>(&body)
        .map_err(|e| e.to_string())
        .and_then(|doc| doc.summarize().map_err(|e| e.to_string()));
    let outcome = match summary {
        Ok(summary) => outcome_from_summary(summary),
        Err(e) => {
            warn!("💻️ Discarding malformed M-Pesa callback: {e}");
            return callback_ack("Rejected: malformed callback");
        },
    };
    let id = outcome.correlation_id.clone();
    match api.apply_callback(outcome).await {
        Ok(CallbackResult::Settled(payment)) => {
            info!("💻️ Callback settled payment [{id}] as {}", payment.status);
        },
        Ok(CallbackResult::Ignored) => {
            debug!("💻️ Callback for [{id}] was a duplicate or unknown. Ignored.");
        },
        // The payment stays Pending; Daraja's retry of this callback will be applied cleanly.
        Err(e) => error!("💻️ Could not apply callback for [{id}]: {e}"),
    }
    callback_ack("Accepted")
}

fn callback_ack(desc: &str) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "ResultCode": 0, "ResultDesc": desc }))
}

/// Fetch one payment by its correlation id.
#[get("/payments/{id}")]
pub async fn payment_by_id(path: web::Path<String>, api: web::Data<Gateway>) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ GET payment [{id}]");
    match api.payment_by_correlation_id(&id).await {
        Ok(Some(payment)) => Ok(HttpResponse::Ok().json(payment)),
        Ok(None) => Err(ServerError::NoRecordFound(format!("No payment with id {id}"))),
        Err(e) => {
            debug!("💻️ Could not fetch payment. {e}");
            Err(ServerError::BackendError(e.to_string()))
        },
    }
}

/// A payer's payments, newest first.
#[get("/payments/history/{address}")]
pub async fn payment_history(
    path: web::Path<WalletAddress>,
    pagination: web::Query<Pagination>,
    api: web::Data<Gateway>,
) -> Result<HttpResponse, ServerError> {
    let address = path.into_inner();
    debug!("💻️ GET payment_history for {address}");
    let history = api
        .payment_history(&address, pagination.limit(), pagination.offset())
        .await
        .map_err(|e| ServerError::BackendError(e.to_string()))?;
    Ok(HttpResponse::Ok().json(history))
}

//--------------------------------------------  Notifications  -------------------------------------------------

/// A recipient's notifications, newest first, with total and unread counts.
#[get("/notifications/{address}")]
pub async fn notifications(
    path: web::Path<WalletAddress>,
    pagination: web::Query<Pagination>,
    api: web::Data<Hub>,
) -> Result<HttpResponse, ServerError> {
    let address = path.into_inner();
    debug!("💻️ GET notifications for {address}");
    let page = api
        .list_notifications(&address, pagination.limit(), pagination.offset())
        .await
        .map_err(|e| ServerError::BackendError(e.to_string()))?;
    Ok(HttpResponse::Ok().json(page))
}

#[get("/notifications/{address}/unread")]
pub async fn unread_count(path: web::Path<WalletAddress>, api: web::Data<Hub>) -> Result<HttpResponse, ServerError> {
    let address = path.into_inner();
    let unread = api.unread_count(&address).await.map_err(|e| ServerError::BackendError(e.to_string()))?;
    Ok(HttpResponse::Ok().json(json!({ "unread": unread })))
}

/// Marks one notification as read. Scoped to the address in the path; an id belonging to another
/// recipient reports failure without changing anything.
#[post("/notifications/{address}/read/{id}")]
pub async fn mark_read(
    path: web::Path<(WalletAddress, i64)>,
    api: web::Data<Hub>,
) -> Result<HttpResponse, ServerError> {
    let (address, id) = path.into_inner();
    debug!("💻️ POST mark_read {id} for {address}");
    let updated = api.mark_read(id, &address).await.map_err(|e| ServerError::BackendError(e.to_string()))?;
    let response = if updated {
        JsonResponse::success("Notification marked as read.")
    } else {
        JsonResponse::failure("No matching unread notification.")
    };
    Ok(HttpResponse::Ok().json(response))
}

#[post("/notifications/{address}/read-all")]
pub async fn mark_all_read(path: web::Path<WalletAddress>, api: web::Data<Hub>) -> Result<HttpResponse, ServerError> {
    let address = path.into_inner();
    debug!("💻️ POST mark_all_read for {address}");
    let marked = api.mark_all_read(&address).await.map_err(|e| ServerError::BackendError(e.to_string()))?;
    Ok(HttpResponse::Ok().json(json!({ "marked": marked })))
}

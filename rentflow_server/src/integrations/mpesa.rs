//! Glue between the Daraja client and the engine's payment seams.
use mpesa_tools::{CallbackSummary, MpesaApi, MpesaApiError, MpesaConfig};
use rentflow_engine::{CallbackOutcome, CallbackStatus, ProviderError, PushPaymentProvider, PushPaymentRequest};

/// [`MpesaApi`] viewed through the engine's [`PushPaymentProvider`] seam.
#[derive(Clone)]
pub struct MpesaProvider {
    api: MpesaApi,
}

impl MpesaProvider {
    pub fn new(config: MpesaConfig) -> Result<Self, MpesaApiError> {
        Ok(Self { api: MpesaApi::new(config)? })
    }
}

impl PushPaymentProvider for MpesaProvider {
    async fn request_push(&self, request: PushPaymentRequest) -> Result<String, ProviderError> {
        let response = self
            .api
            .initiate_stk_push(&request.phone_number, request.amount, &request.account_reference, &request.description)
            .await
            .map_err(|e| match e {
                MpesaApiError::GatewayRejected { status, message } => {
                    ProviderError::Rejected(format!("HTTP {status}: {message}"))
                },
                other => ProviderError::Unreachable(other.to_string()),
            })?;
        Ok(response.checkout_request_id)
    }
}

/// A parsed Daraja callback, re-expressed in the engine's transport-neutral terms.
pub fn outcome_from_summary(summary: CallbackSummary) -> CallbackOutcome {
    match summary {
        CallbackSummary::Success { checkout_request_id, receipt, .. } => {
            CallbackOutcome { correlation_id: checkout_request_id, status: CallbackStatus::Success { receipt } }
        },
        CallbackSummary::Failure { checkout_request_id, reason } => {
            CallbackOutcome { correlation_id: checkout_request_id, status: CallbackStatus::Failure { reason } }
        },
    }
}

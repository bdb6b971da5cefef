use thiserror::Error;

#[derive(Debug, Error)]
pub enum MpesaApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Authentication with Daraja failed: {0}")]
    AuthenticationFailed(String),
    #[error("Request to Daraja failed: {0}")]
    RequestError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Daraja rejected the request. Error {status}. {message}")]
    GatewayRejected { status: u16, message: String },
    #[error("Malformed STK callback payload: {0}")]
    MalformedCallback(String),
}

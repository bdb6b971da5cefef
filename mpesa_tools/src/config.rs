use log::*;
use rf_common::Secret;

const DEFAULT_BASE_URL: &str = "https://sandbox.safaricom.co.ke";

#[derive(Debug, Clone, Default)]
pub struct MpesaConfig {
    /// Base URL for the Daraja API. Defaults to the sandbox.
    pub base_url: String,
    pub consumer_key: Secret<String>,
    pub consumer_secret: Secret<String>,
    /// The paybill / till number payments are addressed to.
    pub shortcode: String,
    pub passkey: Secret<String>,
    /// The publicly reachable URL Daraja POSTs STK callbacks to.
    pub callback_url: String,
}

impl MpesaConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("RF_MPESA_BASE_URL").unwrap_or_else(|_| {
            warn!("RF_MPESA_BASE_URL not set, using the sandbox, {DEFAULT_BASE_URL}");
            DEFAULT_BASE_URL.to_string()
        });
        let consumer_key = std::env::var("RF_MPESA_CONSUMER_KEY").map(Secret::from).unwrap_or_else(|_| {
            warn!("RF_MPESA_CONSUMER_KEY not set, using (probably useless) default");
            Secret::from("00000000000000")
        });
        let consumer_secret = std::env::var("RF_MPESA_CONSUMER_SECRET").map(Secret::from).unwrap_or_else(|_| {
            warn!("RF_MPESA_CONSUMER_SECRET not set, using (probably useless) default");
            Secret::from("00000000000000")
        });
        let shortcode = std::env::var("RF_MPESA_SHORTCODE").unwrap_or_else(|_| {
            warn!("RF_MPESA_SHORTCODE not set, using the sandbox shortcode");
            "174379".to_string()
        });
        let passkey = std::env::var("RF_MPESA_PASSKEY").map(Secret::from).unwrap_or_else(|_| {
            warn!("RF_MPESA_PASSKEY not set, using (probably useless) default");
            Secret::from("00000000000000")
        });
        let callback_url = std::env::var("RF_MPESA_CALLBACK_URL").unwrap_or_else(|_| {
            warn!("RF_MPESA_CALLBACK_URL not set, callbacks will never arrive");
            "http://localhost:8360/api/payments/mpesa-callback".to_string()
        });
        Self { base_url, consumer_key, consumer_secret, shortcode, passkey, callback_url }
    }
}

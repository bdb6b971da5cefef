use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use log::*;
use reqwest::Client;
use tokio::sync::Mutex;

use crate::{
    config::MpesaConfig,
    data_objects::{AuthTokenResponse, StkPushRequest, StkPushResponse},
    MpesaApiError,
};

/// Margin subtracted from the token lifetime so we never present a token that expires mid-flight.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Client for the Daraja STK push API.
///
/// OAuth tokens are cached until shortly before expiry; concurrent callers share the cache.
#[derive(Clone)]
pub struct MpesaApi {
    config: MpesaConfig,
    client: Arc<Client>,
    token: Arc<Mutex<Option<CachedToken>>>,
}

impl MpesaApi {
    pub fn new(config: MpesaConfig) -> Result<Self, MpesaApiError> {
        if config.consumer_key.is_unset() || config.consumer_secret.is_unset() || config.passkey.is_unset() {
            warn!("💳️ M-Pesa credentials are placeholders. The gateway will reject STK push requests.");
        }
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| MpesaApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client), token: Arc::new(Mutex::new(None)) })
    }

    /// Returns a valid OAuth token, fetching a fresh one if the cached token is absent or stale.
    async fn access_token(&self) -> Result<String, MpesaApiError> {
        let mut guard = self.token.lock().await;
        if let Some(cached) = guard.as_ref() {
            if Utc::now() < cached.expires_at {
                return Ok(cached.token.clone());
            }
        }
        trace!("💳️ Fetching a new Daraja access token");
        let url = format!("{}/oauth/v1/generate?grant_type=client_credentials", self.config.base_url);
        let response = self
            .client
            .get(url)
            .basic_auth(self.config.consumer_key.reveal(), Some(self.config.consumer_secret.reveal()))
            .send()
            .await
            .map_err(|e| MpesaApiError::AuthenticationFailed(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(MpesaApiError::AuthenticationFailed(format!("HTTP {status}: {message}")));
        }
        let token = response.json::<AuthTokenResponse>().await.map_err(|e| MpesaApiError::JsonError(e.to_string()))?;
        let lifetime = token.expires_in.parse::<i64>().unwrap_or(3599);
        let expires_at = Utc::now() + Duration::seconds((lifetime - TOKEN_EXPIRY_MARGIN_SECS).max(0));
        *guard = Some(CachedToken { token: token.access_token.clone(), expires_at });
        debug!("💳️ Daraja access token refreshed, valid until {expires_at}");
        Ok(token.access_token)
    }

    /// Asks Daraja to push a payment prompt to `phone_number`.
    ///
    /// On success the returned `checkout_request_id` is the correlation id that every subsequent
    /// callback for this payment will carry. A rejection here means no prompt was shown and no
    /// callback will ever arrive.
    pub async fn initiate_stk_push(
        &self,
        phone_number: &str,
        amount: i64,
        account_reference: &str,
        description: &str,
    ) -> Result<StkPushResponse, MpesaApiError> {
        let token = self.access_token().await?;
        let timestamp = Self::timestamp(Utc::now());
        let request = StkPushRequest {
            business_short_code: self.config.shortcode.clone(),
            password: self.password(&timestamp),
            timestamp,
            transaction_type: "CustomerPayBillOnline".to_string(),
            amount,
            party_a: phone_number.to_string(),
            party_b: self.config.shortcode.clone(),
            phone_number: phone_number.to_string(),
            callback_url: self.config.callback_url.clone(),
            account_reference: account_reference.to_string(),
            transaction_desc: description.to_string(),
        };
        let url = format!("{}/mpesa/stkpush/v1/processrequest", self.config.base_url);
        trace!("💳️ Sending STK push request for {account_reference}");
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(|e| MpesaApiError::RequestError(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(MpesaApiError::GatewayRejected { status, message });
        }
        let push = response.json::<StkPushResponse>().await.map_err(|e| MpesaApiError::JsonError(e.to_string()))?;
        if push.response_code != "0" {
            return Err(MpesaApiError::GatewayRejected {
                status: 200,
                message: format!("ResponseCode {}: {}", push.response_code, push.customer_message),
            });
        }
        debug!("💳️ STK push accepted. Correlation id {}", push.checkout_request_id);
        Ok(push)
    }

    fn timestamp(now: DateTime<Utc>) -> String {
        now.format("%Y%m%d%H%M%S").to_string()
    }

    /// Daraja's "password" is base64(shortcode + passkey + timestamp).
    fn password(&self, timestamp: &str) -> String {
        base64::encode(format!("{}{}{timestamp}", self.config.shortcode, self.config.passkey.reveal()))
    }
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;
    use rf_common::Secret;

    use super::*;

    #[test]
    fn timestamp_matches_daraja_format() {
        let t = Utc.with_ymd_and_hms(2024, 8, 1, 12, 15, 30).unwrap();
        assert_eq!(MpesaApi::timestamp(t), "20240801121530");
    }

    #[test]
    fn password_is_base64_of_shortcode_passkey_timestamp() {
        let config = MpesaConfig {
            shortcode: "174379".to_string(),
            passkey: Secret::new("key".to_string()),
            ..Default::default()
        };
        let api = MpesaApi::new(config).unwrap();
        let password = api.password("20240801121530");
        assert_eq!(base64::decode(password).unwrap(), b"174379key20240801121530");
    }
}

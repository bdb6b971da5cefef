use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::MpesaApiError;

//--------------------------------------   STK push request   --------------------------------------------------------
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StkPushRequest {
    pub business_short_code: String,
    pub password: String,
    pub timestamp: String,
    pub transaction_type: String,
    pub amount: i64,
    #[serde(rename = "PartyA")]
    pub party_a: String,
    #[serde(rename = "PartyB")]
    pub party_b: String,
    pub phone_number: String,
    #[serde(rename = "CallBackURL")]
    pub callback_url: String,
    pub account_reference: String,
    pub transaction_desc: String,
}

//--------------------------------------   STK push response   -------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
pub struct StkPushResponse {
    #[serde(rename = "MerchantRequestID")]
    pub merchant_request_id: String,
    /// The correlation id. Every callback for this payment will carry the same value.
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    #[serde(rename = "ResponseCode")]
    pub response_code: String,
    #[serde(rename = "CustomerMessage")]
    pub customer_message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthTokenResponse {
    pub access_token: String,
    /// Daraja returns this as a string, e.g. "3599"
    pub expires_in: String,
}

//--------------------------------------   STK callback   ------------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
pub struct StkCallbackDocument {
    #[serde(rename = "Body")]
    pub body: StkCallbackBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StkCallbackBody {
    #[serde(rename = "stkCallback")]
    pub stk_callback: StkCallback,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StkCallback {
    #[serde(rename = "MerchantRequestID")]
    pub merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    #[serde(rename = "ResultCode")]
    pub result_code: i64,
    #[serde(rename = "ResultDesc")]
    pub result_desc: String,
    #[serde(rename = "CallbackMetadata")]
    pub callback_metadata: Option<CallbackMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackMetadata {
    #[serde(rename = "Item")]
    pub item: Vec<MetadataItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetadataItem {
    #[serde(rename = "Name")]
    pub name: String,
    // Daraja mixes numbers and strings here, and omits Value entirely for some items
    #[serde(rename = "Value")]
    pub value: Option<Value>,
}

/// The flattened result of an STK callback.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackSummary {
    Success {
        checkout_request_id: String,
        amount: i64,
        receipt: String,
        phone_number: String,
        transaction_date: String,
    },
    Failure {
        checkout_request_id: String,
        reason: String,
    },
}

impl CallbackSummary {
    pub fn checkout_request_id(&self) -> &str {
        match self {
            CallbackSummary::Success { checkout_request_id, .. } => checkout_request_id,
            CallbackSummary::Failure { checkout_request_id, .. } => checkout_request_id,
        }
    }
}

impl CallbackMetadata {
    /// Items are matched by name. Daraja does not guarantee their order.
    fn find(&self, name: &str) -> Result<&Value, MpesaApiError> {
        self.item
            .iter()
            .find(|item| item.name == name)
            .and_then(|item| item.value.as_ref())
            .ok_or_else(|| MpesaApiError::MalformedCallback(format!("metadata item '{name}' is missing")))
    }

    fn find_string(&self, name: &str) -> Result<String, MpesaApiError> {
        let value = self.find(name)?;
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(MpesaApiError::MalformedCallback(format!("metadata item '{name}' has type {other:?}"))),
        }
    }

    fn find_amount(&self, name: &str) -> Result<i64, MpesaApiError> {
        let value = self.find(name)?;
        value
            .as_i64()
            .or_else(|| value.as_f64().map(|f| f.round() as i64))
            .ok_or_else(|| MpesaApiError::MalformedCallback(format!("metadata item '{name}' is not numeric")))
    }
}

impl StkCallbackDocument {
    /// Flattens the nested callback document into a [`CallbackSummary`].
    ///
    /// A result code of 0 means the customer completed the payment; the receipt and amount are
    /// then required metadata. Any other code is a failure and the description is the reason.
    pub fn summarize(&self) -> Result<CallbackSummary, MpesaApiError> {
        let cb = &self.body.stk_callback;
        if cb.result_code != 0 {
            return Ok(CallbackSummary::Failure {
                checkout_request_id: cb.checkout_request_id.clone(),
                reason: cb.result_desc.clone(),
            });
        }
        let metadata = cb
            .callback_metadata
            .as_ref()
            .ok_or_else(|| MpesaApiError::MalformedCallback("successful callback without metadata".to_string()))?;
        Ok(CallbackSummary::Success {
            checkout_request_id: cb.checkout_request_id.clone(),
            amount: metadata.find_amount("Amount")?,
            receipt: metadata.find_string("MpesaReceiptNumber")?,
            phone_number: metadata.find_string("PhoneNumber")?,
            transaction_date: metadata.find_string("TransactionDate")?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn success_payload() -> &'static str {
        r#"{
          "Body": {
            "stkCallback": {
              "MerchantRequestID": "29115-34620561-1",
              "CheckoutRequestID": "ws_CO_191220191020363925",
              "ResultCode": 0,
              "ResultDesc": "The service request is processed successfully.",
              "CallbackMetadata": {
                "Item": [
                  { "Name": "Amount", "Value": 500.0 },
                  { "Name": "MpesaReceiptNumber", "Value": "QAX123" },
                  { "Name": "Balance" },
                  { "Name": "TransactionDate", "Value": 20191219102115 },
                  { "Name": "PhoneNumber", "Value": 254700000000 }
                ]
              }
            }
          }
        }"#
    }

    #[test]
    fn success_callback_is_summarized_by_name() {
        let doc: StkCallbackDocument = serde_json::from_str(success_payload()).unwrap();
        let summary = doc.summarize().unwrap();
        assert_eq!(summary, CallbackSummary::Success {
            checkout_request_id: "ws_CO_191220191020363925".to_string(),
            amount: 500,
            receipt: "QAX123".to_string(),
            phone_number: "254700000000".to_string(),
            transaction_date: "20191219102115".to_string(),
        });
    }

    #[test]
    fn failure_callback_carries_the_reason() {
        let payload = r#"{
          "Body": {
            "stkCallback": {
              "MerchantRequestID": "29115-34620561-1",
              "CheckoutRequestID": "ws_CO_191220191020363925",
              "ResultCode": 1032,
              "ResultDesc": "Request cancelled by user."
            }
          }
        }"#;
        let doc: StkCallbackDocument = serde_json::from_str(payload).unwrap();
        let summary = doc.summarize().unwrap();
        assert_eq!(summary, CallbackSummary::Failure {
            checkout_request_id: "ws_CO_191220191020363925".to_string(),
            reason: "Request cancelled by user.".to_string(),
        });
    }

    #[test]
    fn success_without_receipt_is_malformed() {
        let payload = r#"{
          "Body": {
            "stkCallback": {
              "MerchantRequestID": "1",
              "CheckoutRequestID": "ws_CO_1",
              "ResultCode": 0,
              "ResultDesc": "ok",
              "CallbackMetadata": { "Item": [ { "Name": "Amount", "Value": 10 } ] }
            }
          }
        }"#;
        let doc: StkCallbackDocument = serde_json::from_str(payload).unwrap();
        assert!(matches!(doc.summarize(), Err(MpesaApiError::MalformedCallback(_))));
    }

    #[test]
    fn garbage_does_not_deserialize() {
        let result = serde_json::from_str::<StkCallbackDocument>(r#"{"Body": {"foo": 1}}"#);
        assert!(result.is_err());
    }
}

use std::fmt::Display;

use rf_common::WalletAddress;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiatePaymentRequest {
    pub payer: WalletAddress,
    pub property_id: i64,
    /// Whole KES. Daraja does not accept cents.
    pub amount: i64,
    /// MSISDN in international format, e.g. `254700000000`.
    pub phone_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamping() {
        let p = Pagination::default();
        assert_eq!(p.limit(), 50);
        assert_eq!(p.offset(), 0);
        let p = Pagination { limit: Some(100_000), offset: Some(-5) };
        assert_eq!(p.limit(), 200);
        assert_eq!(p.offset(), 0);
        let p = Pagination { limit: Some(0), offset: Some(20) };
        assert_eq!(p.limit(), 1);
        assert_eq!(p.offset(), 20);
    }
}

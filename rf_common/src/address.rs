use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

/// A normalized EVM wallet address.
///
/// Addresses arrive from three independent sources (chain events, HTTP requests, websocket
/// identify frames) with arbitrary casing. Everything that keys off an address — notification
/// recipients, payment payers, the live-connection registry — goes through this type, so
/// normalization happens in exactly one place.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

#[derive(Debug, Clone, Error)]
#[error("Invalid wallet address: {0}")]
pub struct AddressError(String);

impl WalletAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A short display form for user-facing messages, e.g. `0x1a2b3c4d…`
    pub fn abbreviated(&self) -> String {
        format!("{}…", &self.0[..10])
    }
}

impl FromStr for WalletAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if !s.starts_with("0x") || s.len() != 42 {
            return Err(AddressError(format!("{s} is not a 0x-prefixed 20-byte hex string")));
        }
        if !s[2..].chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AddressError(format!("{s} contains non-hex characters")));
        }
        Ok(Self(s))
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WalletAddress> for String {
    fn from(value: WalletAddress) -> Self {
        value.0
    }
}

impl Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

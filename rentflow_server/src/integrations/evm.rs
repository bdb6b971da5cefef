//! Decoding of raw marketplace contract logs into the engine's typed chain events.
use chrono::{DateTime, Utc};
use ethers::{
    contract::{parse_log, EthEvent},
    types::{Address, Log, U256},
};
use rentflow_engine::events::{
    AgreementSignedEvent,
    ChainEvent,
    DepositReleasedEvent,
    PaymentReceivedEvent,
    PropertyListedEvent,
};
use rf_common::WalletAddress;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventDecodeError {
    #[error("Could not decode log: {0}")]
    AbiError(#[from] ethers::abi::Error),
    #[error("Numeric value {0} does not fit in a signed 64-bit integer")]
    NumericOverflow(U256),
    #[error("Invalid timestamp in event: {0}")]
    InvalidTimestamp(U256),
    #[error("Invalid address in event: {0}")]
    InvalidAddress(String),
}

#[derive(Clone, Debug, EthEvent)]
#[ethevent(name = "PropertyListed", abi = "PropertyListed(uint256,address,string,string,uint256,string[])")]
pub struct PropertyListedFilter {
    #[ethevent(indexed)]
    pub property_id: U256,
    #[ethevent(indexed)]
    pub landlord: Address,
    pub title: String,
    pub location: String,
    pub price: U256,
    pub images: Vec<String>,
}

#[derive(Clone, Debug, EthEvent)]
#[ethevent(
    name = "AgreementSigned",
    abi = "AgreementSigned(uint256,address,address,uint256,uint256,uint256,uint256)"
)]
pub struct AgreementSignedFilter {
    #[ethevent(indexed)]
    pub agreement_id: U256,
    #[ethevent(indexed)]
    pub tenant: Address,
    #[ethevent(indexed)]
    pub landlord: Address,
    pub property_id: U256,
    pub start_date: U256,
    pub end_date: U256,
    pub rent_amount: U256,
}

#[derive(Clone, Debug, EthEvent)]
#[ethevent(name = "PaymentReceived", abi = "PaymentReceived(uint256,address,uint256,uint256,string)")]
pub struct PaymentReceivedFilter {
    #[ethevent(indexed)]
    pub payment_id: U256,
    #[ethevent(indexed)]
    pub tenant: Address,
    pub property_id: U256,
    pub amount: U256,
    pub currency: String,
}

#[derive(Clone, Debug, EthEvent)]
#[ethevent(name = "DepositReleased", abi = "DepositReleased(address,address,uint256,uint256,string)")]
pub struct DepositReleasedFilter {
    #[ethevent(indexed)]
    pub tenant: Address,
    #[ethevent(indexed)]
    pub landlord: Address,
    pub property_id: U256,
    pub amount: U256,
    pub reason: String,
}

/// Decode one raw log into a typed event. Logs from other contracts or with unknown topics return
/// `Ok(None)` and are skipped by the subscription loop.
pub fn decode_event(log: &Log) -> Result<Option<ChainEvent>, EventDecodeError> {
    let Some(topic0) = log.topics.first().copied() else {
        return Ok(None);
    };
    let block_number = log.block_number.unwrap_or_default().as_u64();
    let event = if topic0 == PropertyListedFilter::signature() {
        let ev: PropertyListedFilter = parse_log(log.clone())?;
        ChainEvent::PropertyListed(PropertyListedEvent {
            property_id: u256_to_i64(ev.property_id)?,
            landlord: to_wallet_address(ev.landlord)?,
            title: ev.title,
            location: ev.location,
            price: u256_to_i64(ev.price)?,
            images: ev.images,
            block_number,
        })
    } else if topic0 == AgreementSignedFilter::signature() {
        let ev: AgreementSignedFilter = parse_log(log.clone())?;
        ChainEvent::AgreementSigned(AgreementSignedEvent {
            agreement_id: u256_to_i64(ev.agreement_id)?,
            tenant: to_wallet_address(ev.tenant)?,
            landlord: to_wallet_address(ev.landlord)?,
            property_id: u256_to_i64(ev.property_id)?,
            starts_at: to_timestamp(ev.start_date)?,
            ends_at: to_timestamp(ev.end_date)?,
            rent_amount: u256_to_i64(ev.rent_amount)?,
            block_number,
        })
    } else if topic0 == PaymentReceivedFilter::signature() {
        let ev: PaymentReceivedFilter = parse_log(log.clone())?;
        ChainEvent::PaymentReceived(PaymentReceivedEvent {
            payment_id: format!("chain-{}", ev.payment_id),
            tenant: to_wallet_address(ev.tenant)?,
            property_id: u256_to_i64(ev.property_id)?,
            amount: u256_to_i64(ev.amount)?,
            currency: ev.currency,
            block_number,
        })
    } else if topic0 == DepositReleasedFilter::signature() {
        let ev: DepositReleasedFilter = parse_log(log.clone())?;
        ChainEvent::DepositReleased(DepositReleasedEvent {
            tenant: to_wallet_address(ev.tenant)?,
            landlord: to_wallet_address(ev.landlord)?,
            property_id: u256_to_i64(ev.property_id)?,
            amount: u256_to_i64(ev.amount)?,
            reason: ev.reason,
            block_number,
        })
    } else {
        return Ok(None);
    };
    Ok(Some(event))
}

fn u256_to_i64(value: U256) -> Result<i64, EventDecodeError> {
    if value > U256::from(i64::MAX) {
        return Err(EventDecodeError::NumericOverflow(value));
    }
    Ok(value.as_u64() as i64)
}

/// Contract timestamps are unix seconds.
fn to_timestamp(value: U256) -> Result<DateTime<Utc>, EventDecodeError> {
    let secs = u256_to_i64(value).map_err(|_| EventDecodeError::InvalidTimestamp(value))?;
    DateTime::from_timestamp(secs, 0).ok_or(EventDecodeError::InvalidTimestamp(value))
}

fn to_wallet_address(address: Address) -> Result<WalletAddress, EventDecodeError> {
    format!("{address:#x}").parse().map_err(|_| EventDecodeError::InvalidAddress(format!("{address:#x}")))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn u256_conversion_guards_against_overflow() {
        assert_eq!(u256_to_i64(U256::from(42u64)).unwrap(), 42);
        assert_eq!(u256_to_i64(U256::from(i64::MAX as u64)).unwrap(), i64::MAX);
        assert!(u256_to_i64(U256::from(u64::MAX)).is_err());
        assert!(u256_to_i64(U256::MAX).is_err());
    }

    #[test]
    fn contract_addresses_become_wallet_addresses() {
        let address: Address = "0x00000000219ab540356cBB839Cbe05303d7705Fa".parse().unwrap();
        let wallet = to_wallet_address(address).unwrap();
        assert_eq!(wallet.as_str(), "0x00000000219ab540356cbb839cbe05303d7705fa");
    }

    #[test]
    fn unknown_topics_are_skipped() {
        let log = Log { topics: vec![ethers::types::H256::random()], ..Default::default() };
        assert!(decode_event(&log).unwrap().is_none());
        let bare = Log::default();
        assert!(decode_event(&bare).unwrap().is_none());
    }
}

pub mod evm;
pub mod mpesa;

use std::env;

use ethers::types::Address;
use log::*;
use mpesa_tools::MpesaConfig;

const DEFAULT_RF_HOST: &str = "127.0.0.1";
const DEFAULT_RF_PORT: u16 = 8360;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Absent when the chain subscription is not configured. The server then runs without the
    /// event worker, serving payments and notifications only.
    pub chain: Option<ChainConfig>,
    pub mpesa: MpesaConfig,
}

#[derive(Clone, Debug)]
pub struct ChainConfig {
    /// WebSocket RPC endpoint of the chain node, e.g. `wss://polygon-rpc.example/ws`.
    pub rpc_url: String,
    /// The marketplace contract whose logs are subscribed to.
    pub contract_address: Address,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RF_HOST.to_string(),
            port: DEFAULT_RF_PORT,
            database_url: String::default(),
            chain: None,
            mpesa: MpesaConfig::new_from_env_or_default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("RF_HOST").ok().unwrap_or_else(|| DEFAULT_RF_HOST.into());
        let port = env::var("RF_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for RF_PORT. {e} Using the default, {DEFAULT_RF_PORT}, instead."
                    );
                    DEFAULT_RF_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_RF_PORT);
        let database_url = env::var("RF_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ RF_DATABASE_URL is not set. Please set it to the URL for the Rentflow database.");
            String::default()
        });
        let chain = ChainConfig::try_from_env();
        let mpesa = MpesaConfig::new_from_env_or_default();
        Self { host, port, database_url, chain, mpesa }
    }
}

impl ChainConfig {
    /// Both `RF_CHAIN_RPC_URL` and `RF_CONTRACT_ADDRESS` must be set and valid; otherwise the
    /// chain worker is disabled.
    pub fn try_from_env() -> Option<Self> {
        let rpc_url = match env::var("RF_CHAIN_RPC_URL") {
            Ok(url) => url,
            Err(_) => {
                warn!("🪛️ RF_CHAIN_RPC_URL is not set. The chain event worker will not run.");
                return None;
            },
        };
        let contract_address = match env::var("RF_CONTRACT_ADDRESS") {
            Ok(s) => match s.parse::<Address>() {
                Ok(addr) => addr,
                Err(e) => {
                    error!(
                        "🪛️ {s} is not a valid contract address for RF_CONTRACT_ADDRESS. {e} The chain event \
                         worker will not run."
                    );
                    return None;
                },
            },
            Err(_) => {
                warn!("🪛️ RF_CONTRACT_ADDRESS is not set. The chain event worker will not run.");
                return None;
            },
        };
        Some(Self { rpc_url, contract_address })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8360);
        assert!(config.chain.is_none());
    }

    #[test]
    fn new_overrides_host_and_port() {
        let config = ServerConfig::new("0.0.0.0", 9000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
    }
}

use std::str::FromStr;

use clap::ValueEnum;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;

use crate::error::{LpError, LpResult};

// --- Core Constants ---
pub const WHIRLPOOL_PROGRAM_ID: &str = "whirLbMiicVdio4qvUfM5KAg6Ct8VwpYzGff3uctyCc";
pub const WHIRLPOOLS_CONFIG_ECLIPSE: &str = "FVG4oDbGv16hqTUbovjyGmtYikn6UBEnazz6RVDMEFwv";
pub const WHIRLPOOLS_CONFIG_SOLANA: &str = "2LecshUwdy9xi7meFgHtFJQNSKk4KdTrcpvaB56dP2NQ";
pub const USDT_MINT_ECLIPSE: &str = "CEBP3CqAbW4zdZA57H2wfaSG1QNdzQ72GiQEbQXyW9Tm";

pub const DEFAULT_RPC_URL: &str = "https://mainnetbeta-rpc.eclipse.xyz";
pub const SOLANA_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
pub const WALLET_KEY_ENV: &str = "WALLET_PRIVATE_KEY";

/// Tick spacings probed by pool discovery.
pub const STANDARD_TICK_SPACINGS: [u16; 5] = [1, 8, 32, 64, 128];

/// Parses a base58 address, naming the offending input on failure.
pub fn parse_pubkey(value: &str) -> LpResult<Pubkey> {
    Pubkey::from_str(value.trim()).map_err(|_| LpError::InvalidAddress(value.to_string()))
}

/// Chain the Whirlpool deployment lives on.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Network {
    #[default]
    Eclipse,
    Solana,
}

impl Network {
    pub fn whirlpools_config(self) -> &'static str {
        match self {
            Network::Eclipse => WHIRLPOOLS_CONFIG_ECLIPSE,
            Network::Solana => WHIRLPOOLS_CONFIG_SOLANA,
        }
    }

    pub fn default_rpc_url(self) -> &'static str {
        match self {
            Network::Eclipse => DEFAULT_RPC_URL,
            Network::Solana => SOLANA_RPC_URL,
        }
    }
}

/// Connection and program settings shared by every workflow.
///
/// Built once in `main` and passed down explicitly.
#[derive(Debug, Clone)]
pub struct Settings {
    pub rpc_url: String,
    pub commitment: CommitmentConfig,
    pub program_id: Pubkey,
    pub whirlpools_config: Pubkey,
}

impl Settings {
    pub fn new(rpc_url: impl Into<String>, program_id: &str, whirlpools_config: &str) -> LpResult<Self> {
        Ok(Self {
            rpc_url: rpc_url.into(),
            commitment: CommitmentConfig::confirmed(),
            program_id: parse_pubkey(program_id)?,
            whirlpools_config: parse_pubkey(whirlpools_config)?,
        })
    }

    /// Network defaults, with optional overrides for the endpoint and config.
    pub fn for_network(network: Network, rpc_url: Option<String>, whirlpools_config: Option<&str>) -> LpResult<Self> {
        Self::new(
            rpc_url.unwrap_or_else(|| network.default_rpc_url().to_string()),
            WHIRLPOOL_PROGRAM_ID,
            whirlpools_config.unwrap_or(network.whirlpools_config()),
        )
    }

    /// Eclipse mainnet defaults.
    pub fn eclipse() -> LpResult<Self> {
        Self::for_network(Network::Eclipse, None, None)
    }
}

/// Decodes a base58-encoded 64 byte secret key.
pub fn keypair_from_base58(secret: &str) -> LpResult<Keypair> {
    let bytes = bs58::decode(secret.trim())
        .into_vec()
        .map_err(|err| LpError::InvalidWalletKey(err.to_string()))?;
    Keypair::from_bytes(&bytes).map_err(|err| LpError::InvalidWalletKey(err.to_string()))
}

/// Loads the signing key from `var`, reading `.env` first if present.
pub fn load_keypair_from_env(var: &str) -> LpResult<Keypair> {
    dotenv::dotenv().ok();
    let secret = std::env::var(var).map_err(|_| LpError::MissingWalletKey(var.to_string()))?;
    keypair_from_base58(&secret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signature::Signer;

    #[test]
    fn base58_secret_round_trips_to_same_pubkey() {
        let keypair = Keypair::new();
        let encoded = bs58::encode(keypair.to_bytes()).into_string();
        let loaded = keypair_from_base58(&encoded).unwrap();
        assert_eq!(loaded.pubkey(), keypair.pubkey());
    }

    #[test]
    fn garbage_secret_is_a_config_error() {
        assert!(matches!(
            keypair_from_base58("not-base58-0OIl"),
            Err(LpError::InvalidWalletKey(_))
        ));
        let too_short = bs58::encode([7u8; 12]).into_string();
        assert!(matches!(
            keypair_from_base58(&too_short),
            Err(LpError::InvalidWalletKey(_))
        ));
    }

    #[test]
    fn missing_env_var_is_reported_by_name() {
        let err = load_keypair_from_env("WHIRLPOOL_LP_TEST_UNSET_KEY").unwrap_err();
        assert!(matches!(err, LpError::MissingWalletKey(ref name) if name == "WHIRLPOOL_LP_TEST_UNSET_KEY"));
    }

    #[test]
    fn malformed_address_is_rejected() {
        assert!(matches!(parse_pubkey("abc"), Err(LpError::InvalidAddress(_))));
        assert!(parse_pubkey(USDT_MINT_ECLIPSE).is_ok());
    }

    #[test]
    fn eclipse_settings_parse() {
        let settings = Settings::eclipse().unwrap();
        assert_eq!(settings.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(settings.program_id.to_string(), WHIRLPOOL_PROGRAM_ID);
    }

    #[test]
    fn solana_network_switches_config_and_endpoint() {
        let settings = Settings::for_network(Network::Solana, None, None).unwrap();
        assert_eq!(settings.whirlpools_config.to_string(), WHIRLPOOLS_CONFIG_SOLANA);
        assert_eq!(settings.rpc_url, SOLANA_RPC_URL);

        let custom = Settings::for_network(Network::Solana, Some("http://localhost:8899".into()), Some(WHIRLPOOLS_CONFIG_ECLIPSE))
            .unwrap();
        assert_eq!(custom.rpc_url, "http://localhost:8899");
        assert_eq!(custom.whirlpools_config.to_string(), WHIRLPOOLS_CONFIG_ECLIPSE);
    }
}

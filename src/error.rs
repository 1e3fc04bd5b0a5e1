use solana_client::client_error::ClientError;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LpError {
    #[error("{0} not found in environment")]
    MissingWalletKey(String),

    #[error("Invalid wallet key: {0}")]
    InvalidWalletKey(String),

    #[error("Invalid address {0}")]
    InvalidAddress(String),

    #[error("Invalid price range: {0}")]
    InvalidPriceRange(String),

    #[error("Tick {0} is outside the initializable tick range")]
    TickOutOfBounds(i32),

    #[error("Slippage must be between 0 and 100%, got {0}")]
    InvalidSlippage(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Liquidity quote produced zero liquidity; the price range cannot be funded with the given input")]
    ZeroLiquidity,

    #[error("Quote failed: {0}")]
    Quote(String),

    #[error("Pool not found at {0}")]
    PoolNotFound(Pubkey),

    #[error("Account not found: {0}")]
    AccountNotFound(Pubkey),

    #[error("Mint {mint} is owned by unsupported token program {owner}")]
    UnsupportedTokenProgram { mint: Pubkey, owner: Pubkey },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Transaction simulation failed: {0}")]
    SimulationFailed(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("RPC error: {0}")]
    Rpc(#[from] ClientError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected API response: {0}")]
    Api(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type LpResult<T> = Result<T, LpError>;

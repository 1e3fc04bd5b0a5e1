//! Liquidity-position workflow for Orca Whirlpools on Eclipse and Solana:
//! locate a pool, read its state, turn a price band into ticks, provision
//! tick arrays, quote the deposit and build the open-position transaction.

pub mod config;
pub mod discovery;
pub mod error;
pub mod instructions;
pub mod onchain_states;
pub mod orca_api;
pub mod pool;
pub mod position;
pub mod provision;
pub mod quote;
pub mod registry;
pub mod rpc;
pub mod ticks;
pub mod transfer;
pub mod wallet;

pub use error::{LpError, LpResult};

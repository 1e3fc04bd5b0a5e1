use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use tracing::info;

use crate::error::{LpError, LpResult};
use crate::instructions::{create_token_account, token_account_address, transfer_position_nft};
use crate::pool::fetch_mint;
use crate::rpc::AccountSource;

#[derive(Debug, Clone)]
pub struct PositionTransfer {
    pub source: Pubkey,
    pub destination: Pubkey,
    pub instructions: Vec<Instruction>,
}

/// Builds the instructions moving a position NFT from `owner` to `recipient`:
/// an idempotent token account for the recipient, then `transfer_checked`.
pub async fn build_position_transfer<S: AccountSource + ?Sized>(
    source: &S,
    owner: &Pubkey,
    position_mint: &Pubkey,
    recipient: &Pubkey,
) -> LpResult<PositionTransfer> {
    let mint = fetch_mint(source, position_mint).await?;
    if mint.decimals != 0 {
        return Err(LpError::InvalidAddress(format!(
            "{position_mint} has {} decimals and is not a position NFT",
            mint.decimals
        )));
    }
    let from = token_account_address(owner, position_mint);
    let to = token_account_address(recipient, position_mint);
    info!(source = %from, destination = %to, "position transfer accounts");

    let instructions = vec![
        create_token_account(owner, recipient, position_mint),
        transfer_position_nft(&from, position_mint, &to, owner)?,
    ];
    Ok(PositionTransfer {
        source: from,
        destination: to,
        instructions,
    })
}

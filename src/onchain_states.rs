//! On-chain account layouts for Orca Whirlpools, used for off-chain decoding.
//! Keep field order and sizes aligned with the program.

use anchor_lang::prelude::*;
use anchor_lang::solana_program::hash::hash;

use crate::error::{LpError, LpResult};

/// Length of the anchor account/instruction discriminator prefix.
pub const DISCRIMINATOR_LEN: usize = 8;

#[derive(Debug, AnchorSerialize, AnchorDeserialize, Clone, Default)]
pub struct Whirlpool {
    pub whirlpools_config: Pubkey,
    pub whirlpool_bump: [u8; 1],
    pub tick_spacing: u16,
    pub tick_spacing_seed: [u8; 2],
    pub fee_rate: u16,
    pub protocol_fee_rate: u16,
    pub liquidity: u128,
    pub sqrt_price: u128,
    pub tick_current_index: i32,
    pub protocol_fee_owed_a: u64,
    pub protocol_fee_owed_b: u64,
    pub token_mint_a: Pubkey,
    pub token_vault_a: Pubkey,
    pub fee_growth_global_a: u128,
    pub token_mint_b: Pubkey,
    pub token_vault_b: Pubkey,
    pub fee_growth_global_b: u128,
    pub reward_last_updated_timestamp: u64,
    pub reward_infos: [WhirlpoolRewardInfo; 3],
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default)]
pub struct WhirlpoolRewardInfo {
    pub mint: Pubkey,
    pub vault: Pubkey,
    pub authority: Pubkey,
    pub emissions_per_second_x64: u128,
    pub growth_global_x64: u128,
}

#[derive(Debug, AnchorSerialize, AnchorDeserialize, Clone, Default)]
pub struct Position {
    pub whirlpool: Pubkey,
    pub position_mint: Pubkey,
    pub liquidity: u128,
    pub tick_lower_index: i32,
    pub tick_upper_index: i32,
    pub fee_growth_checkpoint_a: u128,
    pub fee_owed_a: u64,
    pub fee_growth_checkpoint_b: u128,
    pub fee_owed_b: u64,
    pub reward_infos: [PositionRewardInfo; 3],
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default)]
pub struct PositionRewardInfo {
    pub growth_inside_checkpoint: u128,
    pub amount_owed: u64,
}

/// Anchor account discriminator: first 8 bytes of `sha256("account:<Name>")`.
pub fn account_discriminator(name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let digest = hash(format!("account:{name}").as_bytes()).to_bytes();
    let mut out = [0u8; DISCRIMINATOR_LEN];
    out.copy_from_slice(&digest[..DISCRIMINATOR_LEN]);
    out
}

/// Anchor instruction discriminator: first 8 bytes of `sha256("global:<name>")`.
pub fn instruction_discriminator(name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let digest = hash(format!("global:{name}").as_bytes()).to_bytes();
    let mut out = [0u8; DISCRIMINATOR_LEN];
    out.copy_from_slice(&digest[..DISCRIMINATOR_LEN]);
    out
}

/// Checks the discriminator for `name` and deserializes the remaining bytes.
pub fn decode_account<T: AnchorDeserialize>(name: &str, data: &[u8]) -> LpResult<T> {
    if data.len() < DISCRIMINATOR_LEN || data[..DISCRIMINATOR_LEN] != account_discriminator(name) {
        return Err(LpError::Decode(format!("account is not a {name}")));
    }
    T::deserialize(&mut &data[DISCRIMINATOR_LEN..])
        .map_err(|err| LpError::Decode(format!("failed to parse {name}: {err}")))
}

/// Serializes an account with its discriminator, the inverse of [`decode_account`].
pub fn encode_account<T: AnchorSerialize>(name: &str, account: &T) -> LpResult<Vec<u8>> {
    let mut data = account_discriminator(name).to_vec();
    account
        .serialize(&mut data)
        .map_err(|err| LpError::Decode(format!("failed to encode {name}: {err}")))?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whirlpool_decodes_after_discriminator() {
        let pool = Whirlpool {
            tick_spacing: 32,
            fee_rate: 3000,
            liquidity: 42,
            sqrt_price: 1 << 64,
            tick_current_index: -17,
            token_mint_a: Pubkey::new_unique(),
            token_mint_b: Pubkey::new_unique(),
            ..Whirlpool::default()
        };
        let data = encode_account("Whirlpool", &pool).unwrap();

        let decoded: Whirlpool = decode_account("Whirlpool", &data).unwrap();
        assert_eq!(decoded.tick_spacing, 32);
        assert_eq!(decoded.tick_current_index, -17);
        assert_eq!(decoded.token_mint_a, pool.token_mint_a);
    }

    #[test]
    fn wrong_discriminator_is_rejected() {
        let data = encode_account("Position", &Position::default()).unwrap();
        let result: LpResult<Whirlpool> = decode_account("Whirlpool", &data);
        assert!(matches!(result, Err(LpError::Decode(_))));
    }

    #[test]
    fn short_data_is_rejected() {
        let result: LpResult<Position> = decode_account("Position", &[1, 2, 3]);
        assert!(result.is_err());
    }

    #[test]
    fn instruction_and_account_discriminators_differ() {
        assert_ne!(
            instruction_discriminator("open_position"),
            account_discriminator("open_position")
        );
    }
}

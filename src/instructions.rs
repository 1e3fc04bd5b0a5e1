//! Whirlpool instruction encoders plus the SPL plumbing needed around them.

use anchor_lang::prelude::{borsh, AnchorDeserialize, AnchorSerialize};
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::{system_instruction, system_program, sysvar};
use spl_associated_token_account::get_associated_token_address_with_program_id;
use spl_associated_token_account::instruction::create_associated_token_account_idempotent;

use crate::error::{LpError, LpResult};
use crate::onchain_states::instruction_discriminator;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct InitializeTickArrayArgs {
    pub start_tick_index: i32,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct OpenPositionArgs {
    pub position_bump: u8,
    pub tick_lower_index: i32,
    pub tick_upper_index: i32,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct IncreaseLiquidityArgs {
    pub liquidity_amount: u128,
    pub token_max_a: u64,
    pub token_max_b: u64,
}

/// Discriminator followed by the borsh-encoded arguments.
fn build_data<T: AnchorSerialize>(name: &str, args: &T) -> LpResult<Vec<u8>> {
    let mut data = instruction_discriminator(name).to_vec();
    args.serialize(&mut data)
        .map_err(|err| LpError::Decode(format!("failed to encode {name} args: {err}")))?;
    Ok(data)
}

pub fn initialize_tick_array(
    program_id: &Pubkey,
    whirlpool: &Pubkey,
    funder: &Pubkey,
    tick_array: &Pubkey,
    start_tick_index: i32,
) -> LpResult<Instruction> {
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*whirlpool, false),
            AccountMeta::new(*funder, true),
            AccountMeta::new(*tick_array, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: build_data("initialize_tick_array", &InitializeTickArrayArgs { start_tick_index })?,
    })
}

/// Accounts for `open_position`.
#[derive(Debug, Clone, Copy)]
pub struct OpenPositionAccounts {
    pub funder: Pubkey,
    pub owner: Pubkey,
    pub position: Pubkey,
    pub position_mint: Pubkey,
    pub position_token_account: Pubkey,
    pub whirlpool: Pubkey,
}

pub fn open_position(program_id: &Pubkey, accounts: &OpenPositionAccounts, args: &OpenPositionArgs) -> LpResult<Instruction> {
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(accounts.funder, true),
            AccountMeta::new_readonly(accounts.owner, false),
            AccountMeta::new(accounts.position, false),
            AccountMeta::new(accounts.position_mint, true),
            AccountMeta::new(accounts.position_token_account, false),
            AccountMeta::new_readonly(accounts.whirlpool, false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
            AccountMeta::new_readonly(sysvar::rent::id(), false),
            AccountMeta::new_readonly(spl_associated_token_account::id(), false),
        ],
        data: build_data("open_position", args)?,
    })
}

/// Accounts for `increase_liquidity`.
#[derive(Debug, Clone, Copy)]
pub struct IncreaseLiquidityAccounts {
    pub whirlpool: Pubkey,
    pub position_authority: Pubkey,
    pub position: Pubkey,
    pub position_token_account: Pubkey,
    pub token_owner_account_a: Pubkey,
    pub token_owner_account_b: Pubkey,
    pub token_vault_a: Pubkey,
    pub token_vault_b: Pubkey,
    pub tick_array_lower: Pubkey,
    pub tick_array_upper: Pubkey,
}

pub fn increase_liquidity(
    program_id: &Pubkey,
    accounts: &IncreaseLiquidityAccounts,
    args: &IncreaseLiquidityArgs,
) -> LpResult<Instruction> {
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(accounts.whirlpool, false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(accounts.position_authority, true),
            AccountMeta::new(accounts.position, false),
            AccountMeta::new_readonly(accounts.position_token_account, false),
            AccountMeta::new(accounts.token_owner_account_a, false),
            AccountMeta::new(accounts.token_owner_account_b, false),
            AccountMeta::new(accounts.token_vault_a, false),
            AccountMeta::new(accounts.token_vault_b, false),
            AccountMeta::new(accounts.tick_array_lower, false),
            AccountMeta::new(accounts.tick_array_upper, false),
        ],
        data: build_data("increase_liquidity", args)?,
    })
}

// --- SPL Token Helpers ---

pub fn token_account_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    get_associated_token_address_with_program_id(owner, mint, &spl_token::id())
}

/// Idempotent ATA creation; a no-op on-chain when the account already exists.
pub fn create_token_account(payer: &Pubkey, owner: &Pubkey, mint: &Pubkey) -> Instruction {
    create_associated_token_account_idempotent(payer, owner, mint, &spl_token::id())
}

/// Moves `lamports` into the owner's wrapped-native account and syncs its balance.
pub fn wrap_native(owner: &Pubkey, lamports: u64) -> LpResult<Vec<Instruction>> {
    let wrapped = token_account_address(owner, &spl_token::native_mint::id());
    let sync = spl_token::instruction::sync_native(&spl_token::id(), &wrapped)
        .map_err(|err| LpError::Decode(format!("sync_native: {err}")))?;
    Ok(vec![system_instruction::transfer(owner, &wrapped, lamports), sync])
}

/// Closes the owner's wrapped-native account, returning leftover lamports.
pub fn unwrap_native(owner: &Pubkey) -> LpResult<Instruction> {
    let wrapped = token_account_address(owner, &spl_token::native_mint::id());
    spl_token::instruction::close_account(&spl_token::id(), &wrapped, owner, owner, &[])
        .map_err(|err| LpError::Decode(format!("close_account: {err}")))
}

/// `transfer_checked` of a single position NFT between token accounts.
pub fn transfer_position_nft(
    source: &Pubkey,
    position_mint: &Pubkey,
    destination: &Pubkey,
    authority: &Pubkey,
) -> LpResult<Instruction> {
    spl_token::instruction::transfer_checked(
        &spl_token::id(),
        source,
        position_mint,
        destination,
        authority,
        &[],
        1,
        0,
    )
    .map_err(|err| LpError::Decode(format!("transfer_checked: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_array_init_layout() {
        let program_id = Pubkey::new_unique();
        let (pool, funder, array) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        let ix = initialize_tick_array(&program_id, &pool, &funder, &array, -2816).unwrap();

        assert_eq!(ix.accounts.len(), 4);
        assert!(ix.accounts[1].is_signer && ix.accounts[1].is_writable);
        assert_eq!(&ix.data[..8], &instruction_discriminator("initialize_tick_array"));
        let args = InitializeTickArrayArgs::deserialize(&mut &ix.data[8..]).unwrap();
        assert_eq!(args.start_tick_index, -2816);
    }

    #[test]
    fn increase_liquidity_encodes_quote_amounts() {
        let key = Pubkey::new_unique;
        let accounts = IncreaseLiquidityAccounts {
            whirlpool: key(),
            position_authority: key(),
            position: key(),
            position_token_account: key(),
            token_owner_account_a: key(),
            token_owner_account_b: key(),
            token_vault_a: key(),
            token_vault_b: key(),
            tick_array_lower: key(),
            tick_array_upper: key(),
        };
        let args = IncreaseLiquidityArgs {
            liquidity_amount: 123_456_789,
            token_max_a: 1_000_000,
            token_max_b: 2_581_000,
        };
        let ix = increase_liquidity(&key(), &accounts, &args).unwrap();

        assert_eq!(ix.accounts.len(), 11);
        assert!(ix.accounts[2].is_signer);
        assert_eq!(IncreaseLiquidityArgs::deserialize(&mut &ix.data[8..]).unwrap(), args);
    }

    #[test]
    fn open_position_requires_mint_signature() {
        let key = Pubkey::new_unique;
        let accounts = OpenPositionAccounts {
            funder: key(),
            owner: key(),
            position: key(),
            position_mint: key(),
            position_token_account: key(),
            whirlpool: key(),
        };
        let args = OpenPositionArgs { position_bump: 254, tick_lower_index: 8736, tick_upper_index: 10304 };
        let ix = open_position(&key(), &accounts, &args).unwrap();

        let signers: Vec<Pubkey> = ix.accounts.iter().filter(|m| m.is_signer).map(|m| m.pubkey).collect();
        assert_eq!(signers, vec![accounts.funder, accounts.position_mint]);
        assert_eq!(OpenPositionArgs::deserialize(&mut &ix.data[8..]).unwrap(), args);
    }

    #[test]
    fn wrapping_targets_the_native_token_account() {
        let owner = Pubkey::new_unique();
        let ixs = wrap_native(&owner, 1_000_000).unwrap();
        let wrapped = token_account_address(&owner, &spl_token::native_mint::id());
        assert_eq!(ixs.len(), 2);
        assert_eq!(ixs[0].accounts[1].pubkey, wrapped);
        assert_eq!(ixs[1].program_id, spl_token::id());
    }
}

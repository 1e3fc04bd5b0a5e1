use solana_sdk::pubkey::Pubkey;
use spl_token::solana_program::program_pack::Pack;
use spl_token::state::Mint;
use tracing::{debug, warn};

use crate::error::{LpError, LpResult};
use crate::onchain_states::{decode_account, Whirlpool};
use crate::registry::TokenRegistry;
use crate::rpc::AccountSource;
use crate::ticks::{TickArrayHelper, TickConverter};

const WHIRLPOOL_SEED: &[u8] = b"whirlpool";
const TICK_ARRAY_SEED: &[u8] = b"tick_array";
const POSITION_SEED: &[u8] = b"position";

// --- Pool Locator ---

/// Pool PDA for a (config, mint pair, tick spacing) tuple. No network access.
pub fn derive_whirlpool_address(
    program_id: &Pubkey,
    whirlpools_config: &Pubkey,
    mint_a: &Pubkey,
    mint_b: &Pubkey,
    tick_spacing: u16,
) -> Pubkey {
    let (pda, _bump) = Pubkey::find_program_address(
        &[
            WHIRLPOOL_SEED,
            whirlpools_config.as_ref(),
            mint_a.as_ref(),
            mint_b.as_ref(),
            &tick_spacing.to_le_bytes(),
        ],
        program_id,
    );
    pda
}

/// Tick array PDA. The start index is seeded as its decimal string.
pub fn derive_tick_array_address(program_id: &Pubkey, whirlpool: &Pubkey, start_tick_index: i32) -> Pubkey {
    let (pda, _bump) = Pubkey::find_program_address(
        &[
            TICK_ARRAY_SEED,
            whirlpool.as_ref(),
            start_tick_index.to_string().as_bytes(),
        ],
        program_id,
    );
    pda
}

pub fn derive_position_address(program_id: &Pubkey, position_mint: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[POSITION_SEED, position_mint.as_ref()], program_id)
}

// --- Pool State Reader ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintInfo {
    pub address: Pubkey,
    pub decimals: u8,
    pub token_program: Pubkey,
}

/// Decoded pool state plus the decimals of both mints.
#[derive(Debug, Clone)]
pub struct PoolSnapshot {
    pub address: Pubkey,
    pub state: Whirlpool,
    pub mint_a: MintInfo,
    pub mint_b: MintInfo,
}

impl PoolSnapshot {
    pub fn converter(&self) -> TickConverter {
        TickConverter::new(self.mint_a.decimals, self.mint_b.decimals)
    }

    pub fn helper(&self) -> LpResult<TickArrayHelper> {
        TickArrayHelper::new(self.state.tick_spacing)
    }

    /// Current human price of token A in token B.
    pub fn current_price(&self) -> f64 {
        self.converter().sqrt_price_to_price(self.state.sqrt_price)
    }

    /// Fee rate as a percentage; the program stores hundredths of a basis point.
    pub fn fee_rate_pct(&self) -> f64 {
        self.state.fee_rate as f64 / 10_000.0
    }
}

/// Reads and decodes the pool account only.
///
/// A missing account, a foreign owner or a non-`Whirlpool` layout all mean
/// there is no compatible pool at `address`.
pub async fn fetch_whirlpool<S: AccountSource + ?Sized>(
    source: &S,
    program_id: &Pubkey,
    address: &Pubkey,
) -> LpResult<Whirlpool> {
    let Some(account) = source.get_account(address).await? else {
        debug!(%address, "no account at pool address");
        return Err(LpError::PoolNotFound(*address));
    };
    if account.owner != *program_id {
        debug!(%address, owner = %account.owner, "pool address owned by another program");
        return Err(LpError::PoolNotFound(*address));
    }
    decode_account::<Whirlpool>("Whirlpool", &account.data).map_err(|err| {
        warn!(%address, %err, "account is not a whirlpool");
        LpError::PoolNotFound(*address)
    })
}

pub async fn fetch_mint<S: AccountSource + ?Sized>(source: &S, mint: &Pubkey) -> LpResult<MintInfo> {
    let account = source
        .get_account(mint)
        .await?
        .ok_or(LpError::AccountNotFound(*mint))?;
    let base = account
        .data
        .get(..Mint::LEN)
        .ok_or_else(|| LpError::Decode(format!("mint {mint} data too short")))?;
    let state = Mint::unpack_from_slice(base)
        .map_err(|err| LpError::Decode(format!("failed to parse mint {mint}: {err}")))?;
    Ok(MintInfo {
        address: *mint,
        decimals: state.decimals,
        token_program: account.owner,
    })
}

/// Pool account plus both mints: one read for the pool, one per mint.
pub async fn fetch_pool<S: AccountSource + ?Sized>(
    source: &S,
    program_id: &Pubkey,
    address: &Pubkey,
) -> LpResult<PoolSnapshot> {
    let state = fetch_whirlpool(source, program_id, address).await?;
    let mint_a = fetch_mint(source, &state.token_mint_a).await?;
    let mint_b = fetch_mint(source, &state.token_mint_b).await?;
    Ok(PoolSnapshot {
        address: *address,
        state,
        mint_a,
        mint_b,
    })
}

/// Prints the pool summary shown before any position work.
pub fn print_pool_summary(pool: &PoolSnapshot, registry: &TokenRegistry) {
    let state = &pool.state;
    println!("--- Pool State for {} ---", pool.address);
    println!("  - Pair:          {}", registry.pair_label(&state.token_mint_a, &state.token_mint_b));
    println!("  - Token A:       {} ({} decimals)", state.token_mint_a, pool.mint_a.decimals);
    println!("  - Token B:       {} ({} decimals)", state.token_mint_b, pool.mint_b.decimals);
    println!("  - Tick Spacing:  {}", state.tick_spacing);
    println!("  - Fee Rate:      {:.2}%", pool.fee_rate_pct());
    println!("  - Liquidity:     {}", state.liquidity);
    println!("  - Sqrt Price:    {}", state.sqrt_price);
    println!("  - Current Tick:  {}", state.tick_current_index);
    println!("  - Current Price: {:.8}", pool.current_price());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse_pubkey, WHIRLPOOL_PROGRAM_ID, WHIRLPOOLS_CONFIG_ECLIPSE};
    use crate::onchain_states::{encode_account, Position};
    use crate::rpc::{program_account, MemoryAccounts};

    fn program_id() -> Pubkey {
        parse_pubkey(WHIRLPOOL_PROGRAM_ID).unwrap()
    }

    #[test]
    fn pool_address_depends_on_every_seed() {
        let config = parse_pubkey(WHIRLPOOLS_CONFIG_ECLIPSE).unwrap();
        let (a, b) = (Pubkey::new_unique(), Pubkey::new_unique());
        let base = derive_whirlpool_address(&program_id(), &config, &a, &b, 32);

        assert_eq!(base, derive_whirlpool_address(&program_id(), &config, &a, &b, 32));
        assert_ne!(base, derive_whirlpool_address(&program_id(), &config, &a, &b, 64));
        assert_ne!(base, derive_whirlpool_address(&program_id(), &config, &b, &a, 32));
    }

    #[test]
    fn tick_array_address_distinguishes_negative_starts() {
        let pool = Pubkey::new_unique();
        assert_ne!(
            derive_tick_array_address(&program_id(), &pool, 2816),
            derive_tick_array_address(&program_id(), &pool, -2816)
        );
    }

    #[tokio::test]
    async fn missing_pool_account_is_pool_not_found() {
        let source = MemoryAccounts::new();
        let address = Pubkey::new_unique();
        let err = fetch_pool(&source, &program_id(), &address).await.unwrap_err();
        assert!(matches!(err, LpError::PoolNotFound(found) if found == address));
    }

    #[tokio::test]
    async fn foreign_owner_or_layout_is_pool_not_found() {
        let foreign = Pubkey::new_unique();
        let wrong_layout = Pubkey::new_unique();
        let data = encode_account("Whirlpool", &Whirlpool::default()).unwrap();
        let position = encode_account("Position", &Position::default()).unwrap();
        let source = MemoryAccounts::new()
            .with_account(foreign, program_account(Pubkey::new_unique(), data))
            .with_account(wrong_layout, program_account(program_id(), position));

        assert!(matches!(
            fetch_whirlpool(&source, &program_id(), &foreign).await,
            Err(LpError::PoolNotFound(_))
        ));
        assert!(matches!(
            fetch_whirlpool(&source, &program_id(), &wrong_layout).await,
            Err(LpError::PoolNotFound(_))
        ));
    }
}

use rust_decimal::Decimal;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::Transaction;
use tracing::{error, info};

use crate::error::{LpError, LpResult};
use crate::instructions::{
    create_token_account, increase_liquidity, open_position, token_account_address, unwrap_native, wrap_native,
    IncreaseLiquidityAccounts, IncreaseLiquidityArgs, OpenPositionAccounts, OpenPositionArgs,
};
use crate::onchain_states::{decode_account, Position};
use crate::pool::{derive_position_address, fetch_pool, MintInfo, PoolSnapshot};
use crate::provision::{provision_tick_arrays, Provisioning};
use crate::quote::{quote_by_input_token, slippage_to_bps, to_base_units, InputToken, LiquidityQuote};
use crate::rpc::AccountSource;
use crate::ticks::{price_range_to_tick_range, range_around_price, TickRange};
use crate::wallet::WalletSigner;

/// How the operator describes the desired price band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceBand {
    /// Absolute human prices of token A in token B.
    Fixed { lower: f64, upper: f64 },
    /// `pct` percent either side of the pool's current price.
    AroundCurrent { pct: f64 },
}

#[derive(Debug, Clone)]
pub struct OpenPositionRequest {
    pub pool: Pubkey,
    pub band: PriceBand,
    pub input: InputToken,
    /// Human units of the input token.
    pub amount: Decimal,
    /// Fraction, `0.01` is 1%.
    pub slippage: Decimal,
}

/// Everything needed to open the position, before any blockhash or signature.
#[derive(Debug)]
pub struct OpenPositionPlan {
    pub pool: PoolSnapshot,
    pub range: TickRange,
    pub provisioning: Provisioning,
    pub quote: LiquidityQuote,
    pub position_mint: Keypair,
    pub position: Pubkey,
    pub position_token_account: Pubkey,
    /// Tick array inits first, then position open and liquidity deposit.
    pub instructions: Vec<Instruction>,
}

impl OpenPositionPlan {
    /// Signers besides the fee payer.
    pub fn extra_signers(&self) -> Vec<&Keypair> {
        vec![&self.position_mint]
    }
}

fn ensure_classic_token(mint: &MintInfo) -> LpResult<()> {
    if mint.token_program != spl_token::id() {
        return Err(LpError::UnsupportedTokenProgram {
            mint: mint.address,
            owner: mint.token_program,
        });
    }
    Ok(())
}

fn resolve_band(pool: &PoolSnapshot, band: PriceBand) -> LpResult<(f64, f64)> {
    match band {
        PriceBand::Fixed { lower, upper } => Ok((lower, upper)),
        PriceBand::AroundCurrent { pct } => range_around_price(pool.current_price(), pct),
    }
}

/// Reads the pool, derives the range, provisions tick arrays, quotes the
/// deposit and assembles the instruction list. Nothing is signed or sent.
pub async fn build_open_position<S: AccountSource + ?Sized>(
    source: &S,
    program_id: &Pubkey,
    owner: &Pubkey,
    request: &OpenPositionRequest,
) -> LpResult<OpenPositionPlan> {
    let pool = fetch_pool(source, program_id, &request.pool).await?;
    info!(pool = %pool.address, price = pool.current_price(), "pool loaded");
    ensure_classic_token(&pool.mint_a)?;
    ensure_classic_token(&pool.mint_b)?;

    let (lower_price, upper_price) = resolve_band(&pool, request.band)?;
    let range = price_range_to_tick_range(
        lower_price,
        upper_price,
        pool.mint_a.decimals,
        pool.mint_b.decimals,
        pool.state.tick_spacing,
    )?;
    info!(lower_price, upper_price, lower_tick = range.lower, upper_tick = range.upper, "tick range");

    let helper = pool.helper()?;
    let provisioning = provision_tick_arrays(source, program_id, &pool.address, owner, &range, &helper).await?;

    let input_decimals = match request.input {
        InputToken::A => pool.mint_a.decimals,
        InputToken::B => pool.mint_b.decimals,
    };
    let amount = to_base_units(request.amount, input_decimals)?;
    let slippage_bps = slippage_to_bps(request.slippage)?;
    let quote = quote_by_input_token(request.input, amount, pool.state.sqrt_price, &range, slippage_bps)?;
    info!(
        liquidity = %quote.liquidity,
        token_max_a = quote.token_max_a,
        token_max_b = quote.token_max_b,
        "liquidity quote"
    );

    let position_mint = Keypair::new();
    let (position, position_bump) = derive_position_address(program_id, &position_mint.pubkey());
    let position_token_account = token_account_address(owner, &position_mint.pubkey());

    let mut instructions = provisioning.instructions.clone();
    instructions.push(open_position(
        program_id,
        &OpenPositionAccounts {
            funder: *owner,
            owner: *owner,
            position,
            position_mint: position_mint.pubkey(),
            position_token_account,
            whirlpool: pool.address,
        },
        &OpenPositionArgs {
            position_bump,
            tick_lower_index: range.lower,
            tick_upper_index: range.upper,
        },
    )?);

    let state = &pool.state;
    let native = spl_token::native_mint::id();
    let owner_account_a = token_account_address(owner, &state.token_mint_a);
    let owner_account_b = token_account_address(owner, &state.token_mint_b);
    instructions.push(create_token_account(owner, owner, &state.token_mint_a));
    instructions.push(create_token_account(owner, owner, &state.token_mint_b));
    if state.token_mint_a == native {
        instructions.extend(wrap_native(owner, quote.token_max_a)?);
    }
    if state.token_mint_b == native {
        instructions.extend(wrap_native(owner, quote.token_max_b)?);
    }

    instructions.push(increase_liquidity(
        program_id,
        &IncreaseLiquidityAccounts {
            whirlpool: pool.address,
            position_authority: *owner,
            position,
            position_token_account,
            token_owner_account_a: owner_account_a,
            token_owner_account_b: owner_account_b,
            token_vault_a: state.token_vault_a,
            token_vault_b: state.token_vault_b,
            tick_array_lower: provisioning.lower.address,
            tick_array_upper: provisioning.upper.address,
        },
        &IncreaseLiquidityArgs {
            liquidity_amount: quote.liquidity,
            token_max_a: quote.token_max_a,
            token_max_b: quote.token_max_b,
        },
    )?);
    if state.token_mint_a == native || state.token_mint_b == native {
        instructions.push(unwrap_native(owner)?);
    }

    Ok(OpenPositionPlan {
        pool,
        range,
        provisioning,
        quote,
        position_mint,
        position,
        position_token_account,
        instructions,
    })
}

/// What happened to the transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Simulated { units_consumed: Option<u64> },
    Sent(Signature),
}

/// Fee payer transaction carrying `instructions`, signed by the extra
/// signers and then the wallet.
pub async fn sign_instructions(
    client: &RpcClient,
    wallet: &dyn WalletSigner,
    instructions: &[Instruction],
    extra_signers: &[&Keypair],
) -> LpResult<Transaction> {
    let blockhash = client.get_latest_blockhash().await?;
    let mut tx = Transaction::new_with_payer(instructions, Some(&wallet.pubkey()));
    tx.message.recent_blockhash = blockhash;
    if !extra_signers.is_empty() {
        tx.try_partial_sign(extra_signers, blockhash)
            .map_err(|err| LpError::Signing(err.to_string()))?;
    }
    wallet.sign_transaction(&mut tx)?;
    Ok(tx)
}

/// Simulates a signed transaction, printing the node's logs verbatim.
pub async fn simulate(client: &RpcClient, tx: &Transaction) -> LpResult<Submission> {
    let result = client.simulate_transaction(tx).await?.value;
    for line in result.logs.iter().flatten() {
        println!("    {line}");
    }
    if let Some(err) = result.err {
        error!(?err, "simulation failed");
        return Err(LpError::SimulationFailed(format!("{err:?}")));
    }
    Ok(Submission::Simulated {
        units_consumed: result.units_consumed,
    })
}

/// Signs the plan and either simulates it or sends it and waits for
/// confirmation. Failures are returned as-is; there is no retry.
pub async fn submit_plan(
    client: &RpcClient,
    wallet: &dyn WalletSigner,
    plan: &OpenPositionPlan,
    dry_run: bool,
) -> LpResult<Submission> {
    let tx = sign_instructions(client, wallet, &plan.instructions, &plan.extra_signers()).await?;
    if dry_run {
        info!(instructions = plan.instructions.len(), "simulating open position transaction");
        return simulate(client, &tx).await;
    }
    info!(instructions = plan.instructions.len(), "sending open position transaction");
    let signature = client.send_and_confirm_transaction(&tx).await?;
    Ok(Submission::Sent(signature))
}

pub async fn fetch_position<S: AccountSource + ?Sized>(source: &S, address: &Pubkey) -> LpResult<Position> {
    let account = source
        .get_account(address)
        .await?
        .ok_or(LpError::AccountNotFound(*address))?;
    decode_account("Position", &account.data)
}

pub fn print_plan(plan: &OpenPositionPlan) {
    println!("--- Open Position Plan ---");
    println!("  - Pool:                   {}", plan.pool.address);
    println!("  - Tick Range:             [{}, {}]", plan.range.lower, plan.range.upper);
    println!(
        "  - Lower Tick Array:       {} (start {}, {})",
        plan.provisioning.lower.address,
        plan.provisioning.lower.start_index,
        if plan.provisioning.lower.initialized { "exists" } else { "init" }
    );
    println!(
        "  - Upper Tick Array:       {} (start {}, {})",
        plan.provisioning.upper.address,
        plan.provisioning.upper.start_index,
        if plan.provisioning.upper.initialized { "exists" } else { "init" }
    );
    println!("  - Position Mint:          {}", plan.position_mint.pubkey());
    println!("  - Position PDA:           {}", plan.position);
    println!("  - Position Token Account: {}", plan.position_token_account);
    println!("  - Instructions:           {}", plan.instructions.len());
}

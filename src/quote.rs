use clap::ValueEnum;
use orca_whirlpools_core::{increase_liquidity_quote_a, increase_liquidity_quote_b};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::{LpError, LpResult};
use crate::ticks::TickRange;

/// Which side of the pool the operator specifies an amount for.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputToken {
    #[default]
    A,
    B,
}

/// Result of quoting a deposit. Never persisted; recomputed per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidityQuote {
    pub input: InputToken,
    pub input_amount: u64,
    pub slippage_bps: u16,
    pub liquidity: u128,
    pub token_est_a: u64,
    pub token_est_b: u64,
    pub token_max_a: u64,
    pub token_max_b: u64,
}

impl LiquidityQuote {
    /// A zero-liquidity quote would open an empty position; refuse it.
    pub fn ensure_liquidity(self) -> LpResult<Self> {
        if self.liquidity == 0 {
            return Err(LpError::ZeroLiquidity);
        }
        Ok(self)
    }
}

/// Converts a human amount into base units of a mint with `decimals`.
pub fn to_base_units(amount: Decimal, decimals: u8) -> LpResult<u64> {
    if amount.is_sign_negative() {
        return Err(LpError::InvalidAmount(format!("{amount} is negative")));
    }
    let scaled = (0..decimals)
        .try_fold(amount, |acc, _| acc.checked_mul(Decimal::TEN))
        .ok_or_else(|| LpError::InvalidAmount(format!("{amount} overflows at {decimals} decimals")))?;
    scaled
        .trunc()
        .to_u64()
        .ok_or_else(|| LpError::InvalidAmount(format!("{amount} does not fit in a token amount")))
}

/// Slippage given as a fraction (`0.01` is 1%) to basis points.
pub fn slippage_to_bps(slippage: Decimal) -> LpResult<u16> {
    let bps = slippage
        .checked_mul(Decimal::from(10_000u32))
        .ok_or_else(|| LpError::InvalidSlippage(slippage.to_string()))?
        .round();
    match bps.to_u16() {
        Some(bps) if !slippage.is_sign_negative() && bps <= 10_000 => Ok(bps),
        _ => Err(LpError::InvalidSlippage(slippage.to_string())),
    }
}

/// Quotes the liquidity and max token amounts for depositing `amount` base
/// units of the `input` side into `range` at the pool's `sqrt_price`.
pub fn quote_by_input_token(
    input: InputToken,
    amount: u64,
    sqrt_price: u128,
    range: &TickRange,
    slippage_bps: u16,
) -> LpResult<LiquidityQuote> {
    if amount == 0 {
        return Err(LpError::ZeroLiquidity);
    }
    let raw = match input {
        InputToken::A => {
            increase_liquidity_quote_a(amount, slippage_bps, sqrt_price.into(), range.lower, range.upper, None, None)
        }
        InputToken::B => {
            increase_liquidity_quote_b(amount, slippage_bps, sqrt_price.into(), range.lower, range.upper, None, None)
        }
    }
    .map_err(|err| LpError::Quote(err.to_string()))?;

    LiquidityQuote {
        input,
        input_amount: amount,
        slippage_bps,
        liquidity: raw.liquidity_delta,
        token_est_a: raw.token_est_a,
        token_est_b: raw.token_est_b,
        token_max_a: raw.token_max_a,
        token_max_b: raw.token_max_b,
    }
    .ensure_liquidity()
}

pub fn print_quote(quote: &LiquidityQuote) {
    println!("--- Liquidity Quote ---");
    println!("  - Input:               {} units of token {:?}", quote.input_amount, quote.input);
    println!("  - Slippage:            {} bps", quote.slippage_bps);
    println!("  - Token A max:         {}", quote.token_max_a);
    println!("  - Token B max:         {}", quote.token_max_b);
    println!("  - Token A est:         {}", quote.token_est_a);
    println!("  - Token B est:         {}", quote.token_est_b);
    println!("  - Estimated liquidity: {}", quote.liquidity);
}

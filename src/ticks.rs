use orca_whirlpools_core::{price_to_tick_index, sqrt_price_to_price, tick_index_to_price};

use crate::error::{LpError, LpResult};

// --- Core Constants ---
pub const TICK_ARRAY_SIZE: i32 = 88;
pub const MIN_TICK_INDEX: i32 = -443636;
pub const MAX_TICK_INDEX: i32 = 443636;
const Q_RATIO: f64 = 1.0001;

/// A realized position range. `lower < upper`, both multiples of the tick spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickRange {
    pub lower: i32,
    pub upper: i32,
}

/// Helper struct for tick-to-price and price-to-tick conversions.
///
/// Prices are human prices of token A quoted in token B, i.e. already
/// adjusted for both mints' decimals.
#[derive(Debug, Clone, Copy)]
pub struct TickConverter {
    decimals_a: u8,
    decimals_b: u8,
}

impl TickConverter {
    pub fn new(decimals_a: u8, decimals_b: u8) -> Self {
        Self { decimals_a, decimals_b }
    }

    pub fn tick_to_price(&self, tick: i32) -> f64 {
        tick_index_to_price(tick, self.decimals_a, self.decimals_b)
    }

    pub fn sqrt_price_to_price(&self, sqrt_price: u128) -> f64 {
        sqrt_price_to_price(sqrt_price.into(), self.decimals_a, self.decimals_b)
    }

    /// Rough tick estimate from the raw 1.0001 ratio, used to bounds-check
    /// inputs before handing them to the tick math.
    fn approximate_tick(&self, price: f64) -> f64 {
        let raw_price = price * 10f64.powi(self.decimals_b as i32 - self.decimals_a as i32);
        raw_price.log(Q_RATIO)
    }

    fn checked_tick(&self, price: f64) -> LpResult<i32> {
        if !price.is_finite() || price <= 0.0 {
            return Err(LpError::InvalidPriceRange(format!("price {price} must be positive")));
        }
        let approx = self.approximate_tick(price);
        if !approx.is_finite() || approx <= (MIN_TICK_INDEX + 2) as f64 || approx >= (MAX_TICK_INDEX - 2) as f64 {
            return Err(LpError::TickOutOfBounds(approx.clamp(i32::MIN as f64, i32::MAX as f64) as i32));
        }
        Ok(price_to_tick_index(price, self.decimals_a, self.decimals_b))
    }

    /// Largest tick whose price does not exceed `price`.
    pub fn tick_at_or_below(&self, price: f64) -> LpResult<i32> {
        let mut tick = self.checked_tick(price)?;
        while tick > MIN_TICK_INDEX && self.tick_to_price(tick) > price {
            tick -= 1;
        }
        Ok(tick)
    }

    /// Smallest tick whose price is not below `price`.
    pub fn tick_at_or_above(&self, price: f64) -> LpResult<i32> {
        let mut tick = self.checked_tick(price)?;
        while tick < MAX_TICK_INDEX && self.tick_to_price(tick) < price {
            tick += 1;
        }
        Ok(tick)
    }
}

/// Helper struct for all logic related to tick arrays and spacing alignment.
#[derive(Debug, Clone, Copy)]
pub struct TickArrayHelper {
    tick_spacing: u16,
}

impl TickArrayHelper {
    pub fn new(tick_spacing: u16) -> LpResult<Self> {
        if tick_spacing == 0 {
            return Err(LpError::InvalidPriceRange("tick spacing must be non-zero".to_string()));
        }
        Ok(Self { tick_spacing })
    }

    pub fn tick_spacing(&self) -> u16 {
        self.tick_spacing
    }

    /// Total number of tick *indices* covered by one tick array.
    pub fn tick_indices_per_array(&self) -> i32 {
        TICK_ARRAY_SIZE * self.tick_spacing as i32
    }

    /// Start tick index of the array that contains `tick_index`.
    pub fn array_start_index(&self, tick_index: i32) -> i32 {
        let ticks_in_array = self.tick_indices_per_array();
        tick_index.div_euclid(ticks_in_array) * ticks_in_array
    }

    /// Inclusive tick index range covered by the array starting at `start_index`.
    pub fn array_tick_range(&self, start_index: i32) -> (i32, i32) {
        (start_index, start_index + self.tick_indices_per_array() - 1)
    }

    /// Rounds toward negative infinity onto the spacing grid.
    pub fn floor_to_spacing(&self, tick: i32) -> i32 {
        let spacing = self.tick_spacing as i32;
        tick.div_euclid(spacing) * spacing
    }

    /// Rounds toward positive infinity onto the spacing grid.
    pub fn ceil_to_spacing(&self, tick: i32) -> i32 {
        let floored = self.floor_to_spacing(tick);
        if floored == tick { tick } else { floored + self.tick_spacing as i32 }
    }

    pub fn min_initializable_tick(&self) -> i32 {
        self.ceil_to_spacing(MIN_TICK_INDEX)
    }

    pub fn max_initializable_tick(&self) -> i32 {
        self.floor_to_spacing(MAX_TICK_INDEX)
    }

    /// Start indices of every array between two ticks, ascending.
    pub fn arrays_between(&self, tick_a: i32, tick_b: i32) -> Vec<i32> {
        let first = self.array_start_index(tick_a.min(tick_b));
        let last = self.array_start_index(tick_a.max(tick_b));
        (first..=last).step_by(self.tick_indices_per_array() as usize).collect()
    }
}

/// Maps a human price band onto the nearest enclosing valid tick range.
///
/// The lower bound is floored and the upper bound ceiled to the spacing, so
/// `[tick_to_price(lower), tick_to_price(upper)]` always contains the request.
pub fn price_range_to_tick_range(
    lower_price: f64,
    upper_price: f64,
    decimals_a: u8,
    decimals_b: u8,
    tick_spacing: u16,
) -> LpResult<TickRange> {
    if !(lower_price < upper_price) {
        return Err(LpError::InvalidPriceRange(format!(
            "lower price {lower_price} must be below upper price {upper_price}"
        )));
    }
    let converter = TickConverter::new(decimals_a, decimals_b);
    let helper = TickArrayHelper::new(tick_spacing)?;

    let lower = helper.floor_to_spacing(converter.tick_at_or_below(lower_price)?);
    let upper = helper.ceil_to_spacing(converter.tick_at_or_above(upper_price)?);

    if lower < helper.min_initializable_tick() {
        return Err(LpError::TickOutOfBounds(lower));
    }
    if upper > helper.max_initializable_tick() {
        return Err(LpError::TickOutOfBounds(upper));
    }
    Ok(TickRange { lower, upper })
}

/// Price band of `pct` percent either side of `price`.
pub fn range_around_price(price: f64, pct: f64) -> LpResult<(f64, f64)> {
    if !(pct > 0.0 && pct < 100.0) {
        return Err(LpError::InvalidPriceRange(format!("range percentage {pct} must be in (0, 100)")));
    }
    Ok((price * (1.0 - pct / 100.0), price * (1.0 + pct / 100.0)))
}

/// Prints the realized range and the arrays it touches.
pub fn print_tick_range(range: &TickRange, converter: &TickConverter, helper: &TickArrayHelper) {
    println!("--- Tick Range (spacing {}) ---", helper.tick_spacing());
    println!("  - Lower Tick: {:<8} price {:.8}", range.lower, converter.tick_to_price(range.lower));
    println!("  - Upper Tick: {:<8} price {:.8}", range.upper, converter.tick_to_price(range.upper));
    println!("\n{:<15} | {}", "Array Start", "Tick Range");
    println!("{:-<50}", "");
    for start in helper.arrays_between(range.lower, range.upper) {
        let (first, last) = helper.array_tick_range(start);
        println!("{:<15} | [{}, {}]", start, first, last);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eth_usdt_band_rounds_outward_onto_spacing() {
        let range = price_range_to_tick_range(2400.0, 2800.0, 9, 6, 32).unwrap();
        let converter = TickConverter::new(9, 6);

        assert_eq!(range.lower % 32, 0);
        assert_eq!(range.upper % 32, 0);
        assert!(range.lower < range.upper);
        assert!(range.lower <= price_to_tick_index(2400.0, 9, 6));
        assert!(range.upper >= price_to_tick_index(2800.0, 9, 6));
        assert!(converter.tick_to_price(range.lower) <= 2400.0);
        assert!(converter.tick_to_price(range.upper) >= 2800.0);
    }

    #[test]
    fn realized_range_contains_request_for_negative_ticks() {
        // Prices below 1 after decimal adjustment land on negative ticks.
        for (lower, upper, spacing) in [(0.5, 0.75, 1u16), (0.0012, 0.0019, 64), (98.0, 150.0, 128)] {
            let range = price_range_to_tick_range(lower, upper, 6, 6, spacing).unwrap();
            let converter = TickConverter::new(6, 6);
            assert_eq!(range.lower.rem_euclid(spacing as i32), 0);
            assert_eq!(range.upper.rem_euclid(spacing as i32), 0);
            assert!(converter.tick_to_price(range.lower) <= lower);
            assert!(converter.tick_to_price(range.upper) >= upper);
        }
    }

    #[test]
    fn very_narrow_band_still_yields_distinct_ticks() {
        let range = price_range_to_tick_range(1.0, 1.000001, 6, 6, 8).unwrap();
        assert!(range.lower < range.upper);
    }

    #[test]
    fn inverted_or_non_positive_bands_are_rejected() {
        assert!(matches!(
            price_range_to_tick_range(2800.0, 2400.0, 9, 6, 32),
            Err(LpError::InvalidPriceRange(_))
        ));
        assert!(matches!(
            price_range_to_tick_range(-1.0, 2400.0, 9, 6, 32),
            Err(LpError::InvalidPriceRange(_))
        ));
        assert!(matches!(
            price_range_to_tick_range(f64::NAN, 2400.0, 9, 6, 32),
            Err(LpError::InvalidPriceRange(_))
        ));
    }

    #[test]
    fn extreme_prices_are_out_of_bounds() {
        assert!(matches!(
            price_range_to_tick_range(1.0, 1e40, 6, 6, 64),
            Err(LpError::TickOutOfBounds(_))
        ));
        assert!(matches!(
            price_range_to_tick_range(1e-40, 1.0, 6, 6, 64),
            Err(LpError::TickOutOfBounds(_))
        ));
    }

    #[test]
    fn zero_spacing_is_rejected() {
        assert!(TickArrayHelper::new(0).is_err());
    }

    #[test]
    fn array_start_rounds_toward_negative_infinity() {
        let helper = TickArrayHelper::new(32).unwrap();
        assert_eq!(helper.tick_indices_per_array(), 2816);
        assert_eq!(helper.array_start_index(0), 0);
        assert_eq!(helper.array_start_index(2815), 0);
        assert_eq!(helper.array_start_index(2816), 2816);
        assert_eq!(helper.array_start_index(-1), -2816);
        assert_eq!(helper.array_start_index(-2816), -2816);
        assert_eq!(helper.array_tick_range(-2816), (-2816, -1));
    }

    #[test]
    fn spacing_alignment() {
        let helper = TickArrayHelper::new(64).unwrap();
        assert_eq!(helper.floor_to_spacing(-1), -64);
        assert_eq!(helper.ceil_to_spacing(-1), 0);
        assert_eq!(helper.ceil_to_spacing(65), 128);
        assert_eq!(helper.floor_to_spacing(128), 128);
        assert_eq!(helper.max_initializable_tick(), 443584);
        assert_eq!(helper.min_initializable_tick(), -443584);
        assert_eq!(helper.arrays_between(5700, -10), vec![-5632, 0, 5632]);
    }

    #[test]
    fn percentage_band_around_price() {
        let (lower, upper) = range_around_price(2500.0, 10.0).unwrap();
        assert!((lower - 2250.0).abs() < 1e-9);
        assert!((upper - 2750.0).abs() < 1e-9);
        assert!(range_around_price(2500.0, 100.0).is_err());
        assert!(range_around_price(2500.0, 0.0).is_err());
    }
}

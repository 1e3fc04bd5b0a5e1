//! Pool listing from Orca's public HTTP API, enriched with APR and APY.
//!
//! Numeric fields arrive as decimal strings; anything that fails to parse
//! counts as zero, matching how the listing treats absent stats.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::error::{LpError, LpResult};

pub const ECLIPSE_POOLS_URL: &str = "https://api.orca.so/v2/eclipse/pools";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PoolStats {
    #[serde(default)]
    pub volume: Option<String>,
    #[serde(default)]
    pub fees: Option<String>,
    #[serde(default)]
    pub rewards: Option<String>,
    #[serde(default)]
    pub yield_over_tvl: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct StatsWindows {
    #[serde(rename = "24h", default)]
    pub day: Option<PoolStats>,
    #[serde(rename = "7d", default)]
    pub week: Option<PoolStats>,
    #[serde(rename = "30d", default)]
    pub month: Option<PoolStats>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiTokenInfo {
    pub address: String,
    #[serde(default)]
    pub program_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub decimals: Option<u8>,
}

/// One pool object as served by the API. Fields not modelled here are kept
/// in `extra` so the JSON dump round-trips them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrcaPool {
    pub address: String,
    #[serde(default)]
    pub tick_spacing: u16,
    #[serde(default)]
    pub fee_rate: u32,
    #[serde(default)]
    pub liquidity: Option<String>,
    #[serde(default)]
    pub sqrt_price: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub tvl_usdc: Option<String>,
    #[serde(default)]
    pub yield_over_tvl: Option<String>,
    #[serde(default)]
    pub token_a: Option<ApiTokenInfo>,
    #[serde(default)]
    pub token_b: Option<ApiTokenInfo>,
    #[serde(default)]
    pub stats: StatsWindows,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct PoolsResponse {
    data: Vec<OrcaPool>,
}

/// A listed pool with its yields as percentages.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ListedPool {
    #[serde(flatten)]
    pub pool: OrcaPool,
    pub apr: f64,
    pub apy: f64,
}

fn parse_amount(value: Option<&str>) -> f64 {
    value.and_then(|v| v.parse::<f64>().ok()).unwrap_or(0.0)
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

impl OrcaPool {
    /// 24h yield over TVL, falling back to the pool-level figure.
    pub fn daily_yield(&self) -> f64 {
        let day = self.stats.day.as_ref().and_then(|s| s.yield_over_tvl.as_deref());
        parse_amount(day.or(self.yield_over_tvl.as_deref()))
    }

    pub fn tvl(&self) -> f64 {
        parse_amount(self.tvl_usdc.as_deref())
    }

    pub fn volume_24h(&self) -> f64 {
        parse_amount(self.stats.day.as_ref().and_then(|s| s.volume.as_deref()))
    }

    pub fn fees_24h(&self) -> f64 {
        parse_amount(self.stats.day.as_ref().and_then(|s| s.fees.as_deref()))
    }

    /// APR implied by the last 24h of fees alone, in percent.
    pub fn fee_apr(&self) -> f64 {
        estimate_apr_from_fees(self.fees_24h(), self.tvl())
    }

    pub fn pair_label(&self) -> String {
        let symbol = |token: &Option<ApiTokenInfo>| {
            token
                .as_ref()
                .and_then(|t| t.symbol.clone())
                .unwrap_or_else(|| "UNK".to_string())
        };
        format!("{}/{}", symbol(&self.token_a), symbol(&self.token_b))
    }

    pub fn fee_label(&self) -> String {
        format!("{:.2}%", self.fee_rate as f64 / 10_000.0)
    }
}

impl From<OrcaPool> for ListedPool {
    fn from(pool: OrcaPool) -> Self {
        let daily = pool.daily_yield();
        let apr = round4(daily * 365.0 * 100.0);
        let apy = round4(((1.0 + daily).powi(365) - 1.0) * 100.0);
        Self { pool, apr, apy }
    }
}

/// Parses an API body of the form `{ "data": [pool, ...] }`.
pub fn parse_pools_response(body: &str) -> LpResult<Vec<ListedPool>> {
    let response: PoolsResponse = serde_json::from_str(body)
        .map_err(|err| LpError::Api(format!("unexpected pool listing format: {err}")))?;
    Ok(response.data.into_iter().map(ListedPool::from).collect())
}

pub async fn fetch_pools_with_apr_apy(client: &reqwest::Client, url: &str) -> LpResult<Vec<ListedPool>> {
    info!(url, "fetching pools from Orca API");
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(LpError::Api(format!("HTTP error, status {status}")));
    }
    let body = response.text().await?;
    let pools = parse_pools_response(&body)?;
    info!(count = pools.len(), "pools fetched");
    Ok(pools)
}

/// Annualized fee yield in percent. Zero TVL yields zero.
pub fn estimate_apr_from_fees(fees_24h: f64, tvl: f64) -> f64 {
    if tvl == 0.0 {
        return 0.0;
    }
    fees_24h * 365.0 / tvl * 100.0
}

/// Dollar figure with a B/M/K suffix.
pub fn format_number(value: f64) -> String {
    if value >= 1e9 {
        format!("${:.2}B", value / 1e9)
    } else if value >= 1e6 {
        format!("${:.2}M", value / 1e6)
    } else if value >= 1e3 {
        format!("${:.2}K", value / 1e3)
    } else {
        format!("${:.2}", value)
    }
}

pub const APR_BUCKETS: [&str; 5] = ["0-1%", "1-5%", "5-10%", "10-25%", "25%+"];

fn apr_bucket(apr: f64) -> usize {
    if apr < 1.0 {
        0
    } else if apr < 5.0 {
        1
    } else if apr < 10.0 {
        2
    } else if apr < 25.0 {
        3
    } else {
        4
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListingSummary {
    pub pool_count: usize,
    pub unique_pairs: usize,
    pub total_tvl: f64,
    pub total_volume_24h: f64,
    /// Counts per entry of `APR_BUCKETS`.
    pub apr_distribution: [usize; 5],
}

pub fn summarize(pools: &[ListedPool]) -> ListingSummary {
    let mut apr_distribution = [0usize; 5];
    for listed in pools {
        apr_distribution[apr_bucket(listed.apr)] += 1;
    }
    ListingSummary {
        pool_count: pools.len(),
        unique_pairs: pools.iter().map(|p| p.pool.pair_label()).collect::<BTreeSet<_>>().len(),
        total_tvl: pools.iter().map(|p| p.pool.tvl()).sum(),
        total_volume_24h: pools.iter().map(|p| p.pool.volume_24h()).sum(),
        apr_distribution,
    }
}

/// Highest APR first.
pub fn sort_by_apr(pools: &mut [ListedPool]) {
    pools.sort_by(|a, b| b.apr.total_cmp(&a.apr));
}

pub fn print_pools_table(pools: &[ListedPool]) {
    println!("\n{:=<132}", "");
    println!("ORCA WHIRLPOOL POOLS ON ECLIPSE (API Data)");
    println!("{:=<132}", "");
    if pools.is_empty() {
        println!("No pools found.");
        return;
    }
    println!(
        "{:<6}{:<20}{:<10}{:<10}{:<12}{:<15}{:<15}{:<8}{}",
        "RANK", "PAIR", "APR", "APY", "FEE_APR", "TVL", "VOL_24H", "FEE", "ADDRESS"
    );
    println!("{:-<132}", "");
    for (rank, listed) in pools.iter().enumerate() {
        let pool = &listed.pool;
        println!(
            "{:<6}{:<20}{:<10}{:<10}{:<12}{:<15}{:<15}{:<8}{}",
            rank + 1,
            pool.pair_label(),
            format!("{:.2}%", listed.apr),
            format!("{:.2}%", listed.apy),
            format!("{:.2}%", pool.fee_apr()),
            format_number(pool.tvl()),
            format_number(pool.volume_24h()),
            pool.fee_label(),
            pool.address
        );
    }

    let summary = summarize(pools);
    println!("\nSUMMARY:");
    println!("Total pools found: {}", summary.pool_count);
    println!("Unique token pairs: {}", summary.unique_pairs);
    println!("Total TVL across all pools: {}", format_number(summary.total_tvl));
    println!("Total 24h Volume: {}", format_number(summary.total_volume_24h));
    println!("\nAPR Distribution:");
    for (label, count) in APR_BUCKETS.iter().zip(summary.apr_distribution) {
        println!("  {label}: {count} pools");
    }
}

/// Writes a pool listing as pretty JSON.
pub fn write_pools_json<T: Serialize>(pools: &[T], path: &Path) -> LpResult<()> {
    let json = serde_json::to_string_pretty(pools)?;
    std::fs::write(path, json)?;
    info!(path = %path.display(), "pool data saved");
    Ok(())
}

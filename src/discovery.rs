use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Serialize, Serializer};
use solana_client::rpc_filter::{Memcmp, RpcFilterType};
use solana_sdk::pubkey::Pubkey;
use tracing::{info, warn};

use crate::config::Settings;
use crate::error::{LpError, LpResult};
use crate::onchain_states::{account_discriminator, decode_account, Whirlpool, DISCRIMINATOR_LEN};
use crate::pool::{derive_whirlpool_address, fetch_mint, fetch_pool, PoolSnapshot};
use crate::registry::TokenRegistry;
use crate::rpc::AccountSource;
use crate::ticks::TickConverter;

/// Outcome of probing one tick spacing for a pair.
#[derive(Debug)]
pub struct SpacingProbe {
    pub tick_spacing: u16,
    pub address: Pubkey,
    pub pool: Option<PoolSnapshot>,
}

/// Derives the pool for each spacing and reads whichever exist.
///
/// Only a missing or incompatible pool account counts as "no pool"; any
/// other failure aborts the probe.
pub async fn discover_pools<S: AccountSource + ?Sized>(
    source: &S,
    settings: &Settings,
    mint_a: &Pubkey,
    mint_b: &Pubkey,
    tick_spacings: &[u16],
) -> LpResult<Vec<SpacingProbe>> {
    let mut probes = Vec::with_capacity(tick_spacings.len());
    for &tick_spacing in tick_spacings {
        let address = derive_whirlpool_address(
            &settings.program_id,
            &settings.whirlpools_config,
            mint_a,
            mint_b,
            tick_spacing,
        );
        info!(tick_spacing, %address, "checking tick spacing");
        let pool = match fetch_pool(source, &settings.program_id, &address).await {
            Ok(pool) => Some(pool),
            Err(LpError::PoolNotFound(_)) => None,
            Err(err) => return Err(err),
        };
        probes.push(SpacingProbe {
            tick_spacing,
            address,
            pool,
        });
    }
    Ok(probes)
}

pub fn print_discovery(probes: &[SpacingProbe], registry: &TokenRegistry) {
    println!("--- Pool Discovery ---");
    for probe in probes {
        match &probe.pool {
            Some(pool) => {
                println!("Found pool with tick spacing {}:", probe.tick_spacing);
                println!("   Pool Address:  {}", probe.address);
                println!(
                    "   Token A:       {} ({})",
                    registry.symbol(&pool.state.token_mint_a),
                    pool.state.token_mint_a
                );
                println!(
                    "   Token B:       {} ({})",
                    registry.symbol(&pool.state.token_mint_b),
                    pool.state.token_mint_b
                );
                println!("   Current Price: {:.6}", pool.current_price());
                println!("   Fee Rate:      {:.2}%", pool.fee_rate_pct());
                println!("   Liquidity:     {}", pool.state.liquidity);
            }
            None => println!("No pool found with tick spacing {}", probe.tick_spacing),
        }
    }
}

fn as_string<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// One pool of a Whirlpools config, as listed by `list_config_pools`.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPool {
    pub address: String,
    pub token_a_mint: String,
    pub token_b_mint: String,
    pub token_a_symbol: String,
    pub token_b_symbol: String,
    pub tick_spacing: u16,
    pub current_price: String,
    #[serde(serialize_with = "as_string")]
    pub liquidity: u128,
    /// Hundredths of a basis point.
    pub fee_rate: u16,
}

impl ConfigPool {
    pub fn pair_label(&self) -> String {
        format!("{}/{}", self.token_a_symbol, self.token_b_symbol)
    }
}

pub fn fee_label(fee_rate: u16) -> String {
    format!("{:.2}%", fee_rate as f64 / 10_000.0)
}

/// Program account filters selecting `Whirlpool` accounts of one config.
/// The config pubkey is the first field after the discriminator.
pub fn config_pool_filters(whirlpools_config: &Pubkey) -> Vec<RpcFilterType> {
    vec![
        RpcFilterType::Memcmp(Memcmp::new_raw_bytes(0, account_discriminator("Whirlpool").to_vec())),
        RpcFilterType::Memcmp(Memcmp::new_raw_bytes(
            DISCRIMINATOR_LEN,
            whirlpools_config.to_bytes().to_vec(),
        )),
    ]
}

/// Decimals of `mint`, read once per mint. `None` when the mint cannot be
/// read as an SPL mint, in which case the pool is skipped.
async fn cached_decimals<S: AccountSource + ?Sized>(
    source: &S,
    cache: &mut HashMap<Pubkey, u8>,
    mint: &Pubkey,
) -> LpResult<Option<u8>> {
    if let Some(decimals) = cache.get(mint) {
        return Ok(Some(*decimals));
    }
    match fetch_mint(source, mint).await {
        Ok(info) => {
            cache.insert(*mint, info.decimals);
            Ok(Some(info.decimals))
        }
        Err(err @ (LpError::AccountNotFound(_) | LpError::Decode(_))) => {
            warn!(%mint, %err, "unreadable mint");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Every `Whirlpool` under the configured Whirlpools config.
pub async fn list_config_pools<S: AccountSource + ?Sized>(
    source: &S,
    settings: &Settings,
    registry: &TokenRegistry,
) -> LpResult<Vec<ConfigPool>> {
    info!(config = %settings.whirlpools_config, "fetching all whirlpool accounts");
    let accounts = source
        .get_program_accounts(&settings.program_id, config_pool_filters(&settings.whirlpools_config))
        .await?;
    info!(count = accounts.len(), "whirlpool accounts found");

    let mut decimals = HashMap::new();
    let mut pools = Vec::with_capacity(accounts.len());
    for (address, account) in accounts {
        let state: Whirlpool = match decode_account("Whirlpool", &account.data) {
            Ok(state) => state,
            Err(err) => {
                warn!(%address, %err, "skipping account");
                continue;
            }
        };
        let Some(decimals_a) = cached_decimals(source, &mut decimals, &state.token_mint_a).await? else {
            continue;
        };
        let Some(decimals_b) = cached_decimals(source, &mut decimals, &state.token_mint_b).await? else {
            continue;
        };
        let token_a = registry.info_or_placeholder(&state.token_mint_a, decimals_a);
        let token_b = registry.info_or_placeholder(&state.token_mint_b, decimals_b);
        let price = TickConverter::new(decimals_a, decimals_b).sqrt_price_to_price(state.sqrt_price);

        pools.push(ConfigPool {
            address: address.to_string(),
            token_a_mint: state.token_mint_a.to_string(),
            token_b_mint: state.token_mint_b.to_string(),
            token_a_symbol: token_a.symbol,
            token_b_symbol: token_b.symbol,
            tick_spacing: state.tick_spacing,
            current_price: format!("{price:.6}"),
            liquidity: state.liquidity,
            fee_rate: state.fee_rate,
        });
    }
    Ok(pools)
}

/// Deepest liquidity first.
pub fn sort_by_liquidity(pools: &mut [ConfigPool]) {
    pools.sort_by(|a, b| b.liquidity.cmp(&a.liquidity));
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSummary {
    pub pool_count: usize,
    pub unique_pairs: usize,
    /// Pool count per fee rate, ascending by fee.
    pub fee_distribution: BTreeMap<u16, usize>,
}

pub fn summarize_config_pools(pools: &[ConfigPool]) -> ConfigSummary {
    let mut fee_distribution = BTreeMap::new();
    for pool in pools {
        *fee_distribution.entry(pool.fee_rate).or_insert(0) += 1;
    }
    ConfigSummary {
        pool_count: pools.len(),
        unique_pairs: pools.iter().map(ConfigPool::pair_label).collect::<BTreeSet<_>>().len(),
        fee_distribution,
    }
}

pub fn print_config_pools(pools: &[ConfigPool]) {
    println!("\n{:=<100}", "");
    println!("ORCA WHIRLPOOL POOLS");
    println!("{:=<100}", "");
    if pools.is_empty() {
        println!("No pools found.");
        return;
    }
    println!(
        "{:<6}{:<20}{:<15}{:<8}{:<15}{:<20}{}",
        "RANK", "PAIR", "PRICE", "FEE", "TICK_SPACING", "LIQUIDITY", "ADDRESS"
    );
    println!("{:-<100}", "");
    for (rank, pool) in pools.iter().enumerate() {
        println!(
            "{:<6}{:<20}{:<15}{:<8}{:<15}{:<20}{}",
            rank + 1,
            pool.pair_label(),
            pool.current_price,
            fee_label(pool.fee_rate),
            pool.tick_spacing,
            pool.liquidity,
            pool.address
        );
    }

    let summary = summarize_config_pools(pools);
    println!("\nSUMMARY:");
    println!("Total pools found: {}", summary.pool_count);
    println!("Unique token pairs: {}", summary.unique_pairs);
    println!("\nFee Rate Distribution:");
    for (fee_rate, count) in &summary.fee_distribution {
        println!("  {}: {count} pools", fee_label(*fee_rate));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::STANDARD_TICK_SPACINGS;
    use crate::onchain_states::encode_account;
    use crate::registry::TokenInfo;
    use crate::rpc::{program_account, MemoryAccounts};
    use async_trait::async_trait;
    use solana_client::client_error::ClientError;
    use solana_sdk::account::Account;
    use spl_token::solana_program::program_option::COption;
    use spl_token::solana_program::program_pack::Pack;
    use spl_token::state::Mint;

    /// Source whose node is unreachable.
    struct OfflineNode;

    #[async_trait]
    impl AccountSource for OfflineNode {
        async fn get_account(&self, _address: &Pubkey) -> LpResult<Option<Account>> {
            Err(ClientError::from(std::io::Error::other("connection refused")).into())
        }

        async fn get_program_accounts(
            &self,
            _program_id: &Pubkey,
            _filters: Vec<RpcFilterType>,
        ) -> LpResult<Vec<(Pubkey, Account)>> {
            Err(ClientError::from(std::io::Error::other("connection refused")).into())
        }
    }

    fn mint_account(decimals: u8) -> Account {
        let mut data = vec![0u8; Mint::LEN];
        let mint = Mint {
            mint_authority: COption::None,
            supply: 0,
            decimals,
            is_initialized: true,
            freeze_authority: COption::None,
        };
        Mint::pack(mint, &mut data).unwrap();
        program_account(spl_token::id(), data)
    }

    fn whirlpool(config: Pubkey, mint_a: Pubkey, mint_b: Pubkey, liquidity: u128, fee_rate: u16) -> Vec<u8> {
        let state = Whirlpool {
            whirlpools_config: config,
            tick_spacing: 64,
            fee_rate,
            liquidity,
            sqrt_price: 1u128 << 64,
            token_mint_a: mint_a,
            token_mint_b: mint_b,
            ..Default::default()
        };
        encode_account("Whirlpool", &state).unwrap()
    }

    #[tokio::test]
    async fn absent_pools_are_reported_not_raised() {
        let settings = Settings::eclipse().unwrap();
        let source = MemoryAccounts::new();
        let (a, b) = (Pubkey::new_unique(), Pubkey::new_unique());

        let probes = discover_pools(&source, &settings, &a, &b, &STANDARD_TICK_SPACINGS).await.unwrap();

        assert_eq!(probes.len(), 5);
        assert!(probes.iter().all(|probe| probe.pool.is_none()));
        assert_eq!(probes[2].tick_spacing, 32);
    }

    #[tokio::test]
    async fn node_failure_is_not_reported_as_missing_pool() {
        let settings = Settings::eclipse().unwrap();
        let (a, b) = (Pubkey::new_unique(), Pubkey::new_unique());

        let result = discover_pools(&OfflineNode, &settings, &a, &b, &STANDARD_TICK_SPACINGS).await;
        assert!(matches!(result, Err(LpError::Rpc(_))));

        let listing = list_config_pools(&OfflineNode, &settings, &TokenRegistry::default()).await;
        assert!(matches!(listing, Err(LpError::Rpc(_))));
    }

    #[tokio::test]
    async fn lists_only_pools_of_the_config_sorted_by_liquidity() {
        let settings = Settings::eclipse().unwrap();
        let config = settings.whirlpools_config;
        let program = settings.program_id;
        let (mint_a, mint_b, mint_c) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        let (shallow, deep, third, foreign) =
            (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());

        let source = MemoryAccounts::new()
            .with_account(mint_a, mint_account(6))
            .with_account(mint_b, mint_account(6))
            .with_account(mint_c, mint_account(9))
            .with_account(shallow, program_account(program, whirlpool(config, mint_a, mint_b, 10, 3000)))
            .with_account(deep, program_account(program, whirlpool(config, mint_a, mint_b, 5_000, 500)))
            .with_account(third, program_account(program, whirlpool(config, mint_c, mint_b, 700, 3000)))
            .with_account(
                foreign,
                program_account(program, whirlpool(Pubkey::new_unique(), mint_a, mint_b, 1 << 90, 3000)),
            );

        let mut registry = TokenRegistry::default();
        for (mint, symbol) in [(mint_a, "AAA"), (mint_b, "BBB")] {
            registry.insert(TokenInfo {
                mint,
                symbol: symbol.to_string(),
                name: symbol.to_string(),
                decimals: 6,
            });
        }

        let mut pools = list_config_pools(&source, &settings, &registry).await.unwrap();
        sort_by_liquidity(&mut pools);

        let order: Vec<String> = pools.iter().map(|p| p.address.clone()).collect();
        assert_eq!(order, vec![deep.to_string(), third.to_string(), shallow.to_string()]);
        assert_eq!(pools[0].pair_label(), "AAA/BBB");
        assert_eq!(pools[0].current_price, "1.000000");
        // Unregistered mint gets a placeholder symbol; 9 vs 6 decimals scales the price.
        assert!(pools[1].token_a_symbol.starts_with("TOKEN_"));
        assert_eq!(pools[1].current_price, "1000.000000");

        let summary = summarize_config_pools(&pools);
        assert_eq!(summary.pool_count, 3);
        assert_eq!(summary.unique_pairs, 2);
        assert_eq!(summary.fee_distribution, BTreeMap::from([(500, 1), (3000, 2)]));
        assert_eq!(fee_label(3000), "0.30%");
    }

    #[tokio::test]
    async fn pool_with_unreadable_mint_is_skipped() {
        let settings = Settings::eclipse().unwrap();
        let pool = Pubkey::new_unique();
        let (mint_a, missing) = (Pubkey::new_unique(), Pubkey::new_unique());
        let source = MemoryAccounts::new().with_account(mint_a, mint_account(6)).with_account(
            pool,
            program_account(settings.program_id, whirlpool(settings.whirlpools_config, mint_a, missing, 1, 100)),
        );

        let pools = list_config_pools(&source, &settings, &TokenRegistry::default()).await.unwrap();
        assert!(pools.is_empty());
    }

    #[test]
    fn liquidity_is_dumped_as_a_string() {
        let pool = ConfigPool {
            address: "Pool".into(),
            token_a_mint: "A".into(),
            token_b_mint: "B".into(),
            token_a_symbol: "ETH".into(),
            token_b_symbol: "USDT".into(),
            tick_spacing: 64,
            current_price: "2600.000000".into(),
            liquidity: u128::MAX,
            fee_rate: 3000,
        };
        let json = serde_json::to_value(&pool).unwrap();
        assert_eq!(json["liquidity"], u128::MAX.to_string());
        assert_eq!(json["tokenASymbol"], "ETH");
        assert_eq!(json["tickSpacing"], 64);
    }
}

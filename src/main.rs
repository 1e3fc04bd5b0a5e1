use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signer;
use tracing::{error, info, warn};

use whirlpool_lp::config::{
    load_keypair_from_env, parse_pubkey, Network, Settings, STANDARD_TICK_SPACINGS, USDT_MINT_ECLIPSE, WALLET_KEY_ENV,
};
use whirlpool_lp::discovery::{
    discover_pools, list_config_pools, print_config_pools, print_discovery, sort_by_liquidity,
};
use whirlpool_lp::orca_api::{
    fetch_pools_with_apr_apy, print_pools_table, sort_by_apr, write_pools_json, ECLIPSE_POOLS_URL,
};
use whirlpool_lp::pool::{derive_whirlpool_address, fetch_pool, print_pool_summary};
use whirlpool_lp::position::{
    build_open_position, fetch_position, print_plan, sign_instructions, simulate, submit_plan, OpenPositionRequest,
    PriceBand, Submission,
};
use whirlpool_lp::quote::{print_quote, InputToken};
use whirlpool_lp::registry::TokenRegistry;
use whirlpool_lp::ticks::{price_range_to_tick_range, print_tick_range, TickArrayHelper, TickConverter};
use whirlpool_lp::transfer::build_position_transfer;
use whirlpool_lp::wallet::{KeypairWallet, WalletSigner};
use whirlpool_lp::LpError;

/// --- CLI Argument Parsing ---
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Deployment whose default endpoint and Whirlpools config are used.
    #[clap(long, global = true, value_enum, default_value_t = Network::Eclipse)]
    network: Network,
    /// JSON-RPC endpoint; defaults to the network's public endpoint.
    #[clap(long, global = true, env = "RPC_URL")]
    rpc_url: Option<String>,
    /// Whirlpools config override.
    #[clap(long, global = true)]
    whirlpools_config: Option<String>,
    /// Log level used when RUST_LOG is unset.
    #[clap(long, global = true, default_value = "info")]
    log_level: String,
    #[clap(subcommand)]
    command: Commands,
}

/// Either an explicit pool address or the pair + tick spacing it derives from.
#[derive(Args, Debug)]
struct PoolArgs {
    /// Pool address; overrides the mint pair.
    #[clap(long)]
    pool: Option<String>,
    #[clap(long, default_value_t = spl_token::native_mint::id().to_string())]
    mint_a: String,
    #[clap(long, default_value = USDT_MINT_ECLIPSE)]
    mint_b: String,
    #[clap(long, default_value_t = 32)]
    tick_spacing: u16,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a position and deposit liquidity in one transaction.
    OpenPosition {
        #[clap(flatten)]
        pool: PoolArgs,
        /// Lower bound, price of token A in token B.
        #[clap(long, requires = "upper_price", conflicts_with = "range_pct")]
        lower_price: Option<f64>,
        #[clap(long, requires = "lower_price")]
        upper_price: Option<f64>,
        /// Band of this many percent either side of the current price.
        #[clap(long, required_unless_present = "lower_price")]
        range_pct: Option<f64>,
        /// Amount of the input token, in human units.
        #[clap(long)]
        amount: Decimal,
        #[clap(long, value_enum, default_value_t = InputToken::A)]
        input_token: InputToken,
        /// Slippage tolerance as a fraction, 0.01 is 1%.
        #[clap(long, default_value = "0.01")]
        slippage: Decimal,
        /// Simulate instead of sending.
        #[clap(long)]
        dry_run: bool,
    },
    /// Fetch and print the pool state.
    PoolState {
        #[clap(flatten)]
        pool: PoolArgs,
    },
    /// Probe the standard tick spacings for a token pair.
    Discover {
        #[clap(long, default_value_t = spl_token::native_mint::id().to_string())]
        mint_a: String,
        #[clap(long, default_value = USDT_MINT_ECLIPSE)]
        mint_b: String,
    },
    /// List every pool of the Whirlpools config, deepest liquidity first.
    DiscoverAll {
        /// Write the listing as JSON to this file.
        #[clap(long)]
        output: Option<PathBuf>,
    },
    /// List pools from the Orca API sorted by APR.
    ListPools {
        #[clap(long, default_value = ECLIPSE_POOLS_URL)]
        url: String,
        /// Write the enriched listing as JSON to this file.
        #[clap(long)]
        output: Option<PathBuf>,
    },
    /// Convert a price range to ticks and tick arrays, offline.
    Ticks {
        #[clap(long)]
        lower_price: f64,
        #[clap(long)]
        upper_price: f64,
        #[clap(long)]
        decimals_a: u8,
        #[clap(long)]
        decimals_b: u8,
        #[clap(long)]
        tick_spacing: u16,
    },
    /// Simulate moving a position NFT to another wallet.
    TransferPosition {
        #[clap(long)]
        position_mint: String,
        #[clap(long)]
        recipient: String,
    },
}

fn init_logging(log_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("whirlpool_lp={log_level}").into()),
        )
        .init();
}

fn resolve_pool(args: &PoolArgs, settings: &Settings) -> Result<Pubkey> {
    if let Some(pool) = &args.pool {
        return Ok(parse_pubkey(pool)?);
    }
    let mint_a = parse_pubkey(&args.mint_a)?;
    let mint_b = parse_pubkey(&args.mint_b)?;
    let address = derive_whirlpool_address(
        &settings.program_id,
        &settings.whirlpools_config,
        &mint_a,
        &mint_b,
        args.tick_spacing,
    );
    info!(%address, tick_spacing = args.tick_spacing, "derived pool address");
    Ok(address)
}

/// --- Main Application Logic ---
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let settings = Settings::for_network(cli.network, cli.rpc_url.clone(), cli.whirlpools_config.as_deref())?;
    info!(network = ?cli.network, rpc_url = %settings.rpc_url, config = %settings.whirlpools_config, "settings");
    let client = RpcClient::new_with_commitment(settings.rpc_url.clone(), settings.commitment);
    let registry = TokenRegistry::default();

    let outcome = run(cli.command, &settings, &client, &registry).await;
    match outcome {
        Err(err) => match err.downcast_ref::<LpError>() {
            Some(LpError::PoolNotFound(address)) => {
                error!(%address, "pool not found, nothing to do");
                Ok(())
            }
            _ => {
                error!("{err:#}");
                Err(err)
            }
        },
        Ok(()) => Ok(()),
    }
}

async fn run(command: Commands, settings: &Settings, client: &RpcClient, registry: &TokenRegistry) -> Result<()> {
    match command {
        Commands::OpenPosition {
            pool,
            lower_price,
            upper_price,
            range_pct,
            amount,
            input_token,
            slippage,
            dry_run,
        } => {
            let wallet = KeypairWallet::new(load_keypair_from_env(WALLET_KEY_ENV)?);
            info!(wallet = %wallet.pubkey(), "wallet loaded");

            let band = match (lower_price, upper_price, range_pct) {
                (Some(lower), Some(upper), _) => PriceBand::Fixed { lower, upper },
                (_, _, Some(pct)) => PriceBand::AroundCurrent { pct },
                _ => anyhow::bail!("give --lower-price and --upper-price, or --range-pct"),
            };
            let request = OpenPositionRequest {
                pool: resolve_pool(&pool, settings)?,
                band,
                input: input_token,
                amount,
                slippage,
            };

            let plan = build_open_position(client, &settings.program_id, &wallet.pubkey(), &request).await?;
            print_pool_summary(&plan.pool, registry);
            print_tick_range(&plan.range, &plan.pool.converter(), &plan.pool.helper()?);
            print_quote(&plan.quote);
            print_plan(&plan);

            match submit_plan(client, &wallet, &plan, dry_run).await? {
                Submission::Simulated { units_consumed } => {
                    info!(?units_consumed, "simulation succeeded, nothing sent");
                }
                Submission::Sent(signature) => {
                    info!(%signature, position = %plan.position, mint = %plan.position_mint.pubkey(), "position opened");
                    match fetch_position(client, &plan.position).await {
                        Ok(position) => info!(
                            liquidity = %position.liquidity,
                            tick_lower = position.tick_lower_index,
                            tick_upper = position.tick_upper_index,
                            "position account"
                        ),
                        Err(err) => warn!(%err, "position not readable yet"),
                    }
                }
            }
        }
        Commands::PoolState { pool } => {
            let address = resolve_pool(&pool, settings)?;
            let snapshot = fetch_pool(client, &settings.program_id, &address).await?;
            print_pool_summary(&snapshot, registry);
        }
        Commands::Discover { mint_a, mint_b } => {
            let mint_a = parse_pubkey(&mint_a)?;
            let mint_b = parse_pubkey(&mint_b)?;
            info!(pair = %registry.pair_label(&mint_a, &mint_b), "discovering pools");
            let probes = discover_pools(client, settings, &mint_a, &mint_b, &STANDARD_TICK_SPACINGS).await?;
            print_discovery(&probes, registry);
        }
        Commands::DiscoverAll { output } => {
            let started = std::time::Instant::now();
            let mut pools = list_config_pools(client, settings, registry).await?;
            sort_by_liquidity(&mut pools);
            print_config_pools(&pools);
            info!(elapsed_secs = started.elapsed().as_secs_f64(), "discovery completed");
            if let Some(path) = output {
                write_pools_json(&pools, &path).with_context(|| format!("writing {}", path.display()))?;
            }
        }
        Commands::ListPools { url, output } => {
            let http = reqwest::Client::new();
            let mut pools = fetch_pools_with_apr_apy(&http, &url).await?;
            sort_by_apr(&mut pools);
            print_pools_table(&pools);
            if let Some(path) = output {
                write_pools_json(&pools, &path).with_context(|| format!("writing {}", path.display()))?;
            }
        }
        Commands::Ticks {
            lower_price,
            upper_price,
            decimals_a,
            decimals_b,
            tick_spacing,
        } => {
            let range = price_range_to_tick_range(lower_price, upper_price, decimals_a, decimals_b, tick_spacing)?;
            let converter = TickConverter::new(decimals_a, decimals_b);
            let helper = TickArrayHelper::new(tick_spacing)?;
            print_tick_range(&range, &converter, &helper);
        }
        Commands::TransferPosition {
            position_mint,
            recipient,
        } => {
            let wallet = KeypairWallet::new(load_keypair_from_env(WALLET_KEY_ENV)?);
            let position_mint = parse_pubkey(&position_mint)?;
            let recipient = parse_pubkey(&recipient)?;
            let transfer = build_position_transfer(client, &wallet.pubkey(), &position_mint, &recipient).await?;
            info!(from = %transfer.source, to = %transfer.destination, "simulating position transfer");
            let tx = sign_instructions(client, &wallet, &transfer.instructions, &[]).await?;
            if let Submission::Simulated { units_consumed } = simulate(client, &tx).await? {
                info!(?units_consumed, "transfer simulation succeeded");
            }
        }
    }
    Ok(())
}

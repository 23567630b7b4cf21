//! zenith-cli — command-line interface for the Zenith derivatives exchange.
//!
//! Usage:
//!   zenith-cli [--url <RPC>] [--ws-url <WS>] <COMMAND> [OPTIONS]
//!
//! Commands: state  pricing  watch  fee  init-margin-account  deposit  withdraw

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::signature::read_keypair_file;
use std::thread;
use std::time::Duration;
use zenith_sdk::{
    config::ZenithConfig,
    exchange::Exchange,
    types::Asset,
};

#[derive(Parser)]
#[command(name = "zenith-cli", about = "CLI for the Zenith derivatives exchange")]
struct Cli {
    /// RPC URL override.
    #[arg(long)]
    url: Option<String>,

    /// Websocket URL override.
    #[arg(long)]
    ws_url: Option<String>,

    /// Path to the signing keypair file.
    #[arg(long, default_value = "~/.config/solana/id.json")]
    keypair: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the exchange state account.
    State,
    /// Print per-asset mark prices and funding rates.
    Pricing,
    /// Subscribe to the pricing feed and print live mark prices.
    Watch {
        /// Print interval in seconds.
        #[arg(long, default_value_t = 2)]
        interval: u64,
    },
    /// Estimate the current priority fee.
    Fee,
    /// Create a margin account for the keypair.
    InitMarginAccount,
    /// Deposit USDC margin (in atoms).
    Deposit {
        #[arg(long)]
        amount: u64,
    },
    /// Withdraw USDC margin (in atoms).
    Withdraw {
        #[arg(long)]
        amount: u64,
    },
}

fn expand_tilde(path: &str) -> String {
    if path.starts_with("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return format!("{}{}", home, &path[1..]);
        }
    }
    path.to_string()
}

fn main() -> Result<()> {
    solana_logger::setup_with_default("info");
    let cli = Cli::parse();

    let mut builder = ZenithConfig::builder();
    if let Some(url) = &cli.url {
        builder = builder.rpc_url(url);
    }
    if let Some(ws_url) = &cli.ws_url {
        builder = builder.ws_url(ws_url);
    }
    let config = builder.build()?;
    let mut exchange = Exchange::load(config)?;

    match cli.command {
        Command::State => {
            let state = exchange.state.get();
            println!("State account {}", exchange.state_address);
            println!("  Admin:             {}", state.admin);
            println!("  Treasury:          {}", state.treasury_wallet);
            println!("  Trade fee:         {} bps", state.trade_fee_bps);
            println!("  Deposit limit:     {} atoms", state.native_deposit_limit);
            println!("  Funding interval:  {}s", state.funding_interval_seconds);
            println!("  Halted:            {}", state.is_halted());
            println!("  Observed at slot:  {}", exchange.state.slot());
        }
        Command::Pricing => {
            print_pricing(&exchange);
        }
        Command::Watch { interval } => {
            exchange.subscribe(CommitmentConfig::confirmed())?;
            println!(
                "watching pricing feed ({} live feeds), ctrl-c to stop",
                exchange.subscriptions.feed_count()
            );
            loop {
                exchange.pricing.ensure_live()?;
                print_pricing(&exchange);
                println!();
                thread::sleep(Duration::from_secs(interval));
            }
        }
        Command::Fee => match exchange.update_priority_fee() {
            Ok(fee) => println!("estimated priority fee: {fee} microlamports/CU"),
            Err(e) => println!(
                "estimation unavailable ({e}); falling back to {} microlamports/CU",
                exchange.priority_fee()
            ),
        },
        Command::InitMarginAccount => {
            let payer = load_keypair(&cli.keypair)?;
            let sig = exchange.initialize_margin_account(&payer)?;
            println!("created margin account: {sig}");
        }
        Command::Deposit { amount } => {
            let payer = load_keypair(&cli.keypair)?;
            let sig = exchange.deposit(&payer, amount)?;
            println!("deposited {amount} atoms: {sig}");
        }
        Command::Withdraw { amount } => {
            let payer = load_keypair(&cli.keypair)?;
            let sig = exchange.withdraw(&payer, amount)?;
            println!("withdrew {amount} atoms: {sig}");
        }
    }

    Ok(())
}

fn load_keypair(path: &str) -> Result<solana_sdk::signature::Keypair> {
    let path = expand_tilde(path);
    read_keypair_file(&path).map_err(|e| anyhow!("Failed to read keypair {}: {}", path, e))
}

fn print_pricing(exchange: &Exchange) {
    let pricing = exchange.pricing.get();
    println!(
        "Pricing at slot {} (cluster time {})",
        exchange.pricing.slot(),
        exchange.unix_timestamp()
    );
    for asset in Asset::all() {
        println!(
            "  {:<4} mark {:>12.4}  funding {:>9.5}%/day",
            asset.to_string(),
            pricing.mark_price_usd(asset),
            pricing.funding_rate_daily(asset) * 100.0,
        );
    }
}

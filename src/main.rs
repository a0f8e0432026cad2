use chain_client::HttpTradeLog;
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use core_types::TradeSide;
use engine::{TradeOutcome, TradingEngine};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use store::JsonFileStore;
use tracing_subscriber::EnvFilter;

/// The main entry point for the Tally reconciliation engine CLI.
#[tokio::main]
async fn main() {
    // Load environment variable overrides from .env, if one exists.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Execute the appropriate command
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A position-and-ledger reconciliation engine for a single trading account.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Buy shares of a symbol.
    Buy(TradeArgs),

    /// Sell shares of a symbol.
    Sell(TradeArgs),

    /// Show all open positions.
    Positions,

    /// Show the trade history, most recent first.
    History {
        /// Maximum number of trades to show.
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Show the current cash balance.
    Balance,

    /// Replay state from the authoritative source and rewrite the cache.
    Refresh,
}

#[derive(Parser)]
struct TradeArgs {
    /// The ticker symbol to trade (e.g., "AAPL").
    symbol: String,

    /// Number of whole shares.
    quantity: u64,

    /// Price per share (e.g., "187.45").
    price: Decimal,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = configuration::load_config_from(&cli.config)?;

    let store = Arc::new(JsonFileStore::new(&config.store.data_dir));

    let engine = if config.chain.enabled {
        let log = Arc::new(HttpTradeLog::new(
            &config.chain.endpoint,
            config.chain.confirm_timeout_secs,
        )?);
        let account_ref = if config.chain.account_ref.is_empty() {
            config.account.account_id.clone()
        } else {
            config.chain.account_ref.clone()
        };
        TradingEngine::open_with_chain(
            &config.account.account_id,
            config.account.starting_cash,
            store,
            log,
            account_ref,
            Duration::from_secs(config.chain.confirm_timeout_secs),
        )
        .await?
    } else {
        TradingEngine::open_local(&config.account.account_id, config.account.starting_cash, store)
            .await?
    };

    match cli.command {
        Commands::Buy(args) => {
            let outcome = engine
                .submit_trade(TradeSide::Buy, &args.symbol, args.quantity, args.price)
                .await?;
            print_outcome(&outcome);
        }
        Commands::Sell(args) => {
            let outcome = engine
                .submit_trade(TradeSide::Sell, &args.symbol, args.quantity, args.price)
                .await?;
            print_outcome(&outcome);
        }
        Commands::Positions => {
            print_positions(&engine).await;
            println!("Cash balance: {}", engine.cash_balance().await);
        }
        Commands::History { limit } => print_history(&engine, limit).await,
        Commands::Balance => println!("{}", engine.cash_balance().await),
        Commands::Refresh => {
            engine.refresh().await?;
            println!(
                "State refreshed ({} divergence(s) detected this session).",
                engine.divergence_count()
            );
            print_positions(&engine).await;
        }
    }

    Ok(())
}

fn print_outcome(outcome: &TradeOutcome) {
    println!("{}", outcome.message);
    println!(
        "  {} {} x {} @ {}",
        outcome.trade.side, outcome.trade.symbol, outcome.trade.quantity, outcome.trade.price
    );
    if let Some(tx_ref) = &outcome.tx_ref {
        println!("  Recorded externally as {tx_ref}");
    }
    if let Some(pnl) = outcome.realized_pnl {
        println!("  Realized P&L: {pnl}");
    }
    match &outcome.position {
        Some(p) => println!(
            "  Position: {} shares of {} @ avg {}",
            p.quantity, p.symbol, p.average_price
        ),
        None => println!("  Position closed."),
    }
    println!("  Cash balance: {}", outcome.cash_balance);
}

async fn print_positions(engine: &TradingEngine) {
    let positions = engine.positions().await;
    if positions.is_empty() {
        println!("No open positions.");
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        Cell::new("Symbol"),
        Cell::new("Quantity"),
        Cell::new("Avg Price"),
        Cell::new("Total Cost"),
    ]);
    for p in positions {
        table.add_row(vec![
            Cell::new(&p.symbol),
            Cell::new(p.quantity),
            Cell::new(p.average_price),
            Cell::new(p.total_cost()),
        ]);
    }
    println!("{table}");
}

async fn print_history(engine: &TradingEngine, limit: usize) {
    let trades = engine.history(limit).await;
    if trades.is_empty() {
        println!("No trades recorded.");
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        Cell::new("Executed At"),
        Cell::new("Side"),
        Cell::new("Symbol"),
        Cell::new("Quantity"),
        Cell::new("Price"),
        Cell::new("Notional"),
    ]);
    for t in trades {
        table.add_row(vec![
            Cell::new(t.executed_at.format("%Y-%m-%d %H:%M:%S UTC")),
            Cell::new(t.side.to_string()),
            Cell::new(&t.symbol),
            Cell::new(t.quantity),
            Cell::new(t.price),
            Cell::new(t.notional()),
        ]);
    }
    println!("{table}");
}

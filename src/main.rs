use aggregator::{Aggregator, LeaderboardView, LoadContext};
use clap::{Parser, Subcommand};
use comfy_table::{Cell, ContentArrangement, Table};
use configuration::{LogFormat, load_config};
use std::path::PathBuf;

/// The main entry point for the trading arena dashboard.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; settings then come from dashboard.toml and the environment.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut settings = load_config(cli.config.as_deref())?;
    if let Some(format) = cli.log_format {
        settings.logging.format = format;
    }
    // Held for the lifetime of the process so buffered file logs are flushed.
    let _log_guard = configuration::logging::init_tracing(&settings.logging)?;

    let aggregator = Aggregator::from_settings(&settings)?;
    tokio::spawn(events::run_event_logger(aggregator.events().subscribe()));

    match cli.command {
        Commands::Snapshot(args) => handle_snapshot(&aggregator, args).await,
        Commands::Leaderboard(args) => handle_leaderboard(&aggregator, args).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Data core of the simulated-trading dashboard.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML settings file. Defaults to ./dashboard.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides the configured console log format.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a user's dashboard snapshot and print it as JSON.
    Snapshot(SnapshotArgs),
    /// Load, validate, and rank the leaderboard.
    Leaderboard(LeaderboardArgs),
}

#[derive(Parser)]
struct SnapshotArgs {
    /// The user whose dashboard to load.
    #[arg(long)]
    user: String,

    /// Bypass fresh cache entries.
    #[arg(long)]
    refresh: bool,
}

#[derive(Parser)]
struct LeaderboardArgs {
    /// Show only the first N ranked entries.
    #[arg(long)]
    limit: Option<usize>,

    /// Bypass fresh cache entries.
    #[arg(long)]
    refresh: bool,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_snapshot(aggregator: &Aggregator, args: SnapshotArgs) -> anyhow::Result<()> {
    let context = LoadContext {
        force_refresh: args.refresh,
    };
    let snapshot = aggregator.load_snapshot(&args.user, &context).await;

    if snapshot.has_errors {
        tracing::warn!(user_id = %args.user, "Snapshot contains degraded sources.");
    }
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

async fn handle_leaderboard(aggregator: &Aggregator, args: LeaderboardArgs) -> anyhow::Result<()> {
    let context = LoadContext {
        force_refresh: args.refresh,
    };
    let board = aggregator.load_leaderboard(&context).await;

    if let Some(failure) = &board.failure {
        tracing::warn!(kind = %failure.kind, origin = ?board.origin, "Leaderboard fetch failed: {}", failure.message);
    }
    println!("{}", ranked_table(&board, args.limit));

    if !board.rejected.is_empty() {
        println!("\n{} record(s) rejected:", board.rejected.len());
        println!("{}", rejected_table(&board));
    }
    Ok(())
}

fn ranked_table(board: &LeaderboardView, limit: Option<usize>) -> Table {
    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Rank", "Trader", "Email", "Portfolio Value", "PnL", "PnL %", "Trades"]);

    let limit = limit.unwrap_or(board.ranked.len());
    for ranked in board.ranked.iter().take(limit) {
        let entry = &ranked.entry;
        table.add_row(vec![
            Cell::new(ranked.rank),
            Cell::new(&ranked.display_name),
            Cell::new(&entry.email),
            Cell::new(entry.portfolio_value.round_dp(2)),
            Cell::new(entry.pnl.round_dp(2)),
            Cell::new(format!("{}%", entry.pnl_percent.round_dp(2))),
            Cell::new(entry.total_trades),
        ]);
    }
    table
}

fn rejected_table(board: &LeaderboardView) -> Table {
    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Index", "Email", "Errors"]);

    for rejected in &board.rejected {
        let errors: Vec<String> = rejected.errors.iter().map(ToString::to_string).collect();
        table.add_row(vec![
            Cell::new(rejected.index),
            Cell::new(rejected.email.as_deref().unwrap_or("-")),
            Cell::new(errors.join("\n")),
        ]);
    }
    table
}

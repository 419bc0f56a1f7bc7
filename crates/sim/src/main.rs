//! Stairway scenario simulator
//!
//! Loads a TOML scenario, replays it against the exchange with in-memory
//! collaborators and prints the final balances and escrow ledger.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stairway_sim::{create_example_config, SimConfig, Simulation};

#[derive(Parser, Debug)]
#[command(name = "stairway-sim")]
#[command(about = "Replay a bonding-curve exchange scenario")]
struct Cli {
    /// Scenario configuration file path
    #[arg(short, long, default_value = "scenario.toml")]
    config: String,

    /// Override log level
    #[arg(long)]
    log_level: Option<String>,

    /// Dry run mode (validate config and exit)
    #[arg(long)]
    dry_run: bool,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,

    /// Write an example scenario to the config path and exit
    #[arg(long)]
    write_example: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.write_example {
        create_example_config(&cli.config)
            .with_context(|| format!("Failed to write example config to {}", cli.config))?;
        println!("Example scenario written to {}", cli.config);
        return Ok(());
    }

    let mut config = SimConfig::load(&cli.config)
        .with_context(|| format!("Failed to load scenario {}", cli.config))?;

    if let Some(log_level) = cli.log_level {
        config.log_level = log_level;
    }

    init_logging(&config.log_level);

    info!("Starting Stairway simulator");
    info!(
        "Loaded scenario with {} accounts, {} markets, {} tokens, {} steps",
        config.accounts.len(),
        config.markets.len(),
        config.tokens.len(),
        config.steps.len()
    );

    if cli.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        return Ok(());
    }

    let simulation = Simulation::new(config).context("Failed to set up simulation")?;
    let report = simulation.run()?;

    if report.failed_steps() > 0 {
        warn!("{} of {} steps failed", report.failed_steps(), report.steps.len());
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Steps:");
    for step in &report.steps {
        match &step.error {
            None => println!("  [{}] {:<9} ok", step.index, step.action),
            Some(e) => println!("  [{}] {:<9} failed: {}", step.index, step.action, e),
        }
    }

    println!(
        "Vault: rate {} shares {} reserve {}",
        report.vault.exchange_rate, report.vault.total_shares, report.vault.reserve_balance
    );

    println!("Accounts:");
    for (name, account) in &report.accounts {
        println!("  {:<12} reserve {}", name, account.reserve);
        for (token, balance) in &account.tokens {
            if *balance > 0 {
                println!("  {:<12}   {} {}", "", token, balance);
            }
        }
    }

    println!("Tokens:");
    for (name, token) in &report.tokens {
        println!(
            "  {:<12} supply {} principal {} generated {} withdrawn {} pending {}",
            name,
            token.supply,
            token.escrow.reserve_in_token,
            token.escrow.generated_interest,
            token.escrow.withdrawn_interest,
            token.pending_interest
        );
    }

    Ok(())
}

fn init_logging(log_level: &str) {
    let log_level = log_level.parse().unwrap_or(tracing::Level::INFO);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("stairway_sim={0},stairway_core={0}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

//! Paisa CLI - Micro-savings advisor
//!
//! Usage:
//!   paisa serve --port 3000                  Start web server
//!   paisa predict --income 22000 --rent 6000 Daily safe-to-save amount
//!   paisa categorize "Swiggy"                Categorize a merchant
//!   paisa forecast --file txns.csv           Months to a savings goal
//!   paisa analyze --file txns.csv            Spending patterns

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let selector = commands::load_selector(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { port, host } => commands::cmd_serve(selector, &host, port).await,
        Commands::Predict {
            income,
            rent,
            emi,
            age,
            family_size,
            location_tier,
        } => {
            let input = paisa_core::ProfileInput {
                income,
                rent,
                emi,
                age,
                family_size,
                location_tier,
            };
            commands::cmd_predict(&selector, input).await
        }
        Commands::Categorize {
            merchant,
            description,
        } => commands::cmd_categorize(&selector, &merchant, &description).await,
        Commands::Tips {
            language,
            income,
            savings_rate,
        } => commands::cmd_tips(&selector, &language, income, savings_rate).await,
        Commands::Forecast { file, goal } => commands::cmd_forecast(&selector, &file, goal).await,
        Commands::Analyze { file } => commands::cmd_analyze(&selector, &file).await,
        Commands::Status => commands::cmd_status(&selector),
    }
}

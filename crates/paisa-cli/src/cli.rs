//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Paisa - Micro-savings advice that always answers
#[derive(Parser)]
#[command(name = "paisa")]
#[command(about = "Micro-savings advisor with layered AI fallback", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration override file
    ///
    /// Defaults to PAISA_CONFIG, then ~/.local/share/paisa/config/paisa.toml.
    /// Only the keys present in the file are applied over built-in defaults.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Predict a daily safe-to-save amount
    Predict {
        /// Monthly income
        #[arg(long)]
        income: Option<f64>,

        /// Monthly rent
        #[arg(long)]
        rent: Option<f64>,

        /// Monthly loan EMI payments
        #[arg(long)]
        emi: Option<f64>,

        /// Age in years
        #[arg(long)]
        age: Option<f64>,

        /// Number of people in the household
        #[arg(long)]
        family_size: Option<f64>,

        /// City tier: 1 = metro, 2 = tier-1, 3 = tier-2
        #[arg(long)]
        location_tier: Option<f64>,
    },

    /// Categorize a merchant
    Categorize {
        /// Merchant name
        merchant: String,

        /// Free-text transaction description
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Generate financial tips
    Tips {
        /// Language code (en, hi, pb)
        #[arg(short, long, default_value = "en")]
        language: String,

        /// Monthly income, used to personalize generated tips
        #[arg(long)]
        income: Option<f64>,

        /// Percent of income saved monthly
        #[arg(long)]
        savings_rate: Option<f64>,
    },

    /// Forecast months until a savings goal from a transaction CSV
    Forecast {
        /// CSV with columns date,amount,category,merchant
        #[arg(short, long)]
        file: PathBuf,

        /// Goal amount (default from config)
        #[arg(short, long)]
        goal: Option<f64>,
    },

    /// Analyze spending patterns from a transaction CSV
    Analyze {
        /// CSV with columns date,amount,category,merchant
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show configuration and which optional layers are available
    Status,
}

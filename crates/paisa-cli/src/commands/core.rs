//! Shared command utilities
//!
//! This module contains:
//! - `load_selector` - Build the strategy selector from layered config
//! - `read_transactions` / `load_transactions` - Transaction CSV input
//! - `print_json` - Pretty-printed JSON output

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use paisa_core::{models::parse_timestamp, Category, Config, StrategySelector, Transaction};
use serde::Serialize;
use tracing::warn;

/// Columns a transaction CSV must provide
const REQUIRED_COLUMNS: [&str; 2] = ["date", "amount"];

/// Load config (embedded -> override file -> environment) and start the selector
pub fn load_selector(config_path: Option<&Path>) -> Result<StrategySelector> {
    let config = Config::load(config_path).context("Failed to load configuration")?;
    StrategySelector::bootstrap(config).context("Failed to initialize rule engine")
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    println!("{}", out);
    Ok(())
}

/// Open and parse a transaction CSV file
pub fn load_transactions(path: &Path) -> Result<Vec<Transaction>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open transaction file {}", path.display()))?;
    read_transactions(file)
        .with_context(|| format!("Failed to read transactions from {}", path.display()))
}

/// Parse transactions from CSV with a header row
///
/// Columns are matched by name (case-insensitive): `date` and `amount` are
/// required, `category`, `merchant` and `description` are optional. Rows whose
/// date or amount cannot be parsed are skipped.
pub fn read_transactions<R: Read>(reader: R) -> Result<Vec<Transaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

    for name in REQUIRED_COLUMNS {
        if column(name).is_none() {
            bail!("Missing required column '{}'", name);
        }
    }
    let date_col = column("date");
    let amount_col = column("amount");
    let category_col = column("category");
    let merchant_col = column("merchant");
    let description_col = column("description");

    let mut transactions = Vec::new();
    for (index, result) in rdr.records().enumerate() {
        let record = result?;
        let field = |col: Option<usize>| {
            col.and_then(|i| record.get(i))
                .filter(|s| !s.is_empty())
        };

        let date = field(date_col).and_then(parse_timestamp);
        let amount = field(amount_col)
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|a| a.is_finite());
        let (Some(date), Some(amount)) = (date, amount) else {
            warn!(row = index + 1, "Skipping row with unusable date or amount");
            continue;
        };

        let mut tx = Transaction::new(date, amount);
        if let Some(category) = field(category_col).and_then(|c| c.parse::<Category>().ok()) {
            tx = tx.with_category(category);
        }
        if let Some(merchant) = field(merchant_col) {
            tx = tx.with_merchant(merchant);
        }
        tx.description = field(description_col).map(str::to_string);
        transactions.push(tx);
    }

    Ok(transactions)
}

//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::io::Write;

use paisa_core::{AdapterRegistry, Category, Config, ProfileInput, RuleEngine, StrategySelector};
use tempfile::NamedTempFile;

use crate::commands::{self, read_transactions, tips_request};

fn setup_selector() -> StrategySelector {
    let mut config = Config::embedded().unwrap();
    config.goals.seasonal_enabled = false;
    StrategySelector::new(config, RuleEngine::new().unwrap(), AdapterRegistry::empty())
}

fn write_csv(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

const SAMPLE_CSV: &str = "\
date,amount,category,merchant
2024-03-09T21:30:00,-650,Discretionary,Swiggy
2024-03-11T09:15:00,-180.5,Essential,Kirana Bazaar
2024-03-12,-99,,Metro Card
2024-03-01,22000,Income,Salary
";

// ========== CSV Input Tests ==========

#[test]
fn test_read_transactions() {
    let txs = read_transactions(SAMPLE_CSV.as_bytes()).unwrap();
    assert_eq!(txs.len(), 4);

    assert_eq!(txs[0].amount, -650.0);
    assert_eq!(txs[0].category, Some(Category::Discretionary));
    assert_eq!(txs[0].merchant.as_deref(), Some("Swiggy"));

    // Empty category cell and date-only timestamps are accepted
    assert_eq!(txs[2].category, None);
    assert_eq!(txs[2].date.to_string(), "2024-03-12 00:00:00");

    assert!(!txs[3].is_expense());
}

#[test]
fn test_read_transactions_skips_bad_rows() {
    let csv = "\
Date,Amount,Merchant
not-a-date,-100,Somewhere
2024-03-01,lots,Elsewhere
2024-03-02,-42,Chai Point
";
    let txs = read_transactions(csv.as_bytes()).unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].amount, -42.0);
    assert_eq!(txs[0].merchant.as_deref(), Some("Chai Point"));
}

#[test]
fn test_read_transactions_requires_amount_column() {
    let csv = "date,merchant\n2024-03-01,Swiggy\n";
    let err = read_transactions(csv.as_bytes()).unwrap_err();
    assert!(err.to_string().contains("amount"));
}

#[test]
fn test_load_transactions_missing_file() {
    let result = commands::load_transactions(std::path::Path::new("/nonexistent/txns.csv"));
    assert!(result.is_err());
}

// ========== Request Building Tests ==========

#[test]
fn test_tips_request_without_context() {
    let request = tips_request("hi", None, None);
    assert_eq!(request.language(), "hi");
    assert!(request.user_context.is_none());
    assert!(request.context().is_none());
}

#[test]
fn test_tips_request_with_income() {
    let request = tips_request("en", Some(18000.0), None);
    let context = request.context().unwrap();
    assert_eq!(context.income, 18000.0);
    // Savings rate defaults when only income is given
    assert_eq!(context.savings_rate, 10.0);
}

// ========== Command Tests ==========

#[tokio::test]
async fn test_cmd_predict() {
    let selector = setup_selector();
    let input = ProfileInput {
        income: Some(30000.0),
        rent: Some(9000.0),
        ..Default::default()
    };
    assert!(commands::cmd_predict(&selector, input).await.is_ok());
}

#[tokio::test]
async fn test_cmd_categorize() {
    let selector = setup_selector();
    assert!(commands::cmd_categorize(&selector, "Zomato", "lunch")
        .await
        .is_ok());
}

#[tokio::test]
async fn test_cmd_tips() {
    let selector = setup_selector();
    assert!(commands::cmd_tips(&selector, "pb", None, None).await.is_ok());
}

#[tokio::test]
async fn test_cmd_forecast() {
    let selector = setup_selector();
    let file = write_csv(SAMPLE_CSV);
    assert!(commands::cmd_forecast(&selector, file.path(), Some(10000.0))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_cmd_analyze() {
    let selector = setup_selector();
    let file = write_csv(SAMPLE_CSV);
    assert!(commands::cmd_analyze(&selector, file.path()).await.is_ok());
}

#[tokio::test]
async fn test_cmd_analyze_missing_file() {
    let selector = setup_selector();
    let result = commands::cmd_analyze(&selector, std::path::Path::new("/nonexistent.csv")).await;
    assert!(result.is_err());
}

#[test]
fn test_cmd_status() {
    let selector = setup_selector();
    assert!(commands::cmd_status(&selector).is_ok());
}

// ========== Start-up Tests ==========

#[test]
fn test_load_selector_with_override_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[savings]\nmin_amount = 20\nmax_amount = 40").unwrap();

    let selector = commands::load_selector(Some(file.path())).unwrap();
    assert_eq!(selector.config().savings.min_amount, 20);
    assert_eq!(selector.config().savings.max_amount, 40);
}

#[test]
fn test_load_selector_rejects_inverted_bounds() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[savings]\nmin_amount = 60\nmax_amount = 40").unwrap();

    assert!(commands::load_selector(Some(file.path())).is_err());
}

#[test]
fn test_load_selector_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("paisa.toml");

    let err = commands::load_selector(Some(&missing)).unwrap_err();
    assert!(format!("{:#}", err).contains("Config file not found"));
}

//! Capability commands (predict, categorize, tips, forecast, analyze)
//!
//! Each builds a request, resolves it through the strategy selector and
//! prints the same JSON the HTTP API would return.

use std::path::Path;

use anyhow::Result;
use paisa_core::{
    CapabilityRequest, CategorizeRequest, GoalRequest, PatternsRequest, ProfileInput,
    StrategySelector, TipsRequest,
};

use super::{load_transactions, print_json};

async fn resolve_and_print(selector: &StrategySelector, request: CapabilityRequest) -> Result<()> {
    let response = selector.resolve(request).await;
    let source = response.source_method();
    if !source.is_learned() {
        tracing::info!(source = %source, "Answered by deterministic fallback");
    }
    print_json(&response)
}

pub async fn cmd_predict(selector: &StrategySelector, input: ProfileInput) -> Result<()> {
    resolve_and_print(selector, CapabilityRequest::Savings(input)).await
}

pub async fn cmd_categorize(
    selector: &StrategySelector,
    merchant: &str,
    description: &str,
) -> Result<()> {
    let request = CategorizeRequest {
        merchant: merchant.to_string(),
        description: description.to_string(),
    };
    resolve_and_print(selector, CapabilityRequest::Categorize(request)).await
}

pub async fn cmd_tips(
    selector: &StrategySelector,
    language: &str,
    income: Option<f64>,
    savings_rate: Option<f64>,
) -> Result<()> {
    let request = tips_request(language, income, savings_rate);
    resolve_and_print(selector, CapabilityRequest::Tips(request)).await
}

/// Tips request; user context is only attached when a value was given
pub fn tips_request(language: &str, income: Option<f64>, savings_rate: Option<f64>) -> TipsRequest {
    let mut context = serde_json::Map::new();
    if let Some(income) = income {
        context.insert("income".to_string(), income.into());
    }
    if let Some(rate) = savings_rate {
        context.insert("savings_rate".to_string(), rate.into());
    }

    TipsRequest {
        language: Some(language.to_string()),
        user_context: (!context.is_empty()).then(|| serde_json::Value::Object(context)),
    }
}

pub async fn cmd_forecast(
    selector: &StrategySelector,
    file: &Path,
    goal: Option<f64>,
) -> Result<()> {
    let request = GoalRequest {
        transactions: load_transactions(file)?,
        goal_amount: goal,
    };
    resolve_and_print(selector, CapabilityRequest::Goal(request)).await
}

pub async fn cmd_analyze(selector: &StrategySelector, file: &Path) -> Result<()> {
    let request = PatternsRequest {
        transactions: load_transactions(file)?,
    };
    resolve_and_print(selector, CapabilityRequest::Patterns(request)).await
}

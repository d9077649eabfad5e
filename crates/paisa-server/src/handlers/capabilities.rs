//! Capability handlers
//!
//! Thin wrappers over `StrategySelector::resolve`. A body that fails to parse
//! is replaced with the request type's default, so these never return 4xx.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use paisa_core::{
    CapabilityRequest, CapabilityResponse, CategorizeRequest, GoalRequest, PatternsRequest,
    ProfileInput, TipsRequest,
};

use crate::AppState;

/// Parsed body, or the default when it was missing or malformed
fn body_or_default<T: Default>(body: Result<Json<T>, JsonRejection>, endpoint: &str) -> T {
    match body {
        Ok(Json(value)) => value,
        Err(rejection) => {
            tracing::debug!(
                endpoint,
                reason = %rejection.body_text(),
                "Unusable request body, substituting defaults"
            );
            T::default()
        }
    }
}

async fn answer(state: &AppState, request: CapabilityRequest) -> Json<CapabilityResponse> {
    let capability = request.capability();
    let response = state.selector.resolve(request).await;
    let source = response.source_method();
    tracing::debug!(
        capability = %capability,
        source = %source,
        fallback = !source.is_learned(),
        "Answered"
    );
    Json(response)
}

/// POST /ai/predict-savings - Daily safe-to-save amount
pub async fn predict_savings(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ProfileInput>, JsonRejection>,
) -> Json<CapabilityResponse> {
    let input = body_or_default(body, "predict-savings");
    answer(&state, CapabilityRequest::Savings(input)).await
}

/// POST /ai/forecast-goal - Months until a savings goal is reached
pub async fn forecast_goal(
    State(state): State<Arc<AppState>>,
    body: Result<Json<GoalRequest>, JsonRejection>,
) -> Json<CapabilityResponse> {
    let request = body_or_default(body, "forecast-goal");
    answer(&state, CapabilityRequest::Goal(request)).await
}

/// POST /ai/categorize-merchant - Category for a merchant/description
pub async fn categorize_merchant(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CategorizeRequest>, JsonRejection>,
) -> Json<CapabilityResponse> {
    let request = body_or_default(body, "categorize-merchant");
    answer(&state, CapabilityRequest::Categorize(request)).await
}

/// POST /ai/generate-tips - Financial tips, returned as `{"tips": [...]}`
pub async fn generate_tips(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TipsRequest>, JsonRejection>,
) -> Json<CapabilityResponse> {
    let request = body_or_default(body, "generate-tips");
    answer(&state, CapabilityRequest::Tips(request)).await
}

/// POST /ai/analyze-patterns - Spending patterns, insights, recommendations
pub async fn analyze_patterns(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PatternsRequest>, JsonRejection>,
) -> Json<CapabilityResponse> {
    let request = body_or_default(body, "analyze-patterns");
    answer(&state, CapabilityRequest::Patterns(request)).await
}

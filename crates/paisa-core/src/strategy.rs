//! Strategy selector
//!
//! For each capability, tries layers in a fixed priority order and returns the
//! first answer. Learned and external layers may decline; the last layer is
//! always deterministic and total, so every request gets a well-formed result.
//!
//! | Capability          | Layers                                      |
//! |---------------------|---------------------------------------------|
//! | Savings prediction  | savings model -> surplus rules              |
//! | Goal forecast       | seasonal forecaster -> simple projection    |
//! | Categorization      | zero-shot classifier -> keyword rules       |
//! | Tip generation      | LLM -> static tip tables                    |
//! | Pattern analysis    | pattern rules                               |
//!
//! # Initialization order
//!
//! config -> rule engine (fatal on failure) -> model artifacts -> adapters -> selector.
//! Everything is immutable afterwards; the selector is shared behind an `Arc`.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::adapters::AdapterRegistry;
use crate::config::Config;
use crate::error::{Decline, Result};
use crate::estimator::{
    band_confidence, clamp_raw, daily_expense_series, fallback_savings, resolve_goal, round_to,
    seasonal_goal_forecast, simple_goal_forecast,
};
use crate::models::{
    CategorizationResult, CategorizeRequest, Category, GoalForecast, GoalRequest, HealthStatus,
    PatternsRequest, ProfileInput, SavingsPrediction, SourceMethod, SpendingAnalysis, Tip,
    TipsRequest, UserFinancialProfile,
};
use crate::patterns::PatternAnalyzer;
use crate::rules::RuleEngine;

/// Something the selector can answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    SavingsPrediction,
    GoalForecast,
    Categorization,
    TipGeneration,
    PatternAnalysis,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SavingsPrediction => "savings_prediction",
            Self::GoalForecast => "goal_forecast",
            Self::Categorization => "categorization",
            Self::TipGeneration => "tip_generation",
            Self::PatternAnalysis => "pattern_analysis",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input for `StrategySelector::resolve`
#[derive(Debug, Clone)]
pub enum CapabilityRequest {
    Savings(ProfileInput),
    Goal(GoalRequest),
    Categorize(CategorizeRequest),
    Tips(TipsRequest),
    Patterns(PatternsRequest),
}

impl CapabilityRequest {
    pub fn capability(&self) -> Capability {
        match self {
            Self::Savings(_) => Capability::SavingsPrediction,
            Self::Goal(_) => Capability::GoalForecast,
            Self::Categorize(_) => Capability::Categorization,
            Self::Tips(_) => Capability::TipGeneration,
            Self::Patterns(_) => Capability::PatternAnalysis,
        }
    }
}

/// Output of `StrategySelector::resolve`, serialized as the bare result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CapabilityResponse {
    Savings(SavingsPrediction),
    Goal(GoalForecast),
    Categorization(CategorizationResult),
    Tips { tips: Vec<Tip> },
    Patterns(SpendingAnalysis),
}

impl CapabilityResponse {
    /// Layer that produced the answer
    pub fn source_method(&self) -> SourceMethod {
        match self {
            Self::Savings(p) => p.source_method,
            Self::Goal(f) => f.source_method,
            Self::Categorization(c) => c.source_method,
            Self::Tips { tips } => tips
                .first()
                .map(|t| t.source_method)
                .unwrap_or(SourceMethod::StaticTips),
            Self::Patterns(a) => a.source_method,
        }
    }
}

/// Layered fallback over every capability
#[derive(Debug, Clone)]
pub struct StrategySelector {
    config: Config,
    rules: RuleEngine,
    registry: AdapterRegistry,
    patterns: PatternAnalyzer,
}

impl StrategySelector {
    /// Assemble from already-built parts
    pub fn new(config: Config, rules: RuleEngine, registry: AdapterRegistry) -> Self {
        let patterns = PatternAnalyzer::new(config.patterns.clone());
        Self {
            config,
            rules,
            registry,
            patterns,
        }
    }

    /// Build rule engine and adapters from config
    ///
    /// Fails only if the embedded tip tables cannot be parsed.
    pub fn bootstrap(config: Config) -> Result<Self> {
        let rules = RuleEngine::new()?;
        let registry = AdapterRegistry::from_config(&config);
        Ok(Self::new(config, rules, registry))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    pub fn rules(&self) -> &RuleEngine {
        &self.rules
    }

    /// Which optional layers are available
    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "healthy".to_string(),
            models_loaded: self.registry.models_loaded(),
            nlp_available: self.registry.classifier.is_some(),
            llm_available: self.registry.tip_generator.is_some(),
            seasonal_forecaster_available: self.registry.forecaster.is_some(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Answer any capability request
    pub async fn resolve(&self, request: CapabilityRequest) -> CapabilityResponse {
        match request {
            CapabilityRequest::Savings(input) => {
                CapabilityResponse::Savings(self.predict_savings(&input))
            }
            CapabilityRequest::Goal(req) => CapabilityResponse::Goal(self.forecast_goal(&req).await),
            CapabilityRequest::Categorize(req) => {
                CapabilityResponse::Categorization(self.categorize(&req).await)
            }
            CapabilityRequest::Tips(req) => CapabilityResponse::Tips {
                tips: self.generate_tips(&req).await,
            },
            CapabilityRequest::Patterns(req) => {
                CapabilityResponse::Patterns(self.analyze_patterns(&req))
            }
        }
    }

    /// Daily safe-to-save amount
    pub fn predict_savings(&self, input: &ProfileInput) -> SavingsPrediction {
        let savings = &self.config.savings;
        let profile = UserFinancialProfile::from_input(input, &savings.defaults);

        let mut prediction = self
            .model_savings(&profile)
            .unwrap_or_else(|| fallback_savings(&profile, savings));

        prediction.amount = savings.clamp(prediction.amount);
        prediction
    }

    fn model_savings(&self, profile: &UserFinancialProfile) -> Option<SavingsPrediction> {
        let capability = Capability::SavingsPrediction;
        let model = self.registry.savings_model.as_ref()?;

        match model.predict(&profile.features()) {
            Ok(raw) => {
                let savings = &self.config.savings;
                debug!(capability = %capability, raw, "Savings model answered");
                Some(SavingsPrediction {
                    amount: clamp_raw(raw, savings),
                    confidence: band_confidence(raw, savings),
                    source_method: model.source_method(),
                    ml_prediction: true,
                    raw_prediction: Some(round_to(raw, 2)),
                })
            }
            Err(decline) => {
                log_decline(capability, "savings_model", &decline);
                None
            }
        }
    }

    /// Months until a savings goal is reached
    pub async fn forecast_goal(&self, request: &GoalRequest) -> GoalForecast {
        let goals = &self.config.goals;
        let goal = resolve_goal(request.goal_amount, goals);

        if let Some(forecaster) = &self.registry.forecaster {
            let capability = Capability::GoalForecast;
            let series = daily_expense_series(&request.transactions);

            if series.len() < goals.min_seasonal_points {
                log_decline(
                    capability,
                    forecaster.name(),
                    &Decline::InsufficientData {
                        needed: goals.min_seasonal_points,
                        got: series.len(),
                    },
                );
            } else if let Some(trend) = attempt(
                capability,
                forecaster.name(),
                self.config.timeouts.forecaster,
                forecaster.forecast(&series, goals.horizon_days),
            )
            .await
            {
                if trend.projected_daily_mean.is_finite() && trend.trend_per_day.is_finite() {
                    return seasonal_goal_forecast(&series, &trend, goal, goals);
                }
                log_decline(
                    capability,
                    forecaster.name(),
                    &Decline::ExternalService("non-finite forecast".into()),
                );
            }
        }

        simple_goal_forecast(&request.transactions, goal, goals)
    }

    /// Spending category for a merchant
    pub async fn categorize(&self, request: &CategorizeRequest) -> CategorizationResult {
        if let Some(classifier) = &self.registry.classifier {
            let text = format!("{} {}", request.merchant, request.description);
            if let Some(scores) = attempt(
                Capability::Categorization,
                classifier.name(),
                self.config.timeouts.classifier,
                classifier.classify(text.trim(), Category::all()),
            )
            .await
            {
                return CategorizationResult {
                    category: scores.label,
                    confidence: scores.confidence,
                    source_method: SourceMethod::Nlp,
                    all_scores: Some(scores.distribution),
                };
            }
        }

        self.rules.categorize(&request.merchant)
    }

    /// Financial tips in the requested language
    pub async fn generate_tips(&self, request: &TipsRequest) -> Vec<Tip> {
        let language = request.language();

        if let Some(generator) = &self.registry.tip_generator {
            let capability = Capability::TipGeneration;
            let context = request.context();
            if let Some(tips) = attempt(
                capability,
                generator.name(),
                self.config.timeouts.llm,
                generator.generate(language, context.as_ref()),
            )
            .await
            {
                if !tips.is_empty() {
                    return tips;
                }
                log_decline(
                    capability,
                    generator.name(),
                    &Decline::ExternalService("empty tip list".into()),
                );
            }
        }

        self.rules.tips(language)
    }

    /// Weekday, hour and category aggregates with derived advice
    pub fn analyze_patterns(&self, request: &PatternsRequest) -> SpendingAnalysis {
        self.patterns.analyze(&request.transactions)
    }
}

/// Run one adapter under its time budget; a decline or timeout yields None
async fn attempt<T, F>(capability: Capability, adapter: &str, budget: Duration, fut: F) -> Option<T>
where
    F: Future<Output = std::result::Result<T, Decline>>,
{
    match tokio::time::timeout(budget, fut).await {
        Ok(Ok(value)) => {
            debug!(capability = %capability, adapter, "Adapter answered");
            Some(value)
        }
        Ok(Err(decline)) => {
            log_decline(capability, adapter, &decline);
            None
        }
        Err(_) => {
            log_decline(capability, adapter, &Decline::Timeout(budget));
            None
        }
    }
}

fn log_decline(capability: Capability, adapter: &str, decline: &Decline) {
    match decline {
        // Small inputs are routine, not a provider problem
        Decline::InsufficientData { .. } => debug!(
            capability = %capability,
            adapter,
            kind = decline.kind(),
            reason = %decline,
            "Adapter declined, falling through"
        ),
        _ => warn!(
            capability = %capability,
            adapter,
            kind = decline.kind(),
            reason = %decline,
            "Adapter declined, falling through"
        ),
    }
}

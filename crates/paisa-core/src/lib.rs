//! Paisa Core Library
//!
//! Fallback decision core for the Paisa micro-savings advisor:
//! - Strategy selector that layers learned models over deterministic rules
//! - Savings model adapter (random forest / linear regressor + feature scaler)
//! - External-service adapters (zero-shot classifier, LLM tips, seasonal forecaster)
//! - Closed-form savings and goal estimates
//! - Keyword categorization and multilingual static tips
//! - Spending pattern analysis
//! - Layered configuration (embedded defaults, override file, environment)

pub mod adapters;
pub mod config;
pub mod error;
pub mod estimator;
pub mod models;
pub mod patterns;
pub mod rules;
pub mod strategy;

/// Test utilities including mock inference server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use adapters::{
    AdapterRegistry, LabelScores, MerchantClassifier, ModelArtifacts, OpenAITipGenerator,
    SeasonalForecaster, TipGenerator, WeeklySeasonalForecaster, ZeroShotClassifier,
};
pub use config::Config;
pub use error::{Decline, Error, Result};
pub use estimator::SeasonalTrend;
pub use models::{
    CategorizationResult, CategorizeRequest, Category, Confidence, GoalForecast, GoalRequest,
    HealthStatus, PatternsRequest, ProfileInput, SavingsPrediction, SourceMethod,
    SpendingAnalysis, SpendingPatterns, Tip, TipContext, TipsRequest, Transaction,
    UserFinancialProfile,
};
pub use patterns::PatternAnalyzer;
pub use rules::RuleEngine;
pub use strategy::{Capability, CapabilityRequest, CapabilityResponse, StrategySelector};

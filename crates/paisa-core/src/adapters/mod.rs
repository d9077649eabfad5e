//! Model and external-service adapters
//!
//! Every adapter answers with `Result<T, Decline>`. A decline is never an
//! error for the caller: the strategy selector logs it and falls through to
//! the next layer.
//!
//! # Architecture
//!
//! - `MerchantClassifier`: zero-shot label scoring (`ZeroShotClassifier`)
//! - `TipGenerator`: LLM tip generation (`OpenAITipGenerator`)
//! - `SeasonalForecaster`: daily-series trend forecasting (`WeeklySeasonalForecaster`)
//! - `ModelArtifacts`: the trained savings regressor and its feature scaler
//! - `AdapterRegistry`: which of the above are available, decided once at startup
//!
//! # Configuration
//!
//! Environment variables (applied through `Config`):
//! - `OPENAI_API_KEY`: enables the tip generator
//! - `OPENAI_BASE_URL`, `OPENAI_MODEL`: chat completions endpoint and model
//! - `ZERO_SHOT_HOST`, `HF_API_TOKEN`: enable the merchant classifier
//! - `ZERO_SHOT_MODEL`: classification model name
//! - `PAISA_MODEL_DIR`: directory containing the savings model artifacts

mod mock;
mod openai_compatible;
pub mod parsing;
pub mod savings_model;
mod seasonal;
mod zero_shot;

pub use mock::{FailingAdapter, MockClassifier, MockForecaster, MockTipGenerator, SlowAdapter};
pub use openai_compatible::OpenAITipGenerator;
pub use savings_model::{FeatureScaler, ModelArtifacts, SavingsModel, TreeNode};
pub use seasonal::WeeklySeasonalForecaster;
pub use zero_shot::ZeroShotClassifier;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::config::Config;
use crate::error::Decline;
use crate::estimator::SeasonalTrend;
use crate::models::{Category, Tip, TipContext};

/// Scores produced by a classifier over a label set
#[derive(Debug, Clone, PartialEq)]
pub struct LabelScores {
    pub label: Category,
    pub confidence: f64,
    pub distribution: BTreeMap<Category, f64>,
}

/// Assigns one of a fixed set of labels to free text
#[async_trait]
pub trait MerchantClassifier: Send + Sync {
    async fn classify(&self, text: &str, labels: &[Category]) -> Result<LabelScores, Decline>;

    /// Adapter name for logs
    fn name(&self) -> &str;
}

/// Generates financial tips in a language
#[async_trait]
pub trait TipGenerator: Send + Sync {
    async fn generate(
        &self,
        language: &str,
        context: Option<&TipContext>,
    ) -> Result<Vec<Tip>, Decline>;

    fn name(&self) -> &str;
}

/// Projects a daily series forward
#[async_trait]
pub trait SeasonalForecaster: Send + Sync {
    async fn forecast(
        &self,
        series: &[(NaiveDate, f64)],
        horizon_days: u32,
    ) -> Result<SeasonalTrend, Decline>;

    fn name(&self) -> &str;
}

/// Adapters available to the strategy selector
///
/// Built once at startup. An absent adapter is skipped without a decline.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    pub savings_model: Option<Arc<ModelArtifacts>>,
    pub classifier: Option<Arc<dyn MerchantClassifier>>,
    pub tip_generator: Option<Arc<dyn TipGenerator>>,
    pub forecaster: Option<Arc<dyn SeasonalForecaster>>,
}

impl AdapterRegistry {
    /// Registry with nothing but the deterministic layers
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load artifacts and construct the adapters the config enables
    pub fn from_config(config: &Config) -> Self {
        let savings_model = match ModelArtifacts::load(&config.model_dir) {
            Ok(artifacts) => {
                tracing::info!(
                    dir = %config.model_dir.display(),
                    model = artifacts.source_method().as_str(),
                    "Loaded savings model"
                );
                Some(Arc::new(artifacts))
            }
            Err(e) => {
                tracing::warn!(
                    dir = %config.model_dir.display(),
                    error = %e,
                    "Savings model unavailable, using surplus rules"
                );
                None
            }
        };

        let classifier = ZeroShotClassifier::from_config(&config.classifier, config.timeouts.classifier)
            .map(|c| Arc::new(c) as Arc<dyn MerchantClassifier>);

        let tip_generator = OpenAITipGenerator::from_config(&config.llm, config.timeouts.llm)
            .map(|g| Arc::new(g) as Arc<dyn TipGenerator>);

        let forecaster = config
            .goals
            .seasonal_enabled
            .then(|| Arc::new(WeeklySeasonalForecaster::new()) as Arc<dyn SeasonalForecaster>);

        Self {
            savings_model,
            classifier,
            tip_generator,
            forecaster,
        }
    }

    pub fn with_savings_model(mut self, artifacts: ModelArtifacts) -> Self {
        self.savings_model = Some(Arc::new(artifacts));
        self
    }

    pub fn with_classifier(mut self, classifier: impl MerchantClassifier + 'static) -> Self {
        self.classifier = Some(Arc::new(classifier));
        self
    }

    pub fn with_tip_generator(mut self, generator: impl TipGenerator + 'static) -> Self {
        self.tip_generator = Some(Arc::new(generator));
        self
    }

    pub fn with_forecaster(mut self, forecaster: impl SeasonalForecaster + 'static) -> Self {
        self.forecaster = Some(Arc::new(forecaster));
        self
    }

    /// Number of trained models loaded
    pub fn models_loaded(&self) -> usize {
        usize::from(self.savings_model.is_some())
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("savings_model", &self.savings_model.is_some())
            .field("classifier", &self.classifier.as_ref().map(|c| c.name().to_string()))
            .field("tip_generator", &self.tip_generator.as_ref().map(|g| g.name().to_string()))
            .field("forecaster", &self.forecaster.as_ref().map(|f| f.name().to_string()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_from_default_config() {
        let mut config = Config::embedded().unwrap();
        let dir = tempfile::tempdir().unwrap();
        config.model_dir = dir.path().to_path_buf();

        let registry = AdapterRegistry::from_config(&config);
        assert!(registry.savings_model.is_none());
        assert!(registry.classifier.is_none());
        assert!(registry.tip_generator.is_none());
        assert!(registry.forecaster.is_some());
        assert_eq!(registry.models_loaded(), 0);
    }

    #[test]
    fn test_registry_with_credentials() {
        let mut config = Config::embedded().unwrap();
        config.llm.api_key = Some("sk-test".into());
        config.classifier.enabled = true;
        config.goals.seasonal_enabled = false;

        let registry = AdapterRegistry::from_config(&config);
        assert_eq!(registry.classifier.as_ref().unwrap().name(), "zero_shot");
        assert_eq!(registry.tip_generator.as_ref().unwrap().name(), "openai_compatible");
        assert!(registry.forecaster.is_none());
    }
}

//! Mock adapters for testing
//!
//! Predictable stand-ins for each adapter trait, plus adapters that always
//! decline or never answer in time. Useful for exercising every fallback path
//! without a running inference server.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Decline;
use crate::estimator::SeasonalTrend;
use crate::models::{Category, SourceMethod, Tip, TipContext};

use super::{LabelScores, MerchantClassifier, SeasonalForecaster, TipGenerator};

/// Classifier that always answers with one label
#[derive(Debug, Clone)]
pub struct MockClassifier {
    pub label: Category,
    pub confidence: f64,
}

impl MockClassifier {
    pub fn new(label: Category, confidence: f64) -> Self {
        Self { label, confidence }
    }
}

#[async_trait]
impl MerchantClassifier for MockClassifier {
    async fn classify(&self, text: &str, labels: &[Category]) -> Result<LabelScores, Decline> {
        if text.trim().is_empty() {
            return Err(Decline::InsufficientData { needed: 1, got: 0 });
        }
        let rest = (1.0 - self.confidence) / (labels.len().max(2) - 1) as f64;
        let distribution: BTreeMap<Category, f64> = labels
            .iter()
            .map(|l| (*l, if *l == self.label { self.confidence } else { rest }))
            .collect();

        Ok(LabelScores {
            label: self.label,
            confidence: self.confidence,
            distribution,
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Tip generator that returns a fixed number of numbered tips
#[derive(Debug, Clone)]
pub struct MockTipGenerator {
    pub count: usize,
}

impl MockTipGenerator {
    pub fn new(count: usize) -> Self {
        Self { count }
    }
}

#[async_trait]
impl TipGenerator for MockTipGenerator {
    async fn generate(
        &self,
        language: &str,
        context: Option<&TipContext>,
    ) -> Result<Vec<Tip>, Decline> {
        let suffix = context
            .map(|c| format!(" on ₹{}", c.income))
            .unwrap_or_default();
        Ok((1..=self.count)
            .map(|i| Tip {
                id: i.to_string(),
                title: format!("Mock tip {}", i),
                content: format!("Save a little every day{}", suffix),
                category: "ai_generated".to_string(),
                language: language.to_string(),
                source_method: SourceMethod::Llm,
            })
            .collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Forecaster that returns a fixed trend
#[derive(Debug, Clone)]
pub struct MockForecaster {
    pub projected_daily_mean: f64,
    pub trend_per_day: f64,
}

impl MockForecaster {
    pub fn new(projected_daily_mean: f64, trend_per_day: f64) -> Self {
        Self {
            projected_daily_mean,
            trend_per_day,
        }
    }
}

#[async_trait]
impl SeasonalForecaster for MockForecaster {
    async fn forecast(
        &self,
        _series: &[(NaiveDate, f64)],
        horizon_days: u32,
    ) -> Result<SeasonalTrend, Decline> {
        Ok(SeasonalTrend {
            projected_daily_mean: self.projected_daily_mean,
            trend_per_day: self.trend_per_day,
            horizon_days,
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Adapter that declines every request
#[derive(Debug, Clone)]
pub struct FailingAdapter {
    pub decline: Decline,
}

impl FailingAdapter {
    pub fn new(decline: Decline) -> Self {
        Self { decline }
    }

    /// Declines as if the provider returned malformed output
    pub fn malformed() -> Self {
        Self::new(Decline::ExternalService("malformed response".into()))
    }
}

#[async_trait]
impl MerchantClassifier for FailingAdapter {
    async fn classify(&self, _text: &str, _labels: &[Category]) -> Result<LabelScores, Decline> {
        Err(self.decline.clone())
    }

    fn name(&self) -> &str {
        "failing"
    }
}

#[async_trait]
impl TipGenerator for FailingAdapter {
    async fn generate(
        &self,
        _language: &str,
        _context: Option<&TipContext>,
    ) -> Result<Vec<Tip>, Decline> {
        Err(self.decline.clone())
    }

    fn name(&self) -> &str {
        "failing"
    }
}

#[async_trait]
impl SeasonalForecaster for FailingAdapter {
    async fn forecast(
        &self,
        _series: &[(NaiveDate, f64)],
        _horizon_days: u32,
    ) -> Result<SeasonalTrend, Decline> {
        Err(self.decline.clone())
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Adapter that sleeps before answering, for timeout tests
#[derive(Debug, Clone)]
pub struct SlowAdapter {
    pub delay: Duration,
}

impl SlowAdapter {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl MerchantClassifier for SlowAdapter {
    async fn classify(&self, text: &str, labels: &[Category]) -> Result<LabelScores, Decline> {
        tokio::time::sleep(self.delay).await;
        MockClassifier::new(Category::Discretionary, 0.9)
            .classify(text, labels)
            .await
    }

    fn name(&self) -> &str {
        "slow"
    }
}

#[async_trait]
impl TipGenerator for SlowAdapter {
    async fn generate(
        &self,
        language: &str,
        context: Option<&TipContext>,
    ) -> Result<Vec<Tip>, Decline> {
        tokio::time::sleep(self.delay).await;
        MockTipGenerator::new(5).generate(language, context).await
    }

    fn name(&self) -> &str {
        "slow"
    }
}

#[async_trait]
impl SeasonalForecaster for SlowAdapter {
    async fn forecast(
        &self,
        series: &[(NaiveDate, f64)],
        horizon_days: u32,
    ) -> Result<SeasonalTrend, Decline> {
        tokio::time::sleep(self.delay).await;
        MockForecaster::new(100.0, 0.0)
            .forecast(series, horizon_days)
            .await
    }

    fn name(&self) -> &str {
        "slow"
    }
}

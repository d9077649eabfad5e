//! Zero-shot merchant classifier
//!
//! Talks to a Hugging Face style inference endpoint:
//! `POST {host}/models/{model}` with `{"inputs", "parameters": {"candidate_labels"}}`,
//! answered by `{"labels": [...], "scores": [...]}` sorted by score.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ClassifierConfig;
use crate::error::{Decline, Error, Result};
use crate::estimator::round_to;
use crate::models::Category;

use super::{LabelScores, MerchantClassifier};

/// HTTP zero-shot classifier
#[derive(Clone)]
pub struct ZeroShotClassifier {
    http_client: Client,
    host: String,
    model: String,
    api_token: Option<String>,
}

impl ZeroShotClassifier {
    pub fn new(host: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            host: host.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_token: None,
        }
    }

    /// Build from config; None unless the classifier is enabled
    pub fn from_config(config: &ClassifierConfig, timeout: Duration) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Some(Self {
            http_client,
            host: config.host.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_token: config.api_token.clone(),
        })
    }

    async fn request(&self, text: &str, labels: &[Category]) -> Result<ZeroShotResponse> {
        let request = ZeroShotRequest {
            inputs: text.to_string(),
            parameters: ZeroShotParameters {
                candidate_labels: labels.iter().map(|l| l.as_str().to_string()).collect(),
            },
        };

        let mut req_builder = self
            .http_client
            .post(format!("{}/models/{}", self.host, self.model))
            .json(&request);

        if let Some(ref token) = self.api_token {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", token));
        }

        let response = req_builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::InvalidData(format!(
                "Zero-shot API error {}: {}",
                status, body
            )));
        }

        let body: ZeroShotBody = response.json().await?;
        match body {
            ZeroShotBody::Single(r) => Ok(r),
            ZeroShotBody::Batch(rs) => rs
                .into_iter()
                .next()
                .ok_or_else(|| Error::InvalidData("Empty zero-shot response".into())),
        }
    }
}

/// Validate a provider response against the requested label set
pub fn scores_from_response(
    labels: &[String],
    scores: &[f64],
    requested: &[Category],
) -> Result<LabelScores> {
    if labels.is_empty() || labels.len() != scores.len() {
        return Err(Error::InvalidData(format!(
            "zero-shot returned {} labels and {} scores",
            labels.len(),
            scores.len()
        )));
    }

    let mut distribution = BTreeMap::new();
    let mut best: Option<(Category, f64)> = None;

    for (label, score) in labels.iter().zip(scores) {
        let category: Category = label
            .parse()
            .map_err(|_| Error::InvalidData(format!("unknown label '{}'", label)))?;
        if !requested.contains(&category) {
            return Err(Error::InvalidData(format!("unrequested label '{}'", label)));
        }
        if !score.is_finite() {
            return Err(Error::InvalidData(format!("non-finite score for '{}'", label)));
        }
        distribution.insert(category, *score);
        if best.map_or(true, |(_, s)| *score > s) {
            best = Some((category, *score));
        }
    }

    let (label, confidence) =
        best.ok_or_else(|| Error::InvalidData("zero-shot returned no scores".into()))?;

    Ok(LabelScores {
        label,
        confidence: round_to(confidence, 3),
        distribution,
    })
}

#[async_trait]
impl MerchantClassifier for ZeroShotClassifier {
    async fn classify(
        &self,
        text: &str,
        labels: &[Category],
    ) -> std::result::Result<LabelScores, Decline> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Decline::InsufficientData { needed: 1, got: 0 });
        }

        let response = self.request(text, labels).await?;
        let scores = scores_from_response(&response.labels, &response.scores, labels)?;
        debug!(
            model = %self.model,
            label = %scores.label,
            confidence = scores.confidence,
            "Zero-shot classification"
        );
        Ok(scores)
    }

    fn name(&self) -> &str {
        "zero_shot"
    }
}

// ============================================================================
// API types
// ============================================================================

#[derive(Debug, Serialize)]
struct ZeroShotRequest {
    inputs: String,
    parameters: ZeroShotParameters,
}

#[derive(Debug, Serialize)]
struct ZeroShotParameters {
    candidate_labels: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ZeroShotResponse {
    labels: Vec<String>,
    scores: Vec<f64>,
}

/// Some deployments wrap the result in a one-element array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ZeroShotBody {
    Single(ZeroShotResponse),
    Batch(Vec<ZeroShotResponse>),
}

//! Trained savings regressor
//!
//! Artifacts are exported as JSON by the training pipeline:
//! - `savings_predictor.json`: a random forest of regression trees or a linear model
//! - `scaler.json`: per-feature mean and scale (standard scaling)
//!
//! Both are validated at load so prediction never indexes out of bounds.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Decline, Error, Result};
use crate::models::SourceMethod;

pub const MODEL_FILE: &str = "savings_predictor.json";
pub const SCALER_FILE: &str = "scaler.json";

/// Number of profile features the model consumes
pub const FEATURE_COUNT: usize = 6;

/// A node in a regression tree; the root is index 0
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// `x[feature] <= threshold` goes left
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Regression model over scaled features
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SavingsModel {
    /// Mean of the tree outputs
    RandomForest { trees: Vec<Vec<TreeNode>> },
    Linear {
        coefficients: Vec<f64>,
        intercept: f64,
    },
}

impl SavingsModel {
    pub fn source_method(&self) -> SourceMethod {
        match self {
            SavingsModel::RandomForest { .. } => SourceMethod::RandomForest,
            SavingsModel::Linear { .. } => SourceMethod::LinearModel,
        }
    }

    /// Check structure against the expected feature count
    pub fn validate(&self, features: usize) -> Result<()> {
        match self {
            SavingsModel::RandomForest { trees } => {
                if trees.is_empty() {
                    return Err(Error::InvalidData("random forest has no trees".into()));
                }
                for (t, nodes) in trees.iter().enumerate() {
                    if nodes.is_empty() {
                        return Err(Error::InvalidData(format!("tree {} is empty", t)));
                    }
                    for node in nodes {
                        match node {
                            TreeNode::Split {
                                feature,
                                threshold,
                                left,
                                right,
                            } => {
                                if *feature >= features {
                                    return Err(Error::InvalidData(format!(
                                        "tree {} splits on feature {} of {}",
                                        t, feature, features
                                    )));
                                }
                                if *left >= nodes.len() || *right >= nodes.len() {
                                    return Err(Error::InvalidData(format!(
                                        "tree {} has a child index out of range",
                                        t
                                    )));
                                }
                                if !threshold.is_finite() {
                                    return Err(Error::InvalidData(format!(
                                        "tree {} has a non-finite threshold",
                                        t
                                    )));
                                }
                            }
                            TreeNode::Leaf { value } if !value.is_finite() => {
                                return Err(Error::InvalidData(format!(
                                    "tree {} has a non-finite leaf",
                                    t
                                )));
                            }
                            TreeNode::Leaf { .. } => {}
                        }
                    }
                }
                Ok(())
            }
            SavingsModel::Linear { coefficients, .. } => {
                if coefficients.len() != features {
                    return Err(Error::InvalidData(format!(
                        "linear model has {} coefficients, expected {}",
                        coefficients.len(),
                        features
                    )));
                }
                Ok(())
            }
        }
    }

    /// Predict from already-scaled features
    pub fn predict(&self, x: &[f64]) -> std::result::Result<f64, Decline> {
        match self {
            SavingsModel::RandomForest { trees } => {
                let mut sum = 0.0;
                for nodes in trees {
                    sum += eval_tree(nodes, x)?;
                }
                Ok(sum / trees.len() as f64)
            }
            SavingsModel::Linear {
                coefficients,
                intercept,
            } => {
                if coefficients.len() != x.len() {
                    return Err(feature_mismatch(coefficients.len(), x.len()));
                }
                Ok(intercept + coefficients.iter().zip(x).map(|(c, v)| c * v).sum::<f64>())
            }
        }
    }
}

fn eval_tree(nodes: &[TreeNode], x: &[f64]) -> std::result::Result<f64, Decline> {
    let mut index = 0;
    // A valid tree reaches a leaf in fewer steps than it has nodes
    for _ in 0..nodes.len() {
        match nodes.get(index) {
            Some(TreeNode::Leaf { value }) => return Ok(*value),
            Some(TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            }) => {
                let v = x
                    .get(*feature)
                    .ok_or_else(|| feature_mismatch(*feature + 1, x.len()))?;
                index = if v <= threshold { *left } else { *right };
            }
            None => break,
        }
    }
    Err(Decline::MissingArtifact(
        "regression tree does not terminate".into(),
    ))
}

fn feature_mismatch(expected: usize, got: usize) -> Decline {
    Decline::MissingArtifact(format!(
        "feature count mismatch: model expects {}, got {}",
        expected, got
    ))
}

/// Standard scaler: `(x - mean) / scale`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeatureScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl FeatureScaler {
    pub fn validate(&self, features: usize) -> Result<()> {
        if self.mean.len() != features || self.scale.len() != features {
            return Err(Error::InvalidData(format!(
                "scaler has {}/{} entries, expected {}",
                self.mean.len(),
                self.scale.len(),
                features
            )));
        }
        if self.mean.iter().chain(&self.scale).any(|v| !v.is_finite()) {
            return Err(Error::InvalidData("scaler has non-finite entries".into()));
        }
        Ok(())
    }

    /// Scale a feature vector; a zero scale is treated as 1
    pub fn transform(&self, x: &[f64]) -> std::result::Result<Vec<f64>, Decline> {
        if x.len() != self.mean.len() {
            return Err(feature_mismatch(self.mean.len(), x.len()));
        }
        Ok(x.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| {
                let s = if *s == 0.0 { 1.0 } else { *s };
                (v - m) / s
            })
            .collect())
    }
}

/// Loaded model plus scaler
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifacts {
    pub model: SavingsModel,
    pub scaler: FeatureScaler,
}

impl ModelArtifacts {
    pub fn new(model: SavingsModel, scaler: FeatureScaler) -> Result<Self> {
        model.validate(FEATURE_COUNT)?;
        scaler.validate(FEATURE_COUNT)?;
        Ok(Self { model, scaler })
    }

    /// Load and validate both artifacts from a directory
    pub fn load(dir: &Path) -> Result<Self> {
        let model: SavingsModel = read_json(&dir.join(MODEL_FILE))?;
        let scaler: FeatureScaler = read_json(&dir.join(SCALER_FILE))?;
        Self::new(model, scaler)
    }

    pub fn source_method(&self) -> SourceMethod {
        self.model.source_method()
    }

    /// Raw (unclamped) prediction for an unscaled feature vector
    pub fn predict(&self, features: &[f64]) -> std::result::Result<f64, Decline> {
        let scaled = self.scaler.transform(features)?;
        let raw = self.model.predict(&scaled)?;
        if !raw.is_finite() {
            return Err(Decline::MissingArtifact(format!(
                "model produced non-finite output: {}",
                raw
            )));
        }
        Ok(raw)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(Error::NotFound(path.display().to_string()));
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

//! Error types for Paisa
//!
//! `Error` is the ordinary library error. `Decline` is what an adapter returns
//! when it cannot answer; the strategy selector turns every decline into a
//! fallthrough to the next layer, so declines never reach API callers.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Reason an adapter declined to answer a request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Decline {
    /// Model, scaler, pipeline or credential is not loaded
    #[error("missing artifact: {0}")]
    MissingArtifact(String),

    /// Network failure, error status or malformed provider response
    #[error("external service error: {0}")]
    ExternalService(String),

    /// Not enough input for the method to produce an answer
    #[error("insufficient data: need {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// The adapter did not answer within its time budget
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl Decline {
    /// Short machine-readable label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Decline::MissingArtifact(_) => "missing_artifact",
            Decline::ExternalService(_) => "external_service",
            Decline::InsufficientData { .. } => "insufficient_data",
            Decline::Timeout(_) => "timeout",
        }
    }
}

impl From<Error> for Decline {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(e) => Decline::MissingArtifact(e.to_string()),
            Error::NotFound(what) => Decline::MissingArtifact(what),
            Error::Config(msg) => Decline::MissingArtifact(msg),
            Error::Http(e) => Decline::ExternalService(e.to_string()),
            Error::Json(e) => Decline::ExternalService(format!("malformed response: {}", e)),
            Error::InvalidData(msg) => Decline::ExternalService(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_to_decline() {
        let d: Decline = Error::NotFound("savings_predictor.json".into()).into();
        assert_eq!(d.kind(), "missing_artifact");

        let d: Decline = Error::InvalidData("bad labels".into()).into();
        assert_eq!(d, Decline::ExternalService("bad labels".into()));
    }

    #[test]
    fn test_decline_display() {
        let d = Decline::InsufficientData { needed: 10, got: 3 };
        assert_eq!(d.to_string(), "insufficient data: need 10, got 3");
        assert_eq!(
            Decline::Timeout(Duration::from_secs(5)).to_string(),
            "timed out after 5s"
        );
    }
}

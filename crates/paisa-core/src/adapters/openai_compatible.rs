//! OpenAI-compatible tip generator
//!
//! Works with any server that implements the OpenAI chat completions API.
//! Unavailable unless an API key is configured.
//!
//! # Configuration
//!
//! Environment variables:
//! - `OPENAI_API_KEY`: API key (required)
//! - `OPENAI_BASE_URL`: Server URL (default: https://api.openai.com)
//! - `OPENAI_MODEL`: Model name (default: gpt-3.5-turbo)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LlmConfig;
use crate::error::{Decline, Error, Result};
use crate::models::{Tip, TipContext};

use super::parsing::parse_tips;
use super::TipGenerator;

const SYSTEM_PROMPT: &str = "You are a financial advisor for low-income Indian families. \
Provide practical, culturally relevant advice.";

/// Chat-completions backed tip generator
#[derive(Clone)]
pub struct OpenAITipGenerator {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAITipGenerator {
    /// Create a generator against a base URL
    pub fn new(base_url: &str, model: &str, api_key: &str) -> Self {
        let defaults = LlmConfig::default();
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
        }
    }

    /// Build from config; None when no API key is set
    pub fn from_config(config: &LlmConfig, timeout: Duration) -> Option<Self> {
        let api_key = config.api_key.as_deref()?;
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Some(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: api_key.to_string(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    /// Make a chat completion request
    async fn chat_completion(&self, prompt: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::InvalidData(format!(
                "OpenAI API error {}: {}",
                status, body
            )));
        }

        let chat_response: ChatCompletionResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::InvalidData("No response from OpenAI API".into()))
    }
}

/// Display name used in the prompt for a language code
pub fn language_name(code: &str) -> &'static str {
    match code {
        "hi" => "Hindi (हिंदी)",
        "pb" => "Punjabi (ਪੰਜਾਬੀ)",
        _ => "English",
    }
}

/// Build the tip prompt for a language and optional user context
pub fn build_prompt(language: &str, context: Option<&TipContext>) -> String {
    let context_line = context
        .map(|c| {
            format!(
                "User has monthly income of ₹{} and saves {}% monthly.",
                c.income, c.savings_rate
            )
        })
        .unwrap_or_default();

    format!(
        "Generate 5 practical financial tips for micro-investment and savings in {} \
for low-income users in India. {}

Focus on:
1. Daily savings (₹10-₹50)
2. Fraud prevention
3. Emergency fund building
4. Simple investment options
5. Budgeting for Indian families

Format as JSON array with title and content fields.",
        language_name(language),
        context_line
    )
}

#[async_trait]
impl TipGenerator for OpenAITipGenerator {
    async fn generate(
        &self,
        language: &str,
        context: Option<&TipContext>,
    ) -> std::result::Result<Vec<Tip>, Decline> {
        let prompt = build_prompt(language, context);
        let response = self.chat_completion(&prompt).await?;
        debug!(model = %self.model, chars = response.len(), "LLM tip response received");
        Ok(parse_tips(&response, language)?)
    }

    fn name(&self) -> &str {
        "openai_compatible"
    }
}

// ============================================================================
// API types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockInferenceServer;

    #[test]
    fn test_language_names() {
        assert_eq!(language_name("en"), "English");
        assert_eq!(language_name("hi"), "Hindi (हिंदी)");
        assert_eq!(language_name("pb"), "Punjabi (ਪੰਜਾਬੀ)");
        assert_eq!(language_name("ta"), "English");
    }

    #[test]
    fn test_prompt_context() {
        let ctx = TipContext {
            income: 18000.0,
            savings_rate: 12.0,
        };
        let prompt = build_prompt("hi", Some(&ctx));
        assert!(prompt.contains("in Hindi (हिंदी) for low-income users"));
        assert!(prompt.contains("User has monthly income of ₹18000 and saves 12% monthly."));

        let prompt = build_prompt("en", None);
        assert!(!prompt.contains("User has monthly income"));
        assert!(prompt.ends_with("Format as JSON array with title and content fields."));
    }

    #[test]
    fn test_unavailable_without_key() {
        assert!(OpenAITipGenerator::from_config(&LlmConfig::default(), Duration::from_secs(1))
            .is_none());
    }

    #[tokio::test]
    async fn test_generate_against_mock_server() {
        let server = MockInferenceServer::start().await;
        let generator = OpenAITipGenerator::new(&server.url(), "gpt-3.5-turbo", "sk-test");

        let tips = generator.generate("pb", None).await.unwrap();
        assert!(!tips.is_empty());
        assert!(tips.iter().all(|t| t.language == "pb"));
        assert!(tips.iter().all(|t| t.category == "ai_generated"));
    }

    #[tokio::test]
    async fn test_server_error_declines() {
        let server = MockInferenceServer::start_failing().await;
        let generator = OpenAITipGenerator::new(&server.url(), "gpt-3.5-turbo", "sk-test");

        let err = generator.generate("en", None).await.unwrap_err();
        assert_eq!(err.kind(), "external_service");
    }

    #[tokio::test]
    async fn test_unreachable_host_declines() {
        let generator = OpenAITipGenerator::new("http://127.0.0.1:1", "gpt-3.5-turbo", "sk-test");
        let err = generator.generate("en", None).await.unwrap_err();
        assert_eq!(err.kind(), "external_service");
    }

    #[tokio::test]
    async fn test_prose_reply_declines() {
        let server = MockInferenceServer::start_malformed().await;
        let generator = OpenAITipGenerator::new(&server.url(), "gpt-3.5-turbo", "sk-test");

        let err = generator.generate("hi", None).await.unwrap_err();
        assert_eq!(err.kind(), "external_service");
    }
}

//! Test utilities for paisa-core
//!
//! Provides a mock inference server speaking both provider protocols the
//! adapters use: OpenAI chat completions and Hugging Face zero-shot
//! classification. Usable from integration tests and local development.

use axum::{
    extract::Json,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use tokio::sync::oneshot;

/// Mock inference server for testing and development
pub struct MockInferenceServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockInferenceServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let app = Router::new()
            .route("/v1/chat/completions", post(handle_chat))
            .route("/models/*model", post(handle_zero_shot));
        Self::serve(app).await
    }

    /// Start a server that answers every request with HTTP 503
    pub async fn start_failing() -> Self {
        let app = Router::new()
            .route("/v1/chat/completions", post(handle_unavailable))
            .route("/models/*model", post(handle_unavailable));
        Self::serve(app).await
    }

    /// Start a server that answers with well-formed HTTP but unusable payloads
    pub async fn start_malformed() -> Self {
        let app = Router::new()
            .route("/v1/chat/completions", post(handle_chat_prose))
            .route("/models/*model", post(handle_zero_shot_mismatched));
        Self::serve(app).await
    }

    async fn serve(app: Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockInferenceServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ZeroShotRequest {
    inputs: String,
    parameters: ZeroShotParameters,
}

#[derive(Debug, Deserialize)]
struct ZeroShotParameters {
    candidate_labels: Vec<String>,
}

fn chat_response(model: &str, content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion",
        "model": model,
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

/// Chat completions: three tips, wrapped in prose like a real model would
async fn handle_chat(Json(request): Json<ChatRequest>) -> Json<serde_json::Value> {
    let prompt = request
        .messages
        .last()
        .map(|m| m.content.as_str())
        .unwrap_or_default();
    let income_note = if prompt.contains("User has monthly income") {
        "Based on your income, "
    } else {
        ""
    };

    let tips = json!([
        {"title": "Save ₹20 a day", "content": format!("{}set aside ₹20 every morning before spending.", income_note)},
        {"title": "Guard your UPI PIN", "content": "Never share your UPI PIN or OTP with anyone."},
        {"title": "Build a small cushion", "content": "Keep one month of expenses in a separate account."}
    ]);
    let content = format!("Here are some tips:\n```json\n{}\n```", tips);

    Json(chat_response(&request.model, &content))
}

/// Chat completions that never contain a JSON array
async fn handle_chat_prose(Json(request): Json<ChatRequest>) -> Json<serde_json::Value> {
    Json(chat_response(
        &request.model,
        "Sorry, I can only answer in prose today.",
    ))
}

/// Zero-shot classification by keyword, scores sorted descending
async fn handle_zero_shot(Json(request): Json<ZeroShotRequest>) -> Json<serde_json::Value> {
    let text = request.inputs.to_lowercase();
    let winner = if text.contains("zomato") || text.contains("swiggy") || text.contains("movie") {
        "Discretionary"
    } else if text.contains("loan") || text.contains("emi") {
        "Debt"
    } else if text.contains("salary") {
        "Income"
    } else {
        "Essential"
    };

    let mut labels = vec![winner.to_string()];
    labels.extend(
        request
            .parameters
            .candidate_labels
            .iter()
            .filter(|l| l.as_str() != winner)
            .cloned(),
    );
    let rest = if labels.len() > 1 {
        0.1 / (labels.len() - 1) as f64
    } else {
        0.0
    };
    let scores: Vec<f64> = (0..labels.len())
        .map(|i| if i == 0 { 0.9 } else { rest })
        .collect();

    Json(json!({
        "sequence": request.inputs,
        "labels": labels,
        "scores": scores
    }))
}

/// Zero-shot response whose label and score counts disagree
async fn handle_zero_shot_mismatched() -> Json<serde_json::Value> {
    Json(json!({
        "labels": ["Essential", "Debt"],
        "scores": [0.7]
    }))
}

async fn handle_unavailable() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({"error": "Model is currently loading"})),
    )
        .into_response()
}

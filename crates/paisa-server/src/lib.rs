//! Paisa Web Server
//!
//! Axum-based REST API exposing the fallback decision core under `/ai`.
//!
//! - Every capability endpoint answers 200 with a well-formed body; malformed
//!   or missing request bodies are replaced with defaults
//! - Optional bearer API-key auth (`PAISA_API_KEYS`), compared in constant time
//! - CORS per configured origins, permissive when none are configured
//! - Request tracing via `tower-http`

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use paisa_core::StrategySelector;

mod handlers;

/// Authorization header for API key auth
const AUTHORIZATION_HEADER: &str = "authorization";

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = any origin)
    pub allowed_origins: Vec<String>,
    /// API keys accepted as `Authorization: Bearer <key>`.
    /// Auth is only enforced when at least one key is configured.
    pub api_keys: Vec<String>,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("allowed_origins", &self.allowed_origins)
            .field("api_keys", &format!("<{} redacted>", self.api_keys.len()))
            .finish()
    }
}

impl ServerConfig {
    /// Read `PAISA_API_KEYS` and `PAISA_ALLOWED_ORIGINS` (both comma-separated)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            allowed_origins: split_list(lookup("PAISA_ALLOWED_ORIGINS")),
            api_keys: split_list(lookup("PAISA_API_KEYS")),
        }
    }

    pub fn auth_enabled(&self) -> bool {
        !self.api_keys.is_empty()
    }
}

fn split_list(value: Option<String>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Shared application state
pub struct AppState {
    pub selector: StrategySelector,
    pub config: ServerConfig,
}

/// Authentication middleware - validates a bearer API key when keys are configured
///
/// Keys are compared using constant-time comparison to prevent timing attacks.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.auth_enabled() {
        return next.run(request).await;
    }

    let api_key_valid = request
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|key| validate_api_key(key.trim(), &state.config.api_keys))
        .unwrap_or(false);

    if api_key_valid {
        tracing::debug!(path = %request.uri().path(), "Authenticated via API key");
        return next.run(request).await;
    }

    warn!(path = %request.uri().path(), "Unauthorized request - no valid API key");
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "Authentication required"
        })),
    )
        .into_response()
}

/// Validate an API key against the configured keys
///
/// Uses constant-time comparison for same-length keys.
fn validate_api_key(provided: &str, valid_keys: &[String]) -> bool {
    use subtle::ConstantTimeEq;

    let provided_bytes = provided.as_bytes();

    for key in valid_keys {
        let key_bytes = key.as_bytes();
        // Only compare if lengths match (constant-time for same-length keys)
        if provided_bytes.len() == key_bytes.len() && bool::from(provided_bytes.ct_eq(key_bytes)) {
            return true;
        }
    }
    false
}

/// Create the application router
pub fn create_router(selector: StrategySelector, config: ServerConfig) -> Router {
    let cors = build_cors(&config);
    let state = Arc::new(AppState { selector, config });

    let capability_routes = Router::new()
        .route("/predict-savings", post(handlers::predict_savings))
        .route("/forecast-goal", post(handlers::forecast_goal))
        .route("/categorize-merchant", post(handlers::categorize_merchant))
        .route("/generate-tips", post(handlers::generate_tips))
        .route("/analyze-patterns", post(handlers::analyze_patterns))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Health stays open so load balancers can probe without a key
    let ai_routes = capability_routes.route("/health", get(handlers::health));

    Router::new()
        .nest("/ai", ai_routes)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

fn build_cors(config: &ServerConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if config.allowed_origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

/// Start the server
pub async fn serve(
    selector: StrategySelector,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if config.auth_enabled() {
        info!("🔑 API key auth enabled ({} key(s))", config.api_keys.len());
    } else {
        warn!("⚠️  No API keys configured (PAISA_API_KEYS) - endpoints are open");
    }

    log_availability(&selector);

    let app = create_router(selector, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Log which optional layers will answer and which fall back
fn log_availability(selector: &StrategySelector) {
    let health = selector.health();
    let config = selector.config();

    if health.models_loaded > 0 {
        info!("✅ Savings model loaded from {}", config.model_dir.display());
    } else {
        info!(
            "ℹ️  Savings model not found in {} (using surplus rules)",
            config.model_dir.display()
        );
    }

    if health.nlp_available {
        info!(
            "✅ Zero-shot classifier: {} ({})",
            config.classifier.host, config.classifier.model
        );
    } else {
        info!("ℹ️  Zero-shot classifier not configured (set ZERO_SHOT_HOST or HF_API_TOKEN)");
    }

    if health.llm_available {
        info!("✅ LLM tips: {} ({})", config.llm.base_url, config.llm.model);
    } else {
        info!("ℹ️  LLM tips not configured (set OPENAI_API_KEY to enable)");
    }

    if !health.seasonal_forecaster_available {
        info!("ℹ️  Seasonal forecaster disabled (using simple goal projection)");
    }
}

#[cfg(test)]
mod tests;

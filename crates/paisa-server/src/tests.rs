//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use paisa_core::{
    adapters::{FailingAdapter, MockClassifier},
    test_utils::MockInferenceServer,
    AdapterRegistry, Category, Config, Decline, OpenAITipGenerator, RuleEngine,
    ZeroShotClassifier,
};
use tower::ServiceExt;

fn deterministic_selector(registry: AdapterRegistry) -> StrategySelector {
    let mut config = Config::embedded().unwrap();
    config.goals.seasonal_enabled = false;
    StrategySelector::new(config, RuleEngine::new().unwrap(), registry)
}

fn setup_test_app() -> Router {
    create_router(
        deterministic_selector(AdapterRegistry::empty()),
        ServerConfig::default(),
    )
}

fn setup_authed_app() -> Router {
    let config = ServerConfig {
        api_keys: vec!["test-key-123".to_string()],
        ..Default::default()
    };
    create_router(deterministic_selector(AdapterRegistry::empty()), config)
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn post_raw(uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

// ========== Health ==========

#[tokio::test]
async fn test_health() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/ai/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["models_loaded"], 0);
    assert_eq!(json["nlp_available"], false);
    assert_eq!(json["llm_available"], false);
    assert_eq!(json["seasonal_forecaster_available"], false);
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_health_reports_registered_adapters() {
    let registry = AdapterRegistry::empty()
        .with_classifier(MockClassifier::new(Category::Debt, 0.9));
    let app = create_router(deterministic_selector(registry), ServerConfig::default());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/ai/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["nlp_available"], true);
}

// ========== Savings ==========

#[tokio::test]
async fn test_predict_savings() {
    let app = setup_test_app();

    // Surplus 40000 - 5000 = 35000 is above the high threshold
    let response = app
        .oneshot(post_json(
            "/ai/predict-savings",
            serde_json::json!({"income": 40000, "rent": 5000, "emi": 0}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["amount"], 45);
    assert_eq!(json["confidence"], "High");
    assert_eq!(json["source_method"], "surplus_rules");
    assert_eq!(json["ml_prediction"], false);
    assert!(json.get("raw_prediction").is_none());
}

#[tokio::test]
async fn test_predict_savings_without_body_uses_defaults() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/ai/predict-savings")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    // Defaults: 25000 - (8000 + 3000) = 14000 surplus
    let json = get_body_json(response).await;
    assert_eq!(json["amount"], 30);
    assert_eq!(json["confidence"], "Medium");
}

#[tokio::test]
async fn test_predict_savings_malformed_json_uses_defaults() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_raw("/ai/predict-savings", "{income: oops"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["amount"], 30);
}

// ========== Goals ==========

#[tokio::test]
async fn test_forecast_goal_without_transactions() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json("/ai/forecast-goal", serde_json::json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["months_to_goal"], 12.0);
    assert_eq!(json["confidence"], "Low");
    assert_eq!(json["source_method"], "simple");
}

#[tokio::test]
async fn test_forecast_goal_with_transactions() {
    let app = setup_test_app();

    // 2 expenses averaging 1000 -> 30000/month -> 3000 saved -> 3 months
    let body = serde_json::json!({
        "transactions": [
            {"date": "2024-03-01", "amount": -1500, "category": "Essential"},
            {"date": "2024-03-02", "amount": -500, "category": "Discretionary"},
            {"date": "2024-03-03", "amount": 20000, "category": "Income"}
        ],
        "goal_amount": 9000
    });
    let response = app
        .oneshot(post_json("/ai/forecast-goal", body))
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["estimated_monthly_savings"], 3000.0);
    assert_eq!(json["months_to_goal"], 3.0);
    assert_eq!(json["confidence"], "Low");
}

// ========== Categorization ==========

#[tokio::test]
async fn test_categorize_merchant_by_rules() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/ai/categorize-merchant",
            serde_json::json!({"merchant": "Swiggy", "description": "dinner"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["category"], "Discretionary");
    assert_eq!(json["confidence"], 0.8);
    assert_eq!(json["source_method"], "rule_based");
}

#[tokio::test]
async fn test_categorize_merchant_failing_classifier_falls_back() {
    let registry = AdapterRegistry::empty().with_classifier(FailingAdapter::new(
        Decline::ExternalService("connection refused".into()),
    ));
    let app = create_router(deterministic_selector(registry), ServerConfig::default());

    let response = app
        .oneshot(post_json(
            "/ai/categorize-merchant",
            serde_json::json!({"merchant": "Home Loan EMI"}),
        ))
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["category"], "Debt");
    assert_eq!(json["source_method"], "rule_based");
}

#[tokio::test]
async fn test_categorize_merchant_with_classifier() {
    let registry =
        AdapterRegistry::empty().with_classifier(MockClassifier::new(Category::Essential, 0.76));
    let app = create_router(deterministic_selector(registry), ServerConfig::default());

    let response = app
        .oneshot(post_json(
            "/ai/categorize-merchant",
            serde_json::json!({"merchant": "Apollo Pharmacy"}),
        ))
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["category"], "Essential");
    assert_eq!(json["confidence"], 0.76);
    assert_eq!(json["source_method"], "nlp");
    assert!(json["all_scores"].is_object());
}

#[tokio::test]
async fn test_categorize_merchant_through_inference_server() {
    let server = MockInferenceServer::start().await;
    let registry = AdapterRegistry::empty().with_classifier(ZeroShotClassifier::new(
        &server.url(),
        "facebook/bart-large-mnli",
    ));
    let app = create_router(deterministic_selector(registry), ServerConfig::default());

    let response = app
        .oneshot(post_json(
            "/ai/categorize-merchant",
            serde_json::json!({"merchant": "Personal loan", "description": "EMI"}),
        ))
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["category"], "Debt");
    assert_eq!(json["confidence"], 0.9);
    assert_eq!(json["source_method"], "nlp");
}

#[tokio::test]
async fn test_unusable_inference_payloads_fall_back() {
    let server = MockInferenceServer::start_malformed().await;
    let registry = AdapterRegistry::empty()
        .with_classifier(ZeroShotClassifier::new(
            &server.url(),
            "facebook/bart-large-mnli",
        ))
        .with_tip_generator(OpenAITipGenerator::new(
            &server.url(),
            "gpt-3.5-turbo",
            "sk-test",
        ));
    let app = create_router(deterministic_selector(registry), ServerConfig::default());

    let response = app
        .clone()
        .oneshot(post_json(
            "/ai/categorize-merchant",
            serde_json::json!({"merchant": "Zomato"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["category"], "Discretionary");
    assert_eq!(json["source_method"], "rule_based");

    let response = app
        .oneshot(post_json(
            "/ai/generate-tips",
            serde_json::json!({"language": "pb"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let tips = json["tips"].as_array().unwrap();
    assert_eq!(tips.len(), 2);
    assert!(tips.iter().all(|t| t["source_method"] == "static_tips"));
}

// ========== Tips ==========

#[tokio::test]
async fn test_generate_tips_in_hindi() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/ai/generate-tips",
            serde_json::json!({"language": "hi"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let tips = json["tips"].as_array().unwrap();
    assert_eq!(tips.len(), 3);
    assert!(tips.iter().all(|t| t["language"] == "hi"));
    assert!(tips.iter().all(|t| t["source_method"] == "static_tips"));
}

#[tokio::test]
async fn test_generate_tips_unknown_language_gets_english() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/ai/generate-tips",
            serde_json::json!({"language": "xx"}),
        ))
        .await
        .unwrap();

    let json = get_body_json(response).await;
    let tips = json["tips"].as_array().unwrap();
    assert_eq!(tips.len(), 5);
    assert_eq!(tips[0]["language"], "en");
}

// ========== Patterns ==========

#[tokio::test]
async fn test_analyze_patterns_empty() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/ai/analyze-patterns",
            serde_json::json!({"transactions": []}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["patterns"], serde_json::json!([]));
    assert_eq!(json["insights"], serde_json::json!([]));
    assert_eq!(json["recommendations"], serde_json::json!([]));
    assert!(json.get("analysis_date").is_none());
}

#[tokio::test]
async fn test_analyze_patterns_with_transactions() {
    let app = setup_test_app();

    // 2024-03-09 is a Saturday
    let body = serde_json::json!({
        "transactions": [
            {"date": "2024-03-09T23:10:00", "amount": -900, "category": "Discretionary", "merchant": "Zomato"},
            {"date": "2024-03-11T10:00:00", "amount": -100, "category": "Essential", "merchant": "Kirana"}
        ]
    });
    let response = app
        .oneshot(post_json("/ai/analyze-patterns", body))
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["patterns"]["highest_spending_day"], "Saturday");
    assert_eq!(json["patterns"]["peak_spending_hour"], 23);
    assert!(json["analysis_date"].is_string());
}

// ========== Routing ==========

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/ai/does-not-exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ========== Auth ==========

#[tokio::test]
async fn test_auth_rejects_missing_key() {
    let app = setup_authed_app();

    let response = app
        .oneshot(post_json("/ai/predict-savings", serde_json::json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Authentication required");
}

#[tokio::test]
async fn test_auth_rejects_wrong_key() {
    let app = setup_authed_app();

    let mut request = post_json("/ai/predict-savings", serde_json::json!({}));
    request
        .headers_mut()
        .insert("authorization", "Bearer wrong-key-123".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_accepts_valid_key() {
    let app = setup_authed_app();

    let mut request = post_json("/ai/predict-savings", serde_json::json!({}));
    request
        .headers_mut()
        .insert("authorization", "Bearer test-key-123".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_is_open_when_auth_enabled() {
    let app = setup_authed_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/ai/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[test]
fn test_validate_api_key() {
    let keys = vec!["alpha-key".to_string(), "beta".to_string()];
    assert!(validate_api_key("alpha-key", &keys));
    assert!(validate_api_key("beta", &keys));
    assert!(!validate_api_key("alpha-kez", &keys));
    assert!(!validate_api_key("alpha", &keys));
    assert!(!validate_api_key("", &keys));
    assert!(!validate_api_key("beta", &[]));
}

// ========== Config ==========

#[test]
fn test_server_config_from_lookup() {
    let config = ServerConfig::from_lookup(|name| match name {
        "PAISA_API_KEYS" => Some(" key-one, ,key-two ".to_string()),
        "PAISA_ALLOWED_ORIGINS" => Some("https://app.example.in".to_string()),
        _ => None,
    });
    assert_eq!(config.api_keys, vec!["key-one", "key-two"]);
    assert_eq!(config.allowed_origins, vec!["https://app.example.in"]);
    assert!(config.auth_enabled());

    let open = ServerConfig::from_lookup(|_| None);
    assert!(!open.auth_enabled());
    assert!(open.allowed_origins.is_empty());
}

#[test]
fn test_server_config_debug_redacts_keys() {
    let config = ServerConfig {
        api_keys: vec!["super-secret".to_string()],
        ..Default::default()
    };
    let debug = format!("{:?}", config);
    assert!(!debug.contains("super-secret"));
}

#[tokio::test]
async fn test_cors_preflight_allows_any_origin_by_default() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/ai/predict-savings")
                .header("origin", "https://paisa.example.in")
                .header("access-control-request-method", "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}

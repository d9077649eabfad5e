//! Status command implementation

use anyhow::Result;
use paisa_core::StrategySelector;

pub fn cmd_status(selector: &StrategySelector) -> Result<()> {
    let health = selector.health();
    let summary = selector.config().summary();
    let setting = |key: &str| summary.get(key).map(String::as_str).unwrap_or("-");
    let mark = |available: bool| if available { "✅" } else { "➖" };

    println!();
    println!("📊 Paisa Status (v{})", health.version);
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Savings bounds: {}", setting("savings_bounds"));
    println!("   Model directory: {}", setting("model_dir"));
    println!();
    println!("   Layers:");
    println!(
        "   {} Savings model ({} loaded, else surplus rules)",
        mark(health.models_loaded > 0),
        health.models_loaded
    );
    println!(
        "   {} Zero-shot classifier: {} (else keyword rules)",
        mark(health.nlp_available),
        setting("classifier_model")
    );
    println!(
        "   {} LLM tips: {} (else static tips)",
        mark(health.llm_available),
        setting("llm_model")
    );
    println!(
        "   {} Seasonal forecaster (else simple projection)",
        mark(health.seasonal_forecaster_available)
    );

    let languages = selector.rules().languages();
    println!();
    println!("   Tip languages: {}", languages.join(", "));

    if !health.llm_available {
        println!();
        println!("   Set OPENAI_API_KEY to enable generated tips");
    }

    Ok(())
}

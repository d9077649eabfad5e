//! Server command implementation

use anyhow::Result;
use paisa_core::StrategySelector;

pub async fn cmd_serve(selector: StrategySelector, host: &str, port: u16) -> Result<()> {
    let config = paisa_server::ServerConfig::from_env();

    println!("🚀 Starting Paisa web server...");
    println!("   Listening: http://{}:{}/ai", host, port);
    if config.auth_enabled() {
        println!(
            "   🔑 API keys: {} configured (PAISA_API_KEYS)",
            config.api_keys.len()
        );
    } else {
        println!();
        println!("   ⚠️  Authentication DISABLED - set PAISA_API_KEYS before exposing to a network");
    }
    if !config.allowed_origins.is_empty() {
        println!(
            "   🌐 CORS origins: {} (PAISA_ALLOWED_ORIGINS)",
            config.allowed_origins.join(", ")
        );
    }
    println!();
    println!("   Press Ctrl+C to stop");

    paisa_server::serve(selector, host, port, config).await?;

    Ok(())
}

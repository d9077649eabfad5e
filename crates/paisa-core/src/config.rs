//! Service configuration
//!
//! Config is resolved in three layers:
//! 1. Embedded defaults (`config/paisa.toml`, compiled into the binary)
//! 2. Override file: explicit path, `PAISA_CONFIG`, or
//!    `~/.local/share/paisa/config/paisa.toml`. Only keys present are applied.
//! 3. Environment variables for provider hosts, models and credentials
//!
//! The resulting `Config` is immutable for the lifetime of the process.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/paisa.toml");

/// Values substituted for missing or malformed profile fields
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileDefaults {
    pub income: f64,
    pub rent: f64,
    pub emi: f64,
    pub age: f64,
    pub family_size: f64,
    pub location_tier: f64,
}

impl Default for ProfileDefaults {
    fn default() -> Self {
        Self {
            income: 25000.0,
            rent: 8000.0,
            emi: 3000.0,
            age: 30.0,
            family_size: 3.0,
            location_tier: 2.0,
        }
    }
}

/// Savings prediction settings
#[derive(Debug, Clone, PartialEq)]
pub struct SavingsConfig {
    pub min_amount: u32,
    pub max_amount: u32,
    /// Raw model output in this range is High confidence
    pub high_band: (f64, f64),
    /// Raw model output in this range (but outside `high_band`) is Medium
    pub medium_band: (f64, f64),
    pub high_surplus: f64,
    pub medium_surplus: f64,
    pub high_amount: u32,
    pub medium_amount: u32,
    pub low_amount: u32,
    pub defaults: ProfileDefaults,
}

impl Default for SavingsConfig {
    fn default() -> Self {
        Self {
            min_amount: 10,
            max_amount: 50,
            high_band: (20.0, 40.0),
            medium_band: (15.0, 45.0),
            high_surplus: 15000.0,
            medium_surplus: 8000.0,
            high_amount: 45,
            medium_amount: 30,
            low_amount: 15,
            defaults: ProfileDefaults::default(),
        }
    }
}

impl SavingsConfig {
    /// Clamp an amount into the configured bounds
    pub fn clamp(&self, amount: u32) -> u32 {
        amount.clamp(self.min_amount, self.max_amount)
    }
}

/// Goal forecasting settings
#[derive(Debug, Clone, PartialEq)]
pub struct GoalConfig {
    pub default_goal_amount: f64,
    /// Fraction of monthly expense assumed saveable
    pub savings_rate: f64,
    pub days_per_month: f64,
    pub simple_floor: f64,
    pub seasonal_floor: f64,
    pub medium_confidence_expenses: usize,
    pub min_seasonal_points: usize,
    pub high_confidence_points: usize,
    pub horizon_days: u32,
    pub seasonal_enabled: bool,
    pub default_months: f64,
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self {
            default_goal_amount: 50000.0,
            savings_rate: 0.10,
            days_per_month: 30.0,
            simple_floor: 500.0,
            seasonal_floor: 1000.0,
            medium_confidence_expenses: 5,
            min_seasonal_points: 10,
            high_confidence_points: 30,
            horizon_days: 365,
            seasonal_enabled: true,
            default_months: 12.0,
        }
    }
}

/// Spending pattern thresholds
#[derive(Debug, Clone, PartialEq)]
pub struct PatternConfig {
    /// Peak hours strictly after this count as late night
    pub late_night_hour: u32,
    pub essential_ratio: f64,
    pub frequency_per_day: f64,
    /// Days the transaction list is assumed to cover
    pub window_days: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            late_night_hour: 20,
            essential_ratio: 0.7,
            frequency_per_day: 3.0,
            window_days: 30.0,
        }
    }
}

/// Per-adapter time budgets
#[derive(Debug, Clone, PartialEq)]
pub struct TimeoutConfig {
    pub classifier: Duration,
    pub llm: Duration,
    pub forecaster: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            classifier: Duration::from_secs(10),
            llm: Duration::from_secs(30),
            forecaster: Duration::from_secs(5),
        }
    }
}

/// Zero-shot classification service
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    pub enabled: bool,
    pub host: String,
    pub model: String,
    pub api_token: Option<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "https://api-inference.huggingface.co".to_string(),
            model: "facebook/bart-large-mnli".to_string(),
            api_token: None,
        }
    }
}

/// OpenAI-compatible chat completion service
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            api_key: None,
            max_tokens: 1500,
            temperature: 0.7,
        }
    }
}

/// Complete service configuration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub savings: SavingsConfig,
    pub goals: GoalConfig,
    pub patterns: PatternConfig,
    pub timeouts: TimeoutConfig,
    pub classifier: ClassifierConfig,
    pub llm: LlmConfig,
    /// Directory holding `savings_predictor.json` and `scaler.json`
    pub model_dir: PathBuf,
}

impl Config {
    /// Load embedded defaults, the override file, then environment variables
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::from_toml(DEFAULT_CONFIG)?;

        // An explicitly named file must exist; the per-user default is optional
        let explicit = override_path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("PAISA_CONFIG").ok().map(PathBuf::from));
        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            Some(path) => Some(path),
            None => default_config_path().filter(|p| p.exists()),
        };

        if let Some(path) = path {
            let content = fs::read_to_string(&path)
                .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
            config.apply_toml(&content)?;
            tracing::info!(path = %path.display(), "Applied config override");
        }

        config.apply_env_with(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Embedded defaults only (no override file, no environment)
    pub fn embedded() -> Result<Self> {
        Self::from_toml(DEFAULT_CONFIG)
    }

    /// Parse a full config from TOML on top of the built-in defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config = Self {
            model_dir: PathBuf::from("models"),
            ..Default::default()
        };
        config.apply_toml(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply the keys present in a TOML document
    pub fn apply_toml(&mut self, content: &str) -> Result<()> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

        if let Some(s) = raw.savings {
            let c = &mut self.savings;
            set(&mut c.min_amount, s.min_amount);
            set(&mut c.max_amount, s.max_amount);
            set(&mut c.high_band, s.high_band.map(|[lo, hi]| (lo, hi)));
            set(&mut c.medium_band, s.medium_band.map(|[lo, hi]| (lo, hi)));
            set(&mut c.high_surplus, s.high_surplus);
            set(&mut c.medium_surplus, s.medium_surplus);
            set(&mut c.high_amount, s.high_amount);
            set(&mut c.medium_amount, s.medium_amount);
            set(&mut c.low_amount, s.low_amount);
            set(&mut c.defaults.income, s.default_income);
            set(&mut c.defaults.rent, s.default_rent);
            set(&mut c.defaults.emi, s.default_emi);
            set(&mut c.defaults.age, s.default_age);
            set(&mut c.defaults.family_size, s.default_family_size);
            set(&mut c.defaults.location_tier, s.default_location_tier);
        }

        if let Some(g) = raw.goals {
            let c = &mut self.goals;
            set(&mut c.default_goal_amount, g.default_goal_amount);
            set(&mut c.savings_rate, g.savings_rate);
            set(&mut c.days_per_month, g.days_per_month);
            set(&mut c.simple_floor, g.simple_floor);
            set(&mut c.seasonal_floor, g.seasonal_floor);
            set(&mut c.medium_confidence_expenses, g.medium_confidence_expenses);
            set(&mut c.min_seasonal_points, g.min_seasonal_points);
            set(&mut c.high_confidence_points, g.high_confidence_points);
            set(&mut c.horizon_days, g.horizon_days);
            set(&mut c.seasonal_enabled, g.seasonal_enabled);
            set(&mut c.default_months, g.default_months);
        }

        if let Some(p) = raw.patterns {
            let c = &mut self.patterns;
            set(&mut c.late_night_hour, p.late_night_hour);
            set(&mut c.essential_ratio, p.essential_ratio);
            set(&mut c.frequency_per_day, p.frequency_per_day);
            set(&mut c.window_days, p.window_days);
        }

        if let Some(t) = raw.timeouts {
            let c = &mut self.timeouts;
            set(&mut c.classifier, t.classifier_secs.map(Duration::from_secs));
            set(&mut c.llm, t.llm_secs.map(Duration::from_secs));
            set(&mut c.forecaster, t.forecaster_secs.map(Duration::from_secs));
        }

        if let Some(cl) = raw.classifier {
            let c = &mut self.classifier;
            set(&mut c.enabled, cl.enabled);
            set(&mut c.host, cl.host);
            set(&mut c.model, cl.model);
        }

        if let Some(l) = raw.llm {
            let c = &mut self.llm;
            set(&mut c.base_url, l.base_url);
            set(&mut c.model, l.model);
            set(&mut c.max_tokens, l.max_tokens);
            set(&mut c.temperature, l.temperature);
        }

        if let Some(server) = raw.server {
            set(&mut self.model_dir, server.model_dir.map(PathBuf::from));
        }

        Ok(())
    }

    /// Apply provider settings from environment-style lookups
    ///
    /// - `OPENAI_API_KEY`, `OPENAI_BASE_URL`, `OPENAI_MODEL`
    /// - `ZERO_SHOT_HOST`, `ZERO_SHOT_MODEL`, `HF_API_TOKEN`
    /// - `PAISA_MODEL_DIR`
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(key) = get("OPENAI_API_KEY") {
            self.llm.api_key = Some(key);
        }
        set(&mut self.llm.base_url, get("OPENAI_BASE_URL"));
        set(&mut self.llm.model, get("OPENAI_MODEL"));

        if let Some(host) = get("ZERO_SHOT_HOST") {
            self.classifier.host = host;
            self.classifier.enabled = true;
        }
        if let Some(token) = get("HF_API_TOKEN") {
            self.classifier.api_token = Some(token);
            self.classifier.enabled = true;
        }
        set(&mut self.classifier.model, get("ZERO_SHOT_MODEL"));

        set(&mut self.model_dir, get("PAISA_MODEL_DIR").map(PathBuf::from));
    }

    fn validate(&self) -> Result<()> {
        let s = &self.savings;
        if s.min_amount > s.max_amount {
            return Err(Error::Config(format!(
                "savings.min_amount ({}) exceeds savings.max_amount ({})",
                s.min_amount, s.max_amount
            )));
        }
        for (name, (lo, hi)) in [("high_band", s.high_band), ("medium_band", s.medium_band)] {
            if lo > hi {
                return Err(Error::Config(format!("savings.{} is inverted", name)));
            }
        }
        if self.goals.simple_floor <= 0.0 || self.goals.seasonal_floor <= 0.0 {
            return Err(Error::Config("goal floors must be positive".into()));
        }
        if self.patterns.window_days <= 0.0 || self.goals.days_per_month <= 0.0 {
            return Err(Error::Config("day counts must be positive".into()));
        }
        Ok(())
    }

    /// Summary of settings for `paisa status`
    pub fn summary(&self) -> HashMap<&'static str, String> {
        let mut out = HashMap::new();
        out.insert(
            "savings_bounds",
            format!("{}-{}", self.savings.min_amount, self.savings.max_amount),
        );
        out.insert("model_dir", self.model_dir.display().to_string());
        out.insert("classifier_model", self.classifier.model.clone());
        out.insert("llm_model", self.llm.model.clone());
        out
    }
}

fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *target = v;
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("paisa").join("config").join("paisa.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    savings: Option<RawSavings>,
    goals: Option<RawGoals>,
    patterns: Option<RawPatterns>,
    timeouts: Option<RawTimeouts>,
    classifier: Option<RawClassifier>,
    llm: Option<RawLlm>,
    server: Option<RawServer>,
}

#[derive(Debug, Deserialize)]
struct RawSavings {
    min_amount: Option<u32>,
    max_amount: Option<u32>,
    high_band: Option<[f64; 2]>,
    medium_band: Option<[f64; 2]>,
    high_surplus: Option<f64>,
    medium_surplus: Option<f64>,
    high_amount: Option<u32>,
    medium_amount: Option<u32>,
    low_amount: Option<u32>,
    default_income: Option<f64>,
    default_rent: Option<f64>,
    default_emi: Option<f64>,
    default_age: Option<f64>,
    default_family_size: Option<f64>,
    default_location_tier: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawGoals {
    default_goal_amount: Option<f64>,
    savings_rate: Option<f64>,
    days_per_month: Option<f64>,
    simple_floor: Option<f64>,
    seasonal_floor: Option<f64>,
    medium_confidence_expenses: Option<usize>,
    min_seasonal_points: Option<usize>,
    high_confidence_points: Option<usize>,
    horizon_days: Option<u32>,
    seasonal_enabled: Option<bool>,
    default_months: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawPatterns {
    late_night_hour: Option<u32>,
    essential_ratio: Option<f64>,
    frequency_per_day: Option<f64>,
    window_days: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawTimeouts {
    classifier_secs: Option<u64>,
    llm_secs: Option<u64>,
    forecaster_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawClassifier {
    enabled: Option<bool>,
    host: Option<String>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLlm {
    base_url: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct RawServer {
    model_dir: Option<String>,
}

//! Domain models for Paisa
//!
//! Request types deserialize leniently: a field that is missing, of the wrong
//! type or out of range becomes `None` and is later replaced by a configured
//! default. Capability requests never fail to parse because of their fields.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::config::ProfileDefaults;

/// Spending category label set
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Essential,
    Discretionary,
    Debt,
    Income,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Essential => "Essential",
            Self::Discretionary => "Discretionary",
            Self::Debt => "Debt",
            Self::Income => "Income",
        }
    }

    /// All labels, in rule priority order
    pub fn all() -> &'static [Category] {
        &[
            Self::Essential,
            Self::Discretionary,
            Self::Debt,
            Self::Income,
        ]
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "essential" => Ok(Self::Essential),
            "discretionary" => Ok(Self::Discretionary),
            "debt" => Ok(Self::Debt),
            "income" => Ok(Self::Income),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordinal confidence attached to savings and goal results
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which layer produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMethod {
    /// Random forest regression model
    RandomForest,
    /// Linear regression model
    LinearModel,
    /// Surplus-banded savings rules
    SurplusRules,
    /// Seasonal time-series forecaster
    Seasonal,
    /// Average-expense goal projection
    Simple,
    /// Zero-shot NLP classifier
    Nlp,
    /// Keyword categorization rules
    RuleBased,
    /// LLM text generation
    Llm,
    /// Static tip tables
    StaticTips,
    /// Threshold rules over spending aggregates
    PatternRules,
}

impl SourceMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RandomForest => "random_forest",
            Self::LinearModel => "linear_model",
            Self::SurplusRules => "surplus_rules",
            Self::Seasonal => "seasonal",
            Self::Simple => "simple",
            Self::Nlp => "nlp",
            Self::RuleBased => "rule_based",
            Self::Llm => "llm",
            Self::StaticTips => "static_tips",
            Self::PatternRules => "pattern_rules",
        }
    }

    /// Whether the result came from a learned model or external service
    /// rather than a deterministic fallback
    pub fn is_learned(&self) -> bool {
        matches!(
            self,
            Self::RandomForest | Self::LinearModel | Self::Seasonal | Self::Nlp | Self::Llm
        )
    }
}

impl std::fmt::Display for SourceMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Inputs
// ============================================================================

/// Raw profile fields as received from a caller
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileInput {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub income: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rent: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub emi: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub age: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub family_size: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub location_tier: Option<f64>,
}

/// A user's monthly financial situation, with defaults applied
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UserFinancialProfile {
    pub income: f64,
    pub rent: f64,
    pub emi: f64,
    pub age: f64,
    pub family_size: f64,
    /// 1 = metro, 2 = tier-1, 3 = tier-2
    pub location_tier: f64,
}

impl UserFinancialProfile {
    /// Apply defaults to every missing, negative or out-of-range field
    pub fn from_input(input: &ProfileInput, defaults: &ProfileDefaults) -> Self {
        let non_negative = |v: Option<f64>, d: f64| v.filter(|x| *x >= 0.0).unwrap_or(d);
        let tier = input
            .location_tier
            .filter(|t| [1.0, 2.0, 3.0].contains(t))
            .unwrap_or(defaults.location_tier);

        Self {
            income: non_negative(input.income, defaults.income),
            rent: non_negative(input.rent, defaults.rent),
            emi: non_negative(input.emi, defaults.emi),
            age: non_negative(input.age, defaults.age),
            family_size: non_negative(input.family_size, defaults.family_size),
            location_tier: tier,
        }
    }

    /// Model feature vector, in training column order
    pub fn features(&self) -> [f64; 6] {
        [
            self.income,
            self.rent,
            self.emi,
            self.age,
            self.family_size,
            self.location_tier,
        ]
    }

    /// Income left after fixed obligations, never negative
    pub fn surplus(&self) -> f64 {
        (self.income - (self.rent + self.emi)).max(0.0)
    }
}

/// A single bank/UPI transaction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// Local wall-clock time of the transaction
    pub date: NaiveDateTime,
    /// Negative for expenses, positive for income/credits
    pub amount: f64,
    pub category: Option<Category>,
    pub merchant: Option<String>,
    pub description: Option<String>,
}

impl Transaction {
    pub fn new(date: NaiveDateTime, amount: f64) -> Self {
        Self {
            date,
            amount,
            category: None,
            merchant: None,
            description: None,
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_merchant(mut self, merchant: &str) -> Self {
        self.merchant = Some(merchant.to_string());
        self
    }

    pub fn is_expense(&self) -> bool {
        self.amount < 0.0
    }

    /// Build from a loosely-typed JSON object; None if date or amount is unusable
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let date = obj.get("date").and_then(Value::as_str).and_then(parse_timestamp)?;
        let amount = obj.get("amount").and_then(number_from_value)?;
        let category = obj
            .get("category")
            .and_then(Value::as_str)
            .and_then(|c| c.parse().ok());
        let text = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .map(|s| s.to_string())
                .filter(|s| !s.is_empty())
        };

        Some(Self {
            date,
            amount,
            category,
            merchant: text("merchant"),
            description: text("description"),
        })
    }
}

/// Transaction years accepted from callers
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=2200;

/// Parse the timestamp formats callers send
///
/// Offsets are dropped after conversion so hour-of-day reflects the
/// caller's local time. Years outside 1900-2200 are rejected.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    parse_any_timestamp(s.trim()).filter(|dt| YEAR_RANGE.contains(&dt.year()))
}

fn parse_any_timestamp(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Accept JSON numbers and numeric strings; reject non-finite values
pub fn number_from_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|x| x.is_finite())
}

fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

fn lenient_transactions<'de, D>(deserializer: D) -> std::result::Result<Vec<Transaction>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(items)) = value else {
        return Ok(Vec::new());
    };

    let mut transactions = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match Transaction::from_value(item) {
            Some(tx) => transactions.push(tx),
            None => tracing::warn!(index, "Dropping transaction with unusable date or amount"),
        }
    }
    Ok(transactions)
}

/// Body of a goal forecast request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoalRequest {
    #[serde(default, deserialize_with = "lenient_transactions")]
    pub transactions: Vec<Transaction>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub goal_amount: Option<f64>,
}

/// Body of a merchant categorization request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategorizeRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub merchant: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
}

/// Body of a tip generation request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TipsRequest {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub user_context: Option<Value>,
}

impl TipsRequest {
    /// Language code, defaulting to English
    pub fn language(&self) -> &str {
        self.language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or("en")
    }

    /// Prompt context, present only when the caller sent a non-empty object
    pub fn context(&self) -> Option<TipContext> {
        let obj = self.user_context.as_ref()?.as_object()?;
        if obj.is_empty() {
            return None;
        }
        Some(TipContext {
            income: obj.get("income").and_then(number_from_value).unwrap_or(25000.0),
            savings_rate: obj
                .get("savings_rate")
                .and_then(number_from_value)
                .unwrap_or(10.0),
        })
    }
}

/// User context woven into LLM tip prompts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TipContext {
    pub income: f64,
    /// Percent of income saved monthly
    pub savings_rate: f64,
}

/// Body of a spending analysis request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatternsRequest {
    #[serde(default, deserialize_with = "lenient_transactions")]
    pub transactions: Vec<Transaction>,
}

// ============================================================================
// Results
// ============================================================================

/// Daily safe-to-save recommendation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavingsPrediction {
    pub amount: u32,
    pub confidence: Confidence,
    pub source_method: SourceMethod,
    pub ml_prediction: bool,
    /// Unclamped model output, when a model produced the answer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_prediction: Option<f64>,
}

/// Projection of when a savings goal will be reached
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalForecast {
    pub months_to_goal: f64,
    pub confidence: Confidence,
    pub estimated_monthly_savings: f64,
    pub source_method: SourceMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_avg_expense: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projected_daily_expense: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend_per_day: Option<f64>,
}

/// Category assigned to a merchant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorizationResult {
    pub category: Category,
    /// 0.0 - 1.0
    pub confidence: f64,
    pub source_method: SourceMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_scores: Option<BTreeMap<Category, f64>>,
}

/// A financial tip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tip {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub language: String,
    pub source_method: SourceMethod,
}

/// Aggregates computed over a transaction list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendingPatterns {
    /// Weekday name with the largest total expense
    pub highest_spending_day: Option<String>,
    /// Hour of day (0-23) with the largest total expense
    pub peak_spending_hour: Option<u32>,
    /// Mean expense magnitude
    pub avg_transaction_size: Option<f64>,
    pub spending_by_category: BTreeMap<Category, f64>,
}

/// Patterns plus the insights and recommendations derived from them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendingAnalysis {
    /// Serialized as `[]` when there was nothing to analyze
    #[serde(serialize_with = "patterns_or_empty")]
    pub patterns: Option<SpendingPatterns>,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
    pub source_method: SourceMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_date: Option<DateTime<Utc>>,
}

impl SpendingAnalysis {
    pub fn empty() -> Self {
        Self {
            patterns: None,
            insights: vec![],
            recommendations: vec![],
            source_method: SourceMethod::PatternRules,
            analysis_date: None,
        }
    }
}

fn patterns_or_empty<S>(
    patterns: &Option<SpendingPatterns>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match patterns {
        Some(p) => p.serialize(serializer),
        None => serializer.collect_seq(std::iter::empty::<()>()),
    }
}

/// Which optional subsystems are loaded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub models_loaded: usize,
    pub nlp_available: bool,
    pub llm_available: bool,
    pub seasonal_forecaster_available: bool,
    pub version: String,
}

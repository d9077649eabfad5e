//! Deterministic rule engine
//!
//! The terminal layer for categorization and tip generation. Every method is
//! total: any merchant string gets a category, any language code gets tips.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::models::{CategorizationResult, Category, SourceMethod, Tip};

/// Embedded static tip tables (compiled into binary)
const TIPS_TOML: &str = include_str!("../../../config/tips.toml");

/// Language used when a requested language has no table
pub const DEFAULT_LANGUAGE: &str = "en";

/// Confidence for a keyword hit
const MATCH_CONFIDENCE: f64 = 0.8;
/// Confidence for the no-match default
const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Keyword sets in priority order; the first category with a hit wins
const KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Essential,
        &[
            "bazaar",
            "kirana",
            "grocery",
            "medical",
            "pharmacy",
            "gas",
            "petrol",
            "electricity",
            "water",
            "milk",
            "dairy",
        ],
    ),
    (
        Category::Discretionary,
        &[
            "swiggy",
            "zomato",
            "restaurant",
            "movie",
            "shopping",
            "amazon",
            "flipkart",
            "myntra",
            "entertainment",
        ],
    ),
    (
        Category::Debt,
        &["emi", "loan", "credit", "bank", "lic", "insurance", "premium"],
    ),
    (
        Category::Income,
        &["salary", "freelance", "payment", "income", "credit"],
    ),
];

/// A tip as stored in the embedded table
#[derive(Debug, Clone, serde::Deserialize)]
struct TipEntry {
    id: String,
    title: String,
    content: String,
    category: String,
}

/// Keyword categorizer and static tip tables
#[derive(Debug, Clone)]
pub struct RuleEngine {
    tips: HashMap<String, Vec<TipEntry>>,
}

impl RuleEngine {
    /// Parse the embedded tip tables
    ///
    /// Fails if the tables do not parse or have no default-language entry.
    pub fn new() -> Result<Self> {
        Self::from_toml(TIPS_TOML)
    }

    /// Build from a tip table document keyed by language code
    pub fn from_toml(content: &str) -> Result<Self> {
        let tips: HashMap<String, Vec<TipEntry>> = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid tip table: {}", e)))?;

        match tips.get(DEFAULT_LANGUAGE) {
            Some(default) if !default.is_empty() => {}
            _ => {
                return Err(Error::Config(format!(
                    "Tip table has no '{}' entries",
                    DEFAULT_LANGUAGE
                )))
            }
        }

        Ok(Self { tips })
    }

    /// Categorize a merchant by keyword
    pub fn categorize(&self, merchant: &str) -> CategorizationResult {
        let merchant = merchant.to_lowercase();

        for (category, keywords) in KEYWORDS {
            if keywords.iter().any(|kw| merchant.contains(kw)) {
                return CategorizationResult {
                    category: *category,
                    confidence: MATCH_CONFIDENCE,
                    source_method: SourceMethod::RuleBased,
                    all_scores: None,
                };
            }
        }

        CategorizationResult {
            category: Category::Essential,
            confidence: DEFAULT_CONFIDENCE,
            source_method: SourceMethod::RuleBased,
            all_scores: None,
        }
    }

    /// Static tips for a language, falling back to the default table
    pub fn tips(&self, language: &str) -> Vec<Tip> {
        let (language, entries) = match self.tips.get(language) {
            Some(entries) if !entries.is_empty() => (language, entries),
            _ => (DEFAULT_LANGUAGE, &self.tips[DEFAULT_LANGUAGE]),
        };

        entries
            .iter()
            .map(|t| Tip {
                id: t.id.clone(),
                title: t.title.clone(),
                content: t.content.clone(),
                category: t.category.clone(),
                language: language.to_string(),
                source_method: SourceMethod::StaticTips,
            })
            .collect()
    }

    /// Language codes with a static table
    pub fn languages(&self) -> Vec<&str> {
        let mut langs: Vec<&str> = self.tips.keys().map(String::as_str).collect();
        langs.sort_unstable();
        langs
    }
}

//! Spending pattern analysis
//!
//! Aggregates expenses by weekday, hour and category, then applies threshold
//! rules to produce insights and recommendations. Total over any input.

use std::collections::BTreeMap;

use chrono::{Datelike, Timelike, Utc, Weekday};

use crate::config::PatternConfig;
use crate::models::{Category, SourceMethod, SpendingAnalysis, SpendingPatterns, Transaction};

const WEEKEND_INSIGHT: &str = "You spend more on weekends - consider weekend budgeting";
const LATE_NIGHT_INSIGHT: &str = "Late night spending detected - avoid impulse purchases";
const ESSENTIAL_PRAISE: &str = "Good job! 70%+ spending on essentials shows disciplined budgeting";
const REDUCE_DISCRETIONARY: &str = "Consider reducing discretionary spending to improve savings";
const HIGH_FREQUENCY: &str = "High transaction frequency detected - consider bulk purchases to save";

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Rule-based spending analyzer
#[derive(Debug, Clone, Default)]
pub struct PatternAnalyzer {
    config: PatternConfig,
}

impl PatternAnalyzer {
    pub fn new(config: PatternConfig) -> Self {
        Self { config }
    }

    /// Analyze a transaction list
    pub fn analyze(&self, transactions: &[Transaction]) -> SpendingAnalysis {
        if transactions.is_empty() {
            return SpendingAnalysis::empty();
        }

        let patterns = compute_patterns(transactions);
        let mut insights = Vec::new();
        let mut recommendations = Vec::new();

        if matches!(
            patterns.highest_spending_day.as_deref(),
            Some("Saturday") | Some("Sunday")
        ) {
            insights.push(WEEKEND_INSIGHT.to_string());
        }

        if patterns
            .peak_spending_hour
            .is_some_and(|h| h > self.config.late_night_hour)
        {
            insights.push(LATE_NIGHT_INSIGHT.to_string());
        }

        if essential_ratio(transactions) > self.config.essential_ratio {
            recommendations.push(ESSENTIAL_PRAISE.to_string());
        } else {
            recommendations.push(REDUCE_DISCRETIONARY.to_string());
        }

        let per_day = transactions.len() as f64 / self.config.window_days;
        if per_day > self.config.frequency_per_day {
            recommendations.push(HIGH_FREQUENCY.to_string());
        }

        tracing::debug!(
            transactions = transactions.len(),
            insights = insights.len(),
            recommendations = recommendations.len(),
            "Analyzed spending patterns"
        );

        SpendingAnalysis {
            patterns: Some(patterns),
            insights,
            recommendations,
            source_method: SourceMethod::PatternRules,
            analysis_date: Some(Utc::now()),
        }
    }
}

/// Aggregate expense magnitudes
///
/// Ties resolve to the earliest weekday (Monday first) and the earliest hour.
pub fn compute_patterns(transactions: &[Transaction]) -> SpendingPatterns {
    let mut by_day = [0.0f64; 7];
    let mut by_hour = [0.0f64; 24];
    let mut by_category: BTreeMap<Category, f64> = BTreeMap::new();
    let mut count = 0usize;
    let mut total = 0.0;

    for tx in transactions.iter().filter(|t| t.is_expense()) {
        let amount = tx.amount.abs();
        by_day[tx.date.weekday().num_days_from_monday() as usize] += amount;
        by_hour[tx.date.hour() as usize] += amount;
        if let Some(category) = tx.category {
            *by_category.entry(category).or_insert(0.0) += amount;
        }
        count += 1;
        total += amount;
    }

    if count == 0 {
        return SpendingPatterns {
            highest_spending_day: None,
            peak_spending_hour: None,
            avg_transaction_size: None,
            spending_by_category: by_category,
        };
    }

    let top_day = first_max(&by_day);
    let top_hour = first_max(&by_hour);

    SpendingPatterns {
        highest_spending_day: Some(weekday_name(WEEK[top_day]).to_string()),
        peak_spending_hour: Some(top_hour as u32),
        avg_transaction_size: Some(total / count as f64),
        spending_by_category: by_category,
    }
}

/// Net Essential-category amount relative to total expense magnitude
///
/// Essential credits (refunds, cashback) count against Essential spending.
pub fn essential_ratio(transactions: &[Transaction]) -> f64 {
    let essential: f64 = transactions
        .iter()
        .filter(|t| t.category == Some(Category::Essential))
        .map(|t| t.amount)
        .sum();
    let total: f64 = transactions
        .iter()
        .filter(|t| t.is_expense())
        .map(|t| t.amount.abs())
        .sum();

    if total > 0.0 {
        essential.abs() / total
    } else {
        0.0
    }
}

fn first_max(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

//! Closed-form savings and goal estimates
//!
//! These are the total fallbacks behind the model and seasonal layers: they
//! never decline and never see anything but already-defaulted inputs.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::config::{GoalConfig, SavingsConfig};
use crate::models::{
    Confidence, GoalForecast, SavingsPrediction, SourceMethod, Transaction, UserFinancialProfile,
};

/// Surplus-banded savings recommendation
pub fn fallback_savings(profile: &UserFinancialProfile, config: &SavingsConfig) -> SavingsPrediction {
    let surplus = profile.surplus();
    let (amount, confidence) = if surplus > config.high_surplus {
        (config.high_amount, Confidence::High)
    } else if surplus > config.medium_surplus {
        (config.medium_amount, Confidence::Medium)
    } else {
        (config.low_amount, Confidence::Low)
    };

    SavingsPrediction {
        amount: config.clamp(amount),
        confidence,
        source_method: SourceMethod::SurplusRules,
        ml_prediction: false,
        raw_prediction: None,
    }
}

/// Confidence band for a raw (unclamped) model output
pub fn band_confidence(raw: f64, config: &SavingsConfig) -> Confidence {
    let within = |(lo, hi): (f64, f64)| raw >= lo && raw <= hi;
    if within(config.high_band) {
        Confidence::High
    } else if within(config.medium_band) {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

/// Clamp a raw model output to the savings bounds
pub fn clamp_raw(raw: f64, config: &SavingsConfig) -> u32 {
    let rounded = raw.round();
    if rounded <= config.min_amount as f64 {
        config.min_amount
    } else if rounded >= config.max_amount as f64 {
        config.max_amount
    } else {
        rounded as u32
    }
}

/// Goal amount to use; missing, non-positive or non-finite becomes the default
pub fn resolve_goal(goal: Option<f64>, config: &GoalConfig) -> f64 {
    goal.filter(|g| g.is_finite() && *g > 0.0)
        .unwrap_or(config.default_goal_amount)
}

/// Project months to goal from the average expense per transaction
pub fn simple_goal_forecast(
    transactions: &[Transaction],
    goal: f64,
    config: &GoalConfig,
) -> GoalForecast {
    if transactions.is_empty() {
        return GoalForecast {
            months_to_goal: config.default_months,
            confidence: Confidence::Low,
            estimated_monthly_savings: 0.0,
            source_method: SourceMethod::Simple,
            daily_avg_expense: None,
            projected_daily_expense: None,
            trend_per_day: None,
        };
    }

    let expenses: Vec<f64> = transactions
        .iter()
        .filter(|t| t.is_expense())
        .map(|t| t.amount.abs())
        .collect();

    let avg_expense = expenses.iter().sum::<f64>() / expenses.len().max(1) as f64;
    let monthly_expense = avg_expense * config.days_per_month;
    let estimated = (monthly_expense * config.savings_rate).max(config.simple_floor);

    let confidence = if expenses.len() > config.medium_confidence_expenses {
        Confidence::Medium
    } else {
        Confidence::Low
    };

    GoalForecast {
        months_to_goal: round_to(goal / estimated, 1),
        confidence,
        estimated_monthly_savings: round_to(estimated, 2),
        source_method: SourceMethod::Simple,
        daily_avg_expense: None,
        projected_daily_expense: None,
        trend_per_day: None,
    }
}

/// Daily expense totals, oldest first
///
/// Only expense transactions contribute; days without expenses are absent.
pub fn daily_expense_series(transactions: &[Transaction]) -> Vec<(NaiveDate, f64)> {
    let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for tx in transactions.iter().filter(|t| t.is_expense()) {
        *by_day.entry(tx.date.date()).or_insert(0.0) += tx.amount.abs();
    }
    by_day.into_iter().collect()
}

/// Goal math over a daily expense series, annotated with the seasonal trend
pub fn seasonal_goal_forecast(
    series: &[(NaiveDate, f64)],
    trend: &SeasonalTrend,
    goal: f64,
    config: &GoalConfig,
) -> GoalForecast {
    let points = series.len();
    let daily_avg = series.iter().map(|(_, v)| v).sum::<f64>() / points.max(1) as f64;
    let monthly_expense = daily_avg * config.days_per_month;
    let estimated = (monthly_expense * config.savings_rate).max(config.seasonal_floor);

    let confidence = if points > config.high_confidence_points {
        Confidence::High
    } else {
        Confidence::Medium
    };

    GoalForecast {
        months_to_goal: round_to(goal / estimated, 1),
        confidence,
        estimated_monthly_savings: round_to(estimated, 2),
        source_method: SourceMethod::Seasonal,
        daily_avg_expense: Some(round_to(daily_avg, 2)),
        projected_daily_expense: Some(round_to(trend.projected_daily_mean, 2)),
        trend_per_day: Some(round_to(trend.trend_per_day, 4)),
    }
}

/// Output of a seasonal forecaster over a horizon
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalTrend {
    /// Mean forecast daily value over the horizon
    pub projected_daily_mean: f64,
    /// Slope of the fitted linear trend
    pub trend_per_day: f64,
    pub horizon_days: u32,
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProfileDefaults;
    use crate::models::ProfileInput;
    use chrono::NaiveDateTime;

    /// Profile with the given surplus over default rent and emi
    fn with_surplus(surplus: f64) -> UserFinancialProfile {
        let input = ProfileInput {
            income: Some(surplus + 11000.0),
            ..Default::default()
        };
        UserFinancialProfile::from_input(&input, &ProfileDefaults::default())
    }

    fn tx(date: &str, amount: f64) -> Transaction {
        let date = NaiveDateTime::parse_from_str(&format!("{} 12:00:00", date), "%Y-%m-%d %H:%M:%S")
            .unwrap();
        Transaction::new(date, amount)
    }

    #[test]
    fn test_fallback_savings_bands() {
        let cfg = SavingsConfig::default();

        let p = fallback_savings(&with_surplus(20000.0), &cfg);
        assert_eq!((p.amount, p.confidence), (45, Confidence::High));
        assert_eq!(p.source_method, SourceMethod::SurplusRules);
        assert!(!p.ml_prediction);

        let p = fallback_savings(&with_surplus(10000.0), &cfg);
        assert_eq!((p.amount, p.confidence), (30, Confidence::Medium));

        // Boundaries are exclusive
        let p = fallback_savings(&with_surplus(8000.0), &cfg);
        assert_eq!((p.amount, p.confidence), (15, Confidence::Low));
        let p = fallback_savings(&with_surplus(15000.0), &cfg);
        assert_eq!((p.amount, p.confidence), (30, Confidence::Medium));
    }

    #[test]
    fn test_band_confidence() {
        let cfg = SavingsConfig::default();
        assert_eq!(band_confidence(20.0, &cfg), Confidence::High);
        assert_eq!(band_confidence(40.0, &cfg), Confidence::High);
        assert_eq!(band_confidence(17.5, &cfg), Confidence::Medium);
        assert_eq!(band_confidence(45.0, &cfg), Confidence::Medium);
        assert_eq!(band_confidence(60.0, &cfg), Confidence::Low);
        assert_eq!(band_confidence(-3.0, &cfg), Confidence::Low);
    }

    #[test]
    fn test_clamp_raw() {
        let cfg = SavingsConfig::default();
        assert_eq!(clamp_raw(-12.0, &cfg), 10);
        assert_eq!(clamp_raw(27.6, &cfg), 28);
        assert_eq!(clamp_raw(120.0, &cfg), 50);
    }

    #[test]
    fn test_simple_forecast_empty() {
        let f = simple_goal_forecast(&[], 50000.0, &GoalConfig::default());
        assert_eq!(f.months_to_goal, 12.0);
        assert_eq!(f.confidence, Confidence::Low);
        assert_eq!(f.estimated_monthly_savings, 0.0);
    }

    #[test]
    fn test_simple_forecast_hand_computed() {
        // Six expenses averaging 300 -> monthly 9000 -> 10% = 900
        let txs: Vec<Transaction> = [-100.0, -200.0, -300.0, -400.0, -500.0, -300.0]
            .iter()
            .enumerate()
            .map(|(i, a)| tx(&format!("2024-01-{:02}", i + 1), *a))
            .chain(std::iter::once(tx("2024-01-10", 25000.0)))
            .collect();

        let f = simple_goal_forecast(&txs, 50000.0, &GoalConfig::default());
        assert_eq!(f.estimated_monthly_savings, 900.0);
        assert_eq!(f.months_to_goal, 55.6);
        assert_eq!(f.confidence, Confidence::Medium);
    }

    #[test]
    fn test_simple_forecast_floor() {
        let txs = vec![tx("2024-01-01", -50.0), tx("2024-01-02", -70.0)];
        let f = simple_goal_forecast(&txs, 10000.0, &GoalConfig::default());
        assert_eq!(f.estimated_monthly_savings, 500.0);
        assert_eq!(f.months_to_goal, 20.0);
        assert_eq!(f.confidence, Confidence::Low);
    }

    #[test]
    fn test_simple_forecast_income_only() {
        let txs = vec![tx("2024-01-01", 30000.0)];
        let f = simple_goal_forecast(&txs, 5000.0, &GoalConfig::default());
        assert_eq!(f.estimated_monthly_savings, 500.0);
        assert_eq!(f.months_to_goal, 10.0);
    }

    #[test]
    fn test_resolve_goal() {
        let cfg = GoalConfig::default();
        assert_eq!(resolve_goal(None, &cfg), 50000.0);
        assert_eq!(resolve_goal(Some(-10.0), &cfg), 50000.0);
        assert_eq!(resolve_goal(Some(f64::NAN), &cfg), 50000.0);
        assert_eq!(resolve_goal(Some(1200.0), &cfg), 1200.0);
    }

    #[test]
    fn test_daily_series_aggregates_by_day() {
        let txs = vec![
            tx("2024-01-02", -100.0),
            tx("2024-01-01", -40.0),
            tx("2024-01-02", -60.0),
            tx("2024-01-02", 500.0),
        ];
        let series = daily_expense_series(&txs);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].1, 40.0);
        assert_eq!(series[1].1, 160.0);
    }

    #[test]
    fn test_seasonal_goal_forecast() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let series: Vec<(NaiveDate, f64)> = (0..12)
            .map(|i| (start + chrono::Duration::days(i), 500.0))
            .collect();
        let trend = SeasonalTrend {
            projected_daily_mean: 500.0,
            trend_per_day: 0.0,
            horizon_days: 365,
        };

        // 500/day -> 15000/month -> 10% = 1500
        let f = seasonal_goal_forecast(&series, &trend, 30000.0, &GoalConfig::default());
        assert_eq!(f.estimated_monthly_savings, 1500.0);
        assert_eq!(f.months_to_goal, 20.0);
        assert_eq!(f.confidence, Confidence::Medium);
        assert_eq!(f.source_method, SourceMethod::Seasonal);
        assert_eq!(f.daily_avg_expense, Some(500.0));
    }
}

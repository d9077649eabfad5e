//! In-process weekly seasonal forecaster
//!
//! Fits a least-squares linear trend over the daily series, then models
//! weekly seasonality as the mean residual for each day of the week.

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate};

use crate::error::Decline;
use crate::estimator::SeasonalTrend;

use super::SeasonalForecaster;

const MIN_POINTS: usize = 2;
const BACKFIT_ROUNDS: usize = 25;

/// Linear trend plus day-of-week offsets
#[derive(Debug, Clone, Default)]
pub struct WeeklySeasonalForecaster;

impl WeeklySeasonalForecaster {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous fit and projection
    pub fn fit(
        &self,
        series: &[(NaiveDate, f64)],
        horizon_days: u32,
    ) -> Result<SeasonalTrend, Decline> {
        if series.len() < MIN_POINTS {
            return Err(Decline::InsufficientData {
                needed: MIN_POINTS,
                got: series.len(),
            });
        }
        if series.iter().any(|(_, v)| !v.is_finite()) {
            return Err(Decline::ExternalService("series has non-finite values".into()));
        }

        let origin = series[0].0;
        let xs: Vec<f64> = series
            .iter()
            .map(|(d, _)| (*d - origin).num_days() as f64)
            .collect();
        let ys: Vec<f64> = series.iter().map(|(_, v)| *v).collect();

        let weekdays: Vec<usize> = series
            .iter()
            .map(|(d, _)| d.weekday().num_days_from_monday() as usize)
            .collect();

        let n = xs.len() as f64;
        let mean_x = xs.iter().sum::<f64>() / n;
        let sxx: f64 = xs.iter().map(|x| (x - mean_x).powi(2)).sum();
        if sxx == 0.0 {
            return Err(Decline::InsufficientData {
                needed: MIN_POINTS,
                got: 1,
            });
        }

        // Backfitting: alternate the trend fit on deseasonalized values with
        // the weekday offsets on detrended values until both settle.
        let mut offsets = [0.0f64; 7];
        let mut slope = 0.0;
        let mut intercept = 0.0;
        for _ in 0..BACKFIT_ROUNDS {
            let adjusted: Vec<f64> = ys
                .iter()
                .zip(&weekdays)
                .map(|(y, wd)| y - offsets[*wd])
                .collect();
            let mean_y = adjusted.iter().sum::<f64>() / n;
            let sxy: f64 = xs
                .iter()
                .zip(&adjusted)
                .map(|(x, y)| (x - mean_x) * (y - mean_y))
                .sum();
            slope = sxy / sxx;
            intercept = mean_y - slope * mean_x;

            let mut residual_sum = [0.0f64; 7];
            let mut residual_count = [0usize; 7];
            for ((x, y), wd) in xs.iter().zip(&ys).zip(&weekdays) {
                residual_sum[*wd] += y - (intercept + slope * x);
                residual_count[*wd] += 1;
            }
            for wd in 0..7 {
                offsets[wd] = if residual_count[wd] == 0 {
                    0.0
                } else {
                    residual_sum[wd] / residual_count[wd] as f64
                };
            }
        }

        let horizon = horizon_days.max(1);
        let last = series[series.len() - 1].0;
        let last_x = xs[xs.len() - 1];
        let mut total = 0.0;
        for step in 1..=horizon {
            let date = last
                .checked_add_signed(Duration::days(i64::from(step)))
                .ok_or_else(|| Decline::ExternalService("date overflow".into()))?;
            let wd = date.weekday().num_days_from_monday() as usize;
            total += (intercept + slope * (last_x + f64::from(step)) + offsets[wd]).max(0.0);
        }

        Ok(SeasonalTrend {
            projected_daily_mean: total / horizon as f64,
            trend_per_day: slope,
            horizon_days: horizon,
        })
    }
}

#[async_trait]
impl SeasonalForecaster for WeeklySeasonalForecaster {
    async fn forecast(
        &self,
        series: &[(NaiveDate, f64)],
        horizon_days: u32,
    ) -> Result<SeasonalTrend, Decline> {
        self.fit(series, horizon_days)
    }

    fn name(&self) -> &str {
        "weekly_seasonal"
    }
}

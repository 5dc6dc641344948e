//! Forecast summary computation for the analytics views.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{BloodType, Forecast};

/// One blood type's share of the total predicted demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeShare {
    pub blood_type: BloodType,
    pub volume_ml: f64,
    /// Percentage of the total, 0 when the total is 0.
    pub percentage: f64,
}

/// Display-ready summary of a forecast payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ForecastSummary {
    /// Total predicted volume, rounded to whole milliliters.
    pub total_predicted_ml: f64,
    /// For daily forecasts this equals the total; for weekly forecasts it is
    /// the total divided by the number of distinct dates.
    pub average_daily_ml: f64,
    /// Arg-max blood type, `None` when there is no data ("N/A").
    pub highest_demand: Option<BloodType>,
    /// Top 4 blood types by volume, descending, with share of total.
    pub breakdown: Vec<TypeShare>,
    /// Total volume per date, weekly forecasts only.
    pub daily_trend: Vec<(NaiveDate, f64)>,
}

/// Fold a normalized forecast into its display summary.
///
/// An empty forecast yields the all-zero summary with `highest_demand: None`
/// and an empty breakdown; the view renders that as "N/A".
pub fn forecast_summary(forecast: &Forecast) -> ForecastSummary {
    let per_type: BTreeMap<BloodType, f64> = match forecast {
        Forecast::Daily(map) => map.clone(),
        Forecast::Weekly(points) => {
            let mut totals = BTreeMap::new();
            for point in points {
                *totals.entry(point.blood_type).or_insert(0.0) += point.predicted_volume;
            }
            totals
        }
    };

    let total: f64 = per_type.values().sum();

    let highest_demand = per_type
        .iter()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(blood_type, _)| *blood_type);

    let mut breakdown: Vec<TypeShare> = per_type
        .iter()
        .map(|(blood_type, volume)| TypeShare {
            blood_type: *blood_type,
            volume_ml: *volume,
            percentage: if total > 0.0 { volume / total * 100.0 } else { 0.0 },
        })
        .collect();
    breakdown.sort_by(|a, b| {
        b.volume_ml
            .partial_cmp(&a.volume_ml)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    breakdown.truncate(4);

    let daily_trend: Vec<(NaiveDate, f64)> = match forecast {
        Forecast::Daily(_) => Vec::new(),
        Forecast::Weekly(points) => {
            let mut per_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
            for point in points {
                *per_date.entry(point.date).or_insert(0.0) += point.predicted_volume;
            }
            per_date.into_iter().collect()
        }
    };

    let distinct_dates = daily_trend.len();
    let average_daily_ml = match forecast {
        Forecast::Daily(_) => total.round(),
        Forecast::Weekly(_) if distinct_dates > 0 => (total / distinct_dates as f64).round(),
        Forecast::Weekly(_) => 0.0,
    };

    ForecastSummary {
        total_predicted_ml: total.round(),
        average_daily_ml,
        highest_demand,
        breakdown,
        daily_trend,
    }
}

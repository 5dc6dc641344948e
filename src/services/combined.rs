//! Combined dashboard synthesis of forecast, optimization and stock data.

use serde::Serialize;

use crate::models::{
    Forecast, ForecastPeriod, Optimization, StockStatus, StockUnit, STANDARD_BAG_VOLUME_ML,
};

/// Risk tier shown on the dashboard card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Cross-source metrics for the combined analytics card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedMetrics {
    pub forecast_total_ml: f64,
    pub optimization_cost_xaf: f64,
    pub recommended_bags: f64,
    pub emergency_bags: f64,
    /// Number of units currently marked available.
    pub available_stock_units: usize,
    /// Volume of available units; unit without a volume counts as one
    /// standard 450 ml bag.
    pub available_stock_ml: f64,
    /// Cost per predicted milliliter, `None` when nothing is predicted
    /// ("N/A").
    pub cost_efficiency_xaf_per_ml: Option<f64>,
    /// min(100, available volume / predicted volume × 100); 0 without a
    /// forecast.
    pub stock_adequacy_pct: f64,
    pub risk: RiskLevel,
}

/// Synthesize the combined dashboard metrics.
///
/// Any missing input collapses to its zero default; the function never
/// fails on malformed data since both analytic payloads are already
/// normalized.
pub fn combined_metrics(
    forecast: Option<&Forecast>,
    optimization: Option<&Optimization>,
    stocks: &[StockUnit],
    period: ForecastPeriod,
) -> CombinedMetrics {
    let forecast_total_ml = match forecast {
        // A forecast of the wrong shape for the selected period counts as
        // no data, matching the view's period-gated folds.
        Some(f) if f.period() == period => match f {
            Forecast::Daily(map) => map.values().filter(|v| v.is_finite()).sum(),
            Forecast::Weekly(points) => points.iter().map(|p| p.predicted_volume).sum(),
        },
        _ => 0.0,
    };

    let mut optimization_cost_xaf = 0.0;
    let mut recommended_bags = 0.0;
    let mut emergency_bags = 0.0;
    if let Some(opt) = optimization {
        if period == ForecastPeriod::SevenDays {
            optimization_cost_xaf = opt.total_week_cost_xaf.unwrap_or(0.0);
        }
        for entry in opt.data.values() {
            recommended_bags += entry.recommended_order_bags;
            emergency_bags += entry.emergency_needed_bags;
            if period == ForecastPeriod::OneDay {
                optimization_cost_xaf += entry.total_cost_xaf;
            }
        }
    }

    let available: Vec<&StockUnit> = stocks
        .iter()
        .filter(|s| s.status == StockStatus::Available)
        .collect();
    let available_stock_ml: f64 = available
        .iter()
        .map(|s| s.volume_ml.unwrap_or(STANDARD_BAG_VOLUME_ML))
        .sum();

    let cost_efficiency_xaf_per_ml = if forecast_total_ml > 0.0 {
        Some(optimization_cost_xaf / forecast_total_ml)
    } else {
        None
    };
    let stock_adequacy_pct = if forecast_total_ml > 0.0 {
        (available_stock_ml / forecast_total_ml * 100.0).min(100.0)
    } else {
        0.0
    };

    let risk = if emergency_bags > 0.0 {
        RiskLevel::High
    } else if stock_adequacy_pct < 50.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    CombinedMetrics {
        forecast_total_ml,
        optimization_cost_xaf,
        recommended_bags,
        emergency_bags,
        available_stock_units: available.len(),
        available_stock_ml,
        cost_efficiency_xaf_per_ml,
        stock_adequacy_pct,
        risk,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BloodType;
    use serde_json::json;

    fn stock(volume: Option<f64>, status: StockStatus) -> StockUnit {
        StockUnit {
            id: 0,
            blood_type: BloodType::OPos,
            volume_ml: volume,
            location: None,
            stored_date: None,
            expiry_date: None,
            status,
        }
    }

    #[test]
    fn no_data_yields_zero_metrics_and_low_risk_only_without_forecast() {
        let metrics = combined_metrics(None, None, &[], ForecastPeriod::OneDay);
        assert_eq!(metrics.forecast_total_ml, 0.0);
        assert_eq!(metrics.cost_efficiency_xaf_per_ml, None);
        assert_eq!(metrics.stock_adequacy_pct, 0.0);
        // Adequacy 0 < 50 without emergencies: medium.
        assert_eq!(metrics.risk, RiskLevel::Medium);
    }

    #[test]
    fn emergency_bags_force_high_risk() {
        let opt = Optimization::from_value(&json!({
            "data": {"O+": {"recommended_order_bags": 5.0, "emergency_needed_bags": 2.0, "total_cost_xaf": 60000.0}}
        }));
        let forecast = Forecast::Daily([(BloodType::OPos, 1000.0)].into_iter().collect());
        let stocks = [stock(Some(450.0), StockStatus::Available)];
        let metrics = combined_metrics(
            Some(&forecast),
            Some(&opt),
            &stocks,
            ForecastPeriod::OneDay,
        );
        assert_eq!(metrics.risk, RiskLevel::High);
        assert_eq!(metrics.optimization_cost_xaf, 60000.0);
        assert_eq!(metrics.cost_efficiency_xaf_per_ml, Some(60.0));
        assert_eq!(metrics.stock_adequacy_pct, 45.0);
    }

    #[test]
    fn adequacy_caps_at_100_and_low_risk() {
        let forecast = Forecast::Daily([(BloodType::OPos, 400.0)].into_iter().collect());
        let stocks = [
            stock(Some(450.0), StockStatus::Available),
            stock(None, StockStatus::Available), // counts as 450
            stock(Some(450.0), StockStatus::Reserved),
        ];
        let metrics = combined_metrics(Some(&forecast), None, &stocks, ForecastPeriod::OneDay);
        assert_eq!(metrics.available_stock_units, 2);
        assert_eq!(metrics.available_stock_ml, 900.0);
        assert_eq!(metrics.stock_adequacy_pct, 100.0);
        assert_eq!(metrics.risk, RiskLevel::Low);
    }

    #[test]
    fn period_mismatch_counts_as_no_forecast() {
        let weekly = Forecast::Weekly(Vec::new());
        let metrics = combined_metrics(Some(&weekly), None, &[], ForecastPeriod::OneDay);
        assert_eq!(metrics.forecast_total_ml, 0.0);
        assert_eq!(metrics.cost_efficiency_xaf_per_ml, None);
    }
}

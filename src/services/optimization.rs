//! Optimization summary computation for the analytics views.

use serde::Serialize;

use crate::models::{BloodType, ForecastPeriod, Optimization};

/// Display-ready summary of an optimization payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OptimizationSummary {
    /// Sum of per-type costs for the daily period, the precomputed weekly
    /// total for the 7-day period.
    pub total_cost_xaf: f64,
    pub total_recommended_bags: f64,
    pub total_emergency_bags: f64,
    /// Blood types needing emergency bags, sorted descending by count.
    pub critical: Vec<(BloodType, f64)>,
}

/// Fold an optimization result into its display summary.
pub fn optimization_summary(
    optimization: &Optimization,
    period: ForecastPeriod,
) -> OptimizationSummary {
    let mut summary = OptimizationSummary::default();

    if period == ForecastPeriod::SevenDays {
        summary.total_cost_xaf = optimization.total_week_cost_xaf.unwrap_or(0.0);
    }

    for (blood_type, entry) in &optimization.data {
        summary.total_recommended_bags += entry.recommended_order_bags;
        summary.total_emergency_bags += entry.emergency_needed_bags;
        if period == ForecastPeriod::OneDay {
            summary.total_cost_xaf += entry.total_cost_xaf;
        }
        if entry.emergency_needed_bags > 0.0 {
            summary.critical.push((*blood_type, entry.emergency_needed_bags));
        }
    }

    summary.critical.sort_by(|a, b| {
        b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal)
    });

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn daily_summary_sums_per_type_costs() {
        let opt = Optimization::from_value(&json!({
            "status": "success",
            "data": {
                "O+": {"recommended_order_bags": 5.0, "emergency_needed_bags": 2.0, "total_cost_xaf": 60000.0}
            }
        }));
        let summary = optimization_summary(&opt, ForecastPeriod::OneDay);
        assert_eq!(summary.total_recommended_bags, 5.0);
        assert_eq!(summary.total_emergency_bags, 2.0);
        assert_eq!(summary.total_cost_xaf, 60000.0);
        assert_eq!(summary.critical, vec![(BloodType::OPos, 2.0)]);
    }

    #[test]
    fn weekly_summary_uses_precomputed_total() {
        let opt = Optimization::from_value(&json!({
            "status": "success",
            "data": {
                "A+": {"recommended_order_bags": 3.0, "emergency_needed_bags": 0.0, "total_cost_xaf": 10000.0},
                "B+": {"recommended_order_bags": 2.0, "emergency_needed_bags": 4.0, "total_cost_xaf": 20000.0},
                "O-": {"recommended_order_bags": 1.0, "emergency_needed_bags": 1.0, "total_cost_xaf": 5000.0},
                "total_week_cost_xaf": 420000.0
            }
        }));
        let summary = optimization_summary(&opt, ForecastPeriod::SevenDays);
        // Per-type daily costs are ignored in favor of the weekly total.
        assert_eq!(summary.total_cost_xaf, 420000.0);
        assert_eq!(summary.total_recommended_bags, 6.0);
        assert_eq!(summary.total_emergency_bags, 5.0);
        assert_eq!(
            summary.critical,
            vec![(BloodType::BPos, 4.0), (BloodType::ONeg, 1.0)]
        );
    }

    #[test]
    fn empty_optimization_summarizes_to_zero() {
        let summary = optimization_summary(&Optimization::default(), ForecastPeriod::OneDay);
        assert_eq!(summary, OptimizationSummary::default());
    }
}

//! Derived-metric computation and client-side validation.
//!
//! Everything in this module is a pure, stateless transform over
//! already-fetched data; the analytics views recompute these on every render.
//! Malformed or missing analytic input degrades to zero/empty defaults,
//! never an error.

pub mod combined;
pub mod forecast;
pub mod optimization;
pub mod stats;
pub mod validation;

pub use combined::{combined_metrics, CombinedMetrics, RiskLevel};
pub use forecast::{forecast_summary, ForecastSummary, TypeShare};
pub use optimization::{optimization_summary, OptimizationSummary};
pub use stats::{donor_stats, expiring_stocks, stock_stats, DonorStats, StockStats};
pub use validation::{
    can_edit_manager, hemoglobin_is_safe, validate_donation, validate_donor,
    validate_manager_registration, ValidationErrors,
};

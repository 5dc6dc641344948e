//! Forecast and optimization payloads from the prediction services.
//!
//! These services are the loosest part of the wire: the response shape
//! depends on the requested period, blood types arrive in either encoding,
//! and individual values are occasionally missing or non-numeric. Both types
//! therefore normalize from raw JSON at the network boundary; anything
//! malformed is skipped rather than surfaced as an error, so the rest of the
//! system only ever sees one canonical, possibly empty, representation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::blood_type::BloodType;

/// Forecast horizon selector, `"1d"` or `"7d"` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForecastPeriod {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "7d")]
    SevenDays,
}

impl ForecastPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastPeriod::OneDay => "1d",
            ForecastPeriod::SevenDays => "7d",
        }
    }
}

impl fmt::Display for ForecastPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a 7-day forecast sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub blood_type: BloodType,
    pub predicted_volume: f64,
}

/// Normalized forecast result.
///
/// Daily forecasts arrive as a flat blood-type → volume mapping, weekly
/// forecasts as a sequence of dated points.
#[derive(Debug, Clone, PartialEq)]
pub enum Forecast {
    Daily(BTreeMap<BloodType, f64>),
    Weekly(Vec<ForecastPoint>),
}

impl Forecast {
    /// Expected period of this forecast.
    pub fn period(&self) -> ForecastPeriod {
        match self {
            Forecast::Daily(_) => ForecastPeriod::OneDay,
            Forecast::Weekly(_) => ForecastPeriod::SevenDays,
        }
    }

    /// True when no usable prediction survived normalization.
    pub fn is_empty(&self) -> bool {
        match self {
            Forecast::Daily(map) => map.is_empty(),
            Forecast::Weekly(points) => points.is_empty(),
        }
    }

    /// Normalize a raw service payload for the given period.
    ///
    /// Never fails: entries with an unknown blood type or a non-numeric
    /// volume are skipped, and a payload of the wrong shape for the period
    /// yields an empty forecast.
    pub fn from_value(period: ForecastPeriod, value: &serde_json::Value) -> Self {
        match period {
            ForecastPeriod::OneDay => {
                let mut map = BTreeMap::new();
                if let Some(obj) = value.as_object() {
                    for (key, val) in obj {
                        let Ok(blood_type) = key.parse::<BloodType>() else {
                            continue;
                        };
                        let Some(volume) = val.as_f64().filter(|v| v.is_finite()) else {
                            continue;
                        };
                        map.insert(blood_type, volume);
                    }
                }
                Forecast::Daily(map)
            }
            ForecastPeriod::SevenDays => {
                let mut points = Vec::new();
                if let Some(items) = value.as_array() {
                    for item in items {
                        if let Ok(point) = serde_json::from_value::<ForecastPoint>(item.clone()) {
                            if point.predicted_volume.is_finite() {
                                points.push(point);
                            }
                        }
                    }
                }
                Forecast::Weekly(points)
            }
        }
    }
}

/// Per-blood-type optimization recommendation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationEntry {
    #[serde(default)]
    pub recommended_order_bags: f64,
    #[serde(default)]
    pub recommended_order_ml: f64,
    #[serde(default)]
    pub emergency_needed_bags: f64,
    #[serde(default)]
    pub emergency_needed_ml: f64,
    #[serde(default)]
    pub total_cost_xaf: f64,
}

/// Normalized inventory-optimization result.
///
/// On the wire the `data` object mixes per-blood-type recommendation objects
/// with the scalar `total_week_cost_xaf`; normalization separates the two.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Optimization {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub data: BTreeMap<BloodType, OptimizationEntry>,
    #[serde(default)]
    pub total_week_cost_xaf: Option<f64>,
}

impl Optimization {
    /// Normalize a raw service payload. Never fails; malformed keys or
    /// entries are skipped.
    pub fn from_value(value: &serde_json::Value) -> Self {
        let status = value
            .get("status")
            .and_then(|s| s.as_str())
            .unwrap_or_default()
            .to_string();

        let mut data = BTreeMap::new();
        let mut total_week_cost_xaf = None;
        if let Some(obj) = value.get("data").and_then(|d| d.as_object()) {
            for (key, val) in obj {
                if key == "total_week_cost_xaf" {
                    total_week_cost_xaf = val.as_f64();
                    continue;
                }
                let Ok(blood_type) = key.parse::<BloodType>() else {
                    continue;
                };
                if let Ok(entry) = serde_json::from_value::<OptimizationEntry>(val.clone()) {
                    data.insert(blood_type, entry);
                }
            }
        }

        Optimization {
            status,
            data,
            total_week_cost_xaf,
        }
    }

    /// Whether any recommendation carries a non-zero value. The optimization
    /// service occasionally answers with an all-zero table when its model is
    /// unavailable; callers treat that the same as missing data.
    pub fn has_meaningful_data(&self) -> bool {
        self.data.values().any(|entry| {
            entry.recommended_order_bags > 0.0
                || entry.emergency_needed_bags > 0.0
                || entry.total_cost_xaf > 0.0
        })
    }
}

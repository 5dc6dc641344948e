//! Inventory (stock) records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::blood_type::{BloodType, StockStatus};

/// One storable unit of collected blood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockUnit {
    pub id: i64,
    pub blood_type: BloodType,
    #[serde(default)]
    pub volume_ml: Option<f64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub stored_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
    pub status: StockStatus,
}

impl StockUnit {
    /// True when the unit still counts toward usable inventory and its
    /// expiry date falls within `days` of `now`.
    pub fn expires_within(&self, now: DateTime<Utc>, days: i64) -> bool {
        if matches!(self.status, StockStatus::Expired | StockStatus::Used) {
            return false;
        }
        match self.expiry_date {
            Some(expiry) => expiry > now && expiry <= now + chrono::Duration::days(days),
            None => false,
        }
    }
}

/// Body of `PATCH /stocks/{id}/status`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StockStatusChange {
    pub status: StockStatus,
}

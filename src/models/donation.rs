//! Donation records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::blood_type::{BloodType, ScreeningResult, DEFAULT_LIMIT, DEFAULT_SKIP};
use super::donor::Donor;

/// A recorded donation as returned by the donation backend.
///
/// The backend sometimes embeds the full donor record and sometimes only the
/// donor id, so both are optional beyond `donor_id` itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donation {
    pub donation_id: i64,
    pub donor_id: i64,
    #[serde(default)]
    pub donor: Option<Donor>,
    #[serde(default)]
    pub blood_type: Option<BloodType>,
    pub collection_site: String,
    pub volume_ml: f64,
    #[serde(default)]
    pub hemoglobin_g_dl: Option<f64>,
    #[serde(default)]
    pub donation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub screening_result: Option<ScreeningResult>,
}

/// Payload for recording a new donation against a donor id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDonation {
    pub collection_site: String,
    pub volume_ml: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hemoglobin_g_dl: Option<f64>,
}

/// Partial donation update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DonationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_site: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_ml: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hemoglobin_g_dl: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screening_result: Option<ScreeningResult>,
}

/// Query filters passed through to `GET /donations`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donor_id: Option<i64>,
    pub skip: u32,
    pub limit: u32,
}

impl Default for DonationFilters {
    fn default() -> Self {
        Self {
            donor_id: None,
            skip: DEFAULT_SKIP,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl DonationFilters {
    /// Apply per-call overrides on top of stored filters.
    pub fn merged_with(mut self, overrides: &DonationFilterOverrides) -> Self {
        if let Some(donor_id) = overrides.donor_id {
            self.donor_id = Some(donor_id);
        }
        if let Some(skip) = overrides.skip {
            self.skip = skip;
        }
        if let Some(limit) = overrides.limit {
            self.limit = limit;
        }
        self
    }
}

/// Per-call filter overrides; unset fields keep the store's current value.
#[derive(Debug, Clone, Copy, Default)]
pub struct DonationFilterOverrides {
    pub donor_id: Option<i64>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

//! Donor registry records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::blood_type::{BloodType, Gender, DEFAULT_LIMIT, DEFAULT_SKIP};

/// A registered donor as returned by the donor backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donor {
    pub id: i64,
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub gender: Gender,
    pub age: u32,
    pub blood_type: BloodType,
    #[serde(default)]
    pub location: Option<String>,
    pub is_eligible: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload for registering a new donor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDonor {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub gender: Gender,
    pub age: u32,
    pub blood_type: BloodType,
    pub location: String,
    #[serde(default = "default_eligible")]
    pub is_eligible: bool,
}

fn default_eligible() -> bool {
    true
}

/// Partial donor update. Only fields that actually changed are set; the view
/// layer performs the change detection before calling the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DonorUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_type: Option<BloodType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_eligible: Option<bool>,
}

/// Query filters passed through to `GET /donors`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonorFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_eligible: Option<bool>,
    pub skip: u32,
    pub limit: u32,
}

impl Default for DonorFilters {
    fn default() -> Self {
        Self {
            is_eligible: None,
            skip: DEFAULT_SKIP,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl DonorFilters {
    /// Merge per-call overrides over the stored filters.
    pub fn merged_with(mut self, overrides: &DonorFilterOverrides) -> Self {
        if let Some(eligible) = overrides.is_eligible {
            self.is_eligible = Some(eligible);
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
pub struct DonorFilterOverrides {
    pub is_eligible: Option<bool>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

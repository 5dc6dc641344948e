//! Blood-manager (staff) account records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A staff account as returned by the blood-manager backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manager {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload for the admin-only registration call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewManager {
    pub email: String,
    pub full_name: String,
    pub phone_number: String,
    pub password: String,
}

/// Partial self-service profile update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManagerUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

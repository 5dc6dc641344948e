//! Backend configuration from environment variables.

use std::env;

/// Base URLs for every REST backend the dashboard talks to, plus the shared
/// request timeout.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Auth backend root, e.g. `https://auth.example.org/auth`
    pub auth_url: String,
    /// Blood-manager backend root, e.g. `https://api.example.org/blood-managers`
    pub manager_url: String,
    /// Donor backend root
    pub donor_url: String,
    /// Donation backend root
    pub donation_url: String,
    /// Stock backend root
    pub stock_url: String,
    /// Forecast prediction service root
    pub forecast_url: String,
    /// Optimization service root
    pub optimize_url: String,
    /// Request timeout in seconds (default: 20)
    pub timeout_secs: u64,
}

impl BackendConfig {
    /// Load the configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `BLOODLINK_AUTH_URL` (required)
    /// - `BLOODLINK_MANAGER_URL` (required)
    /// - `BLOODLINK_DONOR_URL` (required)
    /// - `BLOODLINK_DONATION_URL` (required)
    /// - `BLOODLINK_STOCK_URL` (required)
    /// - `BLOODLINK_FORECAST_URL` (required)
    /// - `BLOODLINK_OPTIMIZE_URL` (required)
    /// - `BLOODLINK_TIMEOUT_SECS` (optional, default: 20)
    ///
    /// # Errors
    /// Returns an error naming the first missing variable.
    pub fn from_env() -> Result<Self, String> {
        let timeout_secs = env::var("BLOODLINK_TIMEOUT_SECS")
            .ok()
            .map(|raw| {
                raw.parse::<u64>()
                    .map_err(|_| "BLOODLINK_TIMEOUT_SECS must be a number of seconds".to_string())
            })
            .transpose()?
            .unwrap_or(20);

        Ok(Self {
            auth_url: required("BLOODLINK_AUTH_URL")?,
            manager_url: required("BLOODLINK_MANAGER_URL")?,
            donor_url: required("BLOODLINK_DONOR_URL")?,
            donation_url: required("BLOODLINK_DONATION_URL")?,
            stock_url: required("BLOODLINK_STOCK_URL")?,
            forecast_url: required("BLOODLINK_FORECAST_URL")?,
            optimize_url: required("BLOODLINK_OPTIMIZE_URL")?,
            timeout_secs,
        })
    }
}

fn required(name: &str) -> Result<String, String> {
    env::var(name)
        .map(|url| url.trim_end_matches('/').to_string())
        .map_err(|_| format!("{} environment variable not set", name))
}

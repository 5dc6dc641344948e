//! Backend trait definitions, one per REST resource family.
//!
//! Splitting the surface per family keeps implementations focused and lets
//! tests swap any single backend. Bearer-token handling is a transport
//! concern and lives in the HTTP implementation, not in these signatures.

use async_trait::async_trait;

use super::error::BackendResult;
use crate::models::*;

/// Authentication backend (`/auth`).
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// `POST /auth/login` with the role in the payload (admin login).
    async fn login(&self, credentials: &Credentials) -> BackendResult<LoginOutcome>;

    /// `POST /auth/verify-token` with the bearer token to validate.
    ///
    /// Returns the session user when the token is still valid. A rejected
    /// token is an `Unauthorized`/`Api` error; an unreachable backend is
    /// `Network`; callers treat the two very differently.
    async fn verify_token(&self, token: &str) -> BackendResult<User>;
}

/// Blood-manager backend (`/blood-managers`).
#[async_trait]
pub trait ManagerBackend: Send + Sync {
    /// `POST /blood-managers/login`. No role field in the payload.
    async fn login(&self, email: &str, password: &str) -> BackendResult<LoginOutcome>;

    /// `POST /blood-managers/register` (admin-only, enforced server-side).
    async fn register(&self, manager: &NewManager) -> BackendResult<Manager>;

    async fn list(&self) -> BackendResult<Vec<Manager>>;

    async fn get(&self, id: i64) -> BackendResult<Manager>;

    async fn update(&self, id: i64, update: &ManagerUpdate) -> BackendResult<Manager>;
}

/// Donor registry backend (`/donors`).
#[async_trait]
pub trait DonorBackend: Send + Sync {
    async fn list(&self, filters: &DonorFilters) -> BackendResult<Vec<Donor>>;

    async fn get(&self, id: i64) -> BackendResult<Donor>;

    async fn create(&self, donor: &NewDonor) -> BackendResult<Donor>;

    async fn update(&self, id: i64, update: &DonorUpdate) -> BackendResult<Donor>;

    async fn delete(&self, id: i64) -> BackendResult<()>;
}

/// Donation backend (`/donations`).
#[async_trait]
pub trait DonationBackend: Send + Sync {
    async fn list(&self, filters: &DonationFilters) -> BackendResult<Vec<Donation>>;

    async fn get(&self, id: i64) -> BackendResult<Donation>;

    /// `POST /donations?donor_id=<id>`. The donor id travels as a query
    /// parameter, not in the body.
    async fn create(&self, donor_id: i64, donation: &NewDonation) -> BackendResult<Donation>;

    async fn update(&self, id: i64, update: &DonationUpdate) -> BackendResult<Donation>;

    /// `POST /donations/upload`: bulk import from a multipart file.
    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> BackendResult<serde_json::Value>;
}

/// Stock (inventory) backend (`/stocks`).
#[async_trait]
pub trait StockBackend: Send + Sync {
    async fn list(&self) -> BackendResult<Vec<StockUnit>>;

    async fn get(&self, id: i64) -> BackendResult<StockUnit>;

    /// `PATCH /stocks/{id}/status`, the only stock mutation in this UI.
    async fn update_status(&self, id: i64, status: StockStatus) -> BackendResult<StockUnit>;
}

/// Demand-forecast prediction service.
#[async_trait]
pub trait ForecastBackend: Send + Sync {
    /// `GET /predict`: re-run the current-day prediction.
    async fn predict_today(&self) -> BackendResult<Forecast>;

    /// `GET /predict/next-7-days`: re-run the weekly prediction.
    async fn predict_next_7_days(&self) -> BackendResult<Forecast>;

    /// `GET /forecast/latest?period=`: last stored result for the period.
    async fn latest(&self, period: ForecastPeriod) -> BackendResult<Forecast>;
}

/// Inventory-optimization service.
#[async_trait]
pub trait OptimizeBackend: Send + Sync {
    /// `GET /optimize?period=`: re-run the optimization.
    async fn run(&self, period: ForecastPeriod) -> BackendResult<Optimization>;

    /// `GET /optimization/latest?period=`: last stored result.
    async fn latest(&self, period: ForecastPeriod) -> BackendResult<Optimization>;
}

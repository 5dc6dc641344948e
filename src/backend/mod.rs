//! Backend abstraction layer.
//!
//! Each REST resource family (auth, blood managers, donors, donations,
//! stocks, forecast, optimization) is reached through its own trait, so the
//! stores never know whether they are talking to the real HTTP backends or
//! the in-memory implementation used by tests and local development.
//!
//! # Module Organization
//!
//! - [`error`]: the `BackendError` taxonomy and message normalization
//! - [`traits`]: one async trait per resource family
//! - [`http`]: reqwest-based implementations with bearer-token handling
//! - [`local`]: in-memory implementation of every trait
//! - [`token`]: persisted bearer-token storage
//! - [`config`]: environment-driven base-URL configuration

pub mod config;
pub mod error;
pub mod http;
pub mod local;
pub mod token;
pub mod traits;

pub use config::BackendConfig;
pub use error::{BackendError, BackendResult};
pub use local::LocalBackend;
pub use token::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use traits::{
    AuthBackend, DonationBackend, DonorBackend, ForecastBackend, ManagerBackend, OptimizeBackend,
    StockBackend,
};

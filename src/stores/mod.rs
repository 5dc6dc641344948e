//! Per-resource state containers.
//!
//! Each store owns its backend trait object and interior-mutable state,
//! exposing cloned snapshots. Fetches record errors without discarding
//! previously fetched items; mutations patch local state from the backend's
//! response instead of refetching.

pub mod debounce;
pub mod donation;
pub mod donor;
pub mod forecast;
pub mod manager;
pub mod optimize;
pub mod session;
pub mod stock;

#[cfg(test)]
#[path = "store_tests.rs"]
mod store_tests;

pub use debounce::Debouncer;
pub use donation::{DonationState, DonationStore};
pub use donor::{DonorState, DonorStore};
pub use forecast::{ForecastState, ForecastStore};
pub use manager::{ManagerState, ManagerStore};
pub use optimize::{OptimizeState, OptimizeStore};
pub use session::{AuthState, SessionState, SessionStore};
pub use stock::{StockFilter, StockState, StockStore};

//! # Bloodlink
//!
//! Client core for a blood-bank administration dashboard.
//!
//! This crate implements everything the dashboard UI orchestrates behind the
//! scenes: authenticating a user against the auth backends, fetching donors,
//! donations, stock units and staff accounts from their REST backends,
//! holding the fetched collections in per-resource stores, and computing the
//! derived metrics (forecast summaries, optimization summaries, combined
//! risk assessment) that the read-only analytics views render.
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`models`]: domain records, enumerations, and wire-payload normalization
//! - [`backend`]: backend traits, the reqwest HTTP implementation, the
//!   in-memory implementation for tests, token persistence, and configuration
//! - [`stores`]: per-resource state containers and the session lifecycle
//!   controller
//! - [`services`]: pure derived-metric computation and client-side validation
//! - [`app`]: application-root composition (dependency injection of stores)
//!
//! ## Error contract
//!
//! Every backend interaction fails with a [`backend::BackendError`]:
//! `Validation` never reaches the wire, `Network` means the backend was
//! unreachable, `Api` carries the normalized backend message, and
//! `Unauthorized` forces a global logout (except during the initial token
//! verification). There is no automatic retry anywhere: a failed request
//! surfaces its error and leaves the store state unchanged.

pub mod app;
pub mod backend;
pub mod models;
pub mod services;
pub mod stores;

pub use app::App;
pub use backend::{BackendError, BackendResult};

//! Domain records and enumerations shared across the backend and store layers.
//!
//! Backend payloads are wider than what the client uses; every record here
//! deserializes leniently (unknown fields ignored, optional fields default)
//! and serializes the canonical representation.

pub mod analytics;
pub mod blood_type;
pub mod donation;
pub mod donor;
pub mod manager;
pub mod session;
pub mod stock;

pub use analytics::*;
pub use blood_type::*;
pub use donation::*;
pub use donor::*;
pub use manager::*;
pub use session::*;
pub use stock::*;

//! Core types and service wiring for the binwatch waste bin monitoring dashboard.

/// Great-circle distance between bin coordinates.
pub mod distance;
/// Per-bin linear fill forecasting and pickup-time derivation.
pub mod forecast;
/// Domain models and identifiers shared by all sources.
pub mod model;
/// Registry and helpers for plugging data sources into the service.
pub mod plugin;
/// Traits describing the collaborator interfaces.
pub mod ports;
/// Collection route optimization over flagged bins.
pub mod route;
/// High-level service facade used by clients.
pub mod service;

pub use distance::*;
pub use forecast::*;
pub use model::*;
pub use plugin::*;
pub use ports::*;
pub use route::*;
pub use service::*;

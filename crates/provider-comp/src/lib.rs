//! Provider compensation metrics: wRVU roll-ups, benchmark percentiles, and pay derivation,
//! with repository ports and an HTTP router for hosting services.

pub mod compensation;
pub mod config;
pub mod error;
pub mod telemetry;

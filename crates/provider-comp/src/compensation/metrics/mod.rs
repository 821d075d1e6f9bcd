//! Store-backed facade over the metrics engine: record validation, repository ports,
//! recomputation, and the HTTP router.

pub mod repository;
pub mod router;
pub mod service;
pub mod validation;
pub mod views;

#[cfg(test)]
mod tests;

pub use repository::{
    BenchmarkCatalog, BulkRecomputeSummary, ProviderLedger, RecomputeFailure, RepositoryError,
};
pub use router::{metrics_router, ProductivityEntry};
pub use service::{CompensationMetricsService, MetricsServiceError};
pub use validation::{RecordGuard, ValidationError, ValidationPolicy};
pub use views::{PercentileLookup, PercentileRequest, ProviderYearSummary};

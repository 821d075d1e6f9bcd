use serde::{Deserialize, Serialize};

use super::super::domain::{
    AdjustmentId, BenchmarkRow, CompensationChange, ComputedPeriod, MonthlyAdjustment,
    MonthlyProductivity, PeriodKey, PeriodMetric, PeriodPayouts, Provider, ProviderId,
    TierSchedule, TierScheduleId,
};

/// Provider-owned records: attributes, productivity, adjustments, pay changes, and period
/// metrics. Deleting a provider removes everything it owns.
pub trait ProviderLedger: Send + Sync {
    fn upsert_provider(&self, provider: Provider) -> Result<Provider, RepositoryError>;
    fn provider(&self, id: &ProviderId) -> Result<Option<Provider>, RepositoryError>;
    fn providers(&self) -> Result<Vec<Provider>, RepositoryError>;
    fn delete_provider(&self, id: &ProviderId) -> Result<(), RepositoryError>;

    /// Create-or-update keyed on (provider, year, month).
    fn record_productivity(
        &self,
        entry: MonthlyProductivity,
    ) -> Result<MonthlyProductivity, RepositoryError>;
    fn productivity(
        &self,
        id: &ProviderId,
        year: i32,
    ) -> Result<Vec<MonthlyProductivity>, RepositoryError>;

    fn insert_adjustment(
        &self,
        adjustment: MonthlyAdjustment,
    ) -> Result<MonthlyAdjustment, RepositoryError>;
    fn adjustments(
        &self,
        id: &ProviderId,
        year: i32,
    ) -> Result<Vec<MonthlyAdjustment>, RepositoryError>;
    fn delete_adjustment(&self, id: &AdjustmentId) -> Result<(), RepositoryError>;

    fn insert_compensation_change(
        &self,
        change: CompensationChange,
    ) -> Result<CompensationChange, RepositoryError>;
    fn compensation_changes(
        &self,
        id: &ProviderId,
    ) -> Result<Vec<CompensationChange>, RepositoryError>;

    /// Atomic create-or-update of one period row. New rows start with zero payouts; existing
    /// rows keep theirs (see [`PeriodMetric::apply_computed`]).
    fn upsert_period_metric(&self, computed: ComputedPeriod)
        -> Result<PeriodMetric, RepositoryError>;
    fn period_metrics(&self, id: &ProviderId, year: i32)
        -> Result<Vec<PeriodMetric>, RepositoryError>;
    /// Fails with [`RepositoryError::NotFound`] when the period row does not exist.
    fn record_payouts(
        &self,
        key: &PeriodKey,
        payouts: PeriodPayouts,
    ) -> Result<PeriodMetric, RepositoryError>;
}

/// Specialty benchmarks and tier schedules. Reference data the engine only reads.
pub trait BenchmarkCatalog: Send + Sync {
    fn upsert_benchmark(&self, row: BenchmarkRow) -> Result<BenchmarkRow, RepositoryError>;
    /// Looks a row up by specialty, matching on [`specialty_key`](super::super::domain::specialty_key).
    fn benchmark(&self, specialty: &str) -> Result<Option<BenchmarkRow>, RepositoryError>;
    fn benchmarks(&self) -> Result<Vec<BenchmarkRow>, RepositoryError>;

    fn upsert_tier_schedule(&self, schedule: TierSchedule)
        -> Result<TierSchedule, RepositoryError>;
    fn tier_schedule(&self, id: &TierScheduleId) -> Result<Option<TierSchedule>, RepositoryError>;
    fn tier_schedules(&self) -> Result<Vec<TierSchedule>, RepositoryError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of recomputing every provider for one year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkRecomputeSummary {
    pub year: i32,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub periods_written: usize,
    pub failures: Vec<RecomputeFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecomputeFailure {
    pub provider_id: ProviderId,
    pub error: String,
}

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::super::domain::{
    finite_or_zero, specialty_key, AdjustmentId, AdjustmentSubmission, BenchmarkRow,
    CompensationChange, CompensationChangeId, CompensationChangeSubmission, CompensationModel,
    ComputedPeriod, MonthlyAdjustment, MonthlyProductivity, PeriodKey, PeriodMetric,
    PeriodPayouts, Provider, ProviderId, ProviderStatus, StatusChange, TierSchedule,
    TierScheduleId,
};
use super::super::engine::{
    annualize, latest_reported_month, normalize_for_benchmark, percentile_of, EngineSettings,
    MetricsEngine, PercentileRank, ProviderYear,
};
use super::repository::{
    BenchmarkCatalog, BulkRecomputeSummary, ProviderLedger, RecomputeFailure, RepositoryError,
};
use super::validation::{RecordGuard, ValidationError};
use super::views::{PercentileLookup, PercentileRequest, ProviderYearSummary};

/// Service composing the record guard, the stores, and the metrics engine.
pub struct CompensationMetricsService<L, B> {
    guard: Arc<RecordGuard>,
    ledger: Arc<L>,
    catalog: Arc<B>,
    engine: Arc<MetricsEngine>,
}

static ADJUSTMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static CHANGE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_adjustment_id() -> AdjustmentId {
    let id = ADJUSTMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    AdjustmentId(format!("adj-{id:06}"))
}

fn next_change_id() -> CompensationChangeId {
    let id = CHANGE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    CompensationChangeId(format!("chg-{id:06}"))
}

/// Inputs read from the stores for one provider-year.
struct LoadedInputs {
    benchmark: Option<BenchmarkRow>,
    tier_schedule: Option<TierSchedule>,
    raw_wrvus: Vec<MonthlyProductivity>,
    adjustments: Vec<MonthlyAdjustment>,
    compensation_changes: Vec<CompensationChange>,
}

impl<L, B> CompensationMetricsService<L, B>
where
    L: ProviderLedger + 'static,
    B: BenchmarkCatalog + 'static,
{
    pub fn new(ledger: Arc<L>, catalog: Arc<B>, settings: EngineSettings) -> Self {
        Self::with_guard(RecordGuard::default(), ledger, catalog, settings)
    }

    pub fn with_guard(
        guard: RecordGuard,
        ledger: Arc<L>,
        catalog: Arc<B>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            guard: Arc::new(guard),
            ledger,
            catalog,
            engine: Arc::new(MetricsEngine::new(settings)),
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        self.engine.settings()
    }

    /// Create or replace a provider record.
    pub fn upsert_provider(&self, provider: Provider) -> Result<Provider, MetricsServiceError> {
        self.guard.check_provider(&provider)?;
        let stored = self.ledger.upsert_provider(provider)?;
        debug!(provider_id = %stored.provider_id, "provider saved");
        Ok(stored)
    }

    pub fn provider(&self, id: &ProviderId) -> Result<Provider, MetricsServiceError> {
        self.ledger
            .provider(id)?
            .ok_or_else(|| MetricsServiceError::ProviderNotFound(id.clone()))
    }

    pub fn providers(&self) -> Result<Vec<Provider>, MetricsServiceError> {
        Ok(self.ledger.providers()?)
    }

    /// Moves a provider between Active and Inactive. Reactivation clears the termination date.
    pub fn change_status(
        &self,
        id: &ProviderId,
        change: StatusChange,
    ) -> Result<Provider, MetricsServiceError> {
        self.guard.check_status_change(&change)?;
        let mut provider = self.provider(id)?;
        provider.status = change.status;
        provider.termination_date = match change.status {
            ProviderStatus::Active => None,
            ProviderStatus::Inactive => change.termination_date,
        };
        let stored = self.ledger.upsert_provider(provider)?;
        info!(provider_id = %id, status = stored.status.label(), "provider status changed");
        Ok(stored)
    }

    /// Removes a provider and every record it owns.
    pub fn delete_provider(&self, id: &ProviderId) -> Result<(), MetricsServiceError> {
        self.ledger.delete_provider(id).map_err(|err| match err {
            RepositoryError::NotFound => MetricsServiceError::ProviderNotFound(id.clone()),
            other => MetricsServiceError::Repository(other),
        })?;
        info!(provider_id = %id, "provider deleted with dependent records");
        Ok(())
    }

    pub fn record_productivity(
        &self,
        id: &ProviderId,
        year: i32,
        month: u8,
        wrvus: f64,
    ) -> Result<MonthlyProductivity, MetricsServiceError> {
        self.guard.check_productivity(year, month, wrvus)?;
        self.provider(id)?;
        let entry = self.ledger.record_productivity(MonthlyProductivity {
            provider_id: id.clone(),
            year,
            month,
            wrvus,
        })?;
        Ok(entry)
    }

    pub fn add_adjustment(
        &self,
        id: &ProviderId,
        submission: AdjustmentSubmission,
    ) -> Result<MonthlyAdjustment, MetricsServiceError> {
        self.guard.check_adjustment(&submission)?;
        self.provider(id)?;
        let adjustment = MonthlyAdjustment {
            adjustment_id: next_adjustment_id(),
            provider_id: id.clone(),
            kind: submission.kind,
            year: submission.year,
            scope: submission.scope,
            delta: submission.delta,
            note: submission.note,
        };
        Ok(self.ledger.insert_adjustment(adjustment)?)
    }

    pub fn adjustments(
        &self,
        id: &ProviderId,
        year: i32,
    ) -> Result<Vec<MonthlyAdjustment>, MetricsServiceError> {
        self.provider(id)?;
        Ok(self.ledger.adjustments(id, year)?)
    }

    pub fn delete_adjustment(&self, id: &AdjustmentId) -> Result<(), MetricsServiceError> {
        self.ledger.delete_adjustment(id).map_err(|err| match err {
            RepositoryError::NotFound => MetricsServiceError::AdjustmentNotFound(id.0.clone()),
            other => MetricsServiceError::Repository(other),
        })
    }

    pub fn add_compensation_change(
        &self,
        id: &ProviderId,
        submission: CompensationChangeSubmission,
    ) -> Result<CompensationChange, MetricsServiceError> {
        self.guard.check_compensation_change(&submission)?;
        self.provider(id)?;
        let change = CompensationChange {
            change_id: next_change_id(),
            provider_id: id.clone(),
            effective_date: submission.effective_date,
            base_salary: submission.base_salary,
            conversion_factor: submission.conversion_factor,
            reason: submission.reason,
        };
        Ok(self.ledger.insert_compensation_change(change)?)
    }

    pub fn compensation_changes(
        &self,
        id: &ProviderId,
    ) -> Result<Vec<CompensationChange>, MetricsServiceError> {
        self.provider(id)?;
        Ok(self.ledger.compensation_changes(id)?)
    }

    pub fn upsert_benchmark(&self, row: BenchmarkRow) -> Result<BenchmarkRow, MetricsServiceError> {
        self.guard.check_benchmark(&row)?;
        Ok(self.catalog.upsert_benchmark(row)?)
    }

    pub fn benchmark(&self, specialty: &str) -> Result<BenchmarkRow, MetricsServiceError> {
        self.catalog
            .benchmark(specialty)?
            .ok_or_else(|| MetricsServiceError::BenchmarkNotFound(specialty.to_string()))
    }

    pub fn benchmarks(&self) -> Result<Vec<BenchmarkRow>, MetricsServiceError> {
        Ok(self.catalog.benchmarks()?)
    }

    pub fn upsert_tier_schedule(
        &self,
        schedule: TierSchedule,
    ) -> Result<TierSchedule, MetricsServiceError> {
        self.guard.check_tier_schedule(&schedule)?;
        Ok(self.catalog.upsert_tier_schedule(schedule)?)
    }

    pub fn tier_schedule(&self, id: &TierScheduleId) -> Result<TierSchedule, MetricsServiceError> {
        self.catalog
            .tier_schedule(id)?
            .ok_or_else(|| MetricsServiceError::TierScheduleNotFound(id.0.clone()))
    }

    pub fn tier_schedules(&self) -> Result<Vec<TierSchedule>, MetricsServiceError> {
        Ok(self.catalog.tier_schedules()?)
    }

    /// Ranks an arbitrary value against a specialty's bands. An unknown specialty is not an
    /// error: the lookup reports 0 and `N/A`.
    pub fn percentile(
        &self,
        request: PercentileRequest,
    ) -> Result<PercentileLookup, MetricsServiceError> {
        if let Some(months) = request.months_completed {
            self.guard.check_months_completed(months)?;
        }
        let value = finite_or_zero(request.value);
        let annualized = match request.months_completed {
            Some(months) => annualize(value, months),
            None => value,
        };
        let normalized_value = match &request.fte {
            Some(fte) => {
                normalize_for_benchmark(annualized, 0, fte, self.engine.settings().fte_basis)
            }
            None => annualized,
        };

        let rank = match self.catalog.benchmark(&request.specialty)? {
            Some(row) => percentile_of(normalized_value, row.bands(request.metric)),
            None => {
                warn!(
                    specialty = %request.specialty,
                    "no benchmark row for specialty; percentile reported as N/A"
                );
                PercentileRank::unavailable()
            }
        };

        Ok(PercentileLookup {
            specialty: request.specialty,
            metric: request.metric,
            value,
            normalized_value,
            percentile: rank.percentile,
            nearest_benchmark: rank.nearest_benchmark,
        })
    }

    /// Rolls up one provider-year through its latest reported month and upserts every period.
    pub fn recompute_year(
        &self,
        id: &ProviderId,
        year: i32,
    ) -> Result<Vec<PeriodMetric>, MetricsServiceError> {
        self.guard.check_period(year, 1)?;
        let provider = self.provider(id)?;
        let inputs = self.load_inputs(&provider, year)?;

        let Some(through_month) = latest_reported_month(&inputs.raw_wrvus, year) else {
            info!(provider_id = %id, year, "no productivity reported; nothing to roll up");
            return Ok(Vec::new());
        };

        let computed = self.compute(&provider, year, through_month, &inputs);
        let mut stored = Vec::with_capacity(computed.len());
        for period in computed {
            stored.push(self.ledger.upsert_period_metric(period)?);
        }

        info!(
            provider_id = %id,
            year,
            periods = stored.len(),
            "period metrics recomputed"
        );
        Ok(stored)
    }

    /// Recomputes a single period. Earlier months are rolled up in memory so running totals
    /// are correct, but only the requested month is written. Months past the latest reported
    /// productivity have no period.
    pub fn recompute_period(
        &self,
        id: &ProviderId,
        year: i32,
        month: u8,
    ) -> Result<PeriodMetric, MetricsServiceError> {
        self.guard.check_period(year, month)?;
        let provider = self.provider(id)?;
        let inputs = self.load_inputs(&provider, year)?;
        let not_found = || MetricsServiceError::PeriodNotFound {
            provider_id: id.clone(),
            year,
            month,
        };

        match latest_reported_month(&inputs.raw_wrvus, year) {
            Some(latest) if month <= latest => {}
            _ => return Err(not_found()),
        }

        let period = self
            .compute(&provider, year, month, &inputs)
            .into_iter()
            .find(|period| period.key.month == month)
            .ok_or_else(not_found)?;

        let stored = self.ledger.upsert_period_metric(period)?;
        debug!(provider_id = %id, year, month, "period metric recomputed");
        Ok(stored)
    }

    /// Recomputes every provider active during `year`. One provider's failure is recorded in
    /// the summary and does not stop the batch.
    pub fn recompute_all(&self, year: i32) -> Result<BulkRecomputeSummary, MetricsServiceError> {
        self.guard.check_period(year, 1)?;
        let providers = self.ledger.providers()?;
        let mut summary = BulkRecomputeSummary {
            year,
            ..BulkRecomputeSummary::default()
        };

        for provider in providers {
            if !provider.is_active_in(year) {
                summary.skipped += 1;
                continue;
            }

            summary.processed += 1;
            match self.recompute_year(&provider.provider_id, year) {
                Ok(periods) => {
                    summary.succeeded += 1;
                    summary.periods_written += periods.len();
                }
                Err(err) => {
                    warn!(
                        provider_id = %provider.provider_id,
                        year,
                        error = %err,
                        "provider recompute failed"
                    );
                    summary.failed += 1;
                    summary.failures.push(RecomputeFailure {
                        provider_id: provider.provider_id.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            year,
            processed = summary.processed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            "bulk recompute finished"
        );
        Ok(summary)
    }

    pub fn period_metrics(
        &self,
        id: &ProviderId,
        year: i32,
    ) -> Result<Vec<PeriodMetric>, MetricsServiceError> {
        self.provider(id)?;
        let mut metrics = self.ledger.period_metrics(id, year)?;
        metrics.sort_by_key(|metric| metric.month);
        Ok(metrics)
    }

    pub fn record_payouts(
        &self,
        id: &ProviderId,
        year: i32,
        month: u8,
        payouts: PeriodPayouts,
    ) -> Result<PeriodMetric, MetricsServiceError> {
        self.guard.check_period(year, month)?;
        self.guard.check_payouts(&payouts)?;
        let key = PeriodKey {
            provider_id: id.clone(),
            year,
            month,
        };
        self.ledger
            .record_payouts(&key, payouts)
            .map_err(|err| match err {
                RepositoryError::NotFound => MetricsServiceError::PeriodNotFound {
                    provider_id: id.clone(),
                    year,
                    month,
                },
                other => MetricsServiceError::Repository(other),
            })
    }

    pub fn summary(
        &self,
        id: &ProviderId,
        year: i32,
    ) -> Result<ProviderYearSummary, MetricsServiceError> {
        let provider = self.provider(id)?;
        let metrics = self.ledger.period_metrics(id, year)?;
        Ok(ProviderYearSummary::from_metrics(&provider, year, &metrics))
    }

    fn load_inputs(
        &self,
        provider: &Provider,
        year: i32,
    ) -> Result<LoadedInputs, MetricsServiceError> {
        let id = &provider.provider_id;

        let benchmark = self.catalog.benchmark(&provider.specialty)?;
        if benchmark.is_none() {
            warn!(
                provider_id = %id,
                specialty = %provider.specialty,
                specialty_key = %specialty_key(&provider.specialty),
                "no benchmark row for specialty; percentiles reported as N/A"
            );
        }

        let tier_schedule = match (&provider.compensation_model, &provider.tier_schedule_id) {
            (CompensationModel::Tiered, Some(schedule_id)) => {
                let schedule = self.catalog.tier_schedule(schedule_id)?.ok_or_else(|| {
                    MetricsServiceError::TierScheduleNotFound(schedule_id.0.clone())
                })?;
                Some(schedule)
            }
            (CompensationModel::Tiered, None) => {
                return Err(ValidationError::MissingTierSchedule.into());
            }
            _ => None,
        };

        Ok(LoadedInputs {
            benchmark,
            tier_schedule,
            raw_wrvus: self.ledger.productivity(id, year)?,
            adjustments: self.ledger.adjustments(id, year)?,
            compensation_changes: self.ledger.compensation_changes(id)?,
        })
    }

    fn compute(
        &self,
        provider: &Provider,
        year: i32,
        through_month: u8,
        inputs: &LoadedInputs,
    ) -> Vec<ComputedPeriod> {
        self.engine.compute_year(&ProviderYear {
            provider,
            year,
            through_month,
            benchmark: inputs.benchmark.as_ref(),
            raw_wrvus: &inputs.raw_wrvus,
            adjustments: &inputs.adjustments,
            compensation_changes: &inputs.compensation_changes,
            tier_schedule: inputs.tier_schedule.as_ref(),
        })
    }
}

/// Error raised by the metrics service.
#[derive(Debug, thiserror::Error)]
pub enum MetricsServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("provider {0} not found")]
    ProviderNotFound(ProviderId),
    #[error("no period metric for provider {provider_id} in {year}-{month:02}")]
    PeriodNotFound {
        provider_id: ProviderId,
        year: i32,
        month: u8,
    },
    #[error("no benchmark for specialty '{0}'")]
    BenchmarkNotFound(String),
    #[error("tier schedule {0} not found")]
    TierScheduleNotFound(String),
    #[error("adjustment {0} not found")]
    AdjustmentNotFound(String),
}

impl MetricsServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ProviderNotFound(_)
                | Self::PeriodNotFound { .. }
                | Self::BenchmarkNotFound(_)
                | Self::TierScheduleNotFound(_)
                | Self::AdjustmentNotFound(_)
                | Self::Repository(RepositoryError::NotFound)
        )
    }
}

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::compensation::domain::{
    specialty_key, AdjustmentId, BenchmarkRow, CompensationChange, CompensationModel,
    ComputedPeriod, ConversionTier, Fte, MonthlyAdjustment, MonthlyProductivity,
    PercentileBands, PeriodKey, PeriodMetric, PeriodPayouts, Provider, ProviderId,
    ProviderStatus, TierSchedule, TierScheduleId,
};
use crate::compensation::engine::EngineSettings;
use crate::compensation::metrics::repository::{BenchmarkCatalog, ProviderLedger, RepositoryError};
use crate::compensation::metrics::{metrics_router, CompensationMetricsService};

pub(super) const YEAR: i32 = 2025;

pub(super) fn provider_id(raw: &str) -> ProviderId {
    ProviderId(raw.to_string())
}

pub(super) fn provider(raw_id: &str) -> Provider {
    Provider {
        provider_id: provider_id(raw_id),
        name: "Dana Whitfield".to_string(),
        specialty: "Family Medicine".to_string(),
        fte: Fte::full_time(),
        annual_wrvu_target: 4800.0,
        base_salary: 120_000.0,
        compensation_model: CompensationModel::Standard,
        conversion_factor: 50.0,
        tier_schedule_id: None,
        status: ProviderStatus::Active,
        termination_date: None,
    }
}

pub(super) fn tiered_provider(raw_id: &str, schedule: &str) -> Provider {
    Provider {
        compensation_model: CompensationModel::Tiered,
        tier_schedule_id: Some(TierScheduleId(schedule.to_string())),
        ..provider(raw_id)
    }
}

pub(super) fn benchmark() -> BenchmarkRow {
    BenchmarkRow {
        specialty: "Family Medicine".to_string(),
        total_compensation: PercentileBands::new(300_000.0, 360_000.0, 420_000.0, 480_000.0),
        wrvus: PercentileBands::new(4000.0, 4500.0, 5000.0, 5500.0),
        conversion_factor: PercentileBands::new(45.0, 50.0, 55.0, 60.0),
    }
}

pub(super) fn tier_schedule(raw_id: &str) -> TierSchedule {
    TierSchedule {
        schedule_id: TierScheduleId(raw_id.to_string()),
        name: "Primary care ladder".to_string(),
        tiers: vec![
            ConversionTier {
                threshold: 0.0,
                conversion_factor: 45.0,
            },
            ConversionTier {
                threshold: 1000.0,
                conversion_factor: 55.0,
            },
        ],
    }
}

pub(super) type TestService = CompensationMetricsService<MemoryLedger, MemoryCatalog>;

pub(super) fn build_service() -> (TestService, Arc<MemoryLedger>, Arc<MemoryCatalog>) {
    let ledger = Arc::new(MemoryLedger::default());
    let catalog = Arc::new(MemoryCatalog::default());
    let service =
        CompensationMetricsService::new(ledger.clone(), catalog.clone(), EngineSettings::default());
    (service, ledger, catalog)
}

/// Service seeded with one benchmarked provider and three months of 400 wRVUs.
pub(super) fn seeded_service() -> (TestService, Arc<MemoryLedger>, Arc<MemoryCatalog>) {
    let (service, ledger, catalog) = build_service();
    service.upsert_benchmark(benchmark()).expect("benchmark saved");
    service.upsert_provider(provider("E100")).expect("provider saved");
    for month in 1..=3 {
        service
            .record_productivity(&provider_id("E100"), YEAR, month, 400.0)
            .expect("productivity saved");
    }
    (service, ledger, catalog)
}

#[derive(Default)]
struct LedgerState {
    providers: BTreeMap<ProviderId, Provider>,
    productivity: BTreeMap<PeriodKey, MonthlyProductivity>,
    adjustments: Vec<MonthlyAdjustment>,
    changes: Vec<CompensationChange>,
    metrics: BTreeMap<PeriodKey, PeriodMetric>,
}

#[derive(Default, Clone)]
pub(super) struct MemoryLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl MemoryLedger {
    pub(super) fn stored_metrics(&self) -> Vec<PeriodMetric> {
        let guard = self.state.lock().expect("ledger mutex poisoned");
        guard.metrics.values().cloned().collect()
    }

    pub(super) fn adjustment_count(&self) -> usize {
        self.state
            .lock()
            .expect("ledger mutex poisoned")
            .adjustments
            .len()
    }
}

impl ProviderLedger for MemoryLedger {
    fn upsert_provider(&self, provider: Provider) -> Result<Provider, RepositoryError> {
        let mut guard = self.state.lock().expect("ledger mutex poisoned");
        guard
            .providers
            .insert(provider.provider_id.clone(), provider.clone());
        Ok(provider)
    }

    fn provider(&self, id: &ProviderId) -> Result<Option<Provider>, RepositoryError> {
        let guard = self.state.lock().expect("ledger mutex poisoned");
        Ok(guard.providers.get(id).cloned())
    }

    fn providers(&self) -> Result<Vec<Provider>, RepositoryError> {
        let guard = self.state.lock().expect("ledger mutex poisoned");
        Ok(guard.providers.values().cloned().collect())
    }

    fn delete_provider(&self, id: &ProviderId) -> Result<(), RepositoryError> {
        let mut guard = self.state.lock().expect("ledger mutex poisoned");
        if guard.providers.remove(id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        guard.productivity.retain(|key, _| &key.provider_id != id);
        guard.adjustments.retain(|item| &item.provider_id != id);
        guard.changes.retain(|item| &item.provider_id != id);
        guard.metrics.retain(|key, _| &key.provider_id != id);
        Ok(())
    }

    fn record_productivity(
        &self,
        entry: MonthlyProductivity,
    ) -> Result<MonthlyProductivity, RepositoryError> {
        let mut guard = self.state.lock().expect("ledger mutex poisoned");
        let key = PeriodKey {
            provider_id: entry.provider_id.clone(),
            year: entry.year,
            month: entry.month,
        };
        guard.productivity.insert(key, entry.clone());
        Ok(entry)
    }

    fn productivity(
        &self,
        id: &ProviderId,
        year: i32,
    ) -> Result<Vec<MonthlyProductivity>, RepositoryError> {
        let guard = self.state.lock().expect("ledger mutex poisoned");
        Ok(guard
            .productivity
            .values()
            .filter(|entry| &entry.provider_id == id && entry.year == year)
            .cloned()
            .collect())
    }

    fn insert_adjustment(
        &self,
        adjustment: MonthlyAdjustment,
    ) -> Result<MonthlyAdjustment, RepositoryError> {
        let mut guard = self.state.lock().expect("ledger mutex poisoned");
        guard.adjustments.push(adjustment.clone());
        Ok(adjustment)
    }

    fn adjustments(
        &self,
        id: &ProviderId,
        year: i32,
    ) -> Result<Vec<MonthlyAdjustment>, RepositoryError> {
        let guard = self.state.lock().expect("ledger mutex poisoned");
        Ok(guard
            .adjustments
            .iter()
            .filter(|item| &item.provider_id == id && item.year == year)
            .cloned()
            .collect())
    }

    fn delete_adjustment(&self, id: &AdjustmentId) -> Result<(), RepositoryError> {
        let mut guard = self.state.lock().expect("ledger mutex poisoned");
        let before = guard.adjustments.len();
        guard.adjustments.retain(|item| &item.adjustment_id != id);
        if guard.adjustments.len() == before {
            Err(RepositoryError::NotFound)
        } else {
            Ok(())
        }
    }

    fn insert_compensation_change(
        &self,
        change: CompensationChange,
    ) -> Result<CompensationChange, RepositoryError> {
        let mut guard = self.state.lock().expect("ledger mutex poisoned");
        guard.changes.push(change.clone());
        Ok(change)
    }

    fn compensation_changes(
        &self,
        id: &ProviderId,
    ) -> Result<Vec<CompensationChange>, RepositoryError> {
        let guard = self.state.lock().expect("ledger mutex poisoned");
        Ok(guard
            .changes
            .iter()
            .filter(|item| &item.provider_id == id)
            .cloned()
            .collect())
    }

    fn upsert_period_metric(
        &self,
        computed: ComputedPeriod,
    ) -> Result<PeriodMetric, RepositoryError> {
        let mut guard = self.state.lock().expect("ledger mutex poisoned");
        let key = computed.key.clone();
        let stored = match guard.metrics.get_mut(&key) {
            Some(existing) => {
                existing.apply_computed(computed);
                existing.clone()
            }
            None => {
                let metric = PeriodMetric::from_computed(computed);
                guard.metrics.insert(key, metric.clone());
                metric
            }
        };
        Ok(stored)
    }

    fn period_metrics(
        &self,
        id: &ProviderId,
        year: i32,
    ) -> Result<Vec<PeriodMetric>, RepositoryError> {
        let guard = self.state.lock().expect("ledger mutex poisoned");
        Ok(guard
            .metrics
            .values()
            .filter(|metric| &metric.provider_id == id && metric.year == year)
            .cloned()
            .collect())
    }

    fn record_payouts(
        &self,
        key: &PeriodKey,
        payouts: PeriodPayouts,
    ) -> Result<PeriodMetric, RepositoryError> {
        let mut guard = self.state.lock().expect("ledger mutex poisoned");
        let metric = guard.metrics.get_mut(key).ok_or(RepositoryError::NotFound)?;
        metric.incentive = payouts.incentive;
        metric.holdback = payouts.holdback;
        Ok(metric.clone())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryCatalog {
    benchmarks: Arc<Mutex<HashMap<String, BenchmarkRow>>>,
    schedules: Arc<Mutex<BTreeMap<TierScheduleId, TierSchedule>>>,
}

impl BenchmarkCatalog for MemoryCatalog {
    fn upsert_benchmark(&self, row: BenchmarkRow) -> Result<BenchmarkRow, RepositoryError> {
        let mut guard = self.benchmarks.lock().expect("catalog mutex poisoned");
        guard.insert(specialty_key(&row.specialty), row.clone());
        Ok(row)
    }

    fn benchmark(&self, specialty: &str) -> Result<Option<BenchmarkRow>, RepositoryError> {
        let guard = self.benchmarks.lock().expect("catalog mutex poisoned");
        Ok(guard.get(&specialty_key(specialty)).cloned())
    }

    fn benchmarks(&self) -> Result<Vec<BenchmarkRow>, RepositoryError> {
        let guard = self.benchmarks.lock().expect("catalog mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn upsert_tier_schedule(
        &self,
        schedule: TierSchedule,
    ) -> Result<TierSchedule, RepositoryError> {
        let mut guard = self.schedules.lock().expect("catalog mutex poisoned");
        guard.insert(schedule.schedule_id.clone(), schedule.clone());
        Ok(schedule)
    }

    fn tier_schedule(&self, id: &TierScheduleId) -> Result<Option<TierSchedule>, RepositoryError> {
        let guard = self.schedules.lock().expect("catalog mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn tier_schedules(&self) -> Result<Vec<TierSchedule>, RepositoryError> {
        let guard = self.schedules.lock().expect("catalog mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

/// Ledger whose every call fails as if the backing store were down.
pub(super) struct UnavailableLedger;

impl ProviderLedger for UnavailableLedger {
    fn upsert_provider(&self, _provider: Provider) -> Result<Provider, RepositoryError> {
        offline()
    }

    fn provider(&self, _id: &ProviderId) -> Result<Option<Provider>, RepositoryError> {
        offline()
    }

    fn providers(&self) -> Result<Vec<Provider>, RepositoryError> {
        offline()
    }

    fn delete_provider(&self, _id: &ProviderId) -> Result<(), RepositoryError> {
        offline()
    }

    fn record_productivity(
        &self,
        _entry: MonthlyProductivity,
    ) -> Result<MonthlyProductivity, RepositoryError> {
        offline()
    }

    fn productivity(
        &self,
        _id: &ProviderId,
        _year: i32,
    ) -> Result<Vec<MonthlyProductivity>, RepositoryError> {
        offline()
    }

    fn insert_adjustment(
        &self,
        _adjustment: MonthlyAdjustment,
    ) -> Result<MonthlyAdjustment, RepositoryError> {
        offline()
    }

    fn adjustments(
        &self,
        _id: &ProviderId,
        _year: i32,
    ) -> Result<Vec<MonthlyAdjustment>, RepositoryError> {
        offline()
    }

    fn delete_adjustment(&self, _id: &AdjustmentId) -> Result<(), RepositoryError> {
        offline()
    }

    fn insert_compensation_change(
        &self,
        _change: CompensationChange,
    ) -> Result<CompensationChange, RepositoryError> {
        offline()
    }

    fn compensation_changes(
        &self,
        _id: &ProviderId,
    ) -> Result<Vec<CompensationChange>, RepositoryError> {
        offline()
    }

    fn upsert_period_metric(
        &self,
        _computed: ComputedPeriod,
    ) -> Result<PeriodMetric, RepositoryError> {
        offline()
    }

    fn period_metrics(
        &self,
        _id: &ProviderId,
        _year: i32,
    ) -> Result<Vec<PeriodMetric>, RepositoryError> {
        offline()
    }

    fn record_payouts(
        &self,
        _key: &PeriodKey,
        _payouts: PeriodPayouts,
    ) -> Result<PeriodMetric, RepositoryError> {
        offline()
    }
}

/// Ledger that accepts reads but rejects provider writes as duplicates.
#[derive(Default)]
pub(super) struct ConflictLedger {
    inner: MemoryLedger,
}

impl ProviderLedger for ConflictLedger {
    fn upsert_provider(&self, _provider: Provider) -> Result<Provider, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn provider(&self, id: &ProviderId) -> Result<Option<Provider>, RepositoryError> {
        self.inner.provider(id)
    }

    fn providers(&self) -> Result<Vec<Provider>, RepositoryError> {
        self.inner.providers()
    }

    fn delete_provider(&self, id: &ProviderId) -> Result<(), RepositoryError> {
        self.inner.delete_provider(id)
    }

    fn record_productivity(
        &self,
        entry: MonthlyProductivity,
    ) -> Result<MonthlyProductivity, RepositoryError> {
        self.inner.record_productivity(entry)
    }

    fn productivity(
        &self,
        id: &ProviderId,
        year: i32,
    ) -> Result<Vec<MonthlyProductivity>, RepositoryError> {
        self.inner.productivity(id, year)
    }

    fn insert_adjustment(
        &self,
        adjustment: MonthlyAdjustment,
    ) -> Result<MonthlyAdjustment, RepositoryError> {
        self.inner.insert_adjustment(adjustment)
    }

    fn adjustments(
        &self,
        id: &ProviderId,
        year: i32,
    ) -> Result<Vec<MonthlyAdjustment>, RepositoryError> {
        self.inner.adjustments(id, year)
    }

    fn delete_adjustment(&self, id: &AdjustmentId) -> Result<(), RepositoryError> {
        self.inner.delete_adjustment(id)
    }

    fn insert_compensation_change(
        &self,
        change: CompensationChange,
    ) -> Result<CompensationChange, RepositoryError> {
        self.inner.insert_compensation_change(change)
    }

    fn compensation_changes(
        &self,
        id: &ProviderId,
    ) -> Result<Vec<CompensationChange>, RepositoryError> {
        self.inner.compensation_changes(id)
    }

    fn upsert_period_metric(
        &self,
        computed: ComputedPeriod,
    ) -> Result<PeriodMetric, RepositoryError> {
        self.inner.upsert_period_metric(computed)
    }

    fn period_metrics(
        &self,
        id: &ProviderId,
        year: i32,
    ) -> Result<Vec<PeriodMetric>, RepositoryError> {
        self.inner.period_metrics(id, year)
    }

    fn record_payouts(
        &self,
        key: &PeriodKey,
        payouts: PeriodPayouts,
    ) -> Result<PeriodMetric, RepositoryError> {
        self.inner.record_payouts(key, payouts)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_with_service(service: TestService) -> axum::Router {
    metrics_router(Arc::new(service))
}

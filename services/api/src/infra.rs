use metrics_exporter_prometheus::PrometheusHandle;
use provider_comp::compensation::domain::{
    specialty_key, AdjustmentId, BenchmarkRow, CompensationChange, ComputedPeriod,
    MonthlyAdjustment, MonthlyProductivity, PeriodKey, PeriodMetric, PeriodPayouts, Provider,
    ProviderId, TierSchedule, TierScheduleId,
};
use provider_comp::compensation::metrics::{BenchmarkCatalog, ProviderLedger, RepositoryError};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct LedgerTables {
    providers: BTreeMap<ProviderId, Provider>,
    productivity: BTreeMap<PeriodKey, MonthlyProductivity>,
    adjustments: Vec<MonthlyAdjustment>,
    changes: Vec<CompensationChange>,
    metrics: BTreeMap<PeriodKey, PeriodMetric>,
}

/// Provider-owned records behind one lock so cascades and period upserts are atomic.
#[derive(Default, Clone)]
pub(crate) struct InMemoryProviderLedger {
    tables: Arc<Mutex<LedgerTables>>,
}

impl ProviderLedger for InMemoryProviderLedger {
    fn upsert_provider(&self, provider: Provider) -> Result<Provider, RepositoryError> {
        let mut guard = self.tables.lock().expect("ledger mutex poisoned");
        guard
            .providers
            .insert(provider.provider_id.clone(), provider.clone());
        Ok(provider)
    }

    fn provider(&self, id: &ProviderId) -> Result<Option<Provider>, RepositoryError> {
        let guard = self.tables.lock().expect("ledger mutex poisoned");
        Ok(guard.providers.get(id).cloned())
    }

    fn providers(&self) -> Result<Vec<Provider>, RepositoryError> {
        let guard = self.tables.lock().expect("ledger mutex poisoned");
        Ok(guard.providers.values().cloned().collect())
    }

    fn delete_provider(&self, id: &ProviderId) -> Result<(), RepositoryError> {
        let mut guard = self.tables.lock().expect("ledger mutex poisoned");
        if guard.providers.remove(id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        guard.productivity.retain(|key, _| &key.provider_id != id);
        guard
            .adjustments
            .retain(|adjustment| &adjustment.provider_id != id);
        guard.changes.retain(|change| &change.provider_id != id);
        guard.metrics.retain(|key, _| &key.provider_id != id);
        Ok(())
    }

    fn record_productivity(
        &self,
        entry: MonthlyProductivity,
    ) -> Result<MonthlyProductivity, RepositoryError> {
        let mut guard = self.tables.lock().expect("ledger mutex poisoned");
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
        let guard = self.tables.lock().expect("ledger mutex poisoned");
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
        let mut guard = self.tables.lock().expect("ledger mutex poisoned");
        if guard
            .adjustments
            .iter()
            .any(|existing| existing.adjustment_id == adjustment.adjustment_id)
        {
            return Err(RepositoryError::Conflict);
        }
        guard.adjustments.push(adjustment.clone());
        Ok(adjustment)
    }

    fn adjustments(
        &self,
        id: &ProviderId,
        year: i32,
    ) -> Result<Vec<MonthlyAdjustment>, RepositoryError> {
        let guard = self.tables.lock().expect("ledger mutex poisoned");
        Ok(guard
            .adjustments
            .iter()
            .filter(|adjustment| &adjustment.provider_id == id && adjustment.year == year)
            .cloned()
            .collect())
    }

    fn delete_adjustment(&self, id: &AdjustmentId) -> Result<(), RepositoryError> {
        let mut guard = self.tables.lock().expect("ledger mutex poisoned");
        let before = guard.adjustments.len();
        guard
            .adjustments
            .retain(|adjustment| &adjustment.adjustment_id != id);
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
        let mut guard = self.tables.lock().expect("ledger mutex poisoned");
        if guard
            .changes
            .iter()
            .any(|existing| existing.change_id == change.change_id)
        {
            return Err(RepositoryError::Conflict);
        }
        guard.changes.push(change.clone());
        Ok(change)
    }

    fn compensation_changes(
        &self,
        id: &ProviderId,
    ) -> Result<Vec<CompensationChange>, RepositoryError> {
        let guard = self.tables.lock().expect("ledger mutex poisoned");
        let mut changes: Vec<CompensationChange> = guard
            .changes
            .iter()
            .filter(|change| &change.provider_id == id)
            .cloned()
            .collect();
        changes.sort_by_key(|change| change.effective_date);
        Ok(changes)
    }

    fn upsert_period_metric(
        &self,
        computed: ComputedPeriod,
    ) -> Result<PeriodMetric, RepositoryError> {
        let mut guard = self.tables.lock().expect("ledger mutex poisoned");
        let key = computed.key.clone();
        if let Some(existing) = guard.metrics.get_mut(&key) {
            existing.apply_computed(computed);
            return Ok(existing.clone());
        }
        let metric = PeriodMetric::from_computed(computed);
        guard.metrics.insert(key, metric.clone());
        Ok(metric)
    }

    fn period_metrics(
        &self,
        id: &ProviderId,
        year: i32,
    ) -> Result<Vec<PeriodMetric>, RepositoryError> {
        let guard = self.tables.lock().expect("ledger mutex poisoned");
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
        let mut guard = self.tables.lock().expect("ledger mutex poisoned");
        let metric = guard.metrics.get_mut(key).ok_or(RepositoryError::NotFound)?;
        metric.incentive = payouts.incentive;
        metric.holdback = payouts.holdback;
        Ok(metric.clone())
    }
}

/// Benchmarks keyed by normalized specialty so lookups tolerate spelling noise.
#[derive(Default, Clone)]
pub(crate) struct InMemoryBenchmarkCatalog {
    benchmarks: Arc<Mutex<HashMap<String, BenchmarkRow>>>,
    schedules: Arc<Mutex<BTreeMap<TierScheduleId, TierSchedule>>>,
}

impl BenchmarkCatalog for InMemoryBenchmarkCatalog {
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
        let mut rows: Vec<BenchmarkRow> = guard.values().cloned().collect();
        rows.sort_by(|left, right| left.specialty.cmp(&right.specialty));
        Ok(rows)
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

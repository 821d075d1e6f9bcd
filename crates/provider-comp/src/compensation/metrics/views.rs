use serde::{Deserialize, Serialize};

use super::super::domain::{BenchmarkMetric, Fte, PeriodMetric, Provider, ProviderId};
use super::super::engine::PercentileRank;

/// Year-to-date snapshot of a provider built from the latest persisted period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderYearSummary {
    pub provider_id: ProviderId,
    pub name: String,
    pub specialty: String,
    pub status: &'static str,
    pub year: i32,
    pub months_reported: u8,
    pub ytd_wrvus: f64,
    pub ytd_target: f64,
    pub plan_progress: f64,
    pub wrvu_percentile: f64,
    pub wrvu_benchmark: String,
    pub ytd_compensation: f64,
    pub annualized_compensation: f64,
    pub compensation_percentile: f64,
    pub compensation_benchmark: String,
    pub total_incentive: f64,
    pub total_holdback: f64,
}

impl ProviderYearSummary {
    pub fn from_metrics(provider: &Provider, year: i32, metrics: &[PeriodMetric]) -> Self {
        let latest = metrics
            .iter()
            .filter(|metric| metric.year == year)
            .max_by_key(|metric| metric.month);
        let unavailable = PercentileRank::unavailable();

        Self {
            provider_id: provider.provider_id.clone(),
            name: provider.name.clone(),
            specialty: provider.specialty.clone(),
            status: provider.status.label(),
            year,
            months_reported: latest.map(|metric| metric.months_completed).unwrap_or(0),
            ytd_wrvus: latest.map(|metric| metric.cumulative_wrvus).unwrap_or(0.0),
            ytd_target: latest.map(|metric| metric.cumulative_target).unwrap_or(0.0),
            plan_progress: latest.map(|metric| metric.plan_progress).unwrap_or(0.0),
            wrvu_percentile: latest.map(|metric| metric.wrvu_percentile).unwrap_or(0.0),
            wrvu_benchmark: latest
                .map(|metric| metric.wrvu_benchmark.clone())
                .unwrap_or_else(|| unavailable.nearest_benchmark.clone()),
            ytd_compensation: latest
                .map(|metric| metric.cumulative_compensation)
                .unwrap_or(0.0),
            annualized_compensation: latest
                .map(|metric| metric.annualized_compensation)
                .unwrap_or(0.0),
            compensation_percentile: latest
                .map(|metric| metric.compensation_percentile)
                .unwrap_or(0.0),
            compensation_benchmark: latest
                .map(|metric| metric.compensation_benchmark.clone())
                .unwrap_or(unavailable.nearest_benchmark),
            total_incentive: metrics
                .iter()
                .filter(|metric| metric.year == year)
                .map(|metric| metric.incentive)
                .sum(),
            total_holdback: metrics
                .iter()
                .filter(|metric| metric.year == year)
                .map(|metric| metric.holdback)
                .sum(),
        }
    }
}

/// Ad hoc percentile lookup request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentileRequest {
    pub specialty: String,
    pub metric: BenchmarkMetric,
    pub value: f64,
    /// When present the value is treated as year-to-date and annualized first.
    #[serde(default)]
    pub months_completed: Option<u8>,
    #[serde(default)]
    pub fte: Option<Fte>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentileLookup {
    pub specialty: String,
    pub metric: BenchmarkMetric,
    pub value: f64,
    pub normalized_value: f64,
    pub percentile: f64,
    pub nearest_benchmark: String,
}

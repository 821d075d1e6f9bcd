mod pay;
mod percentile;
mod rollup;
mod settings;

pub use pay::{derive_pay, tier_factor, PayModel, PeriodPay};
pub use percentile::{
    annualize, effective_fte, normalize_for_benchmark, percentile_of, PercentileRank,
    UNAVAILABLE_LABEL,
};
pub use rollup::{latest_reported_month, roll_up, RollupInputs, RollupPeriod};
pub use settings::{EngineSettings, FteBasis, TierBoundary};

use super::domain::{
    BenchmarkMetric, BenchmarkRow, CompensationChange, CompensationModel, ComputedPeriod, Fte,
    MonthlyAdjustment, MonthlyProductivity, PeriodKey, Provider, TierSchedule,
};

/// Everything the engine needs to derive one provider's metrics for one year.
#[derive(Debug, Clone, Copy)]
pub struct ProviderYear<'a> {
    pub provider: &'a Provider,
    pub year: i32,
    pub through_month: u8,
    pub benchmark: Option<&'a BenchmarkRow>,
    pub raw_wrvus: &'a [MonthlyProductivity],
    pub adjustments: &'a [MonthlyAdjustment],
    pub compensation_changes: &'a [CompensationChange],
    pub tier_schedule: Option<&'a TierSchedule>,
}

/// Stateless calculator combining roll-up, pay derivation, and benchmark ranking.
pub struct MetricsEngine {
    settings: EngineSettings,
}

impl MetricsEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    /// Ranks a year-to-date value after annualizing and FTE-normalizing it. A missing
    /// benchmark row yields the `N/A` sentinel.
    pub fn rank(
        &self,
        value: f64,
        months_completed: u8,
        fte: &Fte,
        benchmark: Option<&BenchmarkRow>,
        metric: BenchmarkMetric,
    ) -> PercentileRank {
        match benchmark {
            Some(row) => {
                let normalized =
                    normalize_for_benchmark(value, months_completed, fte, self.settings.fte_basis);
                percentile_of(normalized, row.bands(metric))
            }
            None => PercentileRank::unavailable(),
        }
    }

    pub fn compute_year(&self, input: &ProviderYear<'_>) -> Vec<ComputedPeriod> {
        let provider = input.provider;
        let periods = roll_up(&RollupInputs {
            year: input.year,
            through_month: input.through_month,
            annual_target: provider.annual_wrvu_target,
            raw_wrvus: input.raw_wrvus,
            adjustments: input.adjustments,
        });

        let terms = provider.pay_terms_for_year(input.year, input.compensation_changes);
        let model = match (provider.compensation_model, input.tier_schedule) {
            (CompensationModel::Standard, _) => PayModel::Standard,
            (CompensationModel::Tiered, Some(schedule)) => PayModel::Tiered(schedule),
            (CompensationModel::Tiered, None) | (CompensationModel::BaseOnly, _) => {
                PayModel::BaseOnly
            }
        };
        let pay = derive_pay(&periods, &terms, model, self.settings.tier_boundary);

        periods
            .into_iter()
            .zip(pay)
            .map(|(period, pay)| {
                let months_completed = period.month;
                let wrvu_percentile = self.rank(
                    period.cumulative_wrvus,
                    months_completed,
                    &provider.fte,
                    input.benchmark,
                    BenchmarkMetric::Wrvus,
                );
                let compensation_percentile = self.rank(
                    pay.cumulative_compensation,
                    months_completed,
                    &provider.fte,
                    input.benchmark,
                    BenchmarkMetric::Compensation,
                );

                ComputedPeriod {
                    key: PeriodKey {
                        provider_id: provider.provider_id.clone(),
                        year: input.year,
                        month: period.month,
                    },
                    raw_wrvus: period.raw_wrvus,
                    adjusted_wrvus: period.adjusted_wrvus,
                    cumulative_wrvus: period.cumulative_wrvus,
                    monthly_target: period.monthly_target,
                    cumulative_target: period.cumulative_target,
                    plan_progress: period.plan_progress,
                    wrvu_percentile,
                    compensation_percentile,
                    conversion_factor: pay.conversion_factor,
                    monthly_compensation: pay.monthly_compensation,
                    cumulative_compensation: pay.cumulative_compensation,
                    annualized_compensation: pay.annualized_compensation,
                    months_completed,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compensation::domain::{
        PercentileBands, ProviderId, ProviderStatus, TierScheduleId,
    };

    fn provider(fte: Fte) -> Provider {
        Provider {
            provider_id: ProviderId("E200".to_string()),
            name: "Sam Ortiz".to_string(),
            specialty: "Cardiology".to_string(),
            fte,
            annual_wrvu_target: 4800.0,
            base_salary: 120_000.0,
            compensation_model: CompensationModel::Standard,
            conversion_factor: 50.0,
            tier_schedule_id: None,
            status: ProviderStatus::Active,
            termination_date: None,
        }
    }

    fn benchmark() -> BenchmarkRow {
        BenchmarkRow {
            specialty: "Cardiology".to_string(),
            total_compensation: PercentileBands::new(300_000.0, 360_000.0, 420_000.0, 480_000.0),
            wrvus: PercentileBands::new(4000.0, 4500.0, 5000.0, 5500.0),
            conversion_factor: PercentileBands::new(45.0, 50.0, 55.0, 60.0),
        }
    }

    fn raw_year(wrvus: f64, months: u8) -> Vec<MonthlyProductivity> {
        (1..=months)
            .map(|month| MonthlyProductivity {
                provider_id: ProviderId("E200".to_string()),
                year: 2025,
                month,
                wrvus,
            })
            .collect()
    }

    #[test]
    fn compute_year_ranks_annualized_cumulative_values() {
        let provider = provider(Fte::full_time());
        let benchmark = benchmark();
        let raw = raw_year(375.0, 6);
        let engine = MetricsEngine::new(EngineSettings::default());

        let periods = engine.compute_year(&ProviderYear {
            provider: &provider,
            year: 2025,
            through_month: 6,
            benchmark: Some(&benchmark),
            raw_wrvus: &raw,
            adjustments: &[],
            compensation_changes: &[],
            tier_schedule: None,
        });

        assert_eq!(periods.len(), 6);
        let june = &periods[5];
        assert_eq!(june.cumulative_wrvus, 2250.0);
        assert_eq!(june.months_completed, 6);
        // 2250 over six months annualizes to 4500, the 50th percentile band.
        assert_eq!(june.wrvu_percentile.percentile, 50.0);
        // 10k base + 18.75k productivity per month annualizes to 345k.
        assert_eq!(june.annualized_compensation, 345_000.0);
        assert!((june.compensation_percentile.percentile - 43.75).abs() < 1e-9);
        assert_eq!(june.compensation_percentile.nearest_benchmark, "25th-50th");
    }

    #[test]
    fn missing_benchmark_yields_sentinel_ranks() {
        let provider = provider(Fte::full_time());
        let raw = raw_year(400.0, 2);
        let engine = MetricsEngine::new(EngineSettings::default());

        let periods = engine.compute_year(&ProviderYear {
            provider: &provider,
            year: 2025,
            through_month: 2,
            benchmark: None,
            raw_wrvus: &raw,
            adjustments: &[],
            compensation_changes: &[],
            tier_schedule: None,
        });

        assert!(periods.iter().all(|period| !period.wrvu_percentile.is_available()));
        assert_eq!(periods[1].compensation_percentile, PercentileRank::unavailable());
    }

    #[test]
    fn partial_fte_is_normalized_before_ranking() {
        let half_time = provider(Fte {
            total: 0.5,
            clinical: None,
            non_clinical: None,
        });
        let engine = MetricsEngine::new(EngineSettings::default());
        let rank = engine.rank(
            2250.0,
            12,
            &half_time.fte,
            Some(&benchmark()),
            BenchmarkMetric::Wrvus,
        );
        assert_eq!(rank.percentile, 50.0);
    }

    #[test]
    fn tiered_provider_without_schedule_earns_base_only() {
        let mut provider = provider(Fte::full_time());
        provider.compensation_model = CompensationModel::Tiered;
        provider.tier_schedule_id = Some(TierScheduleId("missing".to_string()));
        let raw = raw_year(400.0, 1);
        let engine = MetricsEngine::new(EngineSettings::default());

        let periods = engine.compute_year(&ProviderYear {
            provider: &provider,
            year: 2025,
            through_month: 1,
            benchmark: None,
            raw_wrvus: &raw,
            adjustments: &[],
            compensation_changes: &[],
            tier_schedule: None,
        });
        assert_eq!(periods[0].monthly_compensation, 10_000.0);
    }
}

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::engine::PercentileRank;

pub const MONTHS_PER_YEAR: u8 = 12;

/// Employee identifier used as the provider key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProviderId(pub String);

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdjustmentId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompensationChangeId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TierScheduleId(pub String);

/// Full-time-equivalent split. Total is the normalization divisor unless the engine is told
/// to prefer the clinical portion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fte {
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_clinical: Option<f64>,
}

impl Fte {
    pub const fn full_time() -> Self {
        Self {
            total: 1.0,
            clinical: None,
            non_clinical: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompensationModel {
    Standard,
    Tiered,
    BaseOnly,
}

impl CompensationModel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Tiered => "tiered",
            Self::BaseOnly => "base_only",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "standard" | "" => Some(Self::Standard),
            "tiered" => Some(Self::Tiered),
            "base_only" | "base" => Some(Self::BaseOnly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    #[default]
    Active,
    Inactive,
}

impl ProviderStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub provider_id: ProviderId,
    pub name: String,
    pub specialty: String,
    pub fte: Fte,
    #[serde(default)]
    pub annual_wrvu_target: f64,
    #[serde(default)]
    pub base_salary: f64,
    pub compensation_model: CompensationModel,
    #[serde(default)]
    pub conversion_factor: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier_schedule_id: Option<TierScheduleId>,
    #[serde(default)]
    pub status: ProviderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination_date: Option<NaiveDate>,
}

/// Requested status transition for a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: ProviderStatus,
    #[serde(default)]
    pub termination_date: Option<NaiveDate>,
}

/// Raw wRVUs credited to a provider for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyProductivity {
    pub provider_id: ProviderId,
    pub year: i32,
    pub month: u8,
    pub wrvus: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    Productivity,
    Target,
}

/// Months an adjustment delta applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentScope {
    Month(u8),
    AllMonths,
}

impl AdjustmentScope {
    pub fn covers(self, month: u8) -> bool {
        match self {
            Self::Month(scoped) => scoped == month,
            Self::AllMonths => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAdjustment {
    pub adjustment_id: AdjustmentId,
    pub provider_id: ProviderId,
    pub kind: AdjustmentKind,
    pub year: i32,
    pub scope: AdjustmentScope,
    pub delta: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Adjustment payload before an identifier is assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentSubmission {
    pub kind: AdjustmentKind,
    pub year: i32,
    pub scope: AdjustmentScope,
    pub delta: f64,
    #[serde(default)]
    pub note: Option<String>,
}

/// Effective-dated change to a provider's pay terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompensationChange {
    pub change_id: CompensationChangeId,
    pub provider_id: ProviderId,
    pub effective_date: NaiveDate,
    pub base_salary: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompensationChangeSubmission {
    pub effective_date: NaiveDate,
    pub base_salary: f64,
    #[serde(default)]
    pub conversion_factor: Option<f64>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Annual base salary and fixed conversion factor in effect for one month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayTerms {
    pub annual_base_salary: f64,
    pub conversion_factor: f64,
}

impl Provider {
    /// Resolves pay terms for each month of `year`, applying the latest change effective on
    /// or before the first of the month.
    pub fn pay_terms_for_year(
        &self,
        year: i32,
        changes: &[CompensationChange],
    ) -> [PayTerms; MONTHS_PER_YEAR as usize] {
        let mut ordered: Vec<&CompensationChange> = changes
            .iter()
            .filter(|change| change.provider_id == self.provider_id)
            .collect();
        ordered.sort_by_key(|change| change.effective_date);

        let defaults = PayTerms {
            annual_base_salary: self.base_salary,
            conversion_factor: self.conversion_factor,
        };

        std::array::from_fn(|index| {
            let month = index as u32 + 1;
            let Some(first_of_month) = NaiveDate::from_ymd_opt(year, month, 1) else {
                return defaults;
            };

            ordered
                .iter()
                .take_while(|change| change.effective_date <= first_of_month)
                .fold(defaults, |terms, change| PayTerms {
                    annual_base_salary: change.base_salary,
                    conversion_factor: change.conversion_factor.unwrap_or(terms.conversion_factor),
                })
        })
    }

    pub fn is_active_in(&self, year: i32) -> bool {
        match (self.status, self.termination_date) {
            (ProviderStatus::Active, _) => true,
            (ProviderStatus::Inactive, Some(terminated)) => terminated.year() >= year,
            (ProviderStatus::Inactive, None) => false,
        }
    }
}

/// Percentile bands published for one measure: (25th, 50th, 75th, 90th).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileBands {
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
}

impl PercentileBands {
    pub const fn new(p25: f64, p50: f64, p75: f64, p90: f64) -> Self {
        Self { p25, p50, p75, p90 }
    }

    pub const fn points(&self) -> [(u8, f64); 4] {
        [(25, self.p25), (50, self.p50), (75, self.p75), (90, self.p90)]
    }

    pub fn is_monotonic(&self) -> bool {
        self.p25 <= self.p50 && self.p50 <= self.p75 && self.p75 <= self.p90
    }
}

/// Market survey row for a specialty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRow {
    pub specialty: String,
    pub total_compensation: PercentileBands,
    pub wrvus: PercentileBands,
    pub conversion_factor: PercentileBands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkMetric {
    Wrvus,
    Compensation,
    ConversionFactor,
}

impl BenchmarkRow {
    pub fn bands(&self, metric: BenchmarkMetric) -> &PercentileBands {
        match metric {
            BenchmarkMetric::Wrvus => &self.wrvus,
            BenchmarkMetric::Compensation => &self.total_compensation,
            BenchmarkMetric::ConversionFactor => &self.conversion_factor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConversionTier {
    pub threshold: f64,
    pub conversion_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierSchedule {
    pub schedule_id: TierScheduleId,
    #[serde(default)]
    pub name: String,
    pub tiers: Vec<ConversionTier>,
}

/// Key of a period metric row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    pub provider_id: ProviderId,
    pub year: i32,
    pub month: u8,
}

/// Every field of a period metric the engine derives. Incentive and holdback are
/// absent: they are recorded separately and survive recomputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedPeriod {
    pub key: PeriodKey,
    pub raw_wrvus: f64,
    pub adjusted_wrvus: f64,
    pub cumulative_wrvus: f64,
    pub monthly_target: f64,
    pub cumulative_target: f64,
    pub plan_progress: f64,
    pub wrvu_percentile: PercentileRank,
    pub compensation_percentile: PercentileRank,
    pub conversion_factor: f64,
    pub monthly_compensation: f64,
    pub cumulative_compensation: f64,
    pub annualized_compensation: f64,
    pub months_completed: u8,
}

/// Persisted per-period metric row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodMetric {
    pub provider_id: ProviderId,
    pub year: i32,
    pub month: u8,
    pub raw_wrvus: f64,
    pub adjusted_wrvus: f64,
    pub cumulative_wrvus: f64,
    pub monthly_target: f64,
    pub cumulative_target: f64,
    pub plan_progress: f64,
    pub wrvu_percentile: f64,
    pub wrvu_benchmark: String,
    pub compensation_percentile: f64,
    pub compensation_benchmark: String,
    pub conversion_factor: f64,
    pub monthly_compensation: f64,
    pub cumulative_compensation: f64,
    pub annualized_compensation: f64,
    pub months_completed: u8,
    pub incentive: f64,
    pub holdback: f64,
}

impl PeriodMetric {
    pub fn key(&self) -> PeriodKey {
        PeriodKey {
            provider_id: self.provider_id.clone(),
            year: self.year,
            month: self.month,
        }
    }

    /// Row created on first upsert: computed fields plus zeroed payouts.
    pub fn from_computed(computed: ComputedPeriod) -> Self {
        let mut metric = Self {
            provider_id: computed.key.provider_id.clone(),
            year: computed.key.year,
            month: computed.key.month,
            raw_wrvus: 0.0,
            adjusted_wrvus: 0.0,
            cumulative_wrvus: 0.0,
            monthly_target: 0.0,
            cumulative_target: 0.0,
            plan_progress: 0.0,
            wrvu_percentile: 0.0,
            wrvu_benchmark: String::new(),
            compensation_percentile: 0.0,
            compensation_benchmark: String::new(),
            conversion_factor: 0.0,
            monthly_compensation: 0.0,
            cumulative_compensation: 0.0,
            annualized_compensation: 0.0,
            months_completed: 0,
            incentive: 0.0,
            holdback: 0.0,
        };
        metric.apply_computed(computed);
        metric
    }

    /// Overwrites only the recomputed fields of an existing row.
    pub fn apply_computed(&mut self, computed: ComputedPeriod) {
        self.raw_wrvus = computed.raw_wrvus;
        self.adjusted_wrvus = computed.adjusted_wrvus;
        self.cumulative_wrvus = computed.cumulative_wrvus;
        self.monthly_target = computed.monthly_target;
        self.cumulative_target = computed.cumulative_target;
        self.plan_progress = computed.plan_progress;
        self.wrvu_percentile = computed.wrvu_percentile.percentile;
        self.wrvu_benchmark = computed.wrvu_percentile.nearest_benchmark;
        self.compensation_percentile = computed.compensation_percentile.percentile;
        self.compensation_benchmark = computed.compensation_percentile.nearest_benchmark;
        self.conversion_factor = computed.conversion_factor;
        self.monthly_compensation = computed.monthly_compensation;
        self.cumulative_compensation = computed.cumulative_compensation;
        self.annualized_compensation = computed.annualized_compensation;
        self.months_completed = computed.months_completed;
    }
}

/// Incentive and holdback amounts recorded against an existing period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodPayouts {
    #[serde(default)]
    pub incentive: f64,
    #[serde(default)]
    pub holdback: f64,
}

/// Replaces non-finite values with zero before they reach arithmetic or storage.
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Normalizes specialty names so spreadsheet and admin spellings agree.
pub fn specialty_key(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_ascii_lowercase()
}

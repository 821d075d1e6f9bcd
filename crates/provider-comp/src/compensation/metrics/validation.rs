use std::collections::BTreeSet;

use super::super::domain::{
    AdjustmentScope, AdjustmentSubmission, BenchmarkRow, CompensationChangeSubmission,
    CompensationModel, PercentileBands, PeriodPayouts, Provider, ProviderStatus, StatusChange,
    TierSchedule, MONTHS_PER_YEAR,
};

/// Reasons a write request is rejected before computation or persistence.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("{field} must be a finite, non-negative number (found {value})")]
    InvalidAmount { field: &'static str, value: f64 },
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },
    #[error("{field} must be within ({min}, {max}] (found {value})")]
    FteOutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("month must be between 1 and 12 (found {0})")]
    InvalidMonth(u8),
    #[error("year must be a four digit year (found {0})")]
    InvalidYear(i32),
    #[error("tiered compensation requires a tier schedule id")]
    MissingTierSchedule,
    #[error("inactive status requires a termination date")]
    MissingTerminationDate,
    #[error("{measure} bands for '{specialty}' must not decrease from p25 to p90")]
    NonMonotonicBands {
        specialty: String,
        measure: &'static str,
    },
    #[error("tier schedule must contain at least one tier")]
    EmptyTierSchedule,
    #[error("tier threshold {0} appears more than once")]
    DuplicateTierThreshold(f64),
}

const DEFAULT_MAX_FTE: f64 = 1.5;

/// Bounds applied while validating writes.
#[derive(Debug, Clone)]
pub struct ValidationPolicy {
    max_fte: f64,
}

impl ValidationPolicy {
    pub fn new(max_fte: f64) -> Self {
        let sanitized = if max_fte.is_finite() && max_fte > 0.0 {
            max_fte
        } else {
            DEFAULT_MAX_FTE
        };
        Self { max_fte: sanitized }
    }

    pub fn max_fte(&self) -> f64 {
        self.max_fte
    }
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FTE)
    }
}

/// Guard run on every write the service accepts.
#[derive(Debug, Clone, Default)]
pub struct RecordGuard {
    policy: ValidationPolicy,
}

impl RecordGuard {
    pub fn with_policy(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    pub fn check_provider(&self, provider: &Provider) -> Result<(), ValidationError> {
        required("provider_id", &provider.provider_id.0)?;
        required("name", &provider.name)?;
        required("specialty", &provider.specialty)?;

        let max = self.policy.max_fte;
        let total = provider.fte.total;
        if !total.is_finite() || total <= 0.0 || total > max {
            return Err(ValidationError::FteOutOfRange {
                field: "fte.total",
                min: 0.0,
                max,
                value: total,
            });
        }
        for (field, value) in [
            ("fte.clinical", provider.fte.clinical),
            ("fte.non_clinical", provider.fte.non_clinical),
        ] {
            if let Some(value) = value {
                if !value.is_finite() || !(0.0..=max).contains(&value) {
                    return Err(ValidationError::FteOutOfRange {
                        field,
                        min: 0.0,
                        max,
                        value,
                    });
                }
            }
        }

        non_negative("annual_wrvu_target", provider.annual_wrvu_target)?;
        non_negative("base_salary", provider.base_salary)?;
        non_negative("conversion_factor", provider.conversion_factor)?;

        if provider.compensation_model == CompensationModel::Tiered
            && provider
                .tier_schedule_id
                .as_ref()
                .map(|id| id.0.trim().is_empty())
                .unwrap_or(true)
        {
            return Err(ValidationError::MissingTierSchedule);
        }

        if provider.status == ProviderStatus::Inactive && provider.termination_date.is_none() {
            return Err(ValidationError::MissingTerminationDate);
        }

        Ok(())
    }

    pub fn check_status_change(&self, change: &StatusChange) -> Result<(), ValidationError> {
        if change.status == ProviderStatus::Inactive && change.termination_date.is_none() {
            return Err(ValidationError::MissingTerminationDate);
        }
        Ok(())
    }

    pub fn check_period(&self, year: i32, month: u8) -> Result<(), ValidationError> {
        check_year(year)?;
        check_month(month)
    }

    /// Months elapsed for an ad hoc lookup; 0 means the value is already annual.
    pub fn check_months_completed(&self, months: u8) -> Result<(), ValidationError> {
        if months == 0 {
            return Ok(());
        }
        check_month(months)
    }

    pub fn check_productivity(
        &self,
        year: i32,
        month: u8,
        wrvus: f64,
    ) -> Result<(), ValidationError> {
        self.check_period(year, month)?;
        finite("wrvus", wrvus)
    }

    pub fn check_adjustment(
        &self,
        submission: &AdjustmentSubmission,
    ) -> Result<(), ValidationError> {
        check_year(submission.year)?;
        if let AdjustmentScope::Month(month) = submission.scope {
            check_month(month)?;
        }
        finite("delta", submission.delta)
    }

    pub fn check_compensation_change(
        &self,
        submission: &CompensationChangeSubmission,
    ) -> Result<(), ValidationError> {
        non_negative("base_salary", submission.base_salary)?;
        if let Some(factor) = submission.conversion_factor {
            non_negative("conversion_factor", factor)?;
        }
        Ok(())
    }

    pub fn check_benchmark(&self, row: &BenchmarkRow) -> Result<(), ValidationError> {
        required("specialty", &row.specialty)?;
        check_bands(&row.specialty, "total_compensation", &row.total_compensation)?;
        check_bands(&row.specialty, "wrvus", &row.wrvus)?;
        check_bands(&row.specialty, "conversion_factor", &row.conversion_factor)
    }

    pub fn check_tier_schedule(&self, schedule: &TierSchedule) -> Result<(), ValidationError> {
        required("schedule_id", &schedule.schedule_id.0)?;
        if schedule.tiers.is_empty() {
            return Err(ValidationError::EmptyTierSchedule);
        }

        let mut seen = BTreeSet::new();
        for tier in &schedule.tiers {
            non_negative("threshold", tier.threshold)?;
            non_negative("conversion_factor", tier.conversion_factor)?;
            if !seen.insert(tier.threshold.to_bits()) {
                return Err(ValidationError::DuplicateTierThreshold(tier.threshold));
            }
        }
        Ok(())
    }

    pub fn check_payouts(&self, payouts: &PeriodPayouts) -> Result<(), ValidationError> {
        non_negative("incentive", payouts.incentive)?;
        non_negative("holdback", payouts.holdback)
    }
}

fn required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField { field })
    } else {
        Ok(())
    }
}

fn finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFinite { field })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidAmount { field, value })
    }
}

fn check_year(year: i32) -> Result<(), ValidationError> {
    if (1000..=9999).contains(&year) {
        Ok(())
    } else {
        Err(ValidationError::InvalidYear(year))
    }
}

fn check_month(month: u8) -> Result<(), ValidationError> {
    if (1..=MONTHS_PER_YEAR).contains(&month) {
        Ok(())
    } else {
        Err(ValidationError::InvalidMonth(month))
    }
}

fn check_bands(
    specialty: &str,
    measure: &'static str,
    bands: &PercentileBands,
) -> Result<(), ValidationError> {
    for (_, value) in bands.points() {
        non_negative(measure, value)?;
    }
    if bands.is_monotonic() {
        Ok(())
    } else {
        Err(ValidationError::NonMonotonicBands {
            specialty: specialty.to_string(),
            measure,
        })
    }
}

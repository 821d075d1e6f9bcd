use super::common::*;
use chrono::NaiveDate;

use crate::compensation::domain::{
    AdjustmentKind, AdjustmentScope, AdjustmentSubmission, ConversionTier, Fte,
    PercentileBands, PeriodPayouts, ProviderStatus, TierScheduleId,
};
use crate::compensation::metrics::{RecordGuard, ValidationError, ValidationPolicy};

fn guard() -> RecordGuard {
    RecordGuard::default()
}

#[test]
fn accepts_a_complete_provider() {
    assert_eq!(guard().check_provider(&provider("E100")), Ok(()));
}

#[test]
fn rejects_blank_identity_fields() {
    let mut blank = provider("  ");
    assert_eq!(
        guard().check_provider(&blank),
        Err(ValidationError::MissingField {
            field: "provider_id"
        })
    );

    blank = provider("E100");
    blank.specialty = String::new();
    assert_eq!(
        guard().check_provider(&blank),
        Err(ValidationError::MissingField { field: "specialty" })
    );
}

#[test]
fn fte_must_fall_within_policy() {
    let mut record = provider("E100");
    record.fte = Fte {
        total: 0.0,
        clinical: None,
        non_clinical: None,
    };
    assert!(matches!(
        guard().check_provider(&record),
        Err(ValidationError::FteOutOfRange {
            field: "fte.total",
            ..
        })
    ));

    record.fte = Fte {
        total: 1.2,
        clinical: Some(1.2),
        non_clinical: None,
    };
    assert_eq!(guard().check_provider(&record), Ok(()));

    let strict = RecordGuard::with_policy(ValidationPolicy::new(1.0));
    assert!(matches!(
        strict.check_provider(&record),
        Err(ValidationError::FteOutOfRange { max, .. }) if max == 1.0
    ));
}

#[test]
fn invalid_policy_falls_back_to_default_ceiling() {
    assert_eq!(ValidationPolicy::new(f64::NAN).max_fte(), 1.5);
    assert_eq!(ValidationPolicy::new(-2.0).max_fte(), 1.5);
}

#[test]
fn amounts_must_be_finite_and_non_negative() {
    let mut record = provider("E100");
    record.base_salary = -1.0;
    assert!(matches!(
        guard().check_provider(&record),
        Err(ValidationError::InvalidAmount {
            field: "base_salary",
            ..
        })
    ));

    record = provider("E100");
    record.annual_wrvu_target = f64::INFINITY;
    assert!(guard().check_provider(&record).is_err());
}

#[test]
fn tiered_provider_needs_a_schedule() {
    let mut record = tiered_provider("E100", "ladder");
    assert_eq!(guard().check_provider(&record), Ok(()));

    record.tier_schedule_id = Some(TierScheduleId("   ".to_string()));
    assert_eq!(
        guard().check_provider(&record),
        Err(ValidationError::MissingTierSchedule)
    );
}

#[test]
fn inactive_provider_needs_a_termination_date() {
    let mut record = provider("E100");
    record.status = ProviderStatus::Inactive;
    assert_eq!(
        guard().check_provider(&record),
        Err(ValidationError::MissingTerminationDate)
    );

    record.termination_date = NaiveDate::from_ymd_opt(2024, 12, 31);
    assert_eq!(guard().check_provider(&record), Ok(()));
}

#[test]
fn period_bounds_are_checked() {
    assert_eq!(guard().check_period(YEAR, 12), Ok(()));
    assert_eq!(
        guard().check_period(YEAR, 0),
        Err(ValidationError::InvalidMonth(0))
    );
    assert_eq!(
        guard().check_period(25, 1),
        Err(ValidationError::InvalidYear(25))
    );
}

#[test]
fn months_completed_allows_zero_through_twelve() {
    assert_eq!(guard().check_months_completed(0), Ok(()));
    assert_eq!(guard().check_months_completed(12), Ok(()));
    assert_eq!(
        guard().check_months_completed(13),
        Err(ValidationError::InvalidMonth(13))
    );
}

#[test]
fn productivity_may_be_negative_but_must_be_finite() {
    assert_eq!(guard().check_productivity(YEAR, 4, -12.5), Ok(()));
    assert_eq!(
        guard().check_productivity(YEAR, 4, f64::NAN),
        Err(ValidationError::NonFinite { field: "wrvus" })
    );
}

#[test]
fn adjustment_month_scope_is_validated() {
    let submission = AdjustmentSubmission {
        kind: AdjustmentKind::Target,
        year: YEAR,
        scope: AdjustmentScope::Month(14),
        delta: 10.0,
        note: None,
    };
    assert_eq!(
        guard().check_adjustment(&submission),
        Err(ValidationError::InvalidMonth(14))
    );

    let all_months = AdjustmentSubmission {
        scope: AdjustmentScope::AllMonths,
        ..submission
    };
    assert_eq!(guard().check_adjustment(&all_months), Ok(()));
}

#[test]
fn benchmark_bands_must_not_decrease() {
    let mut row = benchmark();
    assert_eq!(guard().check_benchmark(&row), Ok(()));

    row.wrvus = PercentileBands::new(4000.0, 3900.0, 5000.0, 5500.0);
    assert_eq!(
        guard().check_benchmark(&row),
        Err(ValidationError::NonMonotonicBands {
            specialty: "Family Medicine".to_string(),
            measure: "wrvus",
        })
    );
}

#[test]
fn tier_schedule_rules() {
    let mut schedule = tier_schedule("ladder");
    assert_eq!(guard().check_tier_schedule(&schedule), Ok(()));

    schedule.tiers.push(ConversionTier {
        threshold: 1000.0,
        conversion_factor: 60.0,
    });
    assert_eq!(
        guard().check_tier_schedule(&schedule),
        Err(ValidationError::DuplicateTierThreshold(1000.0))
    );

    schedule.tiers.clear();
    assert_eq!(
        guard().check_tier_schedule(&schedule),
        Err(ValidationError::EmptyTierSchedule)
    );
}

#[test]
fn payouts_must_be_non_negative() {
    let payouts = PeriodPayouts {
        incentive: 100.0,
        holdback: -5.0,
    };
    assert!(matches!(
        guard().check_payouts(&payouts),
        Err(ValidationError::InvalidAmount {
            field: "holdback",
            ..
        })
    ));
}

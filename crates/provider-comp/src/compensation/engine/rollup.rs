use serde::Serialize;

use super::super::domain::{
    finite_or_zero, AdjustmentKind, MonthlyAdjustment, MonthlyProductivity, MONTHS_PER_YEAR,
};

/// Inputs for one provider and one calendar year.
#[derive(Debug, Clone, Copy)]
pub struct RollupInputs<'a> {
    pub year: i32,
    pub through_month: u8,
    pub annual_target: f64,
    pub raw_wrvus: &'a [MonthlyProductivity],
    pub adjustments: &'a [MonthlyAdjustment],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollupPeriod {
    pub month: u8,
    pub raw_wrvus: f64,
    pub adjusted_wrvus: f64,
    pub cumulative_wrvus: f64,
    pub monthly_target: f64,
    pub cumulative_target: f64,
    pub plan_progress: f64,
}

/// Latest month in `year` holding a raw productivity figure.
pub fn latest_reported_month(raw_wrvus: &[MonthlyProductivity], year: i32) -> Option<u8> {
    raw_wrvus
        .iter()
        .filter(|entry| entry.year == year && (1..=MONTHS_PER_YEAR).contains(&entry.month))
        .map(|entry| entry.month)
        .max()
}

/// Walks months 1..=`through_month` in order, carrying running totals that start at zero for
/// the year. Rows and adjustments belonging to other years are ignored.
pub fn roll_up(inputs: &RollupInputs<'_>) -> Vec<RollupPeriod> {
    let through = inputs.through_month.min(MONTHS_PER_YEAR);
    let base_monthly_target = finite_or_zero(inputs.annual_target) / f64::from(MONTHS_PER_YEAR);

    let mut periods = Vec::with_capacity(usize::from(through));
    let mut cumulative_wrvus = 0.0;
    let mut cumulative_target = 0.0;

    for month in 1..=through {
        let raw_wrvus: f64 = inputs
            .raw_wrvus
            .iter()
            .filter(|entry| entry.year == inputs.year && entry.month == month)
            .map(|entry| finite_or_zero(entry.wrvus))
            .sum();
        let raw_wrvus = finite_or_zero(raw_wrvus);

        let adjusted_wrvus = finite_or_zero(
            raw_wrvus
                + adjustment_total(
                    inputs.adjustments,
                    inputs.year,
                    month,
                    AdjustmentKind::Productivity,
                ),
        );
        cumulative_wrvus = finite_or_zero(cumulative_wrvus + adjusted_wrvus);

        let monthly_target = finite_or_zero(
            base_monthly_target
                + adjustment_total(inputs.adjustments, inputs.year, month, AdjustmentKind::Target),
        );
        cumulative_target = finite_or_zero(cumulative_target + monthly_target);

        let plan_progress = if cumulative_target > 0.0 {
            finite_or_zero((cumulative_wrvus / cumulative_target) * 100.0)
        } else {
            0.0
        };

        periods.push(RollupPeriod {
            month,
            raw_wrvus,
            adjusted_wrvus,
            cumulative_wrvus,
            monthly_target,
            cumulative_target,
            plan_progress,
        });
    }

    periods
}

fn adjustment_total(
    adjustments: &[MonthlyAdjustment],
    year: i32,
    month: u8,
    kind: AdjustmentKind,
) -> f64 {
    adjustments
        .iter()
        .filter(|adjustment| {
            adjustment.kind == kind && adjustment.year == year && adjustment.scope.covers(month)
        })
        .map(|adjustment| finite_or_zero(adjustment.delta))
        .sum()
}

use serde::Serialize;

use super::super::domain::{finite_or_zero, PayTerms, TierSchedule, MONTHS_PER_YEAR};
use super::percentile::annualize;
use super::rollup::RollupPeriod;
use super::settings::TierBoundary;

/// Conversion-factor source for a provider's productivity pay.
#[derive(Debug, Clone, Copy)]
pub enum PayModel<'a> {
    /// Fixed factor taken from the month's pay terms.
    Standard,
    /// Factor chosen by cumulative productivity from an ordered schedule.
    Tiered(&'a TierSchedule),
    BaseOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodPay {
    pub month: u8,
    pub conversion_factor: f64,
    pub monthly_compensation: f64,
    pub cumulative_compensation: f64,
    pub annualized_compensation: f64,
}

/// Factor of the last tier whose threshold `cumulative` has reached; 0 below the first tier.
pub fn tier_factor(schedule: &TierSchedule, cumulative: f64, boundary: TierBoundary) -> f64 {
    let mut tiers: Vec<_> = schedule
        .tiers
        .iter()
        .map(|tier| {
            (
                finite_or_zero(tier.threshold),
                finite_or_zero(tier.conversion_factor),
            )
        })
        .collect();
    tiers.sort_by(|left, right| left.0.total_cmp(&right.0));

    tiers
        .iter()
        .take_while(|(threshold, _)| boundary.reached(*threshold, cumulative))
        .last()
        .map(|(_, factor)| *factor)
        .unwrap_or(0.0)
}

/// Monthly base component plus productivity times the applicable factor, summed into a
/// running total.
pub fn derive_pay(
    periods: &[RollupPeriod],
    terms: &[PayTerms; MONTHS_PER_YEAR as usize],
    model: PayModel<'_>,
    boundary: TierBoundary,
) -> Vec<PeriodPay> {
    let mut cumulative_compensation = 0.0;

    periods
        .iter()
        .map(|period| {
            let index = usize::from(period.month.clamp(1, MONTHS_PER_YEAR) - 1);
            let month_terms = terms[index];
            let monthly_base =
                finite_or_zero(month_terms.annual_base_salary) / f64::from(MONTHS_PER_YEAR);

            let conversion_factor = match model {
                PayModel::Standard => finite_or_zero(month_terms.conversion_factor),
                PayModel::Tiered(schedule) => {
                    tier_factor(schedule, period.cumulative_wrvus, boundary)
                }
                PayModel::BaseOnly => 0.0,
            };

            let monthly_compensation = finite_or_zero(
                monthly_base + finite_or_zero(period.adjusted_wrvus) * conversion_factor,
            );
            cumulative_compensation =
                finite_or_zero(cumulative_compensation + monthly_compensation);

            PeriodPay {
                month: period.month,
                conversion_factor,
                monthly_compensation,
                cumulative_compensation,
                annualized_compensation: annualize(cumulative_compensation, period.month),
            }
        })
        .collect()
}

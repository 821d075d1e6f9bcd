use serde::{Deserialize, Serialize};

use super::super::domain::{finite_or_zero, Fte, PercentileBands, MONTHS_PER_YEAR};
use super::settings::FteBasis;

pub const UNAVAILABLE_LABEL: &str = "N/A";

/// Position of a value against a specialty's percentile bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentileRank {
    pub percentile: f64,
    pub nearest_benchmark: String,
}

impl PercentileRank {
    /// Sentinel returned when no benchmark row exists for a specialty.
    pub fn unavailable() -> Self {
        Self {
            percentile: 0.0,
            nearest_benchmark: UNAVAILABLE_LABEL.to_string(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.nearest_benchmark != UNAVAILABLE_LABEL
    }
}

/// Interpolates `value` against the 25/50/75/90 bands.
pub fn percentile_of(value: f64, bands: &PercentileBands) -> PercentileRank {
    let value = finite_or_zero(value);
    let points = bands.points().map(|(pct, band)| (pct, finite_or_zero(band)));
    let (_, p25) = points[0];
    let (_, p90) = points[3];

    if value < p25 {
        let percentile = if p25 == 0.0 {
            0.0
        } else {
            ((value / p25) * 25.0).max(0.0)
        };
        return PercentileRank {
            percentile,
            nearest_benchmark: "Below 25th".to_string(),
        };
    }

    if value > p90 {
        let extra = if p90 == 0.0 {
            0.0
        } else {
            ((value - p90) / p90) * 10.0
        };
        return PercentileRank {
            percentile: (90.0 + extra).min(100.0),
            nearest_benchmark: "Above 90th".to_string(),
        };
    }

    for pair in points.windows(2) {
        let (lower_pct, lower) = pair[0];
        let (upper_pct, upper) = pair[1];
        if lower <= value && value <= upper {
            let span = upper - lower;
            let percentile = if span == 0.0 {
                f64::from(lower_pct)
            } else {
                f64::from(lower_pct)
                    + ((value - lower) / span) * f64::from(upper_pct - lower_pct)
            };
            return PercentileRank {
                percentile,
                nearest_benchmark: format!("{lower_pct}th-{upper_pct}th"),
            };
        }
    }

    PercentileRank::unavailable()
}

/// Scales a year-to-date figure to a full year. Left unchanged when no months are complete.
pub fn annualize(actual: f64, months_completed: u8) -> f64 {
    let actual = finite_or_zero(actual);
    if months_completed == 0 {
        return actual;
    }
    finite_or_zero((actual / f64::from(months_completed)) * f64::from(MONTHS_PER_YEAR))
}

pub fn effective_fte(fte: &Fte, basis: FteBasis) -> f64 {
    let total = finite_or_zero(fte.total);
    match basis {
        FteBasis::Total => total,
        FteBasis::Clinical => match fte.clinical.map(finite_or_zero) {
            Some(clinical) if clinical != 0.0 => clinical,
            _ => total,
        },
    }
}

/// Annualized, full-time-equivalent figure comparable across partial-time providers.
pub fn normalize_for_benchmark(
    actual: f64,
    months_completed: u8,
    fte: &Fte,
    basis: FteBasis,
) -> f64 {
    let annualized = annualize(actual, months_completed);
    let divisor = effective_fte(fte, basis);
    if divisor > 0.0 && divisor < 1.0 {
        finite_or_zero(annualized / divisor)
    } else {
        annualized
    }
}

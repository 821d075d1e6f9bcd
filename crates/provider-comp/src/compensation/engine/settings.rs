use serde::{Deserialize, Serialize};

/// Which FTE figure divides a partial-time provider's annualized values before benchmark
/// comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FteBasis {
    /// Clinical FTE when supplied and nonzero, otherwise total FTE.
    #[default]
    Clinical,
    /// Always total FTE.
    Total,
}

impl FteBasis {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "clinical" | "clinical_fte" => Some(Self::Clinical),
            "total" | "fte" => Some(Self::Total),
            _ => None,
        }
    }
}

/// How a cumulative value that lands exactly on a tier threshold is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierBoundary {
    /// A tier applies once cumulative productivity reaches its threshold.
    #[default]
    Inclusive,
    /// A tier applies only once cumulative productivity exceeds its threshold.
    Exclusive,
}

impl TierBoundary {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "inclusive" => Some(Self::Inclusive),
            "exclusive" => Some(Self::Exclusive),
            _ => None,
        }
    }

    pub(crate) fn reached(self, threshold: f64, cumulative: f64) -> bool {
        match self {
            Self::Inclusive => threshold <= cumulative,
            Self::Exclusive => threshold < cumulative,
        }
    }
}

/// Engine knobs passed explicitly into every computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngineSettings {
    pub fte_basis: FteBasis,
    pub tier_boundary: TierBoundary,
}

use crate::error::{AppError, Result};
use crate::models::RiskTier;

/// A half-open probability interval `[lower, upper)` mapped to a tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskBand {
    pub lower: f64,
    pub upper: f64,
    pub tier: RiskTier,
}

/// Ordered risk bands; the last band also includes 1.0
pub const RISK_BANDS: [RiskBand; 3] = [
    RiskBand {
        lower: 0.0,
        upper: 0.4,
        tier: RiskTier::Low,
    },
    RiskBand {
        lower: 0.4,
        upper: 0.7,
        tier: RiskTier::Medium,
    },
    RiskBand {
        lower: 0.7,
        upper: 1.0,
        tier: RiskTier::High,
    },
];

/// Map a dropout probability to its risk tier
pub fn classify(probability: f64) -> Result<RiskTier> {
    if !(0.0..=1.0).contains(&probability) {
        return Err(AppError::Validation(format!(
            "probability {} is outside [0, 1]",
            probability
        )));
    }

    let last = RISK_BANDS.len() - 1;
    RISK_BANDS
        .iter()
        .enumerate()
        .find(|(i, band)| {
            probability >= band.lower && (probability < band.upper || *i == last)
        })
        .map(|(_, band)| band.tier)
        .ok_or_else(|| {
            AppError::Internal(format!("no risk band covers probability {}", probability))
        })
}

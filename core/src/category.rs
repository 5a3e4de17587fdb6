//! SDOH lift categories and ZIP risk bands.
//!
//! Two distinct level derivations exist on purpose:
//!   - LiftRebalancer assigns categories by block position after a
//!     rank-preserving sort (see lift.rs).
//!   - ZipRiskRebalancer re-derives the level per row from fixed lift
//!     thresholds after the band shift (see level_for_lift below).
//! Do not unify them.

use serde::{Deserialize, Serialize};

/// Label written for rows whose lift cannot be computed.
pub const LEVEL_PENDING: &str = "SDOH level pending";

/// The four SDOH lift categories, declared in ascending lift order so
/// the derived `Ord` matches Protective < Mild < Significant < Extreme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiftCategory {
    Protective,
    Mild,
    Significant,
    Extreme,
}

impl LiftCategory {
    /// Block assignment order used by the lift rebalancer:
    /// lowest current lift lands in Protective, highest in Extreme.
    pub const ASCENDING: [LiftCategory; 4] = [
        LiftCategory::Protective,
        LiftCategory::Mild,
        LiftCategory::Significant,
        LiftCategory::Extreme,
    ];

    /// Display label written into the `sdoh_lift_level` column.
    pub fn label(self) -> &'static str {
        match self {
            Self::Extreme => "Extreme SDOH Contribution",
            Self::Significant => "Significant SDOH Contribution",
            Self::Mild => "Mild SDOH Contribution",
            Self::Protective => "SDOH Protective / No Impact",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Extreme => "Extreme",
            Self::Significant => "Significant",
            Self::Mild => "Mild",
            Self::Protective => "Protective",
        }
    }
}

/// Per-row threshold derivation of the lift level.
/// Missing lift maps to the pending label, never to an error.
pub fn level_for_lift(lift: Option<f64>) -> &'static str {
    match lift {
        None => LEVEL_PENDING,
        Some(x) if x >= 0.2 => LiftCategory::Extreme.label(),
        Some(x) if x >= 0.1 => LiftCategory::Significant.label(),
        Some(x) if x >= 0.0 => LiftCategory::Mild.label(),
        Some(_) => LiftCategory::Protective.label(),
    }
}

/// ZIP-level risk tier assigned from tertiles of per-ZIP average risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    Low,
    Moderate,
    High,
}

impl RiskBand {
    pub fn name(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Moderate => "Moderate",
            Self::Low => "Low",
        }
    }
}

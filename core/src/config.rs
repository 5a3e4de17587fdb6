//! Run configuration: file paths, master seed, distribution targets.
//!
//! Targets are plain data with Default impls carrying the production
//! constants, so tests can build variants without touching the
//! environment.

use crate::category::{LiftCategory, RiskBand};
use crate::frame::Frame;
use crate::types::{col, Seed};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_SEED: Seed = 42;

const BASE_DATA: &str = "data/sdoh_data.csv";
const ADJUSTED_DATA: &str = "data/sdoh_data_adjusted.csv";
const MODEL_DIR: &str = "data/model";

#[derive(Debug, Clone)]
pub struct AdjustConfig {
    pub source: PathBuf,
    pub output: PathBuf,
    pub model_dir: PathBuf,
    pub seed: Seed,
    pub lift: LiftTargets,
    pub bands: BandTargets,
}

impl AdjustConfig {
    /// Resolve paths from the environment: SDOH_SOURCE and SDOH_OUT
    /// override the defaults. When a previously adjusted file already
    /// exists it is preferred as the default source, so repeated runs
    /// chain without explicit configuration.
    pub fn from_env() -> Self {
        let source = env::var("SDOH_SOURCE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_source());
        let output = env::var("SDOH_OUT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(ADJUSTED_DATA));
        Self {
            source,
            output,
            model_dir: PathBuf::from(MODEL_DIR),
            seed: DEFAULT_SEED,
            lift: LiftTargets::default(),
            bands: BandTargets::default(),
        }
    }
}

fn default_source() -> PathBuf {
    let adjusted = Path::new(ADJUSTED_DATA);
    if adjusted.exists() {
        adjusted.to_path_buf()
    } else {
        PathBuf::from(BASE_DATA)
    }
}

/// Target share of rows and uniform draw range for one lift category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTarget {
    pub share: f64,
    pub lift_lo: f64,
    pub lift_hi: f64,
}

/// Category distribution targets for the lift rebalancer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiftTargets {
    pub extreme: CategoryTarget,
    pub significant: CategoryTarget,
    pub mild: CategoryTarget,
    pub protective: CategoryTarget,
    /// Plausible closed range for risk_full after recomputation.
    pub risk_floor: f64,
    pub risk_ceil: f64,
}

impl LiftTargets {
    pub fn target(&self, category: LiftCategory) -> &CategoryTarget {
        match category {
            LiftCategory::Extreme => &self.extreme,
            LiftCategory::Significant => &self.significant,
            LiftCategory::Mild => &self.mild,
            LiftCategory::Protective => &self.protective,
        }
    }
}

impl Default for LiftTargets {
    fn default() -> Self {
        Self {
            extreme: CategoryTarget {
                share: 0.60,
                lift_lo: 0.20,
                lift_hi: 0.50,
            },
            significant: CategoryTarget {
                share: 0.10,
                lift_lo: 0.10,
                lift_hi: 0.20,
            },
            mild: CategoryTarget {
                share: 0.15,
                lift_lo: 0.00,
                lift_hi: 0.10,
            },
            protective: CategoryTarget {
                share: 0.15,
                lift_lo: -0.20,
                lift_hi: -0.01,
            },
            risk_floor: 1.5,
            risk_ceil: 3.0,
        }
    }
}

/// Target mean and clip bounds for one ZIP risk band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandTarget {
    pub mean: f64,
    pub floor: f64,
    pub ceil: f64,
}

/// Band targets for the ZIP risk rebalancer. The quantiles cut the
/// distribution of per-ZIP averages, not per-row values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandTargets {
    pub high: BandTarget,
    pub moderate: BandTarget,
    pub low: BandTarget,
    pub lower_quantile: f64,
    pub upper_quantile: f64,
}

impl BandTargets {
    pub fn target(&self, band: RiskBand) -> &BandTarget {
        match band {
            RiskBand::High => &self.high,
            RiskBand::Moderate => &self.moderate,
            RiskBand::Low => &self.low,
        }
    }
}

impl Default for BandTargets {
    fn default() -> Self {
        Self {
            high: BandTarget {
                mean: 2.25,
                floor: 2.1,
                ceil: 3.0,
            },
            moderate: BandTarget {
                mean: 2.0,
                floor: 1.85,
                ceil: 2.25,
            },
            low: BandTarget {
                mean: 1.7,
                floor: 1.5,
                ceil: 1.85,
            },
            lower_quantile: 0.33,
            upper_quantile: 0.66,
        }
    }
}

/// Optional columns active for a run, resolved once against the frame
/// header when a stage starts, never re-checked per cell access.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSet {
    pub risk_no_sdoh: Option<usize>,
    pub risk_score_x: Option<usize>,
}

impl ColumnSet {
    pub fn resolve(frame: &Frame) -> Self {
        Self {
            risk_no_sdoh: frame.column_index(col::RISK_NO_SDOH),
            risk_score_x: frame.column_index(col::RISK_SCORE_X),
        }
    }
}

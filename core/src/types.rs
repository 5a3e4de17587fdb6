//! Shared primitive types and the canonical column names of the dataset.

/// Master seed for a run. One seed drives every stage's RNG stream.
pub type Seed = u64;

/// Canonical column names. Stages refer to columns only through these.
pub mod col {
    pub const MEMBER: &str = "member";
    pub const ZIP: &str = "zip";
    pub const RISK_NO_SDOH: &str = "risk_no_sdoh";
    pub const RISK_FULL: &str = "risk_full";
    pub const RISK_SCORE_X: &str = "risk_score_x";
    pub const SDOH_LIFT: &str = "sdoh_lift";
    pub const SDOH_LIFT_LEVEL: &str = "sdoh_lift_level";
}

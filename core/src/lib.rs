//! sdoh-core: deterministic synthetic adjustment of an SDOH risk
//! dataset.
//!
//! Two batch transformers operate on one in-memory frame:
//!   - LiftRebalancer resamples sdoh_lift to match target category
//!     shares (rank preserving, re-randomizes on re-run).
//!   - ZipRiskRebalancer recenters per-ZIP average risk on band
//!     targets derived from tertiles of the per-ZIP averages.
//! A star-schema projector reshapes the adjusted frame into
//! dimension/fact tables for dashboard consumption.
//!
//! Everything is deterministic given the master seed and the input
//! ordering; no platform RNG is used anywhere.

pub mod category;
pub mod config;
pub mod error;
pub mod frame;
pub mod lift;
pub mod pipeline;
pub mod rng;
pub mod star;
pub mod transform;
pub mod types;
pub mod zip_risk;

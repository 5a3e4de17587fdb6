//! ZIP risk rebalancer: recenters each ZIP's average risk_full on its
//! band target.
//!
//! Bands come from tertiles of the per-ZIP averages, not per-row
//! values. Every member of a ZIP is shifted by the same delta, so the
//! within-ZIP spread survives while the mean lands exactly on target.
//! Clipping runs after the shift; the post-clip ZIP average may drift
//! off target and that is accepted behavior, not corrected.

use crate::{
    category::{level_for_lift, RiskBand},
    config::{BandTargets, ColumnSet},
    error::{AdjustError, AdjustResult},
    frame::Frame,
    rng::StageRng,
    transform::FrameTransform,
    types::col,
};
use std::collections::HashMap;

pub struct ZipRiskRebalancer {
    targets: BandTargets,
}

impl ZipRiskRebalancer {
    pub fn new(targets: BandTargets) -> Self {
        Self { targets }
    }
}

impl Default for ZipRiskRebalancer {
    fn default() -> Self {
        Self::new(BandTargets::default())
    }
}

impl FrameTransform for ZipRiskRebalancer {
    fn name(&self) -> &'static str {
        "zip_risk_rebalance"
    }

    fn apply(&mut self, frame: &mut Frame, _rng: &mut StageRng) -> AdjustResult<()> {
        if frame.is_empty() {
            return Err(AdjustError::EmptyFrame);
        }
        let zip_idx = frame.require_column(col::ZIP)?;
        let risk_idx = frame.require_column(col::RISK_FULL)?;
        let columns = ColumnSet::resolve(frame);

        // Per-ZIP average risk_full. Rows without a zip or a numeric
        // risk value contribute nothing to the averages.
        let mut sums: HashMap<String, (f64, usize)> = HashMap::new();
        for row in 0..frame.len() {
            if let (Some(zip), Some(risk)) = (frame.key(row, zip_idx), frame.number(row, risk_idx))
            {
                let entry = sums.entry(zip).or_insert((0.0, 0));
                entry.0 += risk;
                entry.1 += 1;
            }
        }
        if sums.is_empty() {
            // Quantiles over nothing are undefined. Fail here rather
            // than hand every row a NaN band downstream.
            return Err(AdjustError::DegenerateQuantiles {
                reason: "no rows with both a zip and a numeric risk_full".into(),
            });
        }
        let averages: HashMap<String, f64> = sums
            .into_iter()
            .map(|(zip, (sum, count))| (zip, sum / count as f64))
            .collect();

        // Tertile cut points over the distribution of per-ZIP averages.
        let mut sorted: Vec<f64> = averages.values().copied().collect();
        sorted.sort_by(f64::total_cmp);
        let q_low = quantile(&sorted, self.targets.lower_quantile);
        let q_high = quantile(&sorted, self.targets.upper_quantile);
        log::debug!(
            "{} zips, cut points {q_low:.4} / {q_high:.4}",
            sorted.len()
        );

        // Band plus mean-shift delta per ZIP.
        let mut plan: HashMap<String, (RiskBand, f64)> = HashMap::new();
        for (zip, &avg) in &averages {
            let band = if avg >= q_high {
                RiskBand::High
            } else if avg >= q_low {
                RiskBand::Moderate
            } else {
                RiskBand::Low
            };
            plan.insert(zip.clone(), (band, self.targets.target(band).mean - avg));
        }

        // Shift then clip, in that order. ZIPs missing from the plan
        // (no zip value, or no usable risk rows) take the safe default:
        // Moderate band, no shift.
        for row in 0..frame.len() {
            let (band, delta) = frame
                .key(row, zip_idx)
                .and_then(|zip| plan.get(&zip).copied())
                .unwrap_or((RiskBand::Moderate, 0.0));
            let bounds = self.targets.target(band);

            if let Some(risk) = frame.number(row, risk_idx) {
                frame.set_number(row, risk_idx, (risk + delta).clamp(bounds.floor, bounds.ceil));
            }
            if let Some(x_idx) = columns.risk_score_x {
                if let Some(x) = frame.number(row, x_idx) {
                    frame.set_number(row, x_idx, (x + delta).clamp(bounds.floor, bounds.ceil));
                }
            }
        }

        // Recompute the lift from the shifted risk so the consistency
        // invariant holds, and re-derive the level per row from the
        // fixed thresholds. Rows that cannot produce a lift get the
        // pending label.
        if let Some(no_sdoh_idx) = columns.risk_no_sdoh {
            let lift_idx = frame.ensure_column(col::SDOH_LIFT);
            let level_idx = frame.ensure_column(col::SDOH_LIFT_LEVEL);
            for row in 0..frame.len() {
                let lift = match (frame.number(row, risk_idx), frame.number(row, no_sdoh_idx)) {
                    (Some(full), Some(base)) => Some(full - base),
                    _ => None,
                };
                match lift {
                    Some(value) => frame.set_number(row, lift_idx, value),
                    None => frame.set_null(row, lift_idx),
                }
                frame.set_text(row, level_idx, level_for_lift(lift));
            }
        }

        log::info!("zip risk rebalance complete: {} zips banded", plan.len());
        Ok(())
    }
}

/// Linear-interpolation quantile over a sorted, non-empty slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

//! Lift rebalancer: resamples the sdoh_lift column so the category
//! distribution matches the configured target shares.
//!
//! The reassignment is rank preserving, not value preserving. Rows are
//! sorted by their current lift and cut into contiguous blocks, one per
//! category in ascending order, so a row that was relatively low before
//! stays in a low category after. The block's values are then replaced
//! by uniform draws from the category's range, which also means running
//! this stage twice re-randomizes rather than no-ops.

use crate::{
    category::LiftCategory,
    config::{ColumnSet, LiftTargets},
    error::AdjustResult,
    frame::Frame,
    rng::StageRng,
    transform::FrameTransform,
    types::col,
};

pub struct LiftRebalancer {
    targets: LiftTargets,
}

impl LiftRebalancer {
    pub fn new(targets: LiftTargets) -> Self {
        Self { targets }
    }
}

impl Default for LiftRebalancer {
    fn default() -> Self {
        Self::new(LiftTargets::default())
    }
}

impl FrameTransform for LiftRebalancer {
    fn name(&self) -> &'static str {
        "lift_rebalance"
    }

    fn apply(&mut self, frame: &mut Frame, rng: &mut StageRng) -> AdjustResult<()> {
        let n = frame.len();
        let lift_idx = frame.require_column(col::SDOH_LIFT)?;
        let columns = ColumnSet::resolve(frame);

        // Per-category row counts: round(share * n), with the rounding
        // remainder absorbed entirely by Extreme so the counts sum to n.
        let mut counts: Vec<(LiftCategory, i64)> = LiftCategory::ASCENDING
            .iter()
            .map(|&c| (c, (self.targets.target(c).share * n as f64).round() as i64))
            .collect();
        let assigned: i64 = counts.iter().map(|(_, count)| count).sum();
        let remainder = n as i64 - assigned;
        if remainder != 0 {
            for entry in counts.iter_mut() {
                if entry.0 == LiftCategory::Extreme {
                    entry.1 += remainder;
                }
            }
        }

        // Sort by current lift so the reassignment preserves rank. The
        // original row order is discarded; rows without a usable lift
        // value sort last.
        frame.rows.sort_by(|a, b| {
            let ka = a.get(lift_idx).and_then(|v| v.as_f64()).unwrap_or(f64::INFINITY);
            let kb = b.get(lift_idx).and_then(|v| v.as_f64()).unwrap_or(f64::INFINITY);
            ka.total_cmp(&kb)
        });

        let level_idx = frame.ensure_column(col::SDOH_LIFT_LEVEL);

        // Contiguous blocks in ascending category order: lowest current
        // lift lands in Protective, highest in Extreme. A category with
        // a zero (or negative) count contributes no rows.
        let mut start = 0usize;
        for (category, count) in counts {
            if count <= 0 {
                continue;
            }
            let end = (start + count as usize).min(n);
            let target = self.targets.target(category);
            for row in start..end {
                let draw = rng.uniform_in(target.lift_lo, target.lift_hi);
                frame.set_number(row, lift_idx, draw);
                frame.set_text(row, level_idx, category.label());
            }
            log::debug!(
                "category={} rows={}..{} range=[{}, {})",
                category.name(),
                start,
                end,
                target.lift_lo,
                target.lift_hi
            );
            start = end;
        }

        // Keep risk_full consistent with the resampled lift, clipped to
        // the plausible range. Rows missing the baseline stay null.
        if let Some(no_sdoh_idx) = columns.risk_no_sdoh {
            let risk_idx = frame.ensure_column(col::RISK_FULL);
            for row in 0..n {
                match (frame.number(row, no_sdoh_idx), frame.number(row, lift_idx)) {
                    (Some(base), Some(lift)) => {
                        let full =
                            (base + lift).clamp(self.targets.risk_floor, self.targets.risk_ceil);
                        frame.set_number(row, risk_idx, full);
                    }
                    _ => frame.set_null(row, risk_idx),
                }
            }
        }

        log::info!("lift rebalance complete: {n} rows reassigned");
        Ok(())
    }
}

//! The adjustment pipeline.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. LiftRebalancer
//!   2. ZipRiskRebalancer
//!
//! RULES:
//!   - Stages execute in registration order, single threaded.
//!   - No stage calls another stage directly.
//!   - All randomness flows through the RngBank.
//!   - The caller writes output only after every stage has completed,
//!     so a failed run never produces a partial file.

use crate::{
    error::AdjustResult,
    frame::Frame,
    rng::{RngBank, StageSlot},
    transform::FrameTransform,
    types::Seed,
};

pub struct Pipeline {
    rng_bank: RngBank,
    stages: Vec<(StageSlot, Box<dyn FrameTransform>)>,
}

impl Pipeline {
    pub fn new(seed: Seed) -> Self {
        Self {
            rng_bank: RngBank::new(seed),
            stages: Vec::new(),
        }
    }

    /// Register a stage. Call in the documented execution order.
    pub fn register(&mut self, slot: StageSlot, stage: Box<dyn FrameTransform>) {
        self.stages.push((slot, stage));
    }

    /// Run every registered stage against the frame, in order.
    pub fn run(&mut self, frame: &mut Frame) -> AdjustResult<()> {
        for (slot, stage) in &mut self.stages {
            let mut rng = self.rng_bank.for_stage(*slot);
            log::info!("stage={} rows={}", stage.name(), frame.len());
            stage.apply(frame, &mut rng)?;
        }
        Ok(())
    }
}

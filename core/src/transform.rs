//! The stage contract.
//!
//! RULE: Every transformer implements FrameTransform.
//! The pipeline calls apply() on each registered stage in registration
//! order. Execution order is fixed and documented in pipeline.rs.

use crate::{error::AdjustResult, frame::Frame, rng::StageRng};

/// The contract every pipeline stage must fulfill.
pub trait FrameTransform {
    /// Unique stable name for this stage.
    fn name(&self) -> &'static str;

    /// Mutate the frame in place.
    ///
    /// - `frame`: the whole dataset, resident in memory
    /// - `rng`:   this stage's deterministic RNG stream
    ///
    /// A stage either completes or returns an error; it must not leave
    /// helper columns behind in the frame on success.
    fn apply(&mut self, frame: &mut Frame, rng: &mut StageRng) -> AdjustResult<()>;
}

//! Compositional layer: bar-indexed automation, bar-end fills, stochastic
//! gating, phrase awareness, and the macro presets that bundle them.
//!
//! Each policy is a pure function of `(bar, step, rng)` plus its own tiny
//! state; the sequencer evaluates them top-down once per step into a
//! transient [`StepDecision`] that the per-track logic consumes.

pub mod fill;
pub mod gate;
pub mod idm;
pub mod lane;
pub mod phrase;

pub use fill::{DrillFillPolicy, DrillFillState};
pub use gate::{DrillGatePolicy, DrillGateState};
pub use idm::IdmMacroPreset;
pub use lane::DrillAutomationLane;
pub use phrase::PhraseDetector;

/// Outcome of the per-step policy evaluation, consumed by every track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepDecision {
    /// Burst intensity after automation, fill, and phrase overrides.
    pub effective_amount: f32,
    /// Whether this step fell into a silent run.
    pub gated: bool,
    /// Chance that a gated track erupts instead of staying silent.
    pub burst_chance: f32,
}

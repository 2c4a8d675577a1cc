//! Groove timing: swing curve, role offsets, and the per-track drift walk.
//!
//! All offsets here are fractions of a step duration; they are turned into
//! sample offsets only at dispatch time.

use serde::{Deserialize, Serialize};

use crate::pattern::TimingRole;
use crate::rng::XorShift32;

/// Grid offsets for each timing role, as fractions of a step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoleTiming {
    pub pocket_offset: f32,
    pub push_offset: f32,
    pub pull_offset: f32,
}

impl Default for RoleTiming {
    fn default() -> Self {
        Self {
            pocket_offset: 0.0,
            push_offset: -0.04,
            pull_offset: 0.06,
        }
    }
}

/// Parameters of the humanising drift walk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DillaParams {
    /// Overall drift intensity, 0.0-1.0.
    pub amount: f32,
    /// 0 = hats lag, 1 = hats rush.
    pub hat_bias: f32,
    /// How far behind the beat pull-role tracks drift.
    pub snare_late: f32,
    /// How locked pocket-role tracks stay (1 = rigid).
    pub kick_tight: f32,
    /// Hard cap on the absolute drift, as a fraction of a step.
    pub max_drift: f32,
}

impl Default for DillaParams {
    fn default() -> Self {
        Self {
            amount: 0.0,
            hat_bias: 0.5,
            snare_late: 0.3,
            kick_tight: 0.7,
            max_drift: 0.06,
        }
    }
}

/// Per-track bounded random-walk accumulator.
///
/// The walk is a smoothed excitation with a constant pull toward zero and a
/// soft tanh clamp at `max_drift`, so the drift wanders like a human hand
/// but can never leave its bound. Shrinking `max_drift` at runtime is
/// handled by re-clamping on every update.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DillaState {
    drift: f32,
}

impl DillaState {
    /// Advance the walk one trigger and return the new drift.
    /// Consumes exactly one RNG draw.
    pub fn update(&mut self, role: TimingRole, params: &DillaParams, rng: &mut XorShift32) -> f32 {
        let (instability, bias, correction) = match role {
            TimingRole::Pocket => (
                0.015 * params.amount * (1.0 - params.kick_tight),
                0.0,
                0.02,
            ),
            TimingRole::Push => (
                0.07 * params.amount,
                -params.hat_bias * 0.08 + (1.0 - params.hat_bias) * 0.02,
                0.005,
            ),
            TimingRole::Pull => (0.05 * params.amount, params.snare_late * 0.10, 0.008),
        };

        let u = rng.next_01();
        let delta = (u - 0.5) * instability + 0.5 * bias;
        self.drift = 0.98 * self.drift + 0.02 * delta;
        self.drift *= 1.0 - correction;

        if params.max_drift <= 0.0 {
            self.drift = 0.0;
        } else if self.drift.abs() > params.max_drift {
            self.drift = (self.drift / params.max_drift).tanh() * params.max_drift;
        }
        self.drift
    }

    /// Current drift, clamped against the given bound.
    #[inline]
    pub fn drift(&self, params: &DillaParams) -> f32 {
        self.drift.clamp(-params.max_drift.max(0.0), params.max_drift.max(0.0))
    }

    #[inline]
    pub fn reset(&mut self) {
        self.drift = 0.0;
    }
}

/// Swing contribution for a step index.
///
/// Even steps are untouched. Odd steps move linearly up to a quarter step
/// for `swing <= 0.5`, then ease quadratically toward half a step.
#[inline]
pub fn swing_offset(step_index: u32, swing: f32) -> f32 {
    if step_index % 2 == 0 {
        return 0.0;
    }
    let s = swing.clamp(0.0, 1.0);
    if s <= 0.5 {
        s * 0.5
    } else {
        0.25 + ((s - 0.5) * 2.0).powi(2) * 0.25
    }
}

/// Role contribution for a step index.
///
/// Push leans harder on off-beats, pull leans harder on backbeats.
#[inline]
pub fn role_offset(step_index: u32, role: TimingRole, timing: &RoleTiming) -> f32 {
    match role {
        TimingRole::Pocket => timing.pocket_offset,
        TimingRole::Push => {
            if step_index % 2 == 1 {
                timing.push_offset * 1.2
            } else {
                timing.push_offset
            }
        }
        TimingRole::Pull => {
            if step_index % 4 == 2 {
                timing.pull_offset * 1.15
            } else {
                timing.pull_offset
            }
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::rng::XorShift32;

/// Stochastic silencing of whole steps, with a chance that a silenced
/// track erupts into an extreme burst instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrillGatePolicy {
    pub enabled: bool,
    /// Chance of starting a silent run at an un-silenced step.
    pub silence_chance: f32,
    /// Per-track chance that a silenced step bursts instead.
    pub burst_chance: f32,
    /// Drawn silent-run length bounds, in steps.
    pub min_silent_steps: u8,
    pub max_silent_steps: u8,
}

impl Default for DrillGatePolicy {
    fn default() -> Self {
        // Inert until configured: the phrase logic may force-enable the
        // gate on phrase-end bars, and that must not silence anything on
        // an otherwise untouched sequencer.
        Self {
            enabled: false,
            silence_chance: 0.0,
            burst_chance: 0.25,
            min_silent_steps: 1,
            max_silent_steps: 2,
        }
    }
}

/// Remaining steps of the current silent run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DrillGateState {
    pub silent_steps_remaining: u32,
}

impl DrillGateState {
    /// Advance one step and report whether it is gated.
    ///
    /// A running silence is consumed first; otherwise one draw decides
    /// whether a fresh run starts (the deciding step counts as its first
    /// silent step).
    pub fn advance(
        &mut self,
        policy: &DrillGatePolicy,
        enabled: bool,
        rng: &mut XorShift32,
    ) -> bool {
        if !enabled {
            return false;
        }
        if self.silent_steps_remaining > 0 {
            self.silent_steps_remaining -= 1;
            return true;
        }
        let u = rng.next_01();
        if u < policy.silence_chance {
            let lo = policy.min_silent_steps.max(1) as i32;
            let hi = (policy.max_silent_steps as i32).max(lo);
            let run = rng.range_int(lo, hi) as u32;
            self.silent_steps_remaining = run.saturating_sub(1);
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        self.silent_steps_remaining = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_certain_silence_runs_forever() {
        let policy = DrillGatePolicy {
            enabled: true,
            silence_chance: 1.0,
            burst_chance: 0.0,
            min_silent_steps: 2,
            max_silent_steps: 2,
        };
        let mut state = DrillGateState::default();
        let mut rng = XorShift32::new(1);
        for step in 0..64 {
            assert!(
                state.advance(&policy, true, &mut rng),
                "step {} should be gated with certain silence",
                step
            );
        }
    }

    #[test]
    fn test_run_length_is_exact() {
        let policy = DrillGatePolicy {
            enabled: true,
            silence_chance: 1.0,
            min_silent_steps: 3,
            max_silent_steps: 3,
            ..DrillGatePolicy::default()
        };
        let mut state = DrillGateState::default();
        let mut rng = XorShift32::new(2);
        // Draw starts a 3-step run: deciding step plus two more
        assert!(state.advance(&policy, true, &mut rng));
        assert_eq!(state.silent_steps_remaining, 2);
        assert!(state.advance(&policy, true, &mut rng));
        assert!(state.advance(&policy, true, &mut rng));
        assert_eq!(state.silent_steps_remaining, 0);
    }

    #[test]
    fn test_silence_ends_after_drawn_run() {
        let policy = DrillGatePolicy {
            enabled: true,
            silence_chance: 0.0, // never start a new run
            min_silent_steps: 1,
            max_silent_steps: 4,
            ..DrillGatePolicy::default()
        };
        let mut state = DrillGateState {
            silent_steps_remaining: 2,
        };
        let mut rng = XorShift32::new(3);
        assert!(state.advance(&policy, true, &mut rng));
        assert!(state.advance(&policy, true, &mut rng));
        // Run exhausted; chance 0 means the next step is open
        assert!(!state.advance(&policy, true, &mut rng));
    }

    #[test]
    fn test_disabled_gate_is_transparent() {
        let policy = DrillGatePolicy {
            enabled: true,
            silence_chance: 1.0,
            ..DrillGatePolicy::default()
        };
        let mut state = DrillGateState::default();
        let mut rng = XorShift32::new(4);
        assert!(!state.advance(&policy, false, &mut rng));
        assert_eq!(state.silent_steps_remaining, 0);
    }

    #[test]
    fn test_default_policy_is_inert() {
        let policy = DrillGatePolicy::default();
        let mut state = DrillGateState::default();
        let mut rng = XorShift32::new(5);
        for _ in 0..32 {
            assert!(!state.advance(&policy, true, &mut rng));
        }
    }
}

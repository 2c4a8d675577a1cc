use serde::{Deserialize, Serialize};

use super::phrase::PhraseDetector;
use crate::rng::XorShift32;

/// Bar-end fill behaviour: how often the last steps of a bar escalate
/// into bursts, and how hard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrillFillPolicy {
    pub enabled: bool,
    /// How many trailing steps of the bar belong to the fill window.
    pub fill_length_steps: u8,
    /// Per-bar chance that the fill fires at all.
    pub trigger_chance: f32,
    /// Burst intensity at the start of the fill window.
    pub fill_amount: f32,
    /// Intensity lost per step into the window.
    pub decay_per_step: f32,
}

impl Default for DrillFillPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            fill_length_steps: 4,
            trigger_chance: 0.3,
            fill_amount: 0.8,
            decay_per_step: 0.15,
        }
    }
}

impl DrillFillPolicy {
    /// Fill window length clamped to a sane bar fraction.
    #[inline]
    pub fn window_len(&self) -> u32 {
        (self.fill_length_steps as u32).clamp(1, 16)
    }

    /// Trigger chance for the bar being entered. Phrase-end bars are
    /// near-guaranteed to fill; other bars use the stored chance.
    #[inline]
    pub fn chance_for_bar(&self, phrase: &PhraseDetector, bar: u32) -> f32 {
        if phrase.is_phrase_end(bar) {
            self.trigger_chance.max(0.9)
        } else {
            self.trigger_chance
        }
    }

    /// Fill intensity for the bar: boosted to full on phrase-end bars,
    /// held back elsewhere.
    #[inline]
    pub fn amount_for_bar(&self, phrase: &PhraseDetector, bar: u32) -> f32 {
        if phrase.is_phrase_end(bar) {
            self.fill_amount.max(1.0)
        } else {
            self.fill_amount.min(0.6)
        }
    }
}

/// Whether the current bar's fill fired. Redrawn once per bar.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DrillFillState {
    pub active: bool,
}

impl DrillFillState {
    /// Redraw at a bar boundary. Consumes exactly one RNG draw so the
    /// stream stays aligned whether or not the policy is enabled.
    pub fn redraw(
        &mut self,
        policy: &DrillFillPolicy,
        phrase: &PhraseDetector,
        bar: u32,
        rng: &mut XorShift32,
    ) {
        let u = rng.next_01();
        self.active = policy.enabled && u < policy.chance_for_bar(phrase, bar);
    }

    pub fn reset(&mut self) {
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrase_end_boosts_chance_and_amount() {
        let policy = DrillFillPolicy {
            enabled: true,
            trigger_chance: 0.2,
            fill_amount: 0.8,
            ..DrillFillPolicy::default()
        };
        let phrase = PhraseDetector::new(4);
        // bar 3 ends the first 4-bar phrase
        assert_eq!(policy.chance_for_bar(&phrase, 3), 0.9);
        assert_eq!(policy.amount_for_bar(&phrase, 3), 1.0);
        // mid-phrase bars are held back
        assert_eq!(policy.chance_for_bar(&phrase, 1), 0.2);
        assert_eq!(policy.amount_for_bar(&phrase, 1), 0.6);
    }

    #[test]
    fn test_certain_trigger_fills_every_bar() {
        let policy = DrillFillPolicy {
            enabled: true,
            trigger_chance: 1.0,
            ..DrillFillPolicy::default()
        };
        let phrase = PhraseDetector::new(4);
        let mut rng = XorShift32::new(11);
        let mut state = DrillFillState::default();
        for bar in 0..64 {
            state.redraw(&policy, &phrase, bar, &mut rng);
            assert!(state.active, "bar {} should fill with certain trigger", bar);
        }
    }

    #[test]
    fn test_disabled_policy_never_fills() {
        let policy = DrillFillPolicy {
            enabled: false,
            trigger_chance: 1.0,
            ..DrillFillPolicy::default()
        };
        let phrase = PhraseDetector::new(4);
        let mut rng = XorShift32::new(5);
        let mut state = DrillFillState::default();
        for bar in 0..16 {
            state.redraw(&policy, &phrase, bar, &mut rng);
            assert!(!state.active);
        }
    }

    #[test]
    fn test_window_len_clamped() {
        let mut policy = DrillFillPolicy::default();
        policy.fill_length_steps = 0;
        assert_eq!(policy.window_len(), 1);
        policy.fill_length_steps = 200;
        assert_eq!(policy.window_len(), 16);
    }
}

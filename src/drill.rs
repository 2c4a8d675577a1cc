//! Micro-burst engine: replaces one step hit with a cloud of 1-24
//! sample-accurate micro-hits on straight or inharmonic grids.

use std::collections::HashMap;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::pattern::StepCell;
use crate::rng::XorShift32;

/// Hard per-block ceiling on voice triggers. Once reached, the rest of
/// the block's micro-hits are dropped silently.
pub const MAX_MICRO_HITS_PER_BLOCK: u32 = 256;

/// Upper bound on micro-hits per burst.
pub const MAX_BURST: u8 = 24;

/// Rhythmic grid a burst is distributed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrillGrid {
    /// One slot per micro-hit.
    Straight,
    Triplet,
    Quintuplet,
    Septuplet,
    /// Draws 5, 7 or 11 slots per burst, weighted 0.45 / 0.45 / 0.10.
    RandomPrime,
}

/// Burst shape parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrillMode {
    pub enabled: bool,
    /// Global intensity and gate, 0.0-1.0.
    pub amount: f32,
    /// Micro-hits per burst, 1-24.
    pub min_burst: u8,
    pub max_burst: u8,
    /// Fraction of the step the burst occupies.
    pub spread: f32,
    /// Time-jitter amount.
    pub chaos: f32,
    /// Per-hit skip probability.
    pub dropout: f32,
    /// Exponential velocity falloff across the burst, 0.0-0.95.
    pub vel_decay: f32,
    /// Probability of a random velocity spike per hit.
    pub accent_flip: f32,
    /// Probability of re-sampling the burst size.
    pub mutation_rate: f32,
    /// Macro multiplier on burst size, chaos, and mutation.
    pub temporal_aggression: f32,
    pub grid: DrillGrid,
    /// Advisory crossfade length between groove and burst feels; the
    /// path switch itself is hard per step.
    pub transition_beats: f32,
}

impl Default for DrillMode {
    fn default() -> Self {
        Self {
            enabled: false,
            amount: 0.5,
            min_burst: 2,
            max_burst: 8,
            spread: 1.0,
            chaos: 0.25,
            dropout: 0.1,
            vel_decay: 0.12,
            accent_flip: 0.15,
            mutation_rate: 0.2,
            temporal_aggression: 1.0,
            grid: DrillGrid::Straight,
            transition_beats: 1.0,
        }
    }
}

impl DrillMode {
    /// Gentle ratchets for accents.
    pub fn drill_lite() -> Self {
        Self {
            enabled: true,
            amount: 0.3,
            min_burst: 2,
            max_burst: 4,
            spread: 0.9,
            chaos: 0.1,
            dropout: 0.05,
            vel_decay: 0.1,
            accent_flip: 0.05,
            mutation_rate: 0.05,
            temporal_aggression: 1.0,
            grid: DrillGrid::Straight,
            transition_beats: 1.0,
        }
    }

    /// Dense septuplet snare shredding.
    pub fn aphex_snare_hell() -> Self {
        Self {
            enabled: true,
            amount: 0.95,
            min_burst: 8,
            max_burst: 24,
            spread: 1.0,
            chaos: 0.55,
            dropout: 0.15,
            vel_decay: 0.06,
            accent_flip: 0.4,
            mutation_rate: 0.5,
            temporal_aggression: 1.6,
            grid: DrillGrid::Septuplet,
            transition_beats: 0.5,
        }
    }

    /// Sparse, heavily jittered prime grids.
    pub fn venetian_mode() -> Self {
        Self {
            enabled: true,
            amount: 0.8,
            min_burst: 5,
            max_burst: 11,
            spread: 0.75,
            chaos: 0.7,
            dropout: 0.3,
            vel_decay: 0.18,
            accent_flip: 0.25,
            mutation_rate: 0.65,
            temporal_aggression: 1.3,
            grid: DrillGrid::RandomPrime,
            transition_beats: 0.25,
        }
    }

    /// Small bursts with wild accent spikes.
    pub fn glitch_accent() -> Self {
        Self {
            enabled: true,
            amount: 0.45,
            min_burst: 2,
            max_burst: 6,
            spread: 0.5,
            chaos: 0.35,
            dropout: 0.2,
            vel_decay: 0.0,
            accent_flip: 0.85,
            mutation_rate: 0.3,
            temporal_aggression: 1.0,
            grid: DrillGrid::Straight,
            transition_beats: 1.0,
        }
    }

    /// Triplet stumble with heavy dropout.
    pub fn broken_groove() -> Self {
        Self {
            enabled: true,
            amount: 0.6,
            min_burst: 3,
            max_burst: 9,
            spread: 0.85,
            chaos: 0.45,
            dropout: 0.35,
            vel_decay: 0.12,
            accent_flip: 0.2,
            mutation_rate: 0.4,
            temporal_aggression: 1.1,
            grid: DrillGrid::Triplet,
            transition_beats: 2.0,
        }
    }

    /// Quintuplet runs that fade out across the burst.
    pub fn neo_idm_fill() -> Self {
        Self {
            enabled: true,
            amount: 0.7,
            min_burst: 4,
            max_burst: 12,
            spread: 1.0,
            chaos: 0.3,
            dropout: 0.1,
            vel_decay: 0.2,
            accent_flip: 0.3,
            mutation_rate: 0.25,
            temporal_aggression: 1.2,
            grid: DrillGrid::Quintuplet,
            transition_beats: 1.0,
        }
    }

    /// Quiet, hole-riddled ghost bursts.
    pub fn ghost_machinery() -> Self {
        Self {
            enabled: true,
            amount: 0.5,
            min_burst: 3,
            max_burst: 8,
            spread: 0.95,
            chaos: 0.25,
            dropout: 0.45,
            vel_decay: 0.35,
            accent_flip: 0.1,
            mutation_rate: 0.2,
            temporal_aggression: 0.9,
            grid: DrillGrid::Straight,
            transition_beats: 2.0,
        }
    }

    /// Maximum-density fractured prime grids.
    pub fn aphex_microfracture() -> Self {
        Self {
            enabled: true,
            amount: 1.0,
            min_burst: 12,
            max_burst: 24,
            spread: 0.6,
            chaos: 0.8,
            dropout: 0.25,
            vel_decay: 0.04,
            accent_flip: 0.5,
            mutation_rate: 0.7,
            temporal_aggression: 1.8,
            grid: DrillGrid::RandomPrime,
            transition_beats: 0.25,
        }
    }

    /// Quintuplet snare rolls with strong accents.
    pub fn windowlicker_snare() -> Self {
        Self {
            enabled: true,
            amount: 0.85,
            min_burst: 6,
            max_burst: 14,
            spread: 1.0,
            chaos: 0.4,
            dropout: 0.1,
            vel_decay: 0.1,
            accent_flip: 0.45,
            mutation_rate: 0.35,
            temporal_aggression: 1.4,
            grid: DrillGrid::Quintuplet,
            transition_beats: 0.5,
        }
    }

    /// Mild triplet shimmer.
    pub fn polygon_window() -> Self {
        Self {
            enabled: true,
            amount: 0.65,
            min_burst: 4,
            max_burst: 10,
            spread: 0.8,
            chaos: 0.2,
            dropout: 0.15,
            vel_decay: 0.15,
            accent_flip: 0.2,
            mutation_rate: 0.15,
            temporal_aggression: 1.0,
            grid: DrillGrid::Triplet,
            transition_beats: 1.0,
        }
    }

    /// Small bursts smeared by extreme jitter.
    pub fn clock_desync() -> Self {
        Self {
            enabled: true,
            amount: 0.55,
            min_burst: 2,
            max_burst: 7,
            spread: 1.0,
            chaos: 0.9,
            dropout: 0.2,
            vel_decay: 0.08,
            accent_flip: 0.15,
            mutation_rate: 0.45,
            temporal_aggression: 1.2,
            grid: DrillGrid::RandomPrime,
            transition_beats: 4.0,
        }
    }

    /// Relentless straight sixteenth-of-a-step rolls.
    pub fn drill_n_bass_core() -> Self {
        Self {
            enabled: true,
            amount: 0.9,
            min_burst: 8,
            max_burst: 16,
            spread: 1.0,
            chaos: 0.3,
            dropout: 0.05,
            vel_decay: 0.07,
            accent_flip: 0.35,
            mutation_rate: 0.3,
            temporal_aggression: 1.5,
            grid: DrillGrid::Straight,
            transition_beats: 0.5,
        }
    }

    /// Septuplet ghosts that mostly vanish.
    pub fn venetian_ghosts() -> Self {
        Self {
            enabled: true,
            amount: 0.7,
            min_burst: 5,
            max_burst: 13,
            spread: 0.7,
            chaos: 0.6,
            dropout: 0.5,
            vel_decay: 0.3,
            accent_flip: 0.15,
            mutation_rate: 0.55,
            temporal_aggression: 1.2,
            grid: DrillGrid::Septuplet,
            transition_beats: 1.0,
        }
    }

    /// Chopped-break density with hard accents.
    pub fn amen_shredder() -> Self {
        Self {
            enabled: true,
            amount: 0.95,
            min_burst: 10,
            max_burst: 20,
            spread: 1.0,
            chaos: 0.5,
            dropout: 0.2,
            vel_decay: 0.05,
            accent_flip: 0.55,
            mutation_rate: 0.6,
            temporal_aggression: 1.7,
            grid: DrillGrid::Straight,
            transition_beats: 0.25,
        }
    }

    /// Everything at once, as fast as the cap allows.
    pub fn overclocked_snare() -> Self {
        Self {
            enabled: true,
            amount: 1.0,
            min_burst: 16,
            max_burst: 24,
            spread: 0.9,
            chaos: 0.2,
            dropout: 0.1,
            vel_decay: 0.03,
            accent_flip: 0.3,
            mutation_rate: 0.2,
            temporal_aggression: 2.0,
            grid: DrillGrid::Straight,
            transition_beats: 0.25,
        }
    }

    /// Grinding triplets compressed into two thirds of the step.
    pub fn time_grinder() -> Self {
        Self {
            enabled: true,
            amount: 0.75,
            min_burst: 6,
            max_burst: 12,
            spread: 0.65,
            chaos: 0.65,
            dropout: 0.3,
            vel_decay: 0.22,
            accent_flip: 0.25,
            mutation_rate: 0.5,
            temporal_aggression: 1.3,
            grid: DrillGrid::Triplet,
            transition_beats: 2.0,
        }
    }

    /// Full chaos: jitter and mutation pinned high.
    pub fn digital_seizure() -> Self {
        Self {
            enabled: true,
            amount: 1.0,
            min_burst: 8,
            max_burst: 24,
            spread: 1.0,
            chaos: 1.0,
            dropout: 0.4,
            vel_decay: 0.0,
            accent_flip: 0.6,
            mutation_rate: 0.8,
            temporal_aggression: 1.9,
            grid: DrillGrid::RandomPrime,
            transition_beats: 0.25,
        }
    }

    /// Steady machine hum: dense but almost deterministic.
    pub fn static_engine() -> Self {
        Self {
            enabled: true,
            amount: 0.6,
            min_burst: 4,
            max_burst: 8,
            spread: 1.0,
            chaos: 0.05,
            dropout: 0.02,
            vel_decay: 0.25,
            accent_flip: 0.05,
            mutation_rate: 0.05,
            temporal_aggression: 1.0,
            grid: DrillGrid::Straight,
            transition_beats: 4.0,
        }
    }

    /// Clean ratchets that scale with intensity, no randomness.
    pub fn ratchet_builder() -> Self {
        Self {
            enabled: true,
            amount: 0.5,
            min_burst: 2,
            max_burst: 12,
            spread: 1.0,
            chaos: 0.0,
            dropout: 0.0,
            vel_decay: 0.15,
            accent_flip: 0.1,
            mutation_rate: 0.1,
            temporal_aggression: 1.0,
            grid: DrillGrid::Straight,
            transition_beats: 1.0,
        }
    }

    /// Quintuplet sweeps intended for bar-end fills.
    pub fn fill_generator() -> Self {
        Self {
            enabled: true,
            amount: 0.8,
            min_burst: 4,
            max_burst: 16,
            spread: 1.0,
            chaos: 0.25,
            dropout: 0.1,
            vel_decay: 0.12,
            accent_flip: 0.4,
            mutation_rate: 0.4,
            temporal_aggression: 1.3,
            grid: DrillGrid::Quintuplet,
            transition_beats: 0.5,
        }
    }
}

/// Names of the built-in burst presets, in registry order.
pub const DRILL_PRESET_NAMES: [&str; 20] = [
    "DrillLite",
    "AphexSnareHell",
    "VenetianMode",
    "GlitchAccent",
    "BrokenGroove",
    "NeoIDMFill",
    "GhostMachinery",
    "AphexMicrofracture",
    "WindowlickerSnare",
    "PolygonWindow",
    "ClockDesync",
    "DrillNBassCore",
    "VenetianGhosts",
    "AmenShredder",
    "OverclockedSnare",
    "TimeGrinder",
    "DigitalSeizure",
    "StaticEngine",
    "RatchetBuilder",
    "FillGenerator",
];

lazy_static! {
    static ref DRILL_PRESETS: HashMap<&'static str, fn() -> DrillMode> = {
        let mut m: HashMap<&'static str, fn() -> DrillMode> = HashMap::new();
        m.insert("DrillLite", DrillMode::drill_lite);
        m.insert("AphexSnareHell", DrillMode::aphex_snare_hell);
        m.insert("VenetianMode", DrillMode::venetian_mode);
        m.insert("GlitchAccent", DrillMode::glitch_accent);
        m.insert("BrokenGroove", DrillMode::broken_groove);
        m.insert("NeoIDMFill", DrillMode::neo_idm_fill);
        m.insert("GhostMachinery", DrillMode::ghost_machinery);
        m.insert("AphexMicrofracture", DrillMode::aphex_microfracture);
        m.insert("WindowlickerSnare", DrillMode::windowlicker_snare);
        m.insert("PolygonWindow", DrillMode::polygon_window);
        m.insert("ClockDesync", DrillMode::clock_desync);
        m.insert("DrillNBassCore", DrillMode::drill_n_bass_core);
        m.insert("VenetianGhosts", DrillMode::venetian_ghosts);
        m.insert("AmenShredder", DrillMode::amen_shredder);
        m.insert("OverclockedSnare", DrillMode::overclocked_snare);
        m.insert("TimeGrinder", DrillMode::time_grinder);
        m.insert("DigitalSeizure", DrillMode::digital_seizure);
        m.insert("StaticEngine", DrillMode::static_engine);
        m.insert("RatchetBuilder", DrillMode::ratchet_builder);
        m.insert("FillGenerator", DrillMode::fill_generator);
        m
    };
}

/// Look up a built-in burst preset by name.
pub fn drill_preset(name: &str) -> Option<DrillMode> {
    DRILL_PRESETS.get(name).map(|f| f())
}

/// Per-block trigger accounting shared by every dispatch path.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct HitBudget {
    emitted: u32,
    dropped_this_block: u32,
    dropped_peak: u32,
}

impl HitBudget {
    pub fn begin_block(&mut self) {
        self.emitted = 0;
        self.dropped_this_block = 0;
    }

    /// Claim one trigger slot. False once the block cap is reached.
    #[inline]
    pub fn try_take(&mut self) -> bool {
        if self.emitted < MAX_MICRO_HITS_PER_BLOCK {
            self.emitted += 1;
            true
        } else {
            self.drop_hits(1);
            false
        }
    }

    #[inline]
    pub fn drop_hits(&mut self, n: u32) {
        self.dropped_this_block += n;
        self.dropped_peak = self.dropped_peak.max(self.dropped_this_block);
    }

    pub fn emitted(&self) -> u32 {
        self.emitted
    }

    /// Worst observed per-block drop count since the last reset.
    pub fn dropped_peak(&self) -> u32 {
        self.dropped_peak
    }

    pub fn clear_peak(&mut self) {
        self.dropped_peak = 0;
        self.dropped_this_block = 0;
    }
}

/// Expand one step cell into a micro-burst and hand each surviving hit to
/// `emit` as `(velocity01, sample_offset)`.
///
/// Offsets are relative to the step start and always land inside
/// `[0, samples_per_step)`. RNG draws happen in a fixed order per hit so
/// the stream stays aligned regardless of which hits survive.
pub(crate) fn schedule_micro_burst(
    mode: &DrillMode,
    cell: &StepCell,
    effective_amount: f32,
    samples_per_step: f64,
    rng: &mut XorShift32,
    budget: &mut HitBudget,
    emit: &mut dyn FnMut(f32, u32),
) {
    let last_offset = (samples_per_step - 1.0).max(0.0);

    // Single plain hit when the burst engine has nothing to do. The
    // computed delay is only validated against the step window; the hit
    // itself lands at the step start.
    if !mode.enabled || effective_amount <= 1e-4 || mode.max_burst <= 1 {
        let delay = (cell.timing_offset as f64 * samples_per_step).round_ties_even();
        if delay >= 0.0 && delay < samples_per_step && budget.try_take() {
            emit(cell.velocity.min(127) as f32 / 127.0, 0);
        }
        return;
    }

    let lo = mode.min_burst.max(1);
    let hi = mode.max_burst.max(lo).min(MAX_BURST);
    let aggression = mode.temporal_aggression.max(0.0);
    let eff_amt = effective_amount * aggression;

    let mut count = (lo as f32 + eff_amt * (hi - lo) as f32).round() as i32;
    let mutation_u = rng.next_01();
    if mutation_u < mode.mutation_rate * aggression * eff_amt {
        count = rng.range_int(lo as i32, hi as i32);
    }

    let (mut count, chaos, dropout) = if cell.use_drill {
        (
            cell.burst_count as i32,
            cell.burst_chaos,
            cell.burst_dropout,
        )
    } else {
        (count, mode.chaos, mode.dropout)
    };
    count = count.clamp(1, MAX_BURST as i32);

    let slots: i32 = match mode.grid {
        DrillGrid::Straight => count,
        DrillGrid::Triplet => 3,
        DrillGrid::Quintuplet => 5,
        DrillGrid::Septuplet => 7,
        DrillGrid::RandomPrime => {
            let u = rng.next_01();
            if u < 0.45 {
                5
            } else if u < 0.90 {
                7
            } else {
                11
            }
        }
    };

    let spread = mode.spread.clamp(0.0, 1.0);
    let chaos_frac = chaos * aggression * eff_amt * (spread * 0.35);
    let vel_decay = mode.vel_decay.clamp(0.0, 0.95);
    let base_vel = cell.velocity.min(127) as f32 / 127.0;

    for i in 0..count {
        // Fixed draw order per hit: jitter, dropout, accent gate, accent size.
        let chaos_u = rng.next_signed();
        let drop_u = rng.next_01();
        let flip_u = rng.next_01();
        let flip_scale_u = rng.next_01();

        let pos01 = if count > 1 {
            i as f32 / (count - 1) as f32
        } else {
            0.0
        };
        let slot = ((pos01 * (slots - 1) as f32).round() as i32).clamp(0, slots - 1);
        let slot_pos01 = if slots > 1 {
            slot as f32 / (slots - 1) as f32
        } else {
            0.0
        };

        let mut frac = slot_pos01 * spread + chaos_u * chaos_frac;
        frac = frac.clamp(0.0, 1.0);

        if drop_u < dropout * eff_amt {
            continue;
        }

        let mut v = base_vel * (1.0 - vel_decay).powi(i);
        if flip_u < mode.accent_flip * eff_amt {
            v *= 0.8 + flip_scale_u * 0.6;
        }
        let vel7 = (v.clamp(0.0, 1.0) * 127.0).floor();

        let offset = (frac as f64 * samples_per_step)
            .round_ties_even()
            .clamp(0.0, last_offset) as u32;

        if budget.try_take() {
            emit(vel7 / 127.0, offset);
        } else {
            // Cap reached: the rest of this burst is gone.
            budget.drop_hits((count - i - 1) as u32);
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_burst(
        mode: &DrillMode,
        cell: &StepCell,
        amount: f32,
        sps: f64,
        seed: u32,
    ) -> Vec<(f32, u32)> {
        let mut rng = XorShift32::new(seed);
        let mut budget = HitBudget::default();
        budget.begin_block();
        let mut hits = Vec::new();
        schedule_micro_burst(mode, cell, amount, sps, &mut rng, &mut budget, &mut |v, o| {
            hits.push((v, o))
        });
        hits
    }

    fn flat_mode(burst: u8) -> DrillMode {
        DrillMode {
            enabled: true,
            amount: 1.0,
            min_burst: burst,
            max_burst: burst,
            spread: 1.0,
            chaos: 0.0,
            dropout: 0.0,
            vel_decay: 0.0,
            accent_flip: 0.0,
            mutation_rate: 0.0,
            temporal_aggression: 1.0,
            grid: DrillGrid::Straight,
            transition_beats: 1.0,
        }
    }

    #[test]
    fn test_flat_burst_positions() {
        let cell = StepCell::hit(127);
        let hits = collect_burst(&flat_mode(4), &cell, 1.0, 6000.0, 1);
        assert_eq!(hits.len(), 4);
        for (i, &(v, o)) in hits.iter().enumerate() {
            let expected = ((i as f64 * 6000.0 / 3.0).round() as u32).min(5999);
            assert_eq!(o, expected, "hit {} at wrong offset", i);
            assert_eq!(v, 1.0, "hit {} velocity should be full", i);
        }
    }

    #[test]
    fn test_offsets_inside_step_window() {
        let presets: Vec<DrillMode> = DRILL_PRESET_NAMES
            .iter()
            .map(|&n| drill_preset(n).unwrap())
            .collect();
        let cell = StepCell::hit(127);
        for (i, mode) in presets.iter().enumerate() {
            let hits = collect_burst(mode, &cell, 1.0, 5512.5, 1000 + i as u32);
            for &(_, o) in &hits {
                assert!((o as f64) < 5512.5, "preset {} offset {} escapes step", i, o);
            }
        }
    }

    #[test]
    fn test_disabled_mode_emits_single_hit_at_step_start() {
        let mut mode = flat_mode(4);
        mode.enabled = false;
        let mut cell = StepCell::hit(96);
        cell.timing_offset = 0.3;
        let hits = collect_burst(&mode, &cell, 1.0, 4000.0, 2);
        assert_eq!(hits, vec![(96.0 / 127.0, 0)]);
    }

    #[test]
    fn test_single_hit_outside_window_is_discarded() {
        let mut mode = flat_mode(4);
        mode.enabled = false;
        let mut cell = StepCell::hit(96);
        cell.timing_offset = -0.2;
        let hits = collect_burst(&mode, &cell, 1.0, 4000.0, 2);
        assert!(hits.is_empty(), "negative delay fails the window check");
    }

    #[test]
    fn test_velocity_decay_is_exponential() {
        let mut mode = flat_mode(4);
        mode.vel_decay = 0.5;
        let cell = StepCell::hit(127);
        let hits = collect_burst(&mode, &cell, 1.0, 8000.0, 3);
        assert_eq!(hits.len(), 4);
        for (i, &(v, _)) in hits.iter().enumerate() {
            let expected = (0.5f32.powi(i as i32) * 127.0).floor() / 127.0;
            assert_eq!(v, expected, "hit {} decay mismatch", i);
        }
    }

    #[test]
    fn test_full_dropout_silences_burst() {
        let mut mode = flat_mode(8);
        mode.dropout = 1.0;
        let cell = StepCell::hit(127);
        let hits = collect_burst(&mode, &cell, 1.0, 8000.0, 4);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_cell_override_wins() {
        let mode = flat_mode(4);
        let mut cell = StepCell::hit(127);
        cell.use_drill = true;
        cell.burst_count = 7;
        cell.burst_chaos = 0.0;
        cell.burst_dropout = 0.0;
        let hits = collect_burst(&mode, &cell, 1.0, 8000.0, 5);
        assert_eq!(hits.len(), 7);
    }

    #[test]
    fn test_min_above_max_collapses() {
        let mut mode = flat_mode(4);
        mode.min_burst = 9;
        mode.max_burst = 3;
        let cell = StepCell::hit(127);
        let hits = collect_burst(&mode, &cell, 1.0, 8000.0, 6);
        assert_eq!(hits.len(), 9, "min above max behaves as min == max");
    }

    #[test]
    fn test_budget_truncates_burst() {
        let mode = flat_mode(24);
        let cell = StepCell::hit(127);
        let mut rng = XorShift32::new(7);
        let mut budget = HitBudget::default();
        budget.begin_block();
        // Pre-spend the block down to 10 remaining slots
        for _ in 0..(MAX_MICRO_HITS_PER_BLOCK - 10) {
            assert!(budget.try_take());
        }
        let mut hits = 0u32;
        schedule_micro_burst(&mode, &cell, 1.0, 8000.0, &mut rng, &mut budget, &mut |_, _| {
            hits += 1
        });
        assert_eq!(hits, 10, "only the remaining budget may be emitted");
        assert_eq!(budget.emitted(), MAX_MICRO_HITS_PER_BLOCK);
        assert!(budget.dropped_peak() >= 13, "the rest must be recorded as dropped");
    }

    #[test]
    fn test_burst_is_deterministic() {
        let mode = DrillMode::digital_seizure();
        let cell = StepCell::hit(110);
        let a = collect_burst(&mode, &cell, 0.9, 5512.5, 42);
        let b = collect_burst(&mode, &cell, 0.9, 5512.5, 42);
        assert_eq!(a, b);
    }

    #[test]
    fn test_preset_registry_complete() {
        for name in DRILL_PRESET_NAMES {
            let mode = drill_preset(name).unwrap_or_else(|| panic!("missing preset {}", name));
            assert!(mode.enabled, "preset {} should come enabled", name);
            assert!(mode.min_burst >= 1 && mode.max_burst <= MAX_BURST);
            assert!(mode.vel_decay <= 0.95);
        }
        assert!(drill_preset("NoSuchPreset").is_none());
    }
}

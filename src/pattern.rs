//! Pattern data model: step cells, tracks, and the 16x16 grid.

use serde::{Deserialize, Serialize};

use crate::drill::DrillMode;

/// Number of percussion tracks in a pattern.
pub const NUM_TRACKS: usize = 16;

/// Number of step cells per track.
pub const NUM_STEPS: usize = 16;

/// The percussion voice a track excites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoiceType {
    Kick,
    Snare,
    HiHatClosed,
    HiHatOpen,
    Clap,
    TomLow,
    TomMid,
    TomHigh,
    Crash,
    Ride,
    Cowbell,
    Shaker,
    Tambourine,
    Percussion,
    Special,
}

/// Number of distinct voices.
pub const NUM_VOICES: usize = 15;

impl VoiceType {
    /// Stable index for per-voice tables.
    #[inline]
    pub fn index(&self) -> usize {
        match self {
            VoiceType::Kick => 0,
            VoiceType::Snare => 1,
            VoiceType::HiHatClosed => 2,
            VoiceType::HiHatOpen => 3,
            VoiceType::Clap => 4,
            VoiceType::TomLow => 5,
            VoiceType::TomMid => 6,
            VoiceType::TomHigh => 7,
            VoiceType::Crash => 8,
            VoiceType::Ride => 9,
            VoiceType::Cowbell => 10,
            VoiceType::Shaker => 11,
            VoiceType::Tambourine => 12,
            VoiceType::Percussion => 13,
            VoiceType::Special => 14,
        }
    }

    /// All voices in index order.
    pub fn all() -> [VoiceType; NUM_VOICES] {
        [
            VoiceType::Kick,
            VoiceType::Snare,
            VoiceType::HiHatClosed,
            VoiceType::HiHatOpen,
            VoiceType::Clap,
            VoiceType::TomLow,
            VoiceType::TomMid,
            VoiceType::TomHigh,
            VoiceType::Crash,
            VoiceType::Ride,
            VoiceType::Cowbell,
            VoiceType::Shaker,
            VoiceType::Tambourine,
            VoiceType::Percussion,
            VoiceType::Special,
        ]
    }

    /// Whether this voice takes the micro-burst path by default.
    /// Kicks, toms, and cymbals stay on the groove path.
    #[inline]
    pub fn prefers_burst(&self) -> bool {
        matches!(
            self,
            VoiceType::Snare
                | VoiceType::HiHatClosed
                | VoiceType::HiHatOpen
                | VoiceType::Clap
                | VoiceType::Shaker
                | VoiceType::Tambourine
                | VoiceType::Percussion
        )
    }

    /// Whether the per-track semitone offset retunes this voice.
    #[inline]
    pub fn is_pitched(&self) -> bool {
        matches!(
            self,
            VoiceType::TomLow
                | VoiceType::TomMid
                | VoiceType::TomHigh
                | VoiceType::Cowbell
                | VoiceType::Percussion
        )
    }
}

/// A track's habitual timing character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimingRole {
    /// Centred on the grid.
    Pocket,
    /// Slightly ahead of the grid.
    Push,
    /// Slightly behind the grid.
    Pull,
}

/// Per-cell appetite for the micro-burst path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrillIntent {
    /// Never bursts, regardless of intensity.
    None,
    /// Bursts once the effective intensity is substantial (> 0.25).
    Optional,
    /// Bursts at almost any intensity (> 0.05).
    Emphasize,
}

/// Default dispatch bias of the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RhythmFeelMode {
    Groove,
    Drill,
}

/// One cell in the 16-step grid of one track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepCell {
    pub active: bool,
    /// MIDI-style velocity, 0-127.
    pub velocity: u8,
    /// Chance the hit actually fires, 0.0-1.0.
    pub probability: f32,
    pub has_flam: bool,
    pub is_roll: bool,
    /// Sub-hits for a roll, >= 1.
    pub roll_notes: u8,
    /// Sub-step offset as a fraction of the step, recomputed at every
    /// trigger and never persisted.
    #[serde(skip)]
    pub timing_offset: f32,
    /// When set, this cell carries its own burst shape.
    pub use_drill: bool,
    pub burst_count: u8,
    pub burst_chaos: f32,
    pub burst_dropout: f32,
    pub drill_intent: DrillIntent,
}

impl Default for StepCell {
    fn default() -> Self {
        Self {
            active: false,
            velocity: 100,
            probability: 1.0,
            has_flam: false,
            is_roll: false,
            roll_notes: 1,
            timing_offset: 0.0,
            use_drill: false,
            burst_count: 4,
            burst_chaos: 0.0,
            burst_dropout: 0.0,
            drill_intent: DrillIntent::Optional,
        }
    }
}

impl StepCell {
    /// An active cell at the given velocity, everything else default.
    pub fn hit(velocity: u8) -> Self {
        Self {
            active: true,
            velocity,
            ..Self::default()
        }
    }
}

/// One percussion track: 16 cells plus voice and feel settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub steps: [StepCell; NUM_STEPS],
    pub voice: VoiceType,
    pub role: TimingRole,
    pub volume: f32,
    /// -1.0 (left) to 1.0 (right).
    pub pan: f32,
    /// Semitone offset for pitched voices (toms and friends).
    pub pitch: i32,
    /// Shadows the global burst shape for this track when set.
    pub drill_override: Option<DrillMode>,
}

impl Track {
    pub fn new(voice: VoiceType) -> Self {
        Self {
            steps: [StepCell::default(); NUM_STEPS],
            voice,
            role: TimingRole::Pocket,
            volume: 1.0,
            pan: 0.0,
            pitch: 0,
            drill_override: None,
        }
    }

    /// Activate the given steps at the given velocity.
    pub fn with_hits(mut self, steps: &[usize], velocity: u8) -> Self {
        for &s in steps {
            if s < NUM_STEPS {
                self.steps[s] = StepCell::hit(velocity);
            }
        }
        self
    }
}

/// A full pattern: exactly 16 tracks of exactly 16 cells.
///
/// Playable length in steps is a sequencer setting, not pattern data;
/// cells past the playable length are kept but skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub tracks: [Track; NUM_TRACKS],
}

impl Default for Pattern {
    fn default() -> Self {
        // Standard kit layout; the two spare tracks double up on
        // percussion. Snares land late, hats push.
        let voices = [
            VoiceType::Kick,
            VoiceType::Snare,
            VoiceType::HiHatClosed,
            VoiceType::HiHatOpen,
            VoiceType::Clap,
            VoiceType::TomLow,
            VoiceType::TomMid,
            VoiceType::TomHigh,
            VoiceType::Crash,
            VoiceType::Ride,
            VoiceType::Cowbell,
            VoiceType::Shaker,
            VoiceType::Tambourine,
            VoiceType::Percussion,
            VoiceType::Special,
            VoiceType::Percussion,
        ];
        let tracks = voices.map(|v| {
            let mut t = Track::new(v);
            t.role = match v {
                VoiceType::Snare | VoiceType::Clap => TimingRole::Pull,
                VoiceType::HiHatClosed | VoiceType::HiHatOpen | VoiceType::Shaker => {
                    TimingRole::Push
                }
                _ => TimingRole::Pocket,
            };
            t
        });
        Self { tracks }
    }
}

impl Pattern {
    /// Empty pattern with the default kit layout.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_index_round_trip() {
        for (i, v) in VoiceType::all().iter().enumerate() {
            assert_eq!(v.index(), i, "index mismatch for {:?}", v);
        }
    }

    #[test]
    fn test_burst_eligibility() {
        assert!(VoiceType::Snare.prefers_burst());
        assert!(VoiceType::HiHatClosed.prefers_burst());
        assert!(!VoiceType::Kick.prefers_burst());
        assert!(!VoiceType::TomMid.prefers_burst());
        assert!(!VoiceType::Crash.prefers_burst());
    }

    #[test]
    fn test_step_cell_defaults() {
        let cell = StepCell::default();
        assert!(!cell.active);
        assert_eq!(cell.velocity, 100);
        assert_eq!(cell.probability, 1.0);
        assert_eq!(cell.roll_notes, 1);
        assert_eq!(cell.drill_intent, DrillIntent::Optional);
    }

    #[test]
    fn test_track_with_hits_ignores_out_of_bounds() {
        let track = Track::new(VoiceType::Kick).with_hits(&[0, 4, 16, 99], 127);
        let active: Vec<usize> = (0..NUM_STEPS).filter(|&s| track.steps[s].active).collect();
        assert_eq!(active, vec![0, 4]);
    }

    #[test]
    fn test_default_pattern_layout() {
        let pattern = Pattern::default();
        assert_eq!(pattern.tracks.len(), NUM_TRACKS);
        assert_eq!(pattern.tracks[0].voice, VoiceType::Kick);
        assert_eq!(pattern.tracks[1].voice, VoiceType::Snare);
        assert_eq!(pattern.tracks[1].role, TimingRole::Pull);
        assert_eq!(pattern.tracks[2].role, TimingRole::Push);
        for track in &pattern.tracks {
            assert!(track.steps.iter().all(|c| !c.active));
        }
    }

    #[test]
    fn test_timing_offset_not_serialized() {
        let mut cell = StepCell::hit(127);
        cell.timing_offset = 0.25;
        let json = serde_json::to_string(&cell).unwrap();
        assert!(!json.contains("timing_offset"));
        let back: StepCell = serde_json::from_str(&json).unwrap();
        assert_eq!(back.timing_offset, 0.0);
    }
}

//! Preset persistence.
//!
//! A preset file is a JSON object with up to three sections — `global`,
//! `pattern`, and `kit` — each of which can be saved and loaded on its
//! own. None of this runs on the audio path.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::composition::{DrillAutomationLane, DrillFillPolicy, DrillGatePolicy};
use crate::drill::DrillMode;
use crate::error::Result;
use crate::groove::{DillaParams, RoleTiming};
use crate::kit::DrumKit;
use crate::pattern::{Pattern, RhythmFeelMode, VoiceType};
use crate::sequencer::StepSequencer;

/// Flat object of every global sequencer parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalSection {
    pub tempo: f64,
    pub swing: f32,
    pub pattern_length: u32,
    pub rhythm_feel: RhythmFeelMode,
    pub role_timing: RoleTiming,
    pub dilla: DillaParams,
    pub drill: DrillMode,
    pub automation: DrillAutomationLane,
    pub fill: DrillFillPolicy,
    pub gate: DrillGatePolicy,
    pub bars_per_phrase: u32,
}

/// Per-voice kit parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KitVoiceEntry {
    pub voice: VoiceType,
    pub level: f32,
    pub pitch: i32,
}

/// Voice-parameter block for the synthesised kit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KitSection {
    pub voices: Vec<KitVoiceEntry>,
}

/// A saved preset. Missing sections are left untouched on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global: Option<GlobalSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<Pattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kit: Option<KitSection>,
}

impl Preset {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

impl StepSequencer<DrumKit> {
    /// Capture all three preset sections.
    pub fn save_preset(&self) -> Preset {
        Preset {
            global: Some(GlobalSection {
                tempo: self.tempo(),
                swing: self.swing(),
                pattern_length: self.pattern_length(),
                rhythm_feel: self.rhythm_feel_mode(),
                role_timing: self.role_timing(),
                dilla: self.dilla_params(),
                drill: self.drill_mode(),
                automation: self.drill_automation().clone(),
                fill: self.drill_fill_policy(),
                gate: self.drill_gate_policy(),
                bars_per_phrase: self.phrase_detector().bars_per_phrase(),
            }),
            pattern: Some(self.pattern().clone()),
            kit: Some(KitSection {
                voices: VoiceType::all()
                    .iter()
                    .map(|&voice| {
                        let p = self.voice_bank().voice_params(voice);
                        KitVoiceEntry {
                            voice,
                            level: p.level,
                            pitch: p.pitch,
                        }
                    })
                    .collect(),
            }),
        }
    }

    /// Apply whichever sections the preset carries.
    pub fn load_preset(&mut self, preset: &Preset) {
        if let Some(g) = &preset.global {
            self.set_tempo(g.tempo);
            self.set_swing(g.swing);
            self.set_pattern_length(g.pattern_length);
            self.set_rhythm_feel_mode(g.rhythm_feel);
            self.set_role_timing(g.role_timing);
            self.set_dilla_params(g.dilla);
            self.set_drill_mode(g.drill);
            self.set_drill_automation(g.automation.clone());
            self.set_drill_fill_policy(g.fill);
            self.set_drill_gate_policy(g.gate);
            self.set_phrase_detector(crate::composition::PhraseDetector::new(g.bars_per_phrase));
        }
        if let Some(p) = &preset.pattern {
            self.set_pattern(p.clone());
        }
        if let Some(k) = &preset.kit {
            for entry in &k.voices {
                let mut params = self.voice_bank().voice_params(entry.voice);
                params.level = entry.level;
                params.pitch = entry.pitch;
                self.voice_bank_mut().set_voice_params(entry.voice, params);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::PhraseDetector;
    use crate::pattern::{StepCell, Track};

    fn sculpted_sequencer() -> StepSequencer<DrumKit> {
        let mut seq = StepSequencer::new(7);
        seq.set_tempo(163.0);
        seq.set_swing(0.42);
        seq.set_pattern_length(12);
        seq.set_rhythm_feel_mode(RhythmFeelMode::Drill);
        seq.set_role_timing(RoleTiming {
            pocket_offset: 0.01,
            push_offset: -0.05,
            pull_offset: 0.07,
        });
        seq.set_dilla_params(DillaParams {
            amount: 0.6,
            hat_bias: 0.8,
            snare_late: 0.5,
            kick_tight: 0.9,
            max_drift: 0.04,
        });
        seq.set_drill_mode(DrillMode::venetian_mode());
        seq.set_drill_automation(DrillAutomationLane::from_points(&[(0, 0.1), (8, 0.9)]));
        seq.set_drill_fill_policy(DrillFillPolicy {
            enabled: true,
            fill_length_steps: 6,
            trigger_chance: 0.7,
            fill_amount: 0.9,
            decay_per_step: 0.1,
        });
        seq.set_drill_gate_policy(DrillGatePolicy {
            enabled: true,
            silence_chance: 0.25,
            burst_chance: 0.4,
            min_silent_steps: 2,
            max_silent_steps: 5,
        });
        seq.set_phrase_detector(PhraseDetector::new(8));

        let mut track = Track::new(VoiceType::TomMid).with_hits(&[0, 3, 7], 115);
        track.pitch = -5;
        track.volume = 0.8;
        track.pan = -0.3;
        track.drill_override = Some(DrillMode::ratchet_builder());
        track.steps[3].has_flam = true;
        track.steps[7] = StepCell {
            use_drill: true,
            burst_count: 9,
            burst_chaos: 0.3,
            burst_dropout: 0.2,
            ..StepCell::hit(99)
        };
        seq.set_track(5, track);

        let mut params = seq.voice_bank().voice_params(VoiceType::Cowbell);
        params.level = 0.5;
        params.pitch = 3;
        seq.voice_bank_mut().set_voice_params(VoiceType::Cowbell, params);
        seq
    }

    #[test]
    fn test_round_trip_preserves_everything() {
        let seq = sculpted_sequencer();
        let saved = seq.save_preset();
        let json = saved.to_json().unwrap();

        let mut fresh = StepSequencer::new(999);
        fresh.load_preset(&Preset::from_json(&json).unwrap());
        let resaved = fresh.save_preset();

        assert_eq!(saved, resaved, "save -> load -> save must be lossless");
    }

    #[test]
    fn test_sections_load_independently() {
        let seq = sculpted_sequencer();
        let full = seq.save_preset();

        let global_only = Preset {
            global: full.global.clone(),
            ..Preset::default()
        };
        let mut target = StepSequencer::new(1);
        target.load_preset(&global_only);
        assert_eq!(target.tempo(), 163.0);
        // Pattern untouched by a global-only preset
        assert!(!target.track(5).unwrap().steps[0].active);

        let pattern_only = Preset {
            pattern: full.pattern.clone(),
            ..Preset::default()
        };
        let mut target = StepSequencer::new(1);
        target.load_preset(&pattern_only);
        assert!(target.track(5).unwrap().steps[0].active);
        assert_eq!(target.tempo(), 120.0, "global section untouched");
    }

    #[test]
    fn test_section_names_are_stable() {
        let json = sculpted_sequencer().save_preset().to_json().unwrap();
        for key in ["\"global\"", "\"pattern\"", "\"kit\"", "\"tempo\"", "\"tracks\"", "\"voices\""] {
            assert!(json.contains(key), "serialized preset should contain {}", key);
        }
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(Preset::from_json("{ not json").is_err());
    }

    #[test]
    fn test_empty_preset_is_a_noop() {
        let mut seq = sculpted_sequencer();
        let before = seq.save_preset();
        seq.load_preset(&Preset::default());
        assert_eq!(seq.save_preset(), before);
    }
}

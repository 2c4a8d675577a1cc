//! Macro presets: a burst shape, a fill policy, and a gate policy bundled
//! under one behavioural identity and applied atomically.

use super::fill::DrillFillPolicy;
use super::gate::DrillGatePolicy;
use crate::drill::{DrillGrid, DrillMode};

/// A named bundle of burst, fill, and gate behaviour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdmMacroPreset {
    pub name: &'static str,
    pub drill: DrillMode,
    pub fill: DrillFillPolicy,
    pub gate: DrillGatePolicy,
}

impl IdmMacroPreset {
    /// Quiet ghost bursts that only surface in bar-end fills.
    pub fn ghost_fill() -> Self {
        Self {
            name: "GhostFill",
            drill: DrillMode {
                amount: 0.35,
                ..DrillMode::ghost_machinery()
            },
            fill: DrillFillPolicy {
                enabled: true,
                fill_length_steps: 4,
                trigger_chance: 0.6,
                fill_amount: 0.9,
                decay_per_step: 0.1,
            },
            gate: DrillGatePolicy {
                enabled: false,
                silence_chance: 0.0,
                burst_chance: 0.2,
                min_silent_steps: 1,
                max_silent_steps: 2,
            },
        }
    }

    /// Snares dissolve into quintuplet after-images.
    pub fn snare_hallucination() -> Self {
        Self {
            name: "SnareHallucination",
            drill: DrillMode::windowlicker_snare(),
            fill: DrillFillPolicy {
                enabled: true,
                fill_length_steps: 6,
                trigger_chance: 0.45,
                fill_amount: 1.0,
                decay_per_step: 0.08,
            },
            gate: DrillGatePolicy {
                enabled: true,
                silence_chance: 0.12,
                burst_chance: 0.5,
                min_silent_steps: 1,
                max_silent_steps: 2,
            },
        }
    }

    /// The transport keeps dropping out and lurching back in.
    pub fn broken_transport() -> Self {
        Self {
            name: "BrokenTransport",
            drill: DrillMode {
                enabled: true,
                amount: 0.85,
                min_burst: 6,
                max_burst: 16,
                spread: 1.0,
                chaos: 0.4,
                dropout: 0.2,
                vel_decay: 0.08,
                accent_flip: 0.3,
                mutation_rate: 0.35,
                temporal_aggression: 1.3,
                grid: DrillGrid::Straight,
                transition_beats: 0.5,
            },
            fill: DrillFillPolicy {
                enabled: true,
                fill_length_steps: 4,
                trigger_chance: 0.5,
                fill_amount: 1.0,
                decay_per_step: 0.12,
            },
            gate: DrillGatePolicy {
                enabled: true,
                silence_chance: 0.3,
                burst_chance: 0.35,
                min_silent_steps: 1,
                max_silent_steps: 3,
            },
        }
    }

    /// Long eroded silences torn by prime-grid eruptions.
    pub fn venetian_collapse() -> Self {
        Self {
            name: "VenetianCollapse",
            drill: DrillMode::venetian_mode(),
            fill: DrillFillPolicy {
                enabled: true,
                fill_length_steps: 8,
                trigger_chance: 0.35,
                fill_amount: 0.95,
                decay_per_step: 0.05,
            },
            gate: DrillGatePolicy {
                enabled: true,
                silence_chance: 0.4,
                burst_chance: 0.25,
                min_silent_steps: 2,
                max_silent_steps: 6,
            },
        }
    }

    /// Grid feel inverted: silence is the default, hits the exception.
    pub fn anti_groove() -> Self {
        Self {
            name: "AntiGroove",
            drill: DrillMode {
                amount: 0.7,
                ..DrillMode::clock_desync()
            },
            fill: DrillFillPolicy {
                enabled: false,
                fill_length_steps: 4,
                trigger_chance: 0.0,
                fill_amount: 0.5,
                decay_per_step: 0.2,
            },
            gate: DrillGatePolicy {
                enabled: true,
                silence_chance: 0.6,
                burst_chance: 0.45,
                min_silent_steps: 1,
                max_silent_steps: 4,
            },
        }
    }

    /// All built-in macro presets.
    pub fn all() -> [IdmMacroPreset; 5] {
        [
            Self::ghost_fill(),
            Self::snare_hallucination(),
            Self::broken_transport(),
            Self::venetian_collapse(),
            Self::anti_groove(),
        ]
    }

    /// Look up a macro preset by name.
    pub fn by_name(name: &str) -> Option<IdmMacroPreset> {
        Self::all().into_iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_presets_named_and_enabled() {
        for preset in IdmMacroPreset::all() {
            assert!(!preset.name.is_empty());
            assert!(
                preset.drill.enabled,
                "{} should arrive with bursts armed",
                preset.name
            );
            assert!(preset.drill.min_burst <= preset.drill.max_burst);
        }
    }

    #[test]
    fn test_by_name_round_trip() {
        for preset in IdmMacroPreset::all() {
            let found = IdmMacroPreset::by_name(preset.name).expect("preset should be found");
            assert_eq!(found, preset);
        }
        assert!(IdmMacroPreset::by_name("Nope").is_none());
    }

    #[test]
    fn test_anti_groove_prefers_silence() {
        let p = IdmMacroPreset::anti_groove();
        assert!(p.gate.enabled);
        assert!(p.gate.silence_chance > 0.5);
        assert!(!p.fill.enabled);
    }
}

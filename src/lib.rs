//! # ratchet
//!
//! A groove-timing and micro-burst drum machine sequencing core.
//!
//! Sixteen percussion tracks on a 16th-note grid, with per-track timing
//! roles, a bounded humanising drift walk, and a burst engine that can
//! replace any hit with up to 24 sample-accurate micro-hits on triplet,
//! quintuplet, septuplet, or random-prime grids. A bar-indexed automation
//! lane, bar-end fills, stochastic gating, and phrase awareness sit on
//! top. Everything is deterministic for a given seed.
//!
//! ## Quick Start
//!
//! ```no_run
//! use ratchet::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let engine = AudioEngine::new()?;
//!     let mut seq = StepSequencer::new(0xACE5);
//!     seq.set_tempo(164.0);
//!
//!     // Kick on the floor, snare everywhere, bursts armed
//!     seq.set_track(0, Track::new(VoiceType::Kick).with_hits(&[0, 4, 8, 12], 127));
//!     seq.set_track(1, Track::new(VoiceType::Snare).with_hits(&[2, 6, 10, 14], 115));
//!     seq.set_drill_mode(DrillMode::aphex_snare_hell());
//!
//!     engine.play(seq, 8)?;
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod commands;
pub mod composition;
pub mod drill;
pub mod engine;
pub mod error;
pub mod export;
pub mod groove;
pub mod kit;
pub mod pattern;
pub mod preset;
pub mod rng;
pub mod sequencer;
pub mod voices;

/// Prelude module for convenient imports
pub mod prelude {
    // Core sequencing
    pub use crate::clock::Tempo;
    pub use crate::sequencer::StepSequencer;

    // Pattern data
    pub use crate::pattern::{
        DrillIntent, Pattern, RhythmFeelMode, StepCell, TimingRole, Track, VoiceType,
    };

    // Groove timing
    pub use crate::groove::{DillaParams, RoleTiming};

    // Burst engine
    pub use crate::drill::{DrillGrid, DrillMode};

    // Composition layer
    pub use crate::composition::{
        DrillAutomationLane, DrillFillPolicy, DrillGatePolicy, IdmMacroPreset, PhraseDetector,
    };

    // Voices
    pub use crate::kit::{DrumKit, KitVoiceParams, VoiceBank};

    // Playback and persistence
    pub use crate::commands::{CommandSender, SeqCommand};
    pub use crate::engine::AudioEngine;
    pub use crate::error::{RatchetError, Result};
    pub use crate::preset::Preset;
}

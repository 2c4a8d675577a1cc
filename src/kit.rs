//! The voice bank: the only surface the sequencer talks to when a hit is
//! dispatched, and the synthesised kit that implements it.

use serde::{Deserialize, Serialize};

use crate::pattern::{VoiceType, NUM_VOICES};
use crate::voices;

/// Contract between the sequencer and whatever produces sound.
///
/// `trigger` and `render` run on the audio path: implementations must not
/// allocate, and `render` must be deterministic given the same trigger
/// history. `render` writes additively so multiple callers can share an
/// output buffer.
pub trait VoiceBank {
    /// Called from `prepare`; sizes any rate-dependent state.
    fn prepare(&mut self, sample_rate: f32);

    /// Schedule one excitation `sample_offset` samples into the current
    /// block, at velocity `velocity` in [0, 1].
    fn trigger(&mut self, voice: VoiceType, velocity: f32, sample_offset: u32);

    /// Additively render `num_samples` of one voice into `out`.
    fn render(&mut self, voice: VoiceType, out: &mut [f32], num_samples: u32);

    /// Silence everything.
    fn reset(&mut self);

    /// Whether any envelope is still producing output.
    fn any_active(&self) -> bool;

    /// Number of excitations currently sounding.
    fn active_count(&self) -> u32;

    /// Retune a pitched voice by a semitone offset. Banks without
    /// tunable voices can ignore this.
    fn set_pitch(&mut self, _voice: VoiceType, _semitones: i32) {}
}

/// Excitation slots per voice. When a burst outruns the pool the oldest
/// slot is re-used, which is inaudible under the new transient.
pub const EXCITATIONS_PER_VOICE: usize = 32;

/// Host-tweakable parameters of one kit voice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KitVoiceParams {
    /// Output level, 0.0-1.0.
    pub level: f32,
    /// Semitone offset for the pitched voices.
    pub pitch: i32,
}

impl Default for KitVoiceParams {
    fn default() -> Self {
        Self { level: 1.0, pitch: 0 }
    }
}

/// One scheduled hit of a voice.
#[derive(Debug, Clone, Copy, Default)]
struct Excitation {
    live: bool,
    velocity: f32,
    /// Samples until the hit starts, counted inside the current block.
    delay: u32,
    /// Samples already rendered.
    age: u32,
}

/// Synthesised drum kit backing all sixteen tracks.
pub struct DrumKit {
    sample_rate: f32,
    params: [KitVoiceParams; NUM_VOICES],
    /// Precomputed 2^(pitch/12) per voice.
    ratios: [f32; NUM_VOICES],
    pools: [[Excitation; EXCITATIONS_PER_VOICE]; NUM_VOICES],
}

impl Default for DrumKit {
    fn default() -> Self {
        Self {
            sample_rate: 44_100.0,
            params: [KitVoiceParams::default(); NUM_VOICES],
            ratios: [1.0; NUM_VOICES],
            pools: [[Excitation::default(); EXCITATIONS_PER_VOICE]; NUM_VOICES],
        }
    }
}

impl DrumKit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn voice_params(&self, voice: VoiceType) -> KitVoiceParams {
        self.params[voice.index()]
    }

    pub fn set_voice_params(&mut self, voice: VoiceType, params: KitVoiceParams) {
        let i = voice.index();
        self.params[i] = KitVoiceParams {
            level: params.level.clamp(0.0, 1.0),
            pitch: params.pitch.clamp(-24, 24),
        };
        self.ratios[i] = if voice.is_pitched() {
            (self.params[i].pitch as f32 / 12.0).exp2()
        } else {
            1.0
        };
    }

    /// Convenience setter used when a track's semitone offset changes.
    pub fn set_voice_pitch(&mut self, voice: VoiceType, semitones: i32) {
        let mut p = self.voice_params(voice);
        p.pitch = semitones;
        self.set_voice_params(voice, p);
    }
}

impl VoiceBank for DrumKit {
    fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(1.0);
        self.reset();
    }

    fn trigger(&mut self, voice: VoiceType, velocity: f32, sample_offset: u32) {
        let pool = &mut self.pools[voice.index()];
        // First free slot, else steal the oldest
        let slot = match pool.iter().position(|e| !e.live) {
            Some(i) => i,
            None => {
                let mut oldest = 0;
                for (i, e) in pool.iter().enumerate() {
                    if e.age > pool[oldest].age {
                        oldest = i;
                    }
                }
                oldest
            }
        };
        pool[slot] = Excitation {
            live: true,
            velocity: velocity.clamp(0.0, 1.0),
            delay: sample_offset,
            age: 0,
        };
    }

    fn render(&mut self, voice: VoiceType, out: &mut [f32], num_samples: u32) {
        let vi = voice.index();
        let level = self.params[vi].level;
        let ratio = self.ratios[vi];
        let sr = self.sample_rate;
        let n = (num_samples as usize).min(out.len());
        let duration_samples = (voices::duration(voice) * sr) as u32;

        for ex in &mut self.pools[vi] {
            if !ex.live {
                continue;
            }
            if ex.age == 0 && ex.delay >= n as u32 {
                ex.delay -= n as u32;
                continue;
            }
            let start = if ex.age == 0 { ex.delay as usize } else { 0 };
            let gain = level * ex.velocity;
            for (i, slot) in out.iter_mut().enumerate().take(n).skip(start) {
                let idx = ex.age as usize + (i - start);
                *slot += voices::sample(voice, idx, sr, ratio) * gain;
            }
            ex.age += (n - start) as u32;
            ex.delay = 0;
            if ex.age >= duration_samples {
                ex.live = false;
            }
        }
    }

    fn reset(&mut self) {
        for pool in &mut self.pools {
            for ex in pool.iter_mut() {
                ex.live = false;
            }
        }
    }

    fn any_active(&self) -> bool {
        self.pools.iter().flatten().any(|e| e.live)
    }

    fn active_count(&self) -> u32 {
        self.pools.iter().flatten().filter(|e| e.live).count() as u32
    }

    fn set_pitch(&mut self, voice: VoiceType, semitones: i32) {
        self.set_voice_pitch(voice, semitones);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prepared_kit() -> DrumKit {
        let mut kit = DrumKit::new();
        kit.prepare(44_100.0);
        kit
    }

    #[test]
    fn test_trigger_then_render_produces_audio() {
        let mut kit = prepared_kit();
        kit.trigger(VoiceType::Kick, 1.0, 0);
        let mut buf = vec![0.0f32; 512];
        kit.render(VoiceType::Kick, &mut buf, 512);
        assert!(buf.iter().any(|&s| s != 0.0), "kick should produce output");
        assert!(kit.any_active());
    }

    #[test]
    fn test_sample_offset_delays_start() {
        let mut kit = prepared_kit();
        kit.trigger(VoiceType::Snare, 1.0, 100);
        let mut buf = vec![0.0f32; 256];
        kit.render(VoiceType::Snare, &mut buf, 256);
        assert!(buf[..100].iter().all(|&s| s == 0.0), "nothing before the offset");
        assert!(buf[100..].iter().any(|&s| s != 0.0), "sound from the offset on");
    }

    #[test]
    fn test_offset_beyond_block_carries_over() {
        let mut kit = prepared_kit();
        kit.trigger(VoiceType::Clap, 1.0, 700);
        let mut buf = vec![0.0f32; 512];
        kit.render(VoiceType::Clap, &mut buf, 512);
        assert!(buf.iter().all(|&s| s == 0.0), "hit starts in the next block");
        let mut buf2 = vec![0.0f32; 512];
        kit.render(VoiceType::Clap, &mut buf2, 512);
        assert!(buf2[..188].iter().all(|&s| s == 0.0));
        assert!(buf2[188..].iter().any(|&s| s != 0.0));
    }

    #[test]
    fn test_render_is_additive() {
        let mut kit = prepared_kit();
        kit.trigger(VoiceType::Kick, 1.0, 0);
        let mut buf = vec![0.25f32; 64];
        let before = buf[0];
        kit.render(VoiceType::Kick, &mut buf, 64);
        assert_ne!(buf[0], before);
        // Pre-existing content is preserved underneath
        let mut clean = vec![0.0f32; 64];
        let mut kit2 = prepared_kit();
        kit2.trigger(VoiceType::Kick, 1.0, 0);
        kit2.render(VoiceType::Kick, &mut clean, 64);
        assert!((buf[0] - (clean[0] + 0.25)).abs() < 1e-6);
    }

    #[test]
    fn test_velocity_scales_output() {
        let mut loud = prepared_kit();
        loud.trigger(VoiceType::Snare, 1.0, 0);
        let mut loud_buf = vec![0.0f32; 64];
        loud.render(VoiceType::Snare, &mut loud_buf, 64);

        let mut soft = prepared_kit();
        soft.trigger(VoiceType::Snare, 0.5, 0);
        let mut soft_buf = vec![0.0f32; 64];
        soft.render(VoiceType::Snare, &mut soft_buf, 64);

        for (l, s) in loud_buf.iter().zip(&soft_buf) {
            assert!((s - l * 0.5).abs() < 1e-6, "velocity should scale linearly");
        }
    }

    #[test]
    fn test_excitation_expires() {
        let mut kit = prepared_kit();
        kit.trigger(VoiceType::HiHatClosed, 1.0, 0);
        // Closed hat lasts 0.05s = 2205 samples at 44.1k
        let mut buf = vec![0.0f32; 4096];
        kit.render(VoiceType::HiHatClosed, &mut buf, 4096);
        assert!(!kit.any_active(), "hat envelope should have expired");
        assert_eq!(kit.active_count(), 0);
    }

    #[test]
    fn test_reset_silences() {
        let mut kit = prepared_kit();
        kit.trigger(VoiceType::Crash, 1.0, 0);
        assert!(kit.any_active());
        kit.reset();
        assert!(!kit.any_active());
        let mut buf = vec![0.0f32; 128];
        kit.render(VoiceType::Crash, &mut buf, 128);
        assert!(buf.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_pool_overflow_steals_oldest() {
        let mut kit = prepared_kit();
        for _ in 0..(EXCITATIONS_PER_VOICE + 8) {
            kit.trigger(VoiceType::Ride, 1.0, 0);
        }
        assert_eq!(kit.active_count(), EXCITATIONS_PER_VOICE as u32);
    }

    #[test]
    fn test_pitch_param_retunes() {
        let mut kit = prepared_kit();
        kit.set_voice_pitch(VoiceType::TomMid, 7);
        assert_eq!(kit.voice_params(VoiceType::TomMid).pitch, 7);
        kit.trigger(VoiceType::TomMid, 1.0, 0);
        let mut up = vec![0.0f32; 256];
        kit.render(VoiceType::TomMid, &mut up, 256);

        let mut flat = prepared_kit();
        flat.trigger(VoiceType::TomMid, 1.0, 0);
        let mut plain = vec![0.0f32; 256];
        flat.render(VoiceType::TomMid, &mut plain, 256);

        assert_ne!(up, plain, "semitone offset should change the waveform");
    }

    #[test]
    fn test_unpitched_voice_ignores_pitch() {
        let mut kit = prepared_kit();
        kit.set_voice_pitch(VoiceType::Snare, 12);
        kit.trigger(VoiceType::Snare, 1.0, 0);
        let mut a = vec![0.0f32; 128];
        kit.render(VoiceType::Snare, &mut a, 128);

        let mut plain = prepared_kit();
        plain.trigger(VoiceType::Snare, 1.0, 0);
        let mut b = vec![0.0f32; 128];
        plain.render(VoiceType::Snare, &mut b, 128);
        assert_eq!(a, b);
    }
}

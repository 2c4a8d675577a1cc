//! Stateless percussion synthesis.
//!
//! Every voice is a pure function of `(sample_index, sample_rate)` (plus a
//! pitch ratio for the tunable voices), so rendering is deterministic for
//! a given trigger history and needs no per-voice oscillator state.

use crate::pattern::VoiceType;

/// Fast deterministic noise for percussion bodies.
/// Hash-style generator in the range [-1.0, 1.0].
fn noise(seed: f32) -> f32 {
    let hash = ((seed * 78.233).sin() * 43758.5453).abs().fract();
    hash * 2.0 - 1.0
}

#[inline]
fn tau() -> f32 {
    2.0 * std::f32::consts::PI
}

/// Kick: sine burst sweeping 160Hz down to 45Hz with a click transient.
pub fn kick_sample(sample_index: usize, sample_rate: f32) -> f32 {
    let t = sample_index as f32 / sample_rate;
    let duration = 0.16;
    if t > duration {
        return 0.0;
    }
    let freq = 160.0 + (45.0 - 160.0) * (t / duration);
    let body = (tau() * freq * t).sin() * (-t * 18.0).exp();
    // Short click on the attack
    let click = if t < 0.004 { noise(sample_index as f32) * 0.4 } else { 0.0 };
    (body * 0.85 + click) * 0.9
}

/// Snare: noise over two detuned body tones.
pub fn snare_sample(sample_index: usize, sample_rate: f32) -> f32 {
    let t = sample_index as f32 / sample_rate;
    let duration = 0.12;
    if t > duration {
        return 0.0;
    }
    let noise_val = noise(sample_index as f32);
    let tone = (tau() * 190.0 * t).sin() * 0.6 + (tau() * 330.0 * t).sin() * 0.4;
    let envelope = (-t * 22.0).exp();
    (noise_val * 0.65 + tone * 0.35) * envelope * 0.55
}

/// Hi-hat: six inharmonic partials under filtered noise.
pub fn hihat_sample(sample_index: usize, sample_rate: f32, closed: bool) -> f32 {
    let t = sample_index as f32 / sample_rate;
    let duration = if closed { 0.05 } else { 0.18 };
    if t > duration {
        return 0.0;
    }
    let ratios = [1.0, 1.34, 1.57, 1.87, 2.25, 2.63];
    let mut metal = 0.0;
    for &r in &ratios {
        metal += (tau() * 3600.0 * r * t).sin();
    }
    metal /= ratios.len() as f32;
    let noise_val = noise(sample_index as f32);
    let decay_rate = if closed { 42.0 } else { 13.0 };
    let envelope = (-t * decay_rate).exp();
    (noise_val * 0.55 + metal * 0.45) * envelope * 0.3
}

/// Clap: three staggered noise bursts through a midrange emphasis.
pub fn clap_sample(sample_index: usize, sample_rate: f32) -> f32 {
    let t = sample_index as f32 / sample_rate;
    let duration = 0.09;
    if t > duration {
        return 0.0;
    }
    let noise_val = noise(sample_index as f32);
    let burst = if t < 0.009 {
        1.0
    } else if t < 0.018 {
        0.75
    } else if t < 0.027 {
        0.55
    } else {
        0.3
    };
    let midrange = (tau() * 1800.0 * t).sin();
    let envelope = (-t * 24.0).exp();
    (noise_val * 0.8 + midrange * 0.2) * burst * envelope * 0.5
}

/// Tunable tom: pitch sweep to 0.55x with two harmonics.
pub fn tom_sample(sample_index: usize, sample_rate: f32, base_freq: f32, ratio: f32) -> f32 {
    let t = sample_index as f32 / sample_rate;
    let duration = 0.32;
    if t > duration {
        return 0.0;
    }
    let start = base_freq * ratio;
    let freq = start + (start * 0.55 - start) * (t / duration);
    let envelope = (-t * 8.5).exp();
    let fundamental = (tau() * freq * t).sin();
    let harmonic2 = (tau() * freq * 2.0 * t).sin() * 0.3;
    let harmonic3 = (tau() * freq * 3.2 * t).sin() * 0.08;
    (fundamental + harmonic2 + harmonic3) * envelope * 0.6
}

/// Crash: broadband noise with bright partials, long decay.
pub fn crash_sample(sample_index: usize, sample_rate: f32) -> f32 {
    let t = sample_index as f32 / sample_rate;
    let duration = 1.6;
    if t > duration {
        return 0.0;
    }
    let noise_val = noise(sample_index as f32);
    let bright = (tau() * 6800.0 * t).sin() * 0.5 + (tau() * 9200.0 * t).sin() * 0.5;
    let envelope = (-t * 2.2).exp();
    (noise_val * 0.7 + bright * 0.3) * envelope * 0.35
}

/// Ride: sustained metallic bed.
pub fn ride_sample(sample_index: usize, sample_rate: f32) -> f32 {
    let t = sample_index as f32 / sample_rate;
    let duration = 0.9;
    if t > duration {
        return 0.0;
    }
    let noise_val = noise(sample_index as f32);
    let ping = (tau() * 5200.0 * t).sin() * 0.55 + (tau() * 7600.0 * t).sin() * 0.45;
    let envelope = (-t * 3.2).exp();
    (noise_val * 0.5 + ping * 0.5) * envelope * 0.25
}

/// Cowbell: the classic pair of inharmonic square-ish partials.
pub fn cowbell_sample(sample_index: usize, sample_rate: f32, ratio: f32) -> f32 {
    let t = sample_index as f32 / sample_rate;
    let duration = 0.25;
    if t > duration {
        return 0.0;
    }
    let f1 = 560.0 * ratio;
    let f2 = 845.0 * ratio;
    let tone1 = (tau() * f1 * t).sin();
    let tone2 = (tau() * f2 * t).sin();
    let envelope = (-t * 11.0).exp();
    (tone1 * 0.55 + tone2 * 0.45) * envelope * 0.45
}

/// Shaker: short high noise with a grain wobble.
pub fn shaker_sample(sample_index: usize, sample_rate: f32) -> f32 {
    let t = sample_index as f32 / sample_rate;
    let duration = 0.12;
    if t > duration {
        return 0.0;
    }
    let noise_val = noise(sample_index as f32);
    let grain = 1.0 + 0.25 * (t * 140.0).sin();
    let envelope = (-t * 17.0).exp() * grain;
    noise_val * envelope * 0.28
}

/// Tambourine: jingle partials over staggered decays.
pub fn tambourine_sample(sample_index: usize, sample_rate: f32) -> f32 {
    let t = sample_index as f32 / sample_rate;
    let duration = 0.18;
    if t > duration {
        return 0.0;
    }
    let noise_val = noise(sample_index as f32);
    let jingle = (tau() * 4300.0 * t).sin() * 0.4
        + (tau() * 5900.0 * t).sin() * 0.3
        + (tau() * 7400.0 * t).sin() * 0.3;
    let first = (-t * 21.0).exp();
    let second = if t > 0.04 { (-t * 17.0).exp() * 0.5 } else { 0.0 };
    (noise_val * 0.45 + jingle * 0.55) * (first + second) * 0.3
}

/// Generic percussion: tunable woodblock knock.
pub fn percussion_sample(sample_index: usize, sample_rate: f32, ratio: f32) -> f32 {
    let t = sample_index as f32 / sample_rate;
    let duration = 0.1;
    if t > duration {
        return 0.0;
    }
    let freq = 820.0 * ratio;
    let tone = (tau() * freq * t).sin() + (tau() * freq * 2.4 * t).sin() * 0.25;
    let envelope = (-t * 38.0).exp();
    tone * envelope * 0.5
}

/// Special: descending FM zap.
pub fn special_sample(sample_index: usize, sample_rate: f32) -> f32 {
    let t = sample_index as f32 / sample_rate;
    let duration = 0.2;
    if t > duration {
        return 0.0;
    }
    let carrier = 900.0 - 700.0 * (t / duration);
    let modulator = (tau() * carrier * 2.5 * t).sin();
    let envelope = (-t * 14.0).exp();
    (tau() * carrier * t + 3.0 * modulator * envelope).sin() * envelope * 0.5
}

/// Render one sample of a voice. `pitch_ratio` retunes the pitched voices
/// and is ignored by the rest.
pub fn sample(voice: VoiceType, sample_index: usize, sample_rate: f32, pitch_ratio: f32) -> f32 {
    match voice {
        VoiceType::Kick => kick_sample(sample_index, sample_rate),
        VoiceType::Snare => snare_sample(sample_index, sample_rate),
        VoiceType::HiHatClosed => hihat_sample(sample_index, sample_rate, true),
        VoiceType::HiHatOpen => hihat_sample(sample_index, sample_rate, false),
        VoiceType::Clap => clap_sample(sample_index, sample_rate),
        VoiceType::TomLow => tom_sample(sample_index, sample_rate, 90.0, pitch_ratio),
        VoiceType::TomMid => tom_sample(sample_index, sample_rate, 140.0, pitch_ratio),
        VoiceType::TomHigh => tom_sample(sample_index, sample_rate, 200.0, pitch_ratio),
        VoiceType::Crash => crash_sample(sample_index, sample_rate),
        VoiceType::Ride => ride_sample(sample_index, sample_rate),
        VoiceType::Cowbell => cowbell_sample(sample_index, sample_rate, pitch_ratio),
        VoiceType::Shaker => shaker_sample(sample_index, sample_rate),
        VoiceType::Tambourine => tambourine_sample(sample_index, sample_rate),
        VoiceType::Percussion => percussion_sample(sample_index, sample_rate, pitch_ratio),
        VoiceType::Special => special_sample(sample_index, sample_rate),
    }
}

/// Envelope length of a voice in seconds.
pub fn duration(voice: VoiceType) -> f32 {
    match voice {
        VoiceType::Kick => 0.16,
        VoiceType::Snare => 0.12,
        VoiceType::HiHatClosed => 0.05,
        VoiceType::HiHatOpen => 0.18,
        VoiceType::Clap => 0.09,
        VoiceType::TomLow => 0.32,
        VoiceType::TomMid => 0.32,
        VoiceType::TomHigh => 0.32,
        VoiceType::Crash => 1.6,
        VoiceType::Ride => 0.9,
        VoiceType::Cowbell => 0.25,
        VoiceType::Shaker => 0.12,
        VoiceType::Tambourine => 0.18,
        VoiceType::Percussion => 0.1,
        VoiceType::Special => 0.2,
    }
}

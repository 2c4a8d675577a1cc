//! Real-time playback of a sequencer through the default audio device.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::clock::STEPS_PER_BAR;
use crate::error::{RatchetError, Result};
use crate::kit::VoiceBank;
use crate::pattern::NUM_TRACKS;
use crate::sequencer::StepSequencer;

/// Block size handed to the sequencer and the output stream.
const ENGINE_BLOCK: usize = 2048;

/// Equal-power stereo pan gains for a pan position in [-1, 1].
pub(crate) fn pan_gains(pan: f32) -> (f32, f32) {
    let theta = (pan.clamp(-1.0, 1.0) + 1.0) * std::f32::consts::FRAC_PI_4;
    (theta.cos(), theta.sin())
}

/// Central audio engine that manages playback
pub struct AudioEngine {
    device: cpal::Device,
    config: cpal::SupportedStreamConfig,
    buffer_size: u32,
}

impl AudioEngine {
    /// Create a new audio engine with default output device
    pub fn new() -> Result<Self> {
        Self::with_buffer_size(ENGINE_BLOCK as u32)
    }

    /// Create a new audio engine with custom buffer size
    ///
    /// # Arguments
    /// * `buffer_size` - Buffer size in samples
    ///   - Smaller (512-1024): Lower latency
    ///   - Medium (2048-4096): Balanced
    ///   - Large (8192+): Very stable for dense burst settings
    pub fn with_buffer_size(buffer_size: u32) -> Result<Self> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or_else(|| {
            RatchetError::AudioEngineError("No output device available".to_string())
        })?;
        let config = device.default_output_config().map_err(|e| {
            RatchetError::AudioEngineError(format!("Failed to get default config: {}", e))
        })?;

        let latency_ms = (buffer_size as f32 / config.sample_rate().0 as f32) * 1000.0;

        println!("Audio Engine initialized:");
        println!(
            "  Device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );
        println!("  Sample rate: {}", config.sample_rate().0);
        println!(
            "  Buffer size: {} samples ({:.1}ms latency)",
            buffer_size, latency_ms
        );

        Ok(Self {
            device,
            config,
            buffer_size,
        })
    }

    /// Sample rate of the output device.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate().0
    }

    /// Play a sequencer for the given number of bars, blocking until done.
    ///
    /// The sequencer is prepared for the device rate, driven block by
    /// block inside the stream callback, and mixed to stereo with each
    /// track's volume and pan applied.
    pub fn play<B>(&self, seq: StepSequencer<B>, bars: u32) -> Result<()>
    where
        B: VoiceBank + Send + 'static,
    {
        match self.config.sample_format() {
            cpal::SampleFormat::F32 => self.run::<f32, B>(seq, bars),
            cpal::SampleFormat::I16 => self.run::<i16, B>(seq, bars),
            cpal::SampleFormat::U16 => self.run::<u16, B>(seq, bars),
            _ => Err(RatchetError::InvalidAudioFormat(
                "Unsupported sample format".to_string(),
            )),
        }
    }

    fn run<T, B>(&self, mut seq: StepSequencer<B>, bars: u32) -> Result<()>
    where
        T: cpal::SizedSample + cpal::FromSample<f32>,
        B: VoiceBank + Send + 'static,
    {
        let sample_rate = self.config.sample_rate().0 as f64;
        let channels = self.config.channels() as usize;

        let mut config: cpal::StreamConfig = self.config.clone().into();
        config.buffer_size = cpal::BufferSize::Fixed(self.buffer_size);

        seq.prepare(sample_rate, ENGINE_BLOCK as u32);
        let step_secs = 15.0 / seq.tempo();
        let play_secs = bars.max(1) as f64 * step_secs * STEPS_PER_BAR as f64 + 1.0;

        // Scratch owned by the callback; no allocation once streaming
        let mut track_buf = vec![0.0f32; ENGINE_BLOCK];
        let mut mix_l = vec![0.0f32; ENGINE_BLOCK];
        let mut mix_r = vec![0.0f32; ENGINE_BLOCK];
        let mut pans = [(1.0f32, 1.0f32); NUM_TRACKS];

        let stream = self
            .device
            .build_output_stream(
                &config,
                move |data: &mut [T], _| {
                    let frames = (data.len() / channels).min(ENGINE_BLOCK);
                    seq.advance(frames as u32);

                    mix_l[..frames].fill(0.0);
                    mix_r[..frames].fill(0.0);
                    for t in 0..NUM_TRACKS {
                        if let Some(track) = seq.track(t) {
                            pans[t] = pan_gains(track.pan);
                        }
                        track_buf[..frames].fill(0.0);
                        seq.render_track(t, &mut track_buf[..frames], frames as u32);
                        let (gl, gr) = pans[t];
                        for i in 0..frames {
                            mix_l[i] += track_buf[i] * gl;
                            mix_r[i] += track_buf[i] * gr;
                        }
                    }

                    for (i, frame) in data.chunks_mut(channels).enumerate().take(frames) {
                        for (c, slot) in frame.iter_mut().enumerate() {
                            let v = if c % 2 == 0 { mix_l[i] } else { mix_r[i] };
                            *slot = T::from_sample(v.clamp(-1.0, 1.0));
                        }
                    }
                },
                |err| eprintln!("Stream error: {}", err),
                None,
            )
            .map_err(|e| RatchetError::AudioEngineError(format!("Failed to build stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| RatchetError::AudioEngineError(format!("Failed to start stream: {}", e)))?;

        std::thread::sleep(std::time::Duration::from_secs_f64(play_secs));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pan_gains_equal_power() {
        let (l, r) = pan_gains(0.0);
        assert!((l - r).abs() < 1e-6, "centre pan should be symmetric");
        assert!((l * l + r * r - 1.0).abs() < 1e-5, "centre pan keeps unit power");

        let (l, r) = pan_gains(-1.0);
        assert!(l > 0.99 && r < 0.01, "hard left sends everything left");

        let (l, r) = pan_gains(1.0);
        assert!(l < 0.01 && r > 0.99, "hard right sends everything right");
    }

    #[test]
    fn test_pan_clamped() {
        assert_eq!(pan_gains(-5.0), pan_gains(-1.0));
        assert_eq!(pan_gains(5.0), pan_gains(1.0));
    }
}

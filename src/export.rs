//! Offline rendering to WAV.
//!
//! Runs the sequencer block by block at a chosen sample rate and writes a
//! 16-bit stereo file. Standalone: no audio device needed, which also
//! makes it the easiest way to audition presets in CI.

use crate::clock::STEPS_PER_BAR;
use crate::engine::pan_gains;
use crate::kit::VoiceBank;
use crate::pattern::NUM_TRACKS;
use crate::sequencer::StepSequencer;

const EXPORT_BLOCK: usize = 512;

impl<B: VoiceBank> StepSequencer<B> {
    /// Render `bars` bars plus a one-second tail to a stereo WAV file.
    ///
    /// Re-prepares the sequencer for `sample_rate`, so any prior clock
    /// position is discarded.
    ///
    /// # Example
    /// ```no_run
    /// # use ratchet::prelude::*;
    /// # fn main() -> anyhow::Result<()> {
    /// let mut seq = StepSequencer::new(0xBEEF);
    /// if let Some(t) = seq.track_mut(0) {
    ///     t.steps[0].active = true;
    /// }
    /// seq.export_wav("four_bars.wav", 44_100, 4)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn export_wav(&mut self, path: &str, sample_rate: u32, bars: u32) -> anyhow::Result<()> {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;

        self.prepare(sample_rate as f64, EXPORT_BLOCK as u32);
        let samples_per_step = sample_rate as f64 * 60.0 / (self.tempo() * 4.0);
        let body = (bars.max(1) as f64 * STEPS_PER_BAR as f64 * samples_per_step).ceil() as usize;
        let total = body + sample_rate as usize; // one second of tail

        println!("Rendering to WAV...");
        println!("  Bars: {}", bars.max(1));
        println!("  Sample rate: {} Hz", sample_rate);
        println!("  Total samples: {}", total);

        let mut track_buf = [0.0f32; EXPORT_BLOCK];
        let mut mix_l = [0.0f32; EXPORT_BLOCK];
        let mut mix_r = [0.0f32; EXPORT_BLOCK];

        let mut written = 0usize;
        while written < total {
            let frames = EXPORT_BLOCK.min(total - written);
            self.advance(frames as u32);

            mix_l[..frames].fill(0.0);
            mix_r[..frames].fill(0.0);
            for t in 0..NUM_TRACKS {
                track_buf[..frames].fill(0.0);
                self.render_track(t, &mut track_buf[..frames], frames as u32);
                let pan = self.track(t).map(|tr| tr.pan).unwrap_or(0.0);
                let (gl, gr) = pan_gains(pan);
                for i in 0..frames {
                    mix_l[i] += track_buf[i] * gl;
                    mix_r[i] += track_buf[i] * gr;
                }
            }

            for i in 0..frames {
                let left = (mix_l[i].clamp(-1.0, 1.0) * 32767.0) as i16;
                let right = (mix_r[i].clamp(-1.0, 1.0) * 32767.0) as i16;
                writer.write_sample(left)?;
                writer.write_sample(right)?;
            }
            written += frames;
        }

        writer.finalize()?;
        println!("Exported to: {}", path);
        Ok(())
    }
}

//! The step sequencer core: a 16-track, 16-step grid driven by a
//! sample-accurate block clock, deciding per tick whether, when, and how
//! hard each track sounds.
//!
//! The audio path (`advance` / `render_track`) never allocates, never
//! logs, and never fails: bad indices are ignored and bad parameters are
//! clamped on the way in.

use ringbuf::traits::Consumer;

use crate::clock::{Tempo, MAX_PATTERN_STEPS, STEPS_PER_BAR};
use crate::commands::{command_queue, CommandSender, SeqCommand};
use crate::composition::{
    DrillAutomationLane, DrillFillPolicy, DrillFillState, DrillGatePolicy, DrillGateState,
    IdmMacroPreset, PhraseDetector, StepDecision,
};
use crate::drill::{schedule_micro_burst, DrillMode, HitBudget};
use crate::groove::{role_offset, swing_offset, DillaParams, DillaState, RoleTiming};
use crate::kit::{DrumKit, VoiceBank};
use crate::pattern::{DrillIntent, Pattern, RhythmFeelMode, Track, NUM_TRACKS};
use crate::rng::XorShift32;

/// How far ahead of the main hit a flam grace note lands.
const FLAM_LEAD_SECONDS: f64 = 0.008;

/// Rhythm-generation core of the drum machine.
///
/// Create one per drum machine instance with a seed, `prepare` it for a
/// sample rate, then drive it with repeated [`advance`](Self::advance)
/// calls and per-block [`render_track`](Self::render_track) pulls. For a
/// fixed seed, parameter set, pattern, and block schedule, the emitted
/// trigger sequence is bit-identical across runs.
pub struct StepSequencer<B: VoiceBank = DrumKit> {
    rng: XorShift32,

    // Clock
    prepared: bool,
    sample_rate: f64,
    tempo: f64,
    pending_tempo: Option<f64>,
    samples_per_step: f64,
    samples_until_step: f64,
    started: bool,
    pattern_length: u32,
    pending_pattern_length: Option<u32>,
    current_step: u32,
    /// Absolute steps since the last reset; bars derive from this.
    total_steps: u64,
    /// Bars accumulated before the last reset.
    bar_base: u32,

    // Groove
    swing: f32,
    role_timing: RoleTiming,
    dilla: DillaParams,
    drift: [DillaState; NUM_TRACKS],

    // Pattern and dispatch bias
    pattern: Pattern,
    feel: RhythmFeelMode,

    // Burst engine and composition layer
    drill: DrillMode,
    lane: DrillAutomationLane,
    fill_policy: DrillFillPolicy,
    fill_state: DrillFillState,
    gate_policy: DrillGatePolicy,
    gate_state: DrillGateState,
    phrase: PhraseDetector,
    pending_bars_per_phrase: Option<u32>,

    // Dispatch
    budget: HitBudget,
    voice_bank: B,
    scratch: Vec<f32>,
    /// Voices already pulled this block; a shared voice is rendered by
    /// the first track that asks for it.
    rendered_voices: u16,
    commands: Option<ringbuf::HeapCons<SeqCommand>>,
}

impl StepSequencer<DrumKit> {
    /// Sequencer over the built-in synthesised kit.
    pub fn new(seed: u32) -> Self {
        Self::with_voice_bank(seed, DrumKit::new())
    }
}

impl<B: VoiceBank> StepSequencer<B> {
    /// Sequencer over a host-supplied voice bank.
    pub fn with_voice_bank(seed: u32, voice_bank: B) -> Self {
        Self {
            rng: XorShift32::new(seed),
            prepared: false,
            sample_rate: 0.0,
            tempo: Tempo::default().bpm,
            pending_tempo: None,
            samples_per_step: 0.0,
            samples_until_step: 0.0,
            started: false,
            pattern_length: STEPS_PER_BAR,
            pending_pattern_length: None,
            current_step: 0,
            total_steps: 0,
            bar_base: 0,
            swing: 0.0,
            role_timing: RoleTiming::default(),
            dilla: DillaParams::default(),
            drift: [DillaState::default(); NUM_TRACKS],
            pattern: Pattern::default(),
            feel: RhythmFeelMode::Groove,
            drill: DrillMode::default(),
            lane: DrillAutomationLane::new(),
            fill_policy: DrillFillPolicy::default(),
            fill_state: DrillFillState::default(),
            gate_policy: DrillGatePolicy::default(),
            gate_state: DrillGateState::default(),
            phrase: PhraseDetector::default(),
            pending_bars_per_phrase: None,
            budget: HitBudget::default(),
            voice_bank,
            scratch: Vec::new(),
            rendered_voices: 0,
            commands: None,
        }
    }

    /// Size internal state for a sample rate and block size. Must be
    /// called before `advance`; calling it again re-syncs the clock.
    pub fn prepare(&mut self, sample_rate: f64, max_block_size: u32) {
        self.sample_rate = sample_rate.max(1.0);
        self.samples_per_step = Tempo::new(self.tempo).samples_per_step(self.sample_rate);
        self.scratch = vec![0.0; max_block_size.max(1) as usize];
        self.voice_bank.prepare(self.sample_rate as f32);
        self.prepared = true;
        self.samples_until_step = 0.0;
        self.started = false;
        self.current_step = 0;
        self.total_steps = 0;
    }

    /// Clear transient state: clock position, drift, gate and fill runs,
    /// and the voice bank. Pattern, parameters, and the bar count are
    /// preserved.
    pub fn reset(&mut self) {
        self.bar_base = self.current_bar();
        self.samples_until_step = 0.0;
        self.started = false;
        self.current_step = 0;
        self.total_steps = 0;
        for d in &mut self.drift {
            d.reset();
        }
        self.gate_state.reset();
        self.fill_state.reset();
        self.budget.clear_peak();
        self.voice_bank.reset();
    }

    // --- Parameter surface -------------------------------------------------

    /// Set the tempo in BPM (clamped to 20-999). Takes effect at the next
    /// step boundary.
    pub fn set_tempo(&mut self, bpm: f64) {
        self.pending_tempo = Some(Tempo::new(bpm).bpm);
    }

    pub fn tempo(&self) -> f64 {
        self.pending_tempo.unwrap_or(self.tempo)
    }

    pub fn set_swing(&mut self, swing: f32) {
        self.swing = swing.clamp(0.0, 1.0);
    }

    pub fn swing(&self) -> f32 {
        self.swing
    }

    /// Set the playable pattern length in steps (clamped to 1-16).
    /// Takes effect at the next step boundary.
    pub fn set_pattern_length(&mut self, steps: u32) {
        self.pending_pattern_length = Some(steps.clamp(1, MAX_PATTERN_STEPS));
    }

    pub fn pattern_length(&self) -> u32 {
        self.pending_pattern_length.unwrap_or(self.pattern_length)
    }

    pub fn set_role_timing(&mut self, timing: RoleTiming) {
        self.role_timing = timing;
    }

    pub fn role_timing(&self) -> RoleTiming {
        self.role_timing
    }

    pub fn set_dilla_params(&mut self, params: DillaParams) {
        self.dilla = params;
    }

    pub fn dilla_params(&self) -> DillaParams {
        self.dilla
    }

    pub fn set_rhythm_feel_mode(&mut self, feel: RhythmFeelMode) {
        self.feel = feel;
    }

    pub fn rhythm_feel_mode(&self) -> RhythmFeelMode {
        self.feel
    }

    pub fn set_drill_mode(&mut self, mode: DrillMode) {
        self.drill = mode;
    }

    pub fn drill_mode(&self) -> DrillMode {
        self.drill
    }

    pub fn set_drill_automation(&mut self, lane: DrillAutomationLane) {
        self.lane = lane;
    }

    pub fn drill_automation(&self) -> &DrillAutomationLane {
        &self.lane
    }

    pub fn set_drill_fill_policy(&mut self, policy: DrillFillPolicy) {
        self.fill_policy = policy;
    }

    pub fn drill_fill_policy(&self) -> DrillFillPolicy {
        self.fill_policy
    }

    pub fn set_drill_gate_policy(&mut self, policy: DrillGatePolicy) {
        self.gate_policy = policy;
    }

    pub fn drill_gate_policy(&self) -> DrillGatePolicy {
        self.gate_policy
    }

    /// Phrase length change takes effect at the next step boundary.
    pub fn set_phrase_detector(&mut self, detector: PhraseDetector) {
        self.pending_bars_per_phrase = Some(detector.bars_per_phrase());
    }

    pub fn phrase_detector(&self) -> PhraseDetector {
        match self.pending_bars_per_phrase {
            Some(bars) => PhraseDetector::new(bars),
            None => self.phrase,
        }
    }

    /// Swap in a macro preset's burst, fill, and gate settings in one go.
    pub fn apply_idm_macro_preset(&mut self, preset: &IdmMacroPreset) {
        self.drill = preset.drill;
        self.fill_policy = preset.fill;
        self.gate_policy = preset.gate;
    }

    /// Replace one track. Out-of-range indices are ignored.
    pub fn set_track(&mut self, index: usize, track: Track) {
        if index >= NUM_TRACKS {
            return;
        }
        self.voice_bank.set_pitch(track.voice, track.pitch);
        self.pattern.tracks[index] = track;
    }

    pub fn track(&self, index: usize) -> Option<&Track> {
        self.pattern.tracks.get(index)
    }

    pub fn track_mut(&mut self, index: usize) -> Option<&mut Track> {
        self.pattern.tracks.get_mut(index)
    }

    /// Replace the whole pattern, re-syncing voice pitches.
    pub fn set_pattern(&mut self, pattern: Pattern) {
        for track in &pattern.tracks {
            self.voice_bank.set_pitch(track.voice, track.pitch);
        }
        self.pattern = pattern;
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn voice_bank(&self) -> &B {
        &self.voice_bank
    }

    pub fn voice_bank_mut(&mut self) -> &mut B {
        &mut self.voice_bank
    }

    /// Create a command ring for another thread. Commands drain at the
    /// top of every `advance` call.
    pub fn command_channel(&mut self, capacity: usize) -> CommandSender {
        let (tx, rx) = command_queue(capacity);
        self.commands = Some(rx);
        tx
    }

    // --- Observers ---------------------------------------------------------

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn current_bar(&self) -> u32 {
        self.bar_base + (self.total_steps / STEPS_PER_BAR as u64) as u32
    }

    pub fn active_voice_count(&self) -> u32 {
        self.voice_bank.active_count()
    }

    /// Worst per-block count of micro-hits dropped by the block cap since
    /// the last reset. Diagnostic only.
    pub fn dropped_micro_hits(&self) -> u32 {
        self.budget.dropped_peak()
    }

    // --- Block driver ------------------------------------------------------

    /// Drive the clock forward by `num_samples`, emitting voice triggers
    /// at every step boundary crossed. A no-op before `prepare`.
    pub fn advance(&mut self, num_samples: u32) {
        self.budget.begin_block();
        self.rendered_voices = 0;
        self.drain_commands();
        if !self.prepared {
            return;
        }
        let mut remaining = num_samples as f64;
        while remaining > 0.0 {
            if self.samples_until_step <= 0.0 {
                self.begin_step();
                self.samples_until_step += self.samples_per_step;
            }
            let chunk = remaining.min(self.samples_until_step);
            self.samples_until_step -= chunk;
            remaining -= chunk;
        }
    }

    /// Pull one track's audio for the current block. Adds into `out`
    /// scaled by the track volume. Out-of-range indices are ignored.
    pub fn render_track(&mut self, track_index: usize, out: &mut [f32], num_samples: u32) {
        if track_index >= NUM_TRACKS || !self.prepared {
            return;
        }
        let n = (num_samples as usize).min(out.len()).min(self.scratch.len());
        if n == 0 {
            return;
        }
        let voice = self.pattern.tracks[track_index].voice;
        let volume = self.pattern.tracks[track_index].volume;
        let bit = 1u16 << voice.index();
        if self.rendered_voices & bit != 0 {
            return;
        }
        self.rendered_voices |= bit;
        let scratch = &mut self.scratch[..n];
        scratch.fill(0.0);
        self.voice_bank.render(voice, scratch, n as u32);
        for (o, s) in out.iter_mut().zip(scratch.iter()) {
            *o += s * volume;
        }
    }

    fn drain_commands(&mut self) {
        loop {
            let cmd = match self.commands.as_mut() {
                Some(c) => c.try_pop(),
                None => None,
            };
            let Some(cmd) = cmd else { break };
            self.apply_command(cmd);
        }
    }

    fn apply_command(&mut self, cmd: SeqCommand) {
        match cmd {
            SeqCommand::SetTempo(bpm) => self.set_tempo(bpm),
            SeqCommand::SetSwing(s) => self.set_swing(s),
            SeqCommand::SetPatternLength(n) => self.set_pattern_length(n),
            SeqCommand::SetRoleTiming(t) => self.set_role_timing(t),
            SeqCommand::SetDillaParams(p) => self.set_dilla_params(p),
            SeqCommand::SetRhythmFeel(f) => self.set_rhythm_feel_mode(f),
            SeqCommand::SetDrillMode(m) => self.set_drill_mode(m),
            SeqCommand::SetFillPolicy(p) => self.set_drill_fill_policy(p),
            SeqCommand::SetGatePolicy(p) => self.set_drill_gate_policy(p),
            SeqCommand::SetBarsPerPhrase(b) => {
                self.pending_bars_per_phrase = Some(b);
            }
            SeqCommand::ApplyMacro(m) => self.apply_idm_macro_preset(&m),
        }
    }

    /// Cross one step boundary: latch pending parameters, advance the
    /// step/bar position, redraw the fill at bar starts, and trigger.
    fn begin_step(&mut self) {
        if let Some(bpm) = self.pending_tempo.take() {
            self.tempo = bpm;
            self.samples_per_step = Tempo::new(bpm).samples_per_step(self.sample_rate);
        }
        if let Some(len) = self.pending_pattern_length.take() {
            self.pattern_length = len;
        }
        if let Some(bars) = self.pending_bars_per_phrase.take() {
            self.phrase.set_bars_per_phrase(bars);
        }

        if !self.started {
            self.started = true;
            self.current_step = 0;
        } else {
            self.total_steps += 1;
            self.current_step = (self.current_step + 1) % self.pattern_length;
        }

        let step_in_bar = (self.total_steps % STEPS_PER_BAR as u64) as u32;
        if step_in_bar == 0 {
            let bar = self.current_bar();
            self.fill_state
                .redraw(&self.fill_policy, &self.phrase, bar, &mut self.rng);
        }
        self.trigger_all_tracks(step_in_bar);
    }

    /// Evaluate the composition layer once and dispatch every track.
    fn trigger_all_tracks(&mut self, step_in_bar: u32) {
        let bar = self.current_bar();
        let phrase_end = self.phrase.is_phrase_end(bar);

        let mut amount = self.drill.amount;
        if !self.lane.is_empty() {
            amount = self.lane.evaluate_at(bar);
        }
        if self.fill_state.active && self.fill_policy.enabled {
            let len = self.fill_policy.window_len();
            if step_in_bar + len >= STEPS_PER_BAR {
                let k = step_in_bar - (STEPS_PER_BAR - len);
                let bar_amount = self.fill_policy.amount_for_bar(&self.phrase, bar);
                let decayed =
                    bar_amount * (1.0 - k as f32 * self.fill_policy.decay_per_step).max(0.0);
                amount = amount.max(decayed);
            }
        }

        // Phrase-end bars force the gate on; it stays inert unless its
        // silence chance says otherwise.
        let gate_enabled = phrase_end || self.gate_policy.enabled;
        let gated = self
            .gate_state
            .advance(&self.gate_policy, gate_enabled, &mut self.rng);

        let decision = StepDecision {
            effective_amount: amount,
            gated,
            burst_chance: self.gate_policy.burst_chance,
        };
        for t in 0..NUM_TRACKS {
            self.trigger_track(t, decision);
        }
    }

    /// Decide the path for one track and emit its hits.
    fn trigger_track(&mut self, track_index: usize, decision: StepDecision) {
        let step = self.current_step as usize;
        let step_index = self.current_step;
        let track = &self.pattern.tracks[track_index];
        let cell = track.steps[step];
        if !cell.active {
            return;
        }
        let voice = track.voice;
        let role = track.role;
        let mode = track.drill_override.unwrap_or(self.drill);

        let mut amount = decision.effective_amount;
        if decision.gated {
            let u = self.rng.next_01();
            if u < 1.0 - decision.burst_chance {
                return;
            }
            // The gate turned this step into an eruption instead.
            amount = 1.0;
        }

        let cell_wants = mode.enabled
            && amount > 0.001
            && match cell.drill_intent {
                DrillIntent::None => false,
                DrillIntent::Optional => amount > 0.25,
                DrillIntent::Emphasize => amount > 0.05,
            };
        let burst_path = cell_wants
            && voice.prefers_burst()
            && (self.feel == RhythmFeelMode::Drill || cell.use_drill || amount > 0.0);

        // Drift advances on every trigger; swing is frozen on the burst
        // path, which supplies its own timing.
        let drift = self.drift[track_index].update(role, &self.dilla, &mut self.rng);
        let swing = if burst_path {
            0.0
        } else {
            swing_offset(step_index, self.swing)
        };
        let offset = swing + role_offset(step_index, role, &self.role_timing) + drift;
        self.pattern.tracks[track_index].steps[step].timing_offset = offset;

        let sps = self.samples_per_step;
        let last = (sps - 1.0).max(0.0);

        if burst_path {
            let mut burst_cell = cell;
            burst_cell.timing_offset = offset;
            let Self {
                rng,
                budget,
                voice_bank,
                ..
            } = self;
            let mut emit = |vel: f32, so: u32| voice_bank.trigger(voice, vel, so);
            schedule_micro_burst(&mode, &burst_cell, amount, sps, rng, budget, &mut emit);
            return;
        }

        // Groove path
        let u = self.rng.next_01();
        if u > cell.probability {
            return;
        }
        let vel = cell.velocity.min(127) as f32 / 127.0;

        if cell.is_roll {
            // Rolls lay their own grid across the step.
            let n = cell.roll_notes.max(1) as u32;
            for i in 0..n {
                let so = (i as f64 * sps / n as f64)
                    .round_ties_even()
                    .clamp(0.0, last) as u32;
                if self.budget.try_take() {
                    self.voice_bank.trigger(voice, vel, so);
                } else {
                    self.budget.drop_hits(n - i - 1);
                    return;
                }
            }
            return;
        }

        let main = (offset as f64 * sps).round_ties_even().clamp(0.0, last) as u32;
        if cell.has_flam {
            let lead = (FLAM_LEAD_SECONDS * self.sample_rate).round() as u32;
            let grace = main.saturating_sub(lead);
            if self.budget.try_take() {
                self.voice_bank.trigger(voice, vel * 0.7, grace);
            }
        }
        if self.budget.try_take() {
            self.voice_bank.trigger(voice, vel, main);
        }
    }
}

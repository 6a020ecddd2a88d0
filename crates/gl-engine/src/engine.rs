//! The engine: transport and record state machines, CV edge detection, MIDI
//! intake, and the per-block dispatch that drives everything else.
//!
//! One `Engine` value owns all mutable state. The host calls [`Engine::step`]
//! once per audio block and [`Engine::midi_message`] for each inbound
//! message; the two are never called concurrently. Construction is the only
//! place that allocates.

use alloc::vec::Vec;

use gl_core::{
    MidiSink, ParamView, Rand32, RecMode, MAX_TRACKS, MIN_TRACKS, NOTE_OFF, NOTE_ON,
    PARAM_CLEAR_ALL, PARAM_CLEAR_TRACK, PARAM_DIVISION, PARAM_GENERATE, TRACK_LENGTH,
};
use gl_core::{quantize_to_scale, total_params, GLOBAL_PARAMS, PARAMS_PER_TRACK};

use crate::generate;
use crate::playback::{self, DelayedNote, MAX_DELAYED_NOTES};
use crate::recording::{self, HeldNote, RecordContext};
use crate::snapshot::{self, Snapshot};
use crate::track::TrackState;

/// Schmitt trigger thresholds for the run gate and clock inputs, in volts.
pub const GATE_THRESHOLD_HIGH: f32 = 2.0;
pub const GATE_THRESHOLD_LOW: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Running,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordState {
    Idle,
    Live,
    Step,
    /// Record armed in live mode while the transport is stopped; promotes to
    /// Live when the transport starts.
    LivePending,
}

/// Construction-time configuration.
#[derive(Clone, Copy, Debug)]
pub struct EngineSpec {
    /// Number of tracks to allocate (1-8)
    pub num_tracks: usize,
    /// Host sample rate in Hz
    pub sample_rate: u32,
    /// Entropy for the PRNGs, typically the host cycle counter
    pub seed: u32,
}

impl Default for EngineSpec {
    fn default() -> Self {
        Self { num_tracks: 4, sample_rate: 48_000, seed: 0x1234_5678 }
    }
}

/// Memory footprint for a spec, reported to hosts that pre-budget their
/// allocations.
#[derive(Clone, Copy, Debug)]
pub struct MemoryRequirements {
    pub num_parameters: usize,
    /// The engine value itself
    pub sram_bytes: usize,
    /// Per-track state
    pub dram_bytes: usize,
    /// Hot auxiliary state; zero because everything lives in the engine value
    pub dtc_bytes: usize,
}

/// Report what [`Engine::new`] will allocate for a spec.
pub fn calculate_requirements(spec: &EngineSpec) -> MemoryRequirements {
    let num_tracks = spec.num_tracks.clamp(MIN_TRACKS, MAX_TRACKS);
    MemoryRequirements {
        num_parameters: total_params(num_tracks),
        sram_bytes: core::mem::size_of::<Engine>(),
        dram_bytes: core::mem::size_of::<TrackState>() * num_tracks,
        dtc_bytes: 0,
    }
}

pub struct Engine {
    num_tracks: usize,
    sample_rate: u32,

    tracks: Vec<TrackState>,
    held: [HeldNote; 128],
    delayed: [DelayedNote; MAX_DELAYED_NOTES],

    transport: TransportState,
    record: RecordState,

    // CV edge detection
    prev_gate_high: bool,
    prev_clock_high: bool,

    // Clock period measurement
    step_time: f32,
    step_duration: f32,

    // Parameter edge detection
    last_record: i16,
    last_rec_track: i16,
    last_clear_track: i16,
    last_clear_all: i16,
    last_generate: i16,

    /// Step-record cursor: 1-based division-step index, 0 when inactive
    step_rec_pos: u8,

    // Input metering
    input_vel: u8,
    input_notes: [bool; 128],

    /// Quantized pitch sent per inbound note, so note-offs release what the
    /// note-on opened
    note_map: [u8; 128],

    /// Generator PRNG, separate from the per-track streams
    gen_rand: Rand32,
}

impl Engine {
    pub fn new(spec: EngineSpec) -> Self {
        let num_tracks = spec.num_tracks.clamp(MIN_TRACKS, MAX_TRACKS);
        let tracks = (0..num_tracks)
            .map(|t| TrackState::new(spec.seed, t, t == 0))
            .collect();

        let mut note_map = [0u8; 128];
        for (i, slot) in note_map.iter_mut().enumerate() {
            *slot = i as u8;
        }

        Self {
            num_tracks,
            sample_rate: spec.sample_rate.max(1),
            tracks,
            held: [HeldNote::default(); 128],
            delayed: [DelayedNote::default(); MAX_DELAYED_NOTES],
            transport: TransportState::Stopped,
            record: RecordState::Idle,
            prev_gate_high: false,
            prev_clock_high: false,
            step_time: 0.0,
            step_duration: 0.1,
            last_record: 0,
            last_rec_track: 0,
            last_clear_track: 0,
            last_clear_all: 0,
            last_generate: 0,
            step_rec_pos: 0,
            input_vel: 0,
            input_notes: [false; 128],
            note_map,
            gen_rand: Rand32::new(spec.seed ^ 0x9E37_79B9),
        }
    }

    pub fn num_tracks(&self) -> usize {
        self.num_tracks
    }

    pub fn transport_state(&self) -> TransportState {
        self.transport
    }

    pub fn record_state(&self) -> RecordState {
        self.record
    }

    /// Step-record cursor (1-based division step; 0 when not step
    /// recording).
    pub fn step_rec_pos(&self) -> u8 {
        self.step_rec_pos
    }

    /// Velocity of the most recent input note still held, for metering.
    pub fn input_velocity(&self) -> u8 {
        self.input_vel
    }

    pub fn track(&self, index: usize) -> &TrackState {
        &self.tracks[index.min(self.num_tracks - 1)]
    }

    /// Direct access to a track's state, e.g. for host-side pattern editing.
    pub fn track_mut(&mut self, index: usize) -> &mut TrackState {
        &mut self.tracks[index.min(self.num_tracks - 1)]
    }

    /// Wrap the host's parameter vector for this engine's track count.
    pub fn params<'a>(&self, v: &'a [i16]) -> ParamView<'a> {
        ParamView::new(v, self.num_tracks)
    }

    // === Transport ===

    fn transport_start(&mut self, params: &ParamView) {
        for ts in &mut self.tracks {
            ts.reset_positions();
        }
        self.step_time = 0.0;
        self.transport = TransportState::Running;

        // Promote a pending live recording now that the clock is rolling.
        if self.record == RecordState::LivePending {
            if params.rec_mode() == RecMode::Replace {
                let rec_track = params.rec_track();
                self.tracks[rec_track].data.clear();
            }
            self.record = RecordState::Live;
        }
    }

    fn transport_stop(&mut self, params: &ParamView, sink: &mut dyn MidiSink) {
        if self.record == RecordState::Live {
            recording::finalize_held_notes(&mut self.held, &mut self.tracks);
            self.record = RecordState::Idle;
        }

        self.transport = TransportState::Stopped;
        playback::send_all_notes_off(params, sink);

        for ts in &mut self.tracks {
            ts.step = 0;
            ts.clock_count = 0;
            ts.div_counter = 0;
            ts.loop_count = 0;
            ts.brownian_pos = 1;
            ts.shuffle_pos = 1;
            ts.clear_playing();
        }
        for dn in &mut self.delayed {
            dn.active = false;
        }
        self.step_time = 0.0;
    }

    // === Record state machine ===

    fn run_record_fsm(&mut self, params: &ParamView) {
        let record = params.record();
        let rec_mode = params.rec_mode();
        let rec_track = params.rec_track();
        let is_step_mode = rec_mode == RecMode::Step;
        let running = self.transport == TransportState::Running;

        // A record-track change drops any capture in progress.
        if rec_track as i16 != self.last_rec_track {
            recording::clear_held_notes(&mut self.held);
            if self.record == RecordState::Step {
                self.step_rec_pos = 1;
            }
            self.last_rec_track = rec_track as i16;
        }

        let record_changed = record != self.last_record;

        match self.record {
            RecordState::Idle => {
                if record_changed && record == 1 {
                    if is_step_mode {
                        self.step_rec_pos = 1;
                        self.record = RecordState::Step;
                    } else if running {
                        if rec_mode == RecMode::Replace {
                            self.tracks[rec_track].data.clear();
                        }
                        self.record = RecordState::Live;
                    } else {
                        self.record = RecordState::LivePending;
                    }
                }
            }
            RecordState::Live => {
                if record_changed && record == 0 {
                    recording::finalize_held_notes(&mut self.held, &mut self.tracks);
                    self.record = RecordState::Idle;
                } else if is_step_mode {
                    // Mode flipped to step mid-capture.
                    recording::finalize_held_notes(&mut self.held, &mut self.tracks);
                    self.step_rec_pos = 1;
                    self.record = RecordState::Step;
                }
            }
            RecordState::Step => {
                if record_changed && record == 0 {
                    self.step_rec_pos = 0;
                    self.record = RecordState::Idle;
                } else if !is_step_mode {
                    self.step_rec_pos = 0;
                    if running {
                        if rec_mode == RecMode::Replace {
                            self.tracks[rec_track].data.clear();
                        }
                        self.record = RecordState::Live;
                    } else {
                        self.record = RecordState::LivePending;
                    }
                }
            }
            RecordState::LivePending => {
                if record_changed && record == 0 {
                    self.record = RecordState::Idle;
                } else if is_step_mode {
                    self.step_rec_pos = 1;
                    self.record = RecordState::Step;
                } else if running {
                    // Normally promoted by transport_start; kept as a safety
                    // net in case execution order within a block changes.
                    if rec_mode == RecMode::Replace {
                        self.tracks[rec_track].data.clear();
                    }
                    self.record = RecordState::Live;
                }
            }
        }

        self.last_record = record;
    }

    // === Parameter edges ===

    fn run_parameter_edges(&mut self, params: &ParamView, sink: &mut dyn MidiSink) {
        let clear_track = params.global(PARAM_CLEAR_TRACK);
        if clear_track != self.last_clear_track {
            if clear_track == 1 {
                let track = params.rec_track();
                playback::send_track_notes_off(&mut self.tracks, &mut self.delayed, track, sink);
                self.tracks[track].data.clear();
            }
            self.last_clear_track = clear_track;
        }

        let clear_all = params.global(PARAM_CLEAR_ALL);
        if clear_all != self.last_clear_all {
            if clear_all == 1 {
                for t in 0..self.num_tracks {
                    playback::send_track_notes_off(&mut self.tracks, &mut self.delayed, t, sink);
                    self.tracks[t].data.clear();
                }
            }
            self.last_clear_all = clear_all;
        }

        let gen = params.global(PARAM_GENERATE);
        if gen != self.last_generate {
            if gen == 1 {
                generate::execute(
                    &mut self.tracks,
                    &mut self.delayed,
                    params,
                    params.rec_track(),
                    &mut self.gen_rand,
                    sink,
                );
            }
            self.last_generate = gen;
        }
    }

    // === Host callbacks ===

    /// React to a host-side parameter change. Invalidates quantize caches
    /// when the track length or global division moved, and keeps the
    /// step-record cursor on a valid cell.
    pub fn parameter_changed(&mut self, params: &ParamView, index: usize) {
        if index == PARAM_DIVISION {
            for ts in &mut self.tracks {
                ts.cache.invalidate();
            }
            if self.record == RecordState::Step {
                self.step_rec_pos = 1;
            }
            return;
        }
        if index >= GLOBAL_PARAMS {
            let track = (index - GLOBAL_PARAMS) / PARAMS_PER_TRACK;
            let offset = (index - GLOBAL_PARAMS) % PARAMS_PER_TRACK;
            if offset == TRACK_LENGTH && track < self.num_tracks {
                self.tracks[track].cache.invalidate();
                if track == params.rec_track() && self.record == RecordState::Step {
                    self.step_rec_pos = 1;
                }
            }
        }
    }

    /// Per-block processing: sample the CV buses, run the state machines,
    /// and advance every track whose clock divider elapses.
    ///
    /// `bus_frames` is bus-major: bus `b`'s samples occupy
    /// `b * num_frames .. (b + 1) * num_frames`.
    pub fn step(
        &mut self,
        params: &ParamView,
        bus_frames: &[f32],
        num_frames_by_4: usize,
        sink: &mut dyn MidiSink,
    ) {
        let num_frames = num_frames_by_4 * 4;
        if num_frames == 0 {
            return;
        }
        let dt = num_frames as f32 / self.sample_rate as f32;

        let sample_bus = |bus: i16| -> f32 {
            if bus <= 0 {
                return 0.0;
            }
            let idx = (bus as usize - 1) * num_frames + num_frames - 1;
            bus_frames.get(idx).copied().unwrap_or(0.0)
        };
        let gate = sample_bus(params.run_input());
        let clock = sample_bus(params.clock_input());

        let gate_high = gate > GATE_THRESHOLD_HIGH;
        let gate_low = gate < GATE_THRESHOLD_LOW;
        let clock_high = clock > GATE_THRESHOLD_HIGH;
        let clock_low = clock < GATE_THRESHOLD_LOW;

        // Transport edges. Within the hysteresis band the previous level
        // holds, so a sagging gate cannot retrigger.
        if gate_high && !self.prev_gate_high {
            self.transport_start(params);
        } else if gate_low && self.prev_gate_high {
            self.transport_stop(params, sink);
        }
        if gate_high {
            self.prev_gate_high = true;
        } else if gate_low {
            self.prev_gate_high = false;
        }

        let clock_rising = clock_high && !self.prev_clock_high;
        if clock_high {
            self.prev_clock_high = true;
        } else if clock_low {
            self.prev_clock_high = false;
        }

        self.run_parameter_edges(params, sink);

        self.step_time += dt;
        playback::process_delayed_notes(&mut self.delayed, &mut self.tracks, dt, sink);

        self.run_record_fsm(params);

        if clock_rising && self.transport == TransportState::Running {
            // Track the clock period for sub-clock record quantization.
            if self.step_time > 0.001 {
                self.step_duration = self.step_time;
            }
            self.step_time = 0.0;

            let panic_on_wrap = params.panic_on_wrap();
            for t in 0..self.num_tracks {
                let div = params.track(t).clock_div() as u32;
                self.tracks[t].div_counter += 1;
                if self.tracks[t].div_counter >= div {
                    self.tracks[t].div_counter = 0;
                    playback::process_track(
                        &mut self.tracks,
                        &mut self.delayed,
                        params,
                        t,
                        panic_on_wrap,
                        sink,
                    );
                }
            }
        }
    }

    /// Handle one inbound 3-byte MIDI message: channel filter, scale
    /// quantization, pass-through, metering, and routing into step or live
    /// recording.
    pub fn midi_message(
        &mut self,
        params: &ParamView,
        byte0: u8,
        byte1: u8,
        byte2: u8,
        sink: &mut dyn MidiSink,
    ) {
        let status = byte0 & 0xF0;
        let channel = (byte0 & 0x0F) as i16;

        let channel_filter = params.midi_in_channel();
        if channel_filter > 0 && channel != channel_filter - 1 {
            return;
        }

        let is_note_on = status == NOTE_ON && byte2 > 0;
        let is_note_off = status == NOTE_OFF || (status == NOTE_ON && byte2 == 0);
        if !is_note_on && !is_note_off {
            return;
        }

        let track = params.rec_track();
        let tp = params.track(track);
        let out_ch = tp.channel();
        let dest = gl_core::DestMask::from_param(tp.destination());

        // Scale quantization happens once, at the input. The note map
        // remembers what each inbound note became so its note-off releases
        // the same pitch.
        let note = if is_note_on {
            let quantized = quantize_to_scale(byte1 & 127, params.scale_root(), params.scale());
            self.note_map[(byte1 & 127) as usize] = quantized;
            quantized
        } else {
            self.note_map[(byte1 & 127) as usize]
        };

        // Pass-through to the record track's output when the channels
        // differ.
        if channel + 1 != out_ch {
            sink.send(dest, gl_core::with_channel(status, out_ch), note, byte2);
        }

        // Input metering and chord-release detection.
        let mut chord_released = false;
        if is_note_on {
            self.input_notes[note as usize] = true;
            self.input_vel = byte2;
        } else {
            let was_held = self.input_notes[note as usize];
            self.input_notes[note as usize] = false;
            let any_held = self.input_notes.iter().any(|&h| h);
            if !any_held {
                self.input_vel = 0;
                chord_released = was_held;
            }
        }

        // Step recording runs regardless of transport state.
        if self.record == RecordState::Step {
            if is_note_on {
                let cursor = self.step_rec_pos.max(1);
                recording::step_record_note_on(
                    &mut self.tracks[track],
                    params,
                    track,
                    cursor,
                    note,
                    byte2,
                );
            } else if chord_released {
                self.step_rec_pos = recording::advance_step_cursor(
                    &mut self.tracks[track],
                    params,
                    track,
                    self.step_rec_pos.max(1),
                );
            }
            return;
        }

        if self.record != RecordState::Live {
            return;
        }

        let ctx = RecordContext::capture(
            params,
            track,
            &mut self.tracks[track],
            self.step_time,
            self.step_duration,
        );
        if is_note_on {
            recording::record_note_on(&mut self.held, &ctx, note, byte2);
        } else {
            recording::record_note_off(&mut self.held, &mut self.tracks, &ctx, note);
        }
    }

    // === Snapshot ===

    /// Export the state that survives a preset save: step data and the
    /// stateful direction positions. Allocates; not for the audio thread.
    pub fn save_snapshot(&self) -> Snapshot {
        snapshot::capture(&self.tracks)
    }

    /// Apply a parsed snapshot. Infallible: values are clamped and tracks
    /// beyond this engine's allocation are discarded.
    pub fn load_snapshot(&mut self, snap: &Snapshot) {
        snapshot::apply(snap, &mut self.tracks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;
    use gl_core::{default_params, track_param_index, MidiLog, NoteEvent, PARAM_MIDI_IN_CH,
        PARAM_RECORD, PARAM_REC_MODE, PARAM_REC_TRACK, PARAM_SCALE_TYPE, TRACK_CHANNEL,
        TRACK_CLOCK_DIV};

    const FRAMES: usize = 16;
    const BUSES: usize = 4;

    struct Rig {
        engine: Engine,
        v: Vec<i16>,
        log: MidiLog,
    }

    impl Rig {
        fn new(num_tracks: usize) -> Self {
            Self {
                engine: Engine::new(EngineSpec {
                    num_tracks,
                    sample_rate: 48_000,
                    seed: 0xC0FFEE,
                }),
                v: default_params(num_tracks),
                log: MidiLog::new(),
            }
        }

        fn block(&mut self, gate: f32, clock: f32) {
            let mut bus = [0.0f32; BUSES * FRAMES];
            // Run input defaults to bus 1, clock to bus 2.
            for f in 0..FRAMES {
                bus[f] = gate;
                bus[FRAMES + f] = clock;
            }
            let params = ParamView::new(&self.v, self.engine.num_tracks());
            self.engine.step(&params, &bus, FRAMES / 4, &mut self.log);
        }

        fn start(&mut self) {
            self.block(5.0, 0.0);
        }

        fn stop(&mut self) {
            self.block(0.0, 0.0);
        }

        fn tick(&mut self) {
            self.block(5.0, 5.0);
            self.block(5.0, 0.0);
        }

        fn midi(&mut self, byte0: u8, byte1: u8, byte2: u8) {
            let params = ParamView::new(&self.v, self.engine.num_tracks());
            self.engine.midi_message(&params, byte0, byte1, byte2, &mut self.log);
        }

        fn set_track(&mut self, track: usize, offset: usize, value: i16) {
            let idx = track_param_index(track, offset);
            self.v[idx] = value;
            let params = ParamView::new(&self.v, self.engine.num_tracks());
            self.engine.parameter_changed(&params, idx);
        }

        fn set_global(&mut self, index: usize, value: i16) {
            self.v[index] = value;
            let params = ParamView::new(&self.v, self.engine.num_tracks());
            self.engine.parameter_changed(&params, index);
        }
    }

    fn seed_step(rig: &mut Rig, track: usize, step: usize, note: u8, duration: u16) {
        rig.engine.track_mut(track).data.step_mut(step).insert(NoteEvent {
            note,
            velocity: 100,
            duration,
        });
    }

    #[test]
    fn gate_edges_drive_transport() {
        let mut rig = Rig::new(1);
        assert_eq!(rig.engine.transport_state(), TransportState::Stopped);
        rig.start();
        assert_eq!(rig.engine.transport_state(), TransportState::Running);
        rig.stop();
        assert_eq!(rig.engine.transport_state(), TransportState::Stopped);
    }

    #[test]
    fn hysteresis_band_holds_the_gate_level() {
        let mut rig = Rig::new(1);
        rig.start();
        // Sag into the band: neither threshold crossed, stays Running.
        rig.block(1.0, 0.0);
        assert_eq!(rig.engine.transport_state(), TransportState::Running);
        // Climb back above high: no retrigger (positions keep advancing).
        seed_step(&mut rig, 0, 0, 60, 1);
        rig.tick();
        let clock_before = rig.engine.track(0).clock_count;
        rig.block(5.0, 0.0);
        assert_eq!(rig.engine.track(0).clock_count, clock_before);
    }

    #[test]
    fn clock_advances_only_while_running() {
        let mut rig = Rig::new(1);
        seed_step(&mut rig, 0, 0, 60, 1);
        rig.block(0.0, 5.0);
        rig.block(0.0, 0.0);
        assert!(rig.log.note_ons().is_empty());

        rig.start();
        rig.tick();
        assert_eq!(rig.log.note_ons(), vec![(60, 100)]);
    }

    #[test]
    fn forward_one_loop_scenario() {
        let mut rig = Rig::new(1);
        rig.set_track(0, TRACK_LENGTH, 4);
        seed_step(&mut rig, 0, 0, 60, 1);
        rig.start();

        rig.tick();
        assert_eq!(rig.log.note_ons(), vec![(60, 100)]);
        rig.log.clear();
        rig.tick();
        assert_eq!(rig.log.note_offs(), vec![60]);
        rig.log.clear();
        rig.tick();
        rig.tick();
        assert!(rig.log.messages.is_empty());
        // Four clock rises = one completed loop.
        assert_eq!(rig.engine.track(0).loop_count, 1);
        rig.tick();
        assert_eq!(rig.log.note_ons(), vec![(60, 100)]);
        assert_eq!(rig.engine.track(0).loop_count, 1);
    }

    #[test]
    fn clock_divider_skips_ticks() {
        let mut rig = Rig::new(1);
        rig.set_track(0, TRACK_LENGTH, 4);
        rig.set_track(0, TRACK_CLOCK_DIV, 4);
        seed_step(&mut rig, 0, 0, 60, 1);
        seed_step(&mut rig, 0, 1, 62, 1);
        rig.start();

        for _ in 0..3 {
            rig.tick();
        }
        assert!(rig.log.note_ons().is_empty());
        rig.tick();
        assert_eq!(rig.log.note_ons(), vec![(60, 100)]);
    }

    #[test]
    fn transport_start_resets_positions() {
        let mut rig = Rig::new(1);
        rig.set_track(0, TRACK_LENGTH, 8);
        rig.start();
        for _ in 0..5 {
            rig.tick();
        }
        assert_eq!(rig.engine.track(0).step, 5);
        // Restart: falling then rising edge.
        rig.stop();
        rig.start();
        assert_eq!(rig.engine.track(0).step, 0);
        assert_eq!(rig.engine.track(0).clock_count, 0);
        rig.tick();
        assert_eq!(rig.engine.track(0).step, 1);
    }

    #[test]
    fn stop_sends_all_notes_off_and_clears_state() {
        let mut rig = Rig::new(2);
        seed_step(&mut rig, 0, 0, 60, 16);
        rig.start();
        rig.tick();
        rig.log.clear();
        rig.stop();
        let cc: Vec<_> = rig
            .log
            .messages
            .iter()
            .filter(|m| m.status & 0xF0 == gl_core::CONTROL_CHANGE)
            .collect();
        assert_eq!(cc.len(), 2);
        assert!(!rig.engine.track(0).playing[60].active);
    }

    #[test]
    fn clear_track_edge_zeroes_the_rec_track_only() {
        let mut rig = Rig::new(2);
        seed_step(&mut rig, 0, 0, 60, 1);
        seed_step(&mut rig, 1, 0, 61, 1);
        rig.set_global(PARAM_CLEAR_TRACK, 1);
        rig.block(0.0, 0.0);
        assert!(rig.engine.track(0).data.step(0).is_empty());
        assert!(!rig.engine.track(1).data.step(0).is_empty());
        // Level held high does not re-fire; reset and fire again clears 1.
        rig.set_global(PARAM_CLEAR_TRACK, 0);
        rig.set_global(PARAM_REC_TRACK, 1);
        rig.block(0.0, 0.0);
        rig.set_global(PARAM_CLEAR_TRACK, 1);
        rig.block(0.0, 0.0);
        assert!(rig.engine.track(1).data.step(0).is_empty());
    }

    #[test]
    fn clear_all_edge_zeroes_every_track() {
        let mut rig = Rig::new(2);
        seed_step(&mut rig, 0, 0, 60, 1);
        seed_step(&mut rig, 1, 0, 61, 1);
        rig.set_global(PARAM_CLEAR_ALL, 1);
        rig.block(0.0, 0.0);
        assert!(rig.engine.track(0).data.step(0).is_empty());
        assert!(rig.engine.track(1).data.step(0).is_empty());
    }

    #[test]
    fn generate_edge_builds_a_pattern() {
        let mut rig = Rig::new(1);
        rig.set_track(0, TRACK_LENGTH, 8);
        rig.set_global(gl_core::PARAM_GEN_DENSITY, 100);
        rig.set_global(PARAM_GENERATE, 1);
        rig.block(0.0, 0.0);
        let filled = (0..8).filter(|&s| !rig.engine.track(0).data.step(s).is_empty()).count();
        assert_eq!(filled, 8);
    }

    #[test]
    fn record_fsm_live_and_pending() {
        let mut rig = Rig::new(1);
        // Arm while stopped: pending.
        rig.set_global(PARAM_RECORD, 1);
        rig.block(0.0, 0.0);
        assert_eq!(rig.engine.record_state(), RecordState::LivePending);
        // Transport start promotes to Live.
        rig.start();
        assert_eq!(rig.engine.record_state(), RecordState::Live);
        // Record off returns to Idle.
        rig.set_global(PARAM_RECORD, 0);
        rig.block(5.0, 0.0);
        assert_eq!(rig.engine.record_state(), RecordState::Idle);
    }

    #[test]
    fn record_replace_clears_the_rec_track() {
        let mut rig = Rig::new(1);
        seed_step(&mut rig, 0, 3, 55, 1);
        rig.start();
        rig.set_global(PARAM_RECORD, 1);
        rig.block(5.0, 0.0);
        assert_eq!(rig.engine.record_state(), RecordState::Live);
        assert!(rig.engine.track(0).data.step(3).is_empty());
    }

    #[test]
    fn record_overdub_keeps_existing_events() {
        let mut rig = Rig::new(1);
        seed_step(&mut rig, 0, 3, 55, 1);
        rig.set_global(PARAM_REC_MODE, 1);
        rig.start();
        rig.set_global(PARAM_RECORD, 1);
        rig.block(5.0, 0.0);
        assert!(!rig.engine.track(0).data.step(3).is_empty());
    }

    #[test]
    fn step_mode_arms_without_transport() {
        let mut rig = Rig::new(1);
        rig.set_global(PARAM_REC_MODE, 2);
        rig.set_global(PARAM_RECORD, 1);
        rig.block(0.0, 0.0);
        assert_eq!(rig.engine.record_state(), RecordState::Step);
        assert_eq!(rig.engine.step_rec_pos(), 1);
    }

    #[test]
    fn step_record_chord_scenario() {
        let mut rig = Rig::new(1);
        rig.set_track(0, TRACK_LENGTH, 8);
        rig.set_global(PARAM_DIVISION, 2); // divisions of 4 -> 2 cells
        rig.set_global(PARAM_REC_MODE, 2);
        rig.set_global(PARAM_RECORD, 1);
        rig.block(0.0, 0.0);

        for note in [48, 52, 55] {
            rig.midi(0x90, note, 100);
        }
        assert_eq!(rig.engine.track(0).data.step(0).len(), 3);
        assert!(rig.engine.track(0).data.step(0).iter().all(|e| e.duration == 4));
        assert_eq!(rig.engine.step_rec_pos(), 1);

        for note in [48, 52, 55] {
            rig.midi(0x80, note, 0);
        }
        assert_eq!(rig.engine.step_rec_pos(), 2);

        rig.midi(0x90, 50, 100);
        assert_eq!(rig.engine.track(0).data.step(4).len(), 1);
        rig.midi(0x80, 50, 0);
        assert_eq!(rig.engine.step_rec_pos(), 1);
    }

    #[test]
    fn live_record_quantizes_into_the_grid() {
        let mut rig = Rig::new(1);
        rig.set_track(0, TRACK_LENGTH, 8);
        rig.start();
        rig.set_global(PARAM_RECORD, 1);
        rig.block(5.0, 0.0);
        rig.tick();
        rig.tick(); // step 2

        rig.midi(0x90, 60, 90);
        rig.tick();
        rig.tick(); // step 4
        rig.midi(0x80, 60, 0);

        let ev: Vec<_> = rig.engine.track(0).data.step(1).iter().copied().collect();
        assert_eq!(ev.len(), 1);
        assert_eq!(ev[0].note, 60);
        assert_eq!(ev[0].duration, 2);
    }

    #[test]
    fn transport_stop_finalizes_held_notes() {
        let mut rig = Rig::new(1);
        rig.set_track(0, TRACK_LENGTH, 8);
        rig.start();
        rig.set_global(PARAM_RECORD, 1);
        rig.block(5.0, 0.0);
        rig.tick();
        rig.midi(0x90, 64, 90);
        rig.tick();
        rig.stop();
        assert_eq!(rig.engine.record_state(), RecordState::Idle);
        let ev: Vec<_> = rig.engine.track(0).data.step(0).iter().copied().collect();
        assert_eq!(ev.len(), 1);
        assert_eq!(ev[0].note, 64);
    }

    #[test]
    fn channel_filter_blocks_other_channels() {
        let mut rig = Rig::new(1);
        rig.set_global(PARAM_MIDI_IN_CH, 1); // channel 1 only
        rig.set_global(PARAM_REC_MODE, 2);
        rig.set_global(PARAM_RECORD, 1);
        rig.block(0.0, 0.0);
        rig.midi(0x91, 60, 100); // channel 2: filtered
        assert!(rig.engine.track(0).data.step(0).is_empty());
        rig.midi(0x90, 60, 100); // channel 1: accepted
        assert!(!rig.engine.track(0).data.step(0).is_empty());
    }

    #[test]
    fn pass_through_retargets_channel() {
        let mut rig = Rig::new(1);
        rig.set_track(0, TRACK_CHANNEL, 5);
        rig.midi(0x90, 60, 100);
        assert_eq!(rig.log.messages.len(), 1);
        assert_eq!(rig.log.messages[0].status, 0x94);
        // Same in/out channel: nothing forwarded.
        rig.log.clear();
        rig.set_track(0, TRACK_CHANNEL, 1);
        rig.midi(0x90, 60, 100);
        assert!(rig.log.messages.is_empty());
    }

    #[test]
    fn scale_note_map_releases_the_quantized_pitch() {
        let mut rig = Rig::new(1);
        rig.set_track(0, TRACK_CHANNEL, 5);
        rig.set_global(PARAM_SCALE_TYPE, 1); // C major
        rig.midi(0x90, 61, 100); // C# folds to C
        assert_eq!(rig.log.messages[0].data1, 60);
        rig.log.clear();
        rig.midi(0x80, 61, 0);
        assert_eq!(rig.log.messages[0].data1, 60);
    }

    #[test]
    fn input_velocity_meter_follows_held_notes() {
        let mut rig = Rig::new(1);
        rig.midi(0x90, 60, 88);
        assert_eq!(rig.engine.input_velocity(), 88);
        rig.midi(0x90, 64, 70);
        assert_eq!(rig.engine.input_velocity(), 70);
        rig.midi(0x80, 60, 0);
        assert_eq!(rig.engine.input_velocity(), 70);
        rig.midi(0x80, 64, 0);
        assert_eq!(rig.engine.input_velocity(), 0);
    }

    #[test]
    fn division_change_resets_step_cursor() {
        let mut rig = Rig::new(1);
        rig.set_track(0, TRACK_LENGTH, 8);
        rig.set_global(PARAM_DIVISION, 2);
        rig.set_global(PARAM_REC_MODE, 2);
        rig.set_global(PARAM_RECORD, 1);
        rig.block(0.0, 0.0);
        rig.midi(0x90, 48, 100);
        rig.midi(0x80, 48, 0);
        assert_eq!(rig.engine.step_rec_pos(), 2);
        rig.set_global(PARAM_DIVISION, 0);
        assert_eq!(rig.engine.step_rec_pos(), 1);
    }

    #[test]
    fn rec_track_change_drops_held_notes() {
        let mut rig = Rig::new(2);
        rig.set_track(0, TRACK_LENGTH, 8);
        rig.start();
        rig.set_global(PARAM_RECORD, 1);
        rig.block(5.0, 0.0);
        rig.tick();
        rig.midi(0x90, 60, 100);
        rig.set_global(PARAM_REC_TRACK, 1);
        rig.block(5.0, 0.0);
        rig.stop();
        // The held note was dropped, not committed anywhere.
        assert!(rig.engine.track(0).data.step(0).is_empty());
        assert!(rig.engine.track(1).data.step(0).is_empty());
    }

    #[test]
    fn requirements_scale_with_track_count() {
        let small = calculate_requirements(&EngineSpec { num_tracks: 1, ..Default::default() });
        let large = calculate_requirements(&EngineSpec { num_tracks: 8, ..Default::default() });
        assert_eq!(large.dram_bytes, 8 * small.dram_bytes);
        assert!(small.num_parameters < large.num_parameters);
        assert!(small.sram_bytes > 0);
    }
}

//! Flat parameter vector layout and typed accessors.
//!
//! The host owns a flat `i16` vector: a global block followed by one block
//! per track. The engine only ever reads it, through views that clamp every
//! value into its legal range at the access site.

use alloc::vec::Vec;

use crate::event::MAX_STEPS;
use crate::scales::Scale;

pub const MAX_TRACKS: usize = 8;
pub const MIN_TRACKS: usize = 1;

// Global parameter indices.
pub const PARAM_RUN_INPUT: usize = 0;
pub const PARAM_CLOCK_INPUT: usize = 1;
pub const PARAM_RECORD: usize = 2;
pub const PARAM_REC_TRACK: usize = 3;
pub const PARAM_DIVISION: usize = 4;
pub const PARAM_REC_MODE: usize = 5;
pub const PARAM_REC_SNAP: usize = 6;
pub const PARAM_MIDI_IN_CH: usize = 7;
pub const PARAM_PANIC_ON_WRAP: usize = 8;
pub const PARAM_SCALE_ROOT: usize = 9;
pub const PARAM_SCALE_TYPE: usize = 10;
pub const PARAM_CLEAR_TRACK: usize = 11;
pub const PARAM_CLEAR_ALL: usize = 12;
pub const PARAM_GENERATE: usize = 13;
pub const PARAM_GEN_MODE: usize = 14;
pub const PARAM_GEN_DENSITY: usize = 15;
pub const PARAM_GEN_BIAS: usize = 16;
pub const PARAM_GEN_RANGE: usize = 17;
pub const PARAM_GEN_NOTE_RAND: usize = 18;
pub const PARAM_GEN_VEL_VAR: usize = 19;
pub const PARAM_GEN_TIES: usize = 20;
pub const PARAM_GEN_GATE_RAND: usize = 21;
pub const PARAM_FILL: usize = 22;

pub const GLOBAL_PARAMS: usize = 23;

// Per-track parameter offsets.
pub const TRACK_ENABLED: usize = 0;
pub const TRACK_LENGTH: usize = 1;
pub const TRACK_CLOCK_DIV: usize = 2;
pub const TRACK_DIRECTION: usize = 3;
pub const TRACK_STRIDE: usize = 4;
pub const TRACK_VELOCITY: usize = 5;
pub const TRACK_HUMANIZE: usize = 6;
pub const TRACK_CHANNEL: usize = 7;
pub const TRACK_DESTINATION: usize = 8;
pub const TRACK_STABILITY: usize = 9;
pub const TRACK_MOTION: usize = 10;
pub const TRACK_RANDOMNESS: usize = 11;
pub const TRACK_GRAVITY: usize = 12;
pub const TRACK_GRAVITY_ANCHOR: usize = 13;
pub const TRACK_PEDAL: usize = 14;
pub const TRACK_PEDAL_STEP: usize = 15;
pub const TRACK_NO_REPEAT: usize = 16;
pub const TRACK_OCT_DOWN: usize = 17;
pub const TRACK_OCT_UP: usize = 18;
pub const TRACK_OCT_PROB: usize = 19;
pub const TRACK_OCT_BYPASS: usize = 20;
pub const TRACK_STEP_PROB: usize = 21;
pub const TRACK_STEP_COND: usize = 22;
pub const TRACK_COND_STEP_A: usize = 23;
pub const TRACK_COND_A: usize = 24;
pub const TRACK_PROB_A: usize = 25;
pub const TRACK_COND_STEP_B: usize = 26;
pub const TRACK_COND_B: usize = 27;
pub const TRACK_PROB_B: usize = 28;

pub const PARAMS_PER_TRACK: usize = 29;

/// Absolute index of a track parameter in the flat vector.
pub const fn track_param_index(track: usize, offset: usize) -> usize {
    GLOBAL_PARAMS + track * PARAMS_PER_TRACK + offset
}

/// Total vector length for a track count.
pub const fn total_params(num_tracks: usize) -> usize {
    GLOBAL_PARAMS + num_tracks * PARAMS_PER_TRACK
}

/// Recording mode parameter values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecMode {
    Replace,
    Overdub,
    Step,
}

impl RecMode {
    pub fn from_param(value: i16) -> RecMode {
        match value {
            1 => RecMode::Overdub,
            2 => RecMode::Step,
            _ => RecMode::Replace,
        }
    }
}

/// Read-only view of the host parameter vector.
#[derive(Clone, Copy)]
pub struct ParamView<'a> {
    v: &'a [i16],
    num_tracks: usize,
}

impl<'a> ParamView<'a> {
    pub fn new(v: &'a [i16], num_tracks: usize) -> Self {
        let num_tracks = num_tracks.clamp(MIN_TRACKS, MAX_TRACKS);
        Self { v, num_tracks }
    }

    pub fn num_tracks(&self) -> usize {
        self.num_tracks
    }

    /// Raw global value; absent indices read as zero.
    pub fn global(&self, index: usize) -> i16 {
        self.v.get(index).copied().unwrap_or(0)
    }

    pub fn track(&self, track: usize) -> TrackParams<'a> {
        let track = track.min(self.num_tracks - 1);
        TrackParams { v: self.v, base: track_param_index(track, 0) }
    }

    pub fn run_input(&self) -> i16 {
        self.global(PARAM_RUN_INPUT)
    }

    pub fn clock_input(&self) -> i16 {
        self.global(PARAM_CLOCK_INPUT)
    }

    pub fn record(&self) -> i16 {
        self.global(PARAM_RECORD)
    }

    /// 0-based recording track, clamped to the allocated range.
    pub fn rec_track(&self) -> usize {
        (self.global(PARAM_REC_TRACK).max(0) as usize).min(self.num_tracks - 1)
    }

    /// Division parameter index into [`crate::QUANTIZE_VALUES`].
    pub fn division(&self) -> i16 {
        self.global(PARAM_DIVISION).clamp(0, 4)
    }

    pub fn rec_mode(&self) -> RecMode {
        RecMode::from_param(self.global(PARAM_REC_MODE))
    }

    /// Snap threshold as a fraction (parameter is percent, 50-100).
    pub fn rec_snap_threshold(&self) -> f32 {
        self.global(PARAM_REC_SNAP).clamp(50, 100) as f32 / 100.0
    }

    /// Input channel filter, 1-16; 0 = omni.
    pub fn midi_in_channel(&self) -> i16 {
        self.global(PARAM_MIDI_IN_CH).clamp(0, 16)
    }

    pub fn panic_on_wrap(&self) -> bool {
        self.global(PARAM_PANIC_ON_WRAP) == 1
    }

    pub fn scale_root(&self) -> i16 {
        self.global(PARAM_SCALE_ROOT).clamp(0, 11)
    }

    pub fn scale(&self) -> Scale {
        Scale::from_param(self.global(PARAM_SCALE_TYPE))
    }

    pub fn fill(&self) -> bool {
        self.global(PARAM_FILL) == 1
    }

    pub fn gen_mode(&self) -> i16 {
        self.global(PARAM_GEN_MODE).clamp(0, 3)
    }

    pub fn gen_density(&self) -> i32 {
        self.global(PARAM_GEN_DENSITY).clamp(0, 100) as i32
    }

    pub fn gen_bias(&self) -> i32 {
        self.global(PARAM_GEN_BIAS).clamp(0, 127) as i32
    }

    pub fn gen_range(&self) -> i32 {
        self.global(PARAM_GEN_RANGE).clamp(0, 64) as i32
    }

    pub fn gen_note_rand(&self) -> i32 {
        self.global(PARAM_GEN_NOTE_RAND).clamp(0, 100) as i32
    }

    pub fn gen_vel_var(&self) -> i32 {
        self.global(PARAM_GEN_VEL_VAR).clamp(0, 100) as i32
    }

    pub fn gen_ties(&self) -> i32 {
        self.global(PARAM_GEN_TIES).clamp(0, 100) as i32
    }

    pub fn gen_gate_rand(&self) -> i32 {
        self.global(PARAM_GEN_GATE_RAND).clamp(0, 100) as i32
    }
}

/// Typed accessors for one track's parameter block.
#[derive(Clone, Copy)]
pub struct TrackParams<'a> {
    v: &'a [i16],
    base: usize,
}

impl TrackParams<'_> {
    fn raw(&self, offset: usize) -> i16 {
        self.v.get(self.base + offset).copied().unwrap_or(0)
    }

    pub fn enabled(&self) -> bool {
        self.raw(TRACK_ENABLED) == 1
    }

    pub fn length(&self) -> i32 {
        self.raw(TRACK_LENGTH).clamp(1, MAX_STEPS as i16) as i32
    }

    pub fn clock_div(&self) -> i32 {
        self.raw(TRACK_CLOCK_DIV).clamp(1, 16) as i32
    }

    pub fn direction(&self) -> i16 {
        self.raw(TRACK_DIRECTION)
    }

    pub fn stride(&self) -> i32 {
        self.raw(TRACK_STRIDE).clamp(2, 16) as i32
    }

    /// Velocity offset applied at emission; may be negative.
    pub fn velocity(&self) -> i32 {
        self.raw(TRACK_VELOCITY) as i32
    }

    /// Maximum humanization delay in milliseconds.
    pub fn humanize(&self) -> i32 {
        self.raw(TRACK_HUMANIZE).clamp(0, 100) as i32
    }

    pub fn channel(&self) -> i16 {
        self.raw(TRACK_CHANNEL).clamp(1, 16)
    }

    pub fn destination(&self) -> i16 {
        self.raw(TRACK_DESTINATION)
    }

    pub fn stability(&self) -> i32 {
        self.raw(TRACK_STABILITY).clamp(0, 100) as i32
    }

    pub fn motion(&self) -> i32 {
        self.raw(TRACK_MOTION).clamp(0, 100) as i32
    }

    pub fn randomness(&self) -> i32 {
        self.raw(TRACK_RANDOMNESS).clamp(0, 100) as i32
    }

    pub fn gravity(&self) -> i32 {
        self.raw(TRACK_GRAVITY).clamp(0, 100) as i32
    }

    pub fn gravity_anchor(&self, loop_len: i32) -> i32 {
        (self.raw(TRACK_GRAVITY_ANCHOR) as i32).clamp(1, loop_len)
    }

    pub fn pedal(&self) -> i32 {
        self.raw(TRACK_PEDAL).clamp(0, 100) as i32
    }

    pub fn pedal_step(&self, loop_len: i32) -> i32 {
        (self.raw(TRACK_PEDAL_STEP) as i32).clamp(1, loop_len)
    }

    pub fn no_repeat(&self) -> bool {
        self.raw(TRACK_NO_REPEAT) == 1
    }

    pub fn oct_down(&self) -> i32 {
        self.raw(TRACK_OCT_DOWN).clamp(0, 8) as i32
    }

    pub fn oct_up(&self) -> i32 {
        self.raw(TRACK_OCT_UP).clamp(0, 8) as i32
    }

    pub fn oct_prob(&self) -> i32 {
        self.raw(TRACK_OCT_PROB).clamp(0, 100) as i32
    }

    /// Every Nth emission bypasses the octave jump; 0 disables the bypass.
    pub fn oct_bypass(&self) -> u32 {
        self.raw(TRACK_OCT_BYPASS).clamp(0, 16) as u32
    }

    pub fn step_prob(&self) -> i32 {
        self.raw(TRACK_STEP_PROB).clamp(0, 100) as i32
    }

    pub fn step_cond(&self) -> i16 {
        self.raw(TRACK_STEP_COND)
    }

    pub fn cond_step_a(&self) -> i32 {
        self.raw(TRACK_COND_STEP_A).clamp(0, MAX_STEPS as i16) as i32
    }

    pub fn cond_a(&self) -> i16 {
        self.raw(TRACK_COND_A)
    }

    pub fn prob_a(&self) -> i32 {
        self.raw(TRACK_PROB_A).clamp(0, 100) as i32
    }

    pub fn cond_step_b(&self) -> i32 {
        self.raw(TRACK_COND_STEP_B).clamp(0, MAX_STEPS as i16) as i32
    }

    pub fn cond_b(&self) -> i16 {
        self.raw(TRACK_COND_B)
    }

    pub fn prob_b(&self) -> i32 {
        self.raw(TRACK_PROB_B).clamp(0, 100) as i32
    }
}

/// Host-facing metadata for one parameter.
#[derive(Clone, Copy, Debug)]
pub struct ParamSpec {
    pub name: &'static str,
    pub min: i16,
    pub max: i16,
    pub default: i16,
}

const fn spec(name: &'static str, min: i16, max: i16, default: i16) -> ParamSpec {
    ParamSpec { name, min, max, default }
}

static GLOBAL_SPECS: [ParamSpec; GLOBAL_PARAMS] = [
    spec("Run Input", 0, 28, 1),
    spec("Clock Input", 0, 28, 2),
    spec("Record", 0, 1, 0),
    spec("Rec Track", 0, (MAX_TRACKS - 1) as i16, 0),
    spec("Division", 0, 4, 0),
    spec("Rec Mode", 0, 2, 0),
    spec("Rec Snap", 50, 100, 75),
    spec("MIDI In Ch", 0, 16, 0),
    spec("Panic On Wrap", 0, 1, 0),
    spec("Scale Root", 0, 11, 0),
    spec("Scale", 0, 11, 0),
    spec("Clear Track", 0, 1, 0),
    spec("Clear All", 0, 1, 0),
    spec("Generate", 0, 1, 0),
    spec("Gen Mode", 0, 3, 0),
    spec("Gen Density", 0, 100, 50),
    spec("Gen Bias", 0, 127, 60),
    spec("Gen Range", 0, 64, 12),
    spec("Gen Note Rand", 0, 100, 100),
    spec("Gen Vel Var", 0, 100, 20),
    spec("Gen Ties", 0, 100, 0),
    spec("Gen Gate Rand", 0, 100, 0),
    spec("Fill", 0, 1, 0),
];

static TRACK_SPECS: [ParamSpec; PARAMS_PER_TRACK] = [
    spec("Enabled", 0, 1, 0),
    spec("Length", 1, MAX_STEPS as i16, 16),
    spec("Clock Div", 1, 16, 1),
    spec("Direction", 0, 11, 0),
    spec("Stride Size", 2, 16, 2),
    spec("Velocity", -64, 64, 0),
    spec("Humanize", 0, 100, 0),
    spec("Channel", 1, 16, 1),
    spec("Destination", 0, 4, 2),
    spec("Stability", 0, 100, 0),
    spec("Motion", 0, 100, 0),
    spec("Randomness", 0, 100, 0),
    spec("Gravity", 0, 100, 0),
    spec("Anchor", 1, MAX_STEPS as i16, 1),
    spec("Pedal", 0, 100, 0),
    spec("Pedal Step", 1, MAX_STEPS as i16, 1),
    spec("No Repeat", 0, 1, 0),
    spec("Oct Down", 0, 8, 0),
    spec("Oct Up", 0, 8, 0),
    spec("Oct Prob", 0, 100, 0),
    spec("Oct Bypass", 0, 16, 0),
    spec("Step Prob", 0, 100, 100),
    spec("Step Cond", 0, 75, 0),
    spec("Cond Step A", 0, MAX_STEPS as i16, 0),
    spec("Cond A", 0, 75, 0),
    spec("Prob A", 0, 100, 100),
    spec("Cond Step B", 0, MAX_STEPS as i16, 0),
    spec("Cond B", 0, 75, 0),
    spec("Prob B", 0, 100, 100),
];

pub fn global_specs() -> &'static [ParamSpec; GLOBAL_PARAMS] {
    &GLOBAL_SPECS
}

pub fn track_specs() -> &'static [ParamSpec; PARAMS_PER_TRACK] {
    &TRACK_SPECS
}

/// Build a parameter vector with every value at its default. Track 1 comes
/// up enabled on channel 1; further tracks are disabled and numbered up the
/// channels.
pub fn default_params(num_tracks: usize) -> Vec<i16> {
    let num_tracks = num_tracks.clamp(MIN_TRACKS, MAX_TRACKS);
    let mut v = Vec::with_capacity(total_params(num_tracks));
    for s in GLOBAL_SPECS.iter() {
        v.push(s.default);
    }
    for t in 0..num_tracks {
        for (i, s) in TRACK_SPECS.iter().enumerate() {
            let value = match i {
                TRACK_ENABLED => i16::from(t == 0),
                TRACK_CHANNEL => (t as i16 + 1).min(16),
                _ => s.default,
            };
            v.push(value);
        }
    }
    v
}

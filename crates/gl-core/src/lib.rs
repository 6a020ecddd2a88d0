//! Core types for the gridloop MIDI step sequencer.
//!
//! This crate defines the data model shared between the host bridge and the
//! playback engine: step event storage, the flat parameter layout with typed
//! accessors, MIDI routing types, the PRNG, scale quantization, and the
//! recording quantization math.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod event;
mod midi;
mod params;
mod quantize;
mod random;
mod scales;

pub use event::{NoteEvent, StepEvents, TrackData, MAX_EVENTS_PER_STEP, MAX_STEPS};
pub use midi::{
    with_channel, DestMask, MidiLog, MidiMessage, MidiSink, ALL_NOTES_OFF_CC, CONTROL_CHANGE,
    NOTE_OFF, NOTE_ON,
};
pub use params::{
    default_params, global_specs, total_params, track_param_index, track_specs, ParamSpec,
    ParamView, RecMode, TrackParams, GLOBAL_PARAMS, MAX_TRACKS, MIN_TRACKS, PARAMS_PER_TRACK,
    PARAM_CLEAR_ALL, PARAM_CLEAR_TRACK, PARAM_CLOCK_INPUT, PARAM_DIVISION, PARAM_FILL,
    PARAM_GENERATE, PARAM_GEN_BIAS, PARAM_GEN_DENSITY, PARAM_GEN_GATE_RAND, PARAM_GEN_MODE,
    PARAM_GEN_NOTE_RAND, PARAM_GEN_RANGE, PARAM_GEN_TIES, PARAM_GEN_VEL_VAR, PARAM_MIDI_IN_CH,
    PARAM_PANIC_ON_WRAP, PARAM_RECORD, PARAM_REC_MODE, PARAM_REC_SNAP, PARAM_REC_TRACK,
    PARAM_RUN_INPUT, PARAM_SCALE_ROOT, PARAM_SCALE_TYPE, TRACK_CHANNEL, TRACK_CLOCK_DIV,
    TRACK_COND_A, TRACK_COND_B, TRACK_COND_STEP_A, TRACK_COND_STEP_B, TRACK_DESTINATION,
    TRACK_DIRECTION, TRACK_ENABLED, TRACK_GRAVITY, TRACK_GRAVITY_ANCHOR, TRACK_HUMANIZE,
    TRACK_LENGTH, TRACK_MOTION, TRACK_NO_REPEAT, TRACK_OCT_BYPASS, TRACK_OCT_DOWN,
    TRACK_OCT_PROB, TRACK_OCT_UP, TRACK_PEDAL, TRACK_PEDAL_STEP, TRACK_PROB_A, TRACK_PROB_B,
    TRACK_RANDOMNESS, TRACK_STABILITY, TRACK_STEP_COND, TRACK_STEP_PROB, TRACK_STRIDE,
    TRACK_VELOCITY,
};
pub use quantize::{
    effective_quantize, quantized_duration, snap_division_subclock, snap_step_subclock,
    TrackCache, QUANTIZE_VALUES,
};
pub use random::Rand32;
pub use scales::{quantize_to_scale, Scale};

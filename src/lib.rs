//! gridloop: a multi-track MIDI step recorder/sequencer engine.
//!
//! The engine consumes a clock trigger and a run gate from CV buses,
//! advances independent per-track playheads through recorded step patterns,
//! and emits MIDI through a host-provided sink. Live input is recorded into
//! the step grid with sub-clock quantization; a transport-independent step
//! record mode and a four-mode pattern generator operate on the same grid.
//!
//! Crate layout follows the engine/IR split: [`gl_core`] holds the shared
//! data model, [`gl_engine`] the runtime. This crate re-exports the public
//! surface.
//!
//! ```no_run
//! use gridloop::{calculate_requirements, default_params, Engine, EngineSpec, MidiLog, ParamView};
//!
//! let spec = EngineSpec { num_tracks: 4, sample_rate: 48_000, seed: 0xACE1 };
//! let _req = calculate_requirements(&spec);
//! let mut engine = Engine::new(spec);
//! let v = default_params(engine.num_tracks());
//! let mut sink = MidiLog::new();
//!
//! // One audio block: 32 frames of bus data, bus-major.
//! let bus_frames = vec![0.0f32; 28 * 32];
//! let params = ParamView::new(&v, engine.num_tracks());
//! engine.step(&params, &bus_frames, 32 / 4, &mut sink);
//! ```

pub use gl_core::{
    default_params, effective_quantize, global_specs, quantize_to_scale, quantized_duration,
    snap_division_subclock, snap_step_subclock, total_params, track_param_index, track_specs,
    with_channel, DestMask, MidiLog, MidiMessage, MidiSink, NoteEvent, ParamSpec, ParamView,
    Rand32, RecMode, Scale, StepEvents, TrackCache, TrackData, TrackParams, GLOBAL_PARAMS,
    MAX_EVENTS_PER_STEP, MAX_STEPS, MAX_TRACKS, MIN_TRACKS, PARAMS_PER_TRACK, QUANTIZE_VALUES,
};
pub use gl_engine::{
    calculate_requirements, eval_trig_condition, from_json, to_json, DelayedNote, Direction,
    Engine, EngineSpec, EventSnapshot, HeldNote, MemoryRequirements, PlayingNote, RecordState,
    Snapshot, SnapshotError, TrackSnapshot, TrackState, TransportState, COND_FIXED,
    GATE_THRESHOLD_HIGH, GATE_THRESHOLD_LOW, MAX_DELAYED_NOTES, SNAPSHOT_VERSION,
};

/// Parameter index constants, re-exported as a namespace for host bridges.
pub mod params {
    pub use gl_core::{
        PARAM_CLEAR_ALL, PARAM_CLEAR_TRACK, PARAM_CLOCK_INPUT, PARAM_DIVISION, PARAM_FILL,
        PARAM_GENERATE, PARAM_GEN_BIAS, PARAM_GEN_DENSITY, PARAM_GEN_GATE_RAND, PARAM_GEN_MODE,
        PARAM_GEN_NOTE_RAND, PARAM_GEN_RANGE, PARAM_GEN_TIES, PARAM_GEN_VEL_VAR,
        PARAM_MIDI_IN_CH, PARAM_PANIC_ON_WRAP, PARAM_RECORD, PARAM_REC_MODE, PARAM_REC_SNAP,
        PARAM_REC_TRACK, PARAM_RUN_INPUT, PARAM_SCALE_ROOT, PARAM_SCALE_TYPE, TRACK_CHANNEL,
        TRACK_CLOCK_DIV, TRACK_COND_A, TRACK_COND_B, TRACK_COND_STEP_A, TRACK_COND_STEP_B,
        TRACK_DESTINATION, TRACK_DIRECTION, TRACK_ENABLED, TRACK_GRAVITY, TRACK_GRAVITY_ANCHOR,
        TRACK_HUMANIZE, TRACK_LENGTH, TRACK_MOTION, TRACK_NO_REPEAT, TRACK_OCT_BYPASS,
        TRACK_OCT_DOWN, TRACK_OCT_PROB, TRACK_OCT_UP, TRACK_PEDAL, TRACK_PEDAL_STEP,
        TRACK_PROB_A, TRACK_PROB_B, TRACK_RANDOMNESS, TRACK_STABILITY, TRACK_STEP_COND,
        TRACK_STEP_PROB, TRACK_STRIDE, TRACK_VELOCITY,
    };
}

//! Playback engine for the gridloop MIDI step sequencer.
//!
//! Drives per-track playheads from an edge-detected run gate and clock,
//! records live MIDI into the step grid, and emits note events through the
//! host's [`gl_core::MidiSink`]. Everything here runs on the host's
//! real-time thread: after construction the engine neither blocks nor
//! allocates.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod directions;
mod engine;
mod generate;
mod modifiers;
mod playback;
mod recording;
mod snapshot;
mod track;

pub use directions::{Direction, BROWNIAN_DELTA_MAX, BROWNIAN_DELTA_MIN};
pub use engine::{
    calculate_requirements, Engine, EngineSpec, MemoryRequirements, RecordState, TransportState,
    GATE_THRESHOLD_HIGH, GATE_THRESHOLD_LOW,
};
pub use playback::{eval_trig_condition, DelayedNote, COND_FIXED, MAX_DELAYED_NOTES};
pub use recording::HeldNote;
pub use snapshot::{
    from_json, to_json, EventSnapshot, Snapshot, SnapshotError, TrackSnapshot, SNAPSHOT_VERSION,
};
pub use track::{PlayingNote, TrackState};

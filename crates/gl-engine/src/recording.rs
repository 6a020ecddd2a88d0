//! Live and step recording.
//!
//! A note-on opens a [`HeldNote`] snapshotting the quantization context it
//! arrived in; the matching note-off (or a forced finalize) resolves the
//! duration and commits the event to the step grid. First writer wins per
//! step: a note number already present in the target bucket is not replaced.

use gl_core::{
    quantized_duration, snap_division_subclock, snap_step_subclock, NoteEvent, ParamView,
};

use crate::track::TrackState;

/// An in-progress note between note-on and note-off.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeldNote {
    pub note: u8,
    pub velocity: u8,
    pub track: u8,
    /// Division-snapped step the event will be stored at
    pub quantized_step: u8,
    /// Step-snapped position the duration is measured from
    pub effective_step: u8,
    pub quantize: u8,
    pub loop_len: u8,
    pub raw_step: u8,
    pub active: bool,
}

/// Quantization context captured at the moment a MIDI event arrives.
#[derive(Clone, Copy, Debug)]
pub struct RecordContext {
    pub track: usize,
    pub loop_len: i32,
    pub quantize: i32,
    pub snap_threshold: f32,
    pub raw_step: i32,
    pub step_fraction: f32,
}

impl RecordContext {
    /// Snapshot the recording context for a track. `step_time` is how long
    /// the current step has been sounding; `step_duration` the measured
    /// clock period.
    pub fn capture(
        params: &ParamView,
        track: usize,
        ts: &mut TrackState,
        step_time: f32,
        step_duration: f32,
    ) -> Self {
        let (quantize, loop_len) = ts.cache.get(params, track);
        let raw_step = (ts.step as i32).clamp(1, loop_len);
        let step_fraction = if step_duration > 0.0 {
            (step_time / step_duration).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            track,
            loop_len,
            quantize,
            snap_threshold: params.rec_snap_threshold(),
            raw_step,
            step_fraction,
        }
    }
}

/// Open a held note for a live note-on.
pub fn record_note_on(held: &mut [HeldNote; 128], ctx: &RecordContext, note: u8, velocity: u8) {
    let h = &mut held[note as usize & 127];
    h.active = true;
    h.note = note;
    h.velocity = velocity;
    h.track = ctx.track as u8;
    h.quantized_step = snap_division_subclock(
        ctx.raw_step,
        ctx.step_fraction,
        ctx.quantize,
        ctx.snap_threshold,
        ctx.loop_len,
    ) as u8;
    h.effective_step =
        snap_step_subclock(ctx.raw_step, ctx.step_fraction, ctx.snap_threshold, ctx.loop_len) as u8;
    h.quantize = ctx.quantize as u8;
    h.loop_len = ctx.loop_len as u8;
    h.raw_step = ctx.raw_step as u8;
}

/// Duration from a held note's start to an end step, wrapped and quantized.
fn resolve_duration(h: &HeldNote, end_step: i32) -> u16 {
    let loop_len = h.loop_len as i32;
    let mut duration = end_step - h.effective_step as i32;
    if duration < 0 {
        duration += loop_len;
    }
    duration = quantized_duration(duration.max(1), h.quantize as i32);
    let max_duration = loop_len - h.quantized_step as i32 + 1;
    duration.min(max_duration).max(1) as u16
}

/// Commit a held note into its track's step grid.
fn commit(h: &HeldNote, tracks: &mut [TrackState], duration: u16) {
    let track = (h.track as usize).min(tracks.len() - 1);
    let step_idx = (h.quantized_step.max(1) - 1) as usize;
    tracks[track].data.step_mut(step_idx).insert(NoteEvent {
        note: h.note,
        velocity: h.velocity,
        duration,
    });
}

/// Close a held note on its live note-off.
pub fn record_note_off(
    held: &mut [HeldNote; 128],
    tracks: &mut [TrackState],
    ctx: &RecordContext,
    note: u8,
) {
    let h = held[note as usize & 127];
    if !h.active {
        return;
    }
    let end_step = snap_step_subclock(
        ctx.raw_step,
        ctx.step_fraction,
        ctx.snap_threshold,
        h.loop_len as i32,
    );
    let duration = resolve_duration(&h, end_step);
    commit(&h, tracks, duration);
    held[note as usize & 127].active = false;
}

/// Close every held note using its track's current step as a virtual end.
/// Called when recording or the transport stops.
pub fn finalize_held_notes(held: &mut [HeldNote; 128], tracks: &mut [TrackState]) {
    for i in 0..held.len() {
        let h = held[i];
        if !h.active {
            continue;
        }
        let track = (h.track as usize).min(tracks.len() - 1);
        let end_step = (tracks[track].step as i32).clamp(1, h.loop_len as i32);
        let duration = resolve_duration(&h, end_step);
        commit(&h, tracks, duration);
        held[i].active = false;
    }
}

/// Drop all held notes without committing. Called when the record track
/// changes mid-capture.
pub fn clear_held_notes(held: &mut [HeldNote; 128]) {
    for h in held.iter_mut() {
        h.active = false;
    }
}

/// Write a step-record note at the cursor's division cell.
///
/// The cursor is 1-based over division steps; the event gets one division
/// of duration, clamped to the end of the loop.
pub fn step_record_note_on(
    ts: &mut TrackState,
    params: &ParamView,
    track: usize,
    cursor: u8,
    note: u8,
    velocity: u8,
) {
    let (quantize, loop_len) = ts.cache.get(params, track);
    let raw_step = ((cursor.max(1) as i32 - 1) * quantize + 1).min(loop_len);
    let duration = quantize.min(loop_len - raw_step + 1).max(1) as u16;
    ts.data.step_mut((raw_step - 1) as usize).insert(NoteEvent {
        note,
        velocity,
        duration,
    });
}

/// Advance the step-record cursor past a fully released chord, wrapping to
/// the first division cell.
pub fn advance_step_cursor(ts: &mut TrackState, params: &ParamView, track: usize, cursor: u8) -> u8 {
    let (quantize, loop_len) = ts.cache.get(params, track);
    let num_div_steps = (loop_len / quantize.max(1)).max(1) as u8;
    if cursor >= num_div_steps {
        1
    } else {
        cursor + 1
    }
}

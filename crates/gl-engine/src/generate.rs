//! Algorithmic track generation.
//!
//! Four modes, all in-place on the record track and all respecting the
//! active scale: New synthesizes a pattern from density/bias/spread
//! parameters, Reorder shuffles the notes over the existing rhythm,
//! Re-pitch redraws pitches over the existing rhythm, Invert mirrors the
//! step sequence.

use arrayvec::ArrayVec;

use gl_core::{quantize_to_scale, MidiSink, NoteEvent, ParamView, Rand32};

use crate::playback::{send_track_notes_off, DelayedNote, MAX_DELAYED_NOTES};
use crate::track::TrackState;

/// Generator scratch capacity: every step full of events.
const MAX_COLLECTED: usize = 128;

fn draw_note(params: &ParamView, rand: &mut Rand32) -> u8 {
    let spread = (params.gen_range() * params.gen_note_rand()) / 100;
    let note = if spread > 0 {
        params.gen_bias() + rand.range(-spread, spread)
    } else {
        params.gen_bias()
    };
    quantize_to_scale(note.clamp(0, 127) as u8, params.scale_root(), params.scale())
}

/// Mode 0: clear the track and roll a fresh pattern on the division grid.
fn generate_new(ts: &mut TrackState, params: &ParamView, track: usize, rand: &mut Rand32) {
    let density = params.gen_density();
    let vel_var = params.gen_vel_var();
    let ties = params.gen_ties();
    let gate_rand = params.gen_gate_rand();

    let (quantize, loop_len) = ts.cache.get(params, track);

    ts.data.clear();

    for s in 1..=loop_len {
        if quantize > 1 && (s - 1) % quantize != 0 {
            continue;
        }
        if rand.range(1, 100) > density {
            continue;
        }

        let note = draw_note(params, rand);

        // Velocity centered on 100.
        let vel_spread = (100 * vel_var) / 200;
        let velocity = if vel_spread > 0 {
            100 + rand.range(-vel_spread, vel_spread)
        } else {
            100
        }
        .clamp(1, 127) as u8;

        // One division of gate, randomly shortened.
        let max_dur = quantize.max(1);
        let min_dur = (max_dur - (max_dur * gate_rand) / 100).max(1);
        let duration = if min_dur < max_dur {
            rand.range(min_dur, max_dur)
        } else {
            max_dur
        } as u16;

        ts.data.step_mut((s - 1) as usize).insert(NoteEvent { note, velocity, duration });
    }

    // Second pass: ties stretch a step's events to reach the next occupied
    // step, wrapping around the loop.
    if ties > 0 {
        for s in 0..loop_len as usize {
            if ts.data.step(s).is_empty() {
                continue;
            }
            if rand.range(1, 100) > ties {
                continue;
            }
            let mut dist = 0;
            for d in 1..loop_len as usize {
                if !ts.data.step((s + d) % loop_len as usize).is_empty() {
                    dist = d;
                    break;
                }
            }
            if dist == 0 {
                continue;
            }
            for event in ts.data.step_mut(s).iter_mut() {
                event.duration = dist as u16;
            }
        }
    }
}

/// Mode 1: Fisher-Yates the notes over the occupied steps, keeping the
/// rhythm pattern.
fn generate_reorder(ts: &mut TrackState, params: &ParamView, track: usize, rand: &mut Rand32) {
    let (_, loop_len) = ts.cache.get(params, track);

    let mut collected: ArrayVec<NoteEvent, MAX_COLLECTED> = ArrayVec::new();
    let mut positions: ArrayVec<usize, MAX_COLLECTED> = ArrayVec::new();

    for s in 0..loop_len as usize {
        let step = ts.data.step(s);
        if !step.is_empty() && positions.try_push(s).is_err() {
            break;
        }
        for event in step.iter() {
            if collected.try_push(*event).is_err() {
                break;
            }
        }
    }
    if collected.is_empty() {
        return;
    }

    for i in (1..collected.len()).rev() {
        let j = rand.range(0, i as i32) as usize;
        collected.swap(i, j);
    }

    ts.data.clear();
    for (slot, s) in positions.iter().enumerate() {
        if let Some(event) = collected.get(slot) {
            ts.data.step_mut(*s).insert(*event);
        }
    }
}

/// Mode 2: redraw every pitch, keeping rhythm and velocity.
fn generate_repitch(ts: &mut TrackState, params: &ParamView, track: usize, rand: &mut Rand32) {
    let (_, loop_len) = ts.cache.get(params, track);
    for s in 0..loop_len as usize {
        // Duplicate notes produced by the redraw collapse via reinsertion.
        let redrawn: ArrayVec<NoteEvent, { gl_core::MAX_EVENTS_PER_STEP }> = ts
            .data
            .step(s)
            .iter()
            .map(|e| NoteEvent { note: draw_note(params, rand), ..*e })
            .collect();
        let step = ts.data.step_mut(s);
        step.clear();
        for event in redrawn {
            step.insert(event);
        }
    }
}

/// Mode 3: mirror the loop's steps, clamping durations to the space left
/// from each event's new position.
fn generate_invert(ts: &mut TrackState, params: &ParamView, track: usize) {
    let (_, loop_len) = ts.cache.get(params, track);
    let loop_len = loop_len as usize;

    let mut left = 0;
    let mut right = loop_len.saturating_sub(1);
    while left < right {
        ts.data.swap_steps(left, right);
        for (idx, bound) in [(left, loop_len - left), (right, loop_len - right)] {
            for event in ts.data.step_mut(idx).iter_mut() {
                event.duration = event.duration.min(bound as u16);
            }
        }
        left += 1;
        right -= 1;
    }
}

/// Run the configured generator mode against one track. The track's
/// sounding notes are released first.
pub fn execute(
    tracks: &mut [TrackState],
    delayed: &mut [DelayedNote; MAX_DELAYED_NOTES],
    params: &ParamView,
    track: usize,
    rand: &mut Rand32,
    sink: &mut dyn MidiSink,
) {
    if track >= tracks.len() {
        return;
    }
    send_track_notes_off(tracks, delayed, track, sink);

    let ts = &mut tracks[track];
    match params.gen_mode() {
        1 => generate_reorder(ts, params, track, rand),
        2 => generate_repitch(ts, params, track, rand),
        3 => generate_invert(ts, params, track),
        _ => generate_new(ts, params, track, rand),
    }
}

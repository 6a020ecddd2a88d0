//! Step playback: the per-track pipeline, trig conditions, octave jumps,
//! note emission, and the delayed-note scheduler behind humanization.

use arrayvec::ArrayVec;

use gl_core::{
    quantize_to_scale, with_channel, DestMask, MidiSink, NoteEvent, ParamView, TrackParams,
    ALL_NOTES_OFF_CC, CONTROL_CHANGE, MAX_EVENTS_PER_STEP, NOTE_OFF, NOTE_ON,
};

use crate::directions::{brownian_step, generate_shuffle_order, Direction};
use crate::modifiers;
use crate::track::TrackState;

/// Humanization delay pool size.
pub const MAX_DELAYED_NOTES: usize = 64;

/// Trig condition code for Fixed: always fires, bypasses step probability
/// and the octave jump.
pub const COND_FIXED: i16 = 75;

/// A note-on waiting out its humanization delay.
#[derive(Clone, Copy, Debug, Default)]
pub struct DelayedNote {
    pub note: u8,
    pub velocity: u8,
    pub track: u8,
    pub out_ch: i16,
    pub duration: u16,
    /// Remaining delay in milliseconds
    pub delay_ms: u16,
    pub dest: DestMask,
    pub active: bool,
}

// A:B ratio condition lookup: code 1..=35 maps to (period, position) for
// periods 2..8 in the order 1:2, 2:2, 1:3, 2:3, 3:3, ... 8:8.
const NUM_RATIOS: i16 = 35;
const RATIO_PERIOD: [u8; 35] = [
    2, 2, //
    3, 3, 3, //
    4, 4, 4, 4, //
    5, 5, 5, 5, 5, //
    6, 6, 6, 6, 6, 6, //
    7, 7, 7, 7, 7, 7, 7, //
    8, 8, 8, 8, 8, 8, 8, 8,
];
const RATIO_POS: [u8; 35] = [
    0, 1, //
    0, 1, 2, //
    0, 1, 2, 3, //
    0, 1, 2, 3, 4, //
    0, 1, 2, 3, 4, 5, //
    0, 1, 2, 3, 4, 5, 6, //
    0, 1, 2, 3, 4, 5, 6, 7,
];

/// Evaluate a trig condition code against the loop count and Fill flag.
///
/// The integer encoding is a contract shared with the parameter UI and
/// persistence: 0 Always, 1-35 A:B ratios, 36-70 their negations, 71 First,
/// 72 !First, 73 Fill, 74 !Fill, 75 Fixed.
pub fn eval_trig_condition(cond: i16, loop_count: u32, fill: bool) -> bool {
    if cond <= 0 {
        return true;
    }
    if cond <= NUM_RATIOS {
        let idx = (cond - 1) as usize;
        return loop_count % RATIO_PERIOD[idx] as u32 == RATIO_POS[idx] as u32;
    }
    if cond <= NUM_RATIOS * 2 {
        let idx = (cond - NUM_RATIOS - 1) as usize;
        return loop_count % RATIO_PERIOD[idx] as u32 != RATIO_POS[idx] as u32;
    }
    match cond {
        71 => loop_count == 0,
        72 => loop_count != 0,
        73 => fill,
        74 => !fill,
        // Fixed fires always; its probability/octave bypass is applied at
        // the emission site.
        _ => true,
    }
}

/// Advance all pending delayed notes by the elapsed block time, firing any
/// that come due.
pub fn process_delayed_notes(
    delayed: &mut [DelayedNote; MAX_DELAYED_NOTES],
    tracks: &mut [TrackState],
    dt: f32,
    sink: &mut dyn MidiSink,
) {
    let decrement = ((dt * 1000.0) as u16).max(1);

    for dn in delayed.iter_mut() {
        if !dn.active {
            continue;
        }
        if dn.delay_ms <= decrement {
            sink.send(dn.dest, with_channel(NOTE_ON, dn.out_ch), dn.note, dn.velocity);

            let track = (dn.track as usize).min(tracks.len() - 1);
            let note = (dn.note & 127) as usize;
            let ts = &mut tracks[track];
            ts.playing[note] = crate::track::PlayingNote {
                remaining: dn.duration,
                out_ch: dn.out_ch,
                dest: dn.dest,
                active: true,
            };
            ts.active_notes[note] = dn.velocity;
            ts.active_vel = dn.velocity;

            dn.active = false;
        } else {
            dn.delay_ms -= decrement;
        }
    }
}

/// First-fit insert into the delay pool. A full pool drops the note.
fn schedule_delayed_note(delayed: &mut [DelayedNote; MAX_DELAYED_NOTES], note: DelayedNote) -> bool {
    for slot in delayed.iter_mut() {
        if !slot.active {
            *slot = note;
            return true;
        }
    }
    false
}

/// Count down sounding notes; send note-offs as durations elapse.
fn process_note_durations(ts: &mut TrackState, sink: &mut dyn MidiSink) {
    for n in 0..128 {
        let pn = ts.playing[n];
        if !pn.active {
            continue;
        }
        if pn.remaining <= 1 {
            sink.send(pn.dest, with_channel(NOTE_OFF, pn.out_ch), n as u8, 0);
            ts.playing[n].active = false;
            ts.active_notes[n] = 0;
            ts.refresh_active_vel();
        } else {
            ts.playing[n].remaining -= 1;
        }
    }
}

/// Is this note sounding on another track with the same route?
fn note_shared_by_other_track(
    tracks: &[TrackState],
    track: usize,
    note: usize,
    out_ch: i16,
    dest: DestMask,
) -> bool {
    tracks.iter().enumerate().any(|(t, ts)| {
        t != track && ts.playing[note].active && ts.playing[note].out_ch == out_ch
            && ts.playing[note].dest == dest
    })
}

/// Silence one track: note-offs for everything it is sounding (skipping
/// notes another track still holds on the same route) and cancel its pending
/// delayed notes.
pub fn send_track_notes_off(
    tracks: &mut [TrackState],
    delayed: &mut [DelayedNote; MAX_DELAYED_NOTES],
    track: usize,
    sink: &mut dyn MidiSink,
) {
    for n in 0..128 {
        let pn = tracks[track].playing[n];
        if pn.active && !note_shared_by_other_track(tracks, track, n, pn.out_ch, pn.dest) {
            sink.send(pn.dest, with_channel(NOTE_OFF, pn.out_ch), n as u8, 0);
        }
        tracks[track].playing[n].active = false;
        tracks[track].active_notes[n] = 0;
    }
    tracks[track].active_vel = 0;

    for dn in delayed.iter_mut() {
        if dn.active && dn.track as usize == track {
            dn.active = false;
        }
    }
}

/// All Notes Off on every track's current channel and destination.
pub fn send_all_notes_off(params: &ParamView, sink: &mut dyn MidiSink) {
    for t in 0..params.num_tracks() {
        let tp = params.track(t);
        let dest = DestMask::from_param(tp.destination());
        sink.send(dest, with_channel(CONTROL_CHANGE, tp.channel()), ALL_NOTES_OFF_CC, 0);
    }
}

/// Panic: global notes-off plus a hard reset of all outgoing note state.
pub fn panic_all(
    tracks: &mut [TrackState],
    delayed: &mut [DelayedNote; MAX_DELAYED_NOTES],
    params: &ParamView,
    sink: &mut dyn MidiSink,
) {
    send_all_notes_off(params, sink);
    for ts in tracks.iter_mut() {
        ts.clear_playing();
    }
    for dn in delayed.iter_mut() {
        dn.active = false;
    }
}

/// Base step from the direction mode; Brownian and Shuffle route through
/// their positions in track state.
fn calculate_track_step(ts: &mut TrackState, dir: Direction, loop_len: i32, stride: i32) -> i32 {
    match dir {
        Direction::Brownian => {
            if ts.clock_count == 1 {
                ts.brownian_pos = 1;
            } else {
                ts.brownian_pos = brownian_step(ts.brownian_pos as i32, loop_len, &mut ts.rand) as u8;
            }
            ts.brownian_pos as i32
        }
        Direction::Shuffle => {
            if ts.shuffle_pos as i32 > loop_len {
                generate_shuffle_order(&mut ts.shuffle_order, loop_len as usize, &mut ts.rand);
                ts.shuffle_pos = 1;
            }
            let step = ts.shuffle_order[(ts.shuffle_pos - 1) as usize] as i32;
            ts.shuffle_pos += 1;
            step.clamp(1, loop_len)
        }
        _ => dir.base_step(ts.clock_count, loop_len, stride, &mut ts.rand),
    }
}

/// Pitch shift in semitones for the octave jump. Rolled once per step
/// trigger; every event in the step shares the shift.
fn calculate_octave_jump(ts: &mut TrackState, tp: &TrackParams) -> i32 {
    let down = tp.oct_down();
    let up = tp.oct_up();
    if down == 0 && up == 0 {
        return 0;
    }

    ts.octave_play_count += 1;

    let bypass = tp.oct_bypass();
    if bypass > 0 && ts.octave_play_count % bypass == 0 {
        return 0;
    }

    if ts.rand.unit_float() * 100.0 < tp.oct_prob() as f32 {
        ts.rand.range(-down, up) * 12
    } else {
        0
    }
}

/// Send or schedule one note of the current step.
#[allow(clippy::too_many_arguments)]
fn emit_note(
    ts: &mut TrackState,
    delayed: &mut [DelayedNote; MAX_DELAYED_NOTES],
    params: &ParamView,
    track: usize,
    event: &NoteEvent,
    vel_offset: i32,
    humanize: i32,
    out_ch: i16,
    dest: DestMask,
    note_shift: i32,
    sink: &mut dyn MidiSink,
) {
    let shifted = (event.note as i32 + note_shift).clamp(0, 127) as u8;
    let note = quantize_to_scale(shifted, params.scale_root(), params.scale());
    let velocity = (event.velocity as i32 + vel_offset).clamp(0, 127) as u8;
    let delay = if humanize > 0 { ts.rand.range(0, humanize) } else { 0 };

    if delay == 0 {
        sink.send(dest, with_channel(NOTE_ON, out_ch), note, velocity);
        ts.playing[note as usize] = crate::track::PlayingNote {
            remaining: event.duration,
            out_ch,
            dest,
            active: true,
        };
        ts.active_notes[note as usize] = velocity;
        ts.active_vel = velocity;
    } else {
        schedule_delayed_note(
            delayed,
            DelayedNote {
                note,
                velocity,
                track: track as u8,
                out_ch,
                duration: event.duration,
                delay_ms: delay as u16,
                dest,
                active: true,
            },
        );
    }
}

/// Process one clock tick for one track: durations, the step pipeline, wrap
/// accounting, trig gating, and emission.
pub fn process_track(
    tracks: &mut [TrackState],
    delayed: &mut [DelayedNote; MAX_DELAYED_NOTES],
    params: &ParamView,
    track: usize,
    panic_on_wrap: bool,
    sink: &mut dyn MidiSink,
) {
    let tp = params.track(track);
    let loop_len = tp.length();
    let out_ch = tp.channel();
    let dest = DestMask::from_param(tp.destination());

    process_note_durations(&mut tracks[track], sink);

    // A track being switched off releases everything it was sounding.
    let enabled = tp.enabled();
    if !enabled && tracks[track].last_enabled {
        send_track_notes_off(tracks, delayed, track, sink);
    }
    tracks[track].last_enabled = enabled;

    tracks[track].clock_count += 1;
    let prev_pos = tracks[track].step as i32;

    // Step pipeline: direction, then continuous modifiers, then binary
    // filters. No-Repeat compares against the previous cycle's final step.
    let dir = Direction::from_param(tp.direction());
    let ts = &mut tracks[track];
    let base_step = calculate_track_step(ts, dir, loop_len, tp.stride());
    let modified = modifiers::apply_continuous(&tp, base_step, ts.last_step as i32, loop_len, &mut ts.rand);
    let final_step = modifiers::apply_binary(&tp, modified, ts.last_step as i32, loop_len);

    ts.last_step = final_step as u8;
    ts.step = final_step as u8;

    let wrapped = dir.wraps(prev_pos, final_step, loop_len, ts.clock_count);
    if wrapped && ts.clock_count > 1 {
        ts.loop_count += 1;
    }
    if wrapped && panic_on_wrap {
        panic_all(tracks, delayed, params, sink);
    }

    if !enabled {
        return;
    }
    let fill = params.fill();
    let loop_count = tracks[track].loop_count;

    // The per-track condition gates the whole track; per-step overrides
    // replace it on their steps.
    if !eval_trig_condition(tp.step_cond(), loop_count, fill) {
        return;
    }
    let on_step_a = tp.cond_step_a() > 0 && final_step == tp.cond_step_a();
    let on_step_b = tp.cond_step_b() > 0 && final_step == tp.cond_step_b();
    let mut step_cond_met = true;
    if on_step_a {
        step_cond_met = eval_trig_condition(tp.cond_a(), loop_count, fill);
    }
    if on_step_b {
        step_cond_met = eval_trig_condition(tp.cond_b(), loop_count, fill);
    }
    if !step_cond_met {
        return;
    }

    // Fixed on either the track condition or an applicable override wins:
    // probability forced to 100 and the octave jump bypassed.
    let mut fixed = tp.step_cond() == COND_FIXED;
    if on_step_a && tp.cond_a() == COND_FIXED {
        fixed = true;
    }
    if on_step_b && tp.cond_b() == COND_FIXED {
        fixed = true;
    }

    let mut prob = tp.step_prob();
    if on_step_a {
        prob = tp.prob_a();
    }
    if on_step_b {
        prob = tp.prob_b();
    }
    if fixed {
        prob = 100;
    }

    if prob < 100 && (tracks[track].rand.unit_float() * 100.0) as i32 >= prob {
        return;
    }

    let step_idx = (final_step - 1).clamp(0, gl_core::MAX_STEPS as i32 - 1) as usize;
    let events: ArrayVec<NoteEvent, MAX_EVENTS_PER_STEP> =
        tracks[track].data.step(step_idx).iter().copied().collect();
    if events.is_empty() {
        return;
    }

    let note_shift = if fixed {
        0
    } else {
        calculate_octave_jump(&mut tracks[track], &tp)
    };

    for event in &events {
        emit_note(
            &mut tracks[track],
            delayed,
            params,
            track,
            event,
            tp.velocity(),
            tp.humanize(),
            out_ch,
            dest,
            note_shift,
            sink,
        );
    }
}

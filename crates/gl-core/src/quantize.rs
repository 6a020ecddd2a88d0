//! Recording quantization: division math, sub-clock snapping, duration
//! rounding, and the per-track cache of derived values.

use crate::params::ParamView;

/// Division parameter values (index 0-4 -> steps per division).
pub const QUANTIZE_VALUES: [i16; 5] = [1, 2, 4, 8, 16];

/// Largest division `q <= target` that divides `loop_len` exactly.
///
/// A division that does not divide the loop would leave a short last cell,
/// so the target is walked down until one fits. Worst case answer is 1.
pub fn effective_quantize(loop_len: i32, target: i32) -> i32 {
    let max_q = target.min(loop_len);
    for q in (1..=max_q.max(1)).rev() {
        if loop_len % q == 0 {
            return q;
        }
    }
    1
}

/// Snap a raw step to itself or the next step, by how far into the step the
/// event landed. Wraps to 1 past the loop end.
pub fn snap_step_subclock(raw_step: i32, step_fraction: f32, threshold: f32, loop_len: i32) -> i32 {
    if step_fraction < threshold {
        return raw_step;
    }
    let snapped = raw_step + 1;
    if snapped > loop_len {
        1
    } else {
        snapped
    }
}

/// Snap a raw step to the start of its division, or the next division when
/// the event landed at least `threshold` of the way through it. Wraps to 1
/// past the loop end.
pub fn snap_division_subclock(
    raw_step: i32,
    step_fraction: f32,
    quantize: i32,
    threshold: f32,
    loop_len: i32,
) -> i32 {
    let quantize = quantize.max(1);
    let step_in_division = (raw_step - 1) % quantize;
    let division_position = (step_in_division as f32 + step_fraction) / quantize as f32;
    let current_division = (raw_step - 1) / quantize;

    let mut quantized_step = current_division * quantize + 1;
    if division_position >= threshold {
        quantized_step = (current_division + 1) * quantize + 1;
        if quantized_step > loop_len {
            quantized_step = 1;
        }
    }
    quantized_step
}

/// Round a duration to the nearest multiple of the division, never below one
/// division.
pub fn quantized_duration(duration: i32, quantize: i32) -> i32 {
    if quantize <= 1 {
        return duration;
    }
    let rounded = ((duration + quantize / 2) / quantize) * quantize;
    rounded.max(quantize)
}

/// Cached derived values for one track.
///
/// `effective_quantize` is recomputed only when the track length or the
/// global division changes; the MIDI intake path reads it per note.
#[derive(Clone, Copy, Debug)]
pub struct TrackCache {
    effective_quantize: u8,
    loop_len: u8,
    dirty: bool,
}

impl TrackCache {
    pub fn new() -> Self {
        Self { effective_quantize: 1, loop_len: 1, dirty: true }
    }

    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// `(effective_quantize, loop_len)` for the track, refreshing if stale.
    pub fn get(&mut self, params: &ParamView, track: usize) -> (i32, i32) {
        if self.dirty {
            let tp = params.track(track);
            let loop_len = tp.length();
            let target = QUANTIZE_VALUES[params.division() as usize] as i32;
            self.effective_quantize = effective_quantize(loop_len, target) as u8;
            self.loop_len = loop_len as u8;
            self.dirty = false;
        }
        (self.effective_quantize as i32, self.loop_len as i32)
    }
}

impl Default for TrackCache {
    fn default() -> Self {
        Self::new()
    }
}

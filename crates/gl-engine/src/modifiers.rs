//! Step modifier pipeline.
//!
//! Continuous modifiers are each independently probabilistic, so their order
//! changes the output distribution. The order here is a contract:
//! Stability -> Motion -> Randomness -> Gravity -> Pedal, then the binary
//! No-Repeat filter on the result.

use gl_core::{Rand32, TrackParams};

/// Apply the continuous modifiers to a base step.
///
/// `last_step` is the previous cycle's final step (0 if the track has not
/// played yet). Returns a step in `1..=loop_len`.
pub fn apply_continuous(
    tp: &TrackParams,
    base_step: i32,
    last_step: i32,
    loop_len: i32,
    rand: &mut Rand32,
) -> i32 {
    let mut step = base_step;

    // Stability: chance to hold the previous step.
    let stability = tp.stability();
    if stability > 0 && rand.unit_float() * 100.0 < stability as f32 && last_step > 0 {
        step = last_step;
    }

    // Motion: jitter around the current position.
    let motion = tp.motion();
    if motion > 0 {
        let max_jitter = ((loop_len * motion) / 100).max(1);
        let jitter = rand.range(-max_jitter, max_jitter);
        step = (step - 1 + jitter).rem_euclid(loop_len) + 1;
    }

    // Randomness: chance to override with any step.
    let randomness = tp.randomness();
    if randomness > 0 && rand.unit_float() * 100.0 < randomness as f32 {
        step = rand.range(1, loop_len);
    }

    // Gravity: chance to drift one position toward the anchor.
    let gravity = tp.gravity();
    if gravity > 0 && rand.unit_float() * 100.0 < gravity as f32 {
        let anchor = tp.gravity_anchor(loop_len);
        let diff = anchor - step;
        if diff != 0 {
            step += if diff > 0 { 1 } else { -1 };
            step = (step - 1).rem_euclid(loop_len) + 1;
        }
    }

    // Pedal: chance to return to the pedal step.
    let pedal = tp.pedal();
    if pedal > 0 && rand.unit_float() * 100.0 < pedal as f32 {
        step = tp.pedal_step(loop_len);
    }

    step
}

/// Apply the binary filters. No-Repeat advances one step when the pipeline
/// landed on the previous cycle's final step.
pub fn apply_binary(tp: &TrackParams, step: i32, prev_step: i32, loop_len: i32) -> i32 {
    if tp.no_repeat() && step == prev_step && loop_len > 1 {
        step % loop_len + 1
    } else {
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gl_core::{default_params, track_param_index, ParamView, TRACK_GRAVITY,
        TRACK_GRAVITY_ANCHOR, TRACK_MOTION, TRACK_NO_REPEAT, TRACK_PEDAL, TRACK_PEDAL_STEP,
        TRACK_RANDOMNESS, TRACK_STABILITY};

    fn with(offsets: &[(usize, i16)]) -> alloc::vec::Vec<i16> {
        let mut v = default_params(1);
        for &(offset, value) in offsets {
            v[track_param_index(0, offset)] = value;
        }
        v
    }

    #[test]
    fn all_modifiers_off_is_identity() {
        let v = with(&[]);
        let params = ParamView::new(&v, 1);
        let mut rand = Rand32::new(1);
        for base in 1..=16 {
            assert_eq!(apply_continuous(&params.track(0), base, 3, 16, &mut rand), base);
        }
    }

    #[test]
    fn full_stability_holds_last_step() {
        let v = with(&[(TRACK_STABILITY, 100)]);
        let params = ParamView::new(&v, 1);
        let mut rand = Rand32::new(1);
        assert_eq!(apply_continuous(&params.track(0), 5, 3, 16, &mut rand), 3);
        // With no last step yet, the base step survives.
        assert_eq!(apply_continuous(&params.track(0), 5, 0, 16, &mut rand), 5);
    }

    #[test]
    fn stability_is_monotone_in_hold_rate() {
        let count_holds = |stability: i16| {
            let v = with(&[(TRACK_STABILITY, stability)]);
            let params = ParamView::new(&v, 1);
            let mut rand = Rand32::new(77);
            (0..1000)
                .filter(|_| apply_continuous(&params.track(0), 5, 3, 16, &mut rand) == 3)
                .count()
        };
        let low = count_holds(10);
        let mid = count_holds(50);
        let high = count_holds(90);
        assert!(low < mid && mid < high);
    }

    #[test]
    fn motion_stays_within_jitter_radius() {
        let v = with(&[(TRACK_MOTION, 25)]);
        let params = ParamView::new(&v, 1);
        let mut rand = Rand32::new(9);
        // loop 16, motion 25% -> max jitter 4 around base 8.
        for _ in 0..500 {
            let s = apply_continuous(&params.track(0), 8, 0, 16, &mut rand);
            assert!((4..=12).contains(&s), "jitter escaped: {s}");
        }
    }

    #[test]
    fn full_randomness_spans_the_loop() {
        let v = with(&[(TRACK_RANDOMNESS, 100)]);
        let params = ParamView::new(&v, 1);
        let mut rand = Rand32::new(4);
        let mut seen = [false; 9];
        for _ in 0..500 {
            let s = apply_continuous(&params.track(0), 1, 0, 8, &mut rand);
            seen[s as usize] = true;
        }
        assert!(seen[1..=8].iter().all(|&b| b));
    }

    #[test]
    fn full_gravity_steps_toward_anchor() {
        let v = with(&[(TRACK_GRAVITY, 100), (TRACK_GRAVITY_ANCHOR, 8)]);
        let params = ParamView::new(&v, 1);
        let mut rand = Rand32::new(2);
        assert_eq!(apply_continuous(&params.track(0), 5, 0, 16, &mut rand), 6);
        assert_eq!(apply_continuous(&params.track(0), 12, 0, 16, &mut rand), 11);
        // Already at the anchor: no move.
        assert_eq!(apply_continuous(&params.track(0), 8, 0, 16, &mut rand), 8);
    }

    #[test]
    fn full_pedal_returns_pedal_step() {
        let v = with(&[(TRACK_PEDAL, 100), (TRACK_PEDAL_STEP, 7)]);
        let params = ParamView::new(&v, 1);
        let mut rand = Rand32::new(6);
        for base in 1..=16 {
            assert_eq!(apply_continuous(&params.track(0), base, 0, 16, &mut rand), 7);
        }
    }

    #[test]
    fn no_repeat_advances_and_wraps() {
        let v = with(&[(TRACK_NO_REPEAT, 1)]);
        let params = ParamView::new(&v, 1);
        let tp = params.track(0);
        assert_eq!(apply_binary(&tp, 5, 5, 8), 6);
        assert_eq!(apply_binary(&tp, 8, 8, 8), 1);
        assert_eq!(apply_binary(&tp, 5, 4, 8), 5);
        // Single-step loop cannot avoid repeating.
        assert_eq!(apply_binary(&tp, 1, 1, 1), 1);
    }
}

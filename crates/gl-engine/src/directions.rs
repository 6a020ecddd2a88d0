//! Playback directions.
//!
//! Ten directions are pure functions of the clock count; Brownian and
//! Shuffle carry state in [`crate::TrackState`] and are dispatched by the
//! playback pipeline. Each direction pairs with a wrap predicate that tells
//! the loop counter when a cycle has completed.

use gl_core::Rand32;

/// Brownian walk step delta range.
pub const BROWNIAN_DELTA_MIN: i32 = -2;
pub const BROWNIAN_DELTA_MAX: i32 = 2;

/// Playback order through the loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
    Pendulum,
    PingPong,
    Stride,
    OddEven,
    Hopscotch,
    Converge,
    Diverge,
    Brownian,
    Random,
    Shuffle,
}

impl Direction {
    /// Map a direction parameter value; out-of-range reads as Forward.
    pub fn from_param(value: i16) -> Direction {
        match value {
            1 => Direction::Reverse,
            2 => Direction::Pendulum,
            3 => Direction::PingPong,
            4 => Direction::Stride,
            5 => Direction::OddEven,
            6 => Direction::Hopscotch,
            7 => Direction::Converge,
            8 => Direction::Diverge,
            9 => Direction::Brownian,
            10 => Direction::Random,
            11 => Direction::Shuffle,
            _ => Direction::Forward,
        }
    }

    /// 1-based step for a 1-based clock count.
    ///
    /// Stateful directions fall back to Forward here; the caller routes them
    /// through [`brownian_step`] / the shuffle order instead.
    pub fn base_step(self, clock_count: u32, loop_len: i32, stride: i32, rand: &mut Rand32) -> i32 {
        if loop_len <= 1 {
            return 1;
        }
        let c = clock_count.max(1) as i32;
        let len = loop_len;
        match self {
            Direction::Forward | Direction::Brownian | Direction::Shuffle => (c - 1) % len + 1,
            Direction::Reverse => len - (c - 1) % len,
            Direction::Pendulum => {
                let cycle = 2 * (len - 1);
                let pos = (c - 1) % cycle;
                if pos < len {
                    pos + 1
                } else {
                    2 * len - 1 - pos
                }
            }
            Direction::PingPong => {
                let cycle = 2 * len;
                let pos = (c - 1) % cycle;
                if pos < len {
                    pos + 1
                } else {
                    2 * len - pos
                }
            }
            Direction::Stride => ((c - 1) * stride) % len + 1,
            Direction::OddEven => {
                let pos = (c - 1) % len + 1;
                let num_odds = (len + 1) / 2;
                if pos <= num_odds {
                    (pos - 1) * 2 + 1
                } else {
                    (pos - num_odds) * 2
                }
            }
            Direction::Hopscotch => {
                let pos = (c - 1) % (len * 2) + 1;
                let step_index = (pos + 1) / 2;
                if pos % 2 == 1 {
                    (step_index - 1) % len + 1
                } else {
                    let next_forward = step_index % len + 1;
                    (next_forward - 2).rem_euclid(len) + 1
                }
            }
            Direction::Converge => {
                let pos = (c - 1) % len + 1;
                let pair = (pos + 1) / 2;
                if pos % 2 == 1 {
                    pair
                } else {
                    len - pair + 1
                }
            }
            Direction::Diverge => {
                let pos = (c - 1) % len + 1;
                let mid = (len + 1) / 2;
                let pair = (pos + 1) / 2;
                if pos % 2 == 1 {
                    mid - pair + 1
                } else {
                    mid + pair
                }
            }
            Direction::Random => rand.range(1, len),
        }
    }

    /// Did the move `prev -> curr` complete a loop cycle?
    ///
    /// Fires on the tick that finishes a traversal, so a run of `k * L`
    /// clocks counts exactly `k` wraps. Pendulum fires on each endpoint
    /// touch.
    pub fn wraps(self, prev: i32, curr: i32, loop_len: i32, clock_count: u32) -> bool {
        if prev < 1 {
            return false;
        }
        if loop_len <= 1 {
            return curr == 1;
        }
        let c = clock_count as i32;
        match self {
            Direction::Pendulum => {
                (curr == 1 && prev == 2) || (curr == loop_len && prev == loop_len - 1)
            }
            // Double-length cycles: a pass down and one back up.
            Direction::PingPong | Direction::Hopscotch => c % (2 * loop_len) == 0,
            // Everything else visits the loop once every loop_len clocks.
            Direction::Forward
            | Direction::Reverse
            | Direction::Stride
            | Direction::OddEven
            | Direction::Converge
            | Direction::Diverge
            | Direction::Brownian
            | Direction::Random
            | Direction::Shuffle => c % loop_len == 0,
        }
    }
}

/// Advance a Brownian walk: random delta in the configured range, zero
/// replaced by +1 so the walk always moves, wrapped into `1..=loop_len`.
pub fn brownian_step(current: i32, loop_len: i32, rand: &mut Rand32) -> i32 {
    let mut delta = rand.range(BROWNIAN_DELTA_MIN, BROWNIAN_DELTA_MAX);
    if delta == 0 {
        delta = 1;
    }
    (current + delta - 1).rem_euclid(loop_len.max(1)) + 1
}

/// Fisher-Yates a fresh permutation of `1..=loop_len` into `order`.
pub fn generate_shuffle_order(order: &mut [u8], loop_len: usize, rand: &mut Rand32) {
    let loop_len = loop_len.min(order.len());
    for (i, slot) in order.iter_mut().enumerate().take(loop_len) {
        *slot = (i + 1) as u8;
    }
    for i in (1..loop_len).rev() {
        let j = rand.range(0, i as i32) as usize;
        order.swap(i, j);
    }
}

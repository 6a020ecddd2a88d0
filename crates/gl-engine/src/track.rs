//! Per-track runtime state.

use gl_core::{DestMask, Rand32, TrackCache, TrackData, MAX_STEPS};

/// A note currently sounding on a track.
///
/// The route the note-on went out on is captured so the note-off follows it
/// even if the track's channel or destination parameter changes mid-note.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlayingNote {
    /// Remaining duration in clock ticks
    pub remaining: u16,
    /// Channel the note-on was sent with (1-16)
    pub out_ch: i16,
    /// Destination the note-on was sent to
    pub dest: DestMask,
    pub active: bool,
}

/// Everything the engine tracks per sequencer track.
#[derive(Clone, Debug)]
pub struct TrackState {
    /// Recorded step events
    pub data: TrackData,

    /// Duration countdown per note number
    pub playing: [PlayingNote; 128],
    /// Velocity of sounding notes (0 = silent), feeds the level meter
    pub active_notes: [u8; 128],

    /// Permutation consumed by the Shuffle direction
    pub shuffle_order: [u8; MAX_STEPS],

    // Playback counters
    pub clock_count: u32,
    pub div_counter: u32,
    /// Completed loop cycles since transport start; drives trig conditions
    pub loop_count: u32,
    /// Current step position (1-based; 0 = not yet played)
    pub step: u8,
    /// Previous cycle's final step, compared by No-Repeat
    pub last_step: u8,
    pub brownian_pos: u8,
    /// 1-based read position in `shuffle_order`; past the loop end means
    /// "regenerate on next use"
    pub shuffle_pos: u8,
    /// Peak velocity of sounding notes, for metering
    pub active_vel: u8,
    /// Emissions seen by the octave-jump bypass counter
    pub octave_play_count: u32,

    /// Edge detector for the Enabled parameter
    pub last_enabled: bool,

    pub cache: TrackCache,

    /// Per-track PRNG for modifier and emission decisions
    pub rand: Rand32,
}

impl TrackState {
    pub fn new(seed: u32, track_index: usize, enabled: bool) -> Self {
        let mut ts = Self {
            data: TrackData::new(),
            playing: [PlayingNote::default(); 128],
            active_notes: [0; 128],
            shuffle_order: [0; MAX_STEPS],
            clock_count: 0,
            div_counter: 0,
            loop_count: 0,
            step: 0,
            last_step: 1,
            brownian_pos: 1,
            shuffle_pos: 1,
            active_vel: 0,
            octave_play_count: 0,
            last_enabled: enabled,
            cache: TrackCache::new(),
            rand: Rand32::new(seed.wrapping_add(track_index as u32)),
        };
        ts.reset_shuffle_order();
        ts
    }

    /// Identity permutation.
    pub fn reset_shuffle_order(&mut self) {
        for (i, slot) in self.shuffle_order.iter_mut().enumerate() {
            *slot = (i + 1) as u8;
        }
    }

    /// Transport-start reset: playhead, counters, and stateful direction
    /// positions return to their initial values.
    pub fn reset_positions(&mut self) {
        self.step = 0;
        self.clock_count = 0;
        self.div_counter = 0;
        self.loop_count = 0;
        self.last_step = 1;
        self.brownian_pos = 1;
        self.shuffle_pos = 1;
        self.octave_play_count = 0;
        self.reset_shuffle_order();
    }

    /// Forget every sounding note without sending anything.
    pub fn clear_playing(&mut self) {
        for pn in &mut self.playing {
            pn.active = false;
        }
        self.active_notes = [0; 128];
        self.active_vel = 0;
    }

    /// Recompute the peak velocity after a note ends.
    pub fn refresh_active_vel(&mut self) {
        self.active_vel = self.active_notes.iter().copied().max().unwrap_or(0);
    }
}

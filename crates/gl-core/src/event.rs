//! Step event storage for sequencer tracks.

use arrayvec::ArrayVec;

/// Maximum steps per track loop.
pub const MAX_STEPS: usize = 128;
/// Maximum polyphony per step.
pub const MAX_EVENTS_PER_STEP: usize = 8;

/// A note stored in a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoteEvent {
    /// MIDI note number (0-127)
    pub note: u8,
    /// Velocity (0-127)
    pub velocity: u8,
    /// Duration in clock ticks (>= 1)
    pub duration: u16,
}

/// The events recorded on a single step.
///
/// Note numbers are unique within a step; inserting a duplicate or inserting
/// into a full step is a silent no-op.
#[derive(Clone, Debug, Default)]
pub struct StepEvents {
    events: ArrayVec<NoteEvent, MAX_EVENTS_PER_STEP>,
}

impl StepEvents {
    /// Insert an event. Returns false if the note is already present or the
    /// step is at capacity.
    pub fn insert(&mut self, event: NoteEvent) -> bool {
        if self.contains_note(event.note) {
            return false;
        }
        self.events.try_push(event).is_ok()
    }

    /// Is a note with this number already stored here?
    pub fn contains_note(&self, note: u8) -> bool {
        self.events.iter().any(|e| e.note == note)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, NoteEvent> {
        self.events.iter()
    }

    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, NoteEvent> {
        self.events.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

/// All step data for one track.
///
/// Only the first `loop_len` steps are addressed during playback; the tail
/// is inert but keeps its contents so shortening and re-lengthening a loop
/// is non-destructive.
#[derive(Clone, Debug)]
pub struct TrackData {
    steps: [StepEvents; MAX_STEPS],
}

impl TrackData {
    pub fn new() -> Self {
        Self {
            steps: core::array::from_fn(|_| StepEvents::default()),
        }
    }

    /// Step bucket by 0-based index, clamped into range.
    pub fn step(&self, index: usize) -> &StepEvents {
        &self.steps[index.min(MAX_STEPS - 1)]
    }

    /// Mutable step bucket by 0-based index, clamped into range.
    pub fn step_mut(&mut self, index: usize) -> &mut StepEvents {
        &mut self.steps[index.min(MAX_STEPS - 1)]
    }

    /// Remove every event from every step.
    pub fn clear(&mut self) {
        for step in &mut self.steps {
            step.clear();
        }
    }

    /// Swap the contents of two step buckets.
    pub fn swap_steps(&mut self, a: usize, b: usize) {
        self.steps.swap(a.min(MAX_STEPS - 1), b.min(MAX_STEPS - 1));
    }
}

impl Default for TrackData {
    fn default() -> Self {
        Self::new()
    }
}

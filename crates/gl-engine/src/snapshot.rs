//! Preset snapshot: the state that must survive a save/load round trip.
//!
//! The document tree covers step data plus the stateful direction positions.
//! Unknown members at any level are skipped on import so the format can grow
//! without a version bump; a structural parse error rejects the whole import
//! and leaves the engine untouched.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use gl_core::{NoteEvent, MAX_STEPS};

use crate::track::TrackState;

/// Structural format version.
///
/// 1 - initial format (implicit, no version field)
/// 2 - explicit version field
pub const SNAPSHOT_VERSION: u32 = 2;

/// One stored note: `n`ote, `v`elocity, `d`uration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSnapshot {
    #[serde(default)]
    pub n: u8,
    #[serde(default)]
    pub v: u8,
    #[serde(default)]
    pub d: u16,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TrackSnapshot {
    /// Outer index is the step; inner the events on it.
    #[serde(default)]
    pub events: Vec<Vec<EventSnapshot>>,
    #[serde(default)]
    pub shuffle_order: Vec<u8>,
    #[serde(default)]
    pub shuffle_pos: u8,
    #[serde(default)]
    pub brownian_pos: u8,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub num_tracks: u32,
    #[serde(default)]
    pub tracks: Vec<TrackSnapshot>,
}

/// Snapshot import/export error.
#[derive(Debug)]
pub enum SnapshotError {
    /// Malformed document; the message is serde_json's diagnosis.
    Parse(String),
}

impl core::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SnapshotError::Parse(msg) => write!(f, "snapshot parse error: {msg}"),
        }
    }
}

/// Export all tracks into a snapshot document.
pub fn capture(tracks: &[TrackState]) -> Snapshot {
    let snap_tracks = tracks
        .iter()
        .map(|ts| TrackSnapshot {
            events: (0..MAX_STEPS)
                .map(|s| {
                    ts.data
                        .step(s)
                        .iter()
                        .map(|e| EventSnapshot { n: e.note, v: e.velocity, d: e.duration })
                        .collect()
                })
                .collect(),
            shuffle_order: ts.shuffle_order.to_vec(),
            shuffle_pos: ts.shuffle_pos,
            brownian_pos: ts.brownian_pos,
        })
        .collect();

    Snapshot {
        version: SNAPSHOT_VERSION,
        num_tracks: tracks.len() as u32,
        tracks: snap_tracks,
    }
}

/// Apply a snapshot document to the engine's tracks.
///
/// Tracks beyond the allocation are discarded. Steps the document does not
/// cover keep their prior contents; covered steps are replaced. Events are
/// validated (note and velocity in MIDI range, duration at least 1) and
/// positions clamped, so a corrupted document can degrade but not break the
/// engine.
pub fn apply(snap: &Snapshot, tracks: &mut [TrackState]) {
    for (ts, tsnap) in tracks.iter_mut().zip(snap.tracks.iter()) {
        for (s, events) in tsnap.events.iter().enumerate().take(MAX_STEPS) {
            let step = ts.data.step_mut(s);
            step.clear();
            for e in events {
                if e.n <= 127 && e.v <= 127 && e.d >= 1 {
                    step.insert(NoteEvent { note: e.n, velocity: e.v, duration: e.d });
                }
            }
        }
        for (slot, &value) in ts.shuffle_order.iter_mut().zip(tsnap.shuffle_order.iter()) {
            *slot = value.clamp(1, MAX_STEPS as u8);
        }
        if tsnap.shuffle_pos > 0 {
            ts.shuffle_pos = tsnap.shuffle_pos.min(MAX_STEPS as u8 + 1);
        }
        if tsnap.brownian_pos > 0 {
            ts.brownian_pos = tsnap.brownian_pos.min(MAX_STEPS as u8);
        }
    }
}

/// Encode a snapshot as JSON.
pub fn to_json(snap: &Snapshot) -> String {
    // Serialization of plain integers cannot fail.
    serde_json::to_string(snap).unwrap_or_default()
}

/// Parse a snapshot from JSON. Unknown fields are skipped; structural
/// errors reject the document as a whole.
pub fn from_json(json: &str) -> Result<Snapshot, SnapshotError> {
    serde_json::from_str(json).map_err(|e| SnapshotError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn track_with(notes: &[(usize, u8)]) -> TrackState {
        let mut ts = TrackState::new(5, 0, true);
        for &(step, note) in notes {
            ts.data.step_mut(step).insert(NoteEvent { note, velocity: 100, duration: 2 });
        }
        ts
    }

    #[test]
    fn round_trip_preserves_track_state() {
        let mut tracks = vec![track_with(&[(0, 60), (5, 64)]), track_with(&[(3, 50)])];
        tracks[0].shuffle_pos = 4;
        tracks[0].brownian_pos = 7;
        tracks[0].shuffle_order[0] = 3;
        tracks[0].shuffle_order[2] = 1;

        let json = to_json(&capture(&tracks));
        let snap = from_json(&json).unwrap();

        let mut restored = vec![TrackState::new(9, 0, true), TrackState::new(9, 1, false)];
        apply(&snap, &mut restored);

        for t in 0..2 {
            for s in 0..MAX_STEPS {
                let want: Vec<_> = tracks[t].data.step(s).iter().copied().collect();
                let got: Vec<_> = restored[t].data.step(s).iter().copied().collect();
                assert_eq!(want, got, "track {t} step {s}");
            }
            assert_eq!(tracks[t].shuffle_order, restored[t].shuffle_order);
        }
        assert_eq!(restored[0].shuffle_pos, 4);
        assert_eq!(restored[0].brownian_pos, 7);
    }

    #[test]
    fn unknown_fields_are_skipped() {
        let json = r#"{
            "version": 9,
            "future_global": {"a": [1, 2, 3]},
            "num_tracks": 1,
            "tracks": [{
                "events": [[{"n": 60, "v": 100, "d": 2, "future_flag": true}]],
                "shuffle_pos": 2,
                "future_field": "ignored"
            }]
        }"#;
        let snap = from_json(json).unwrap();
        let mut tracks = vec![TrackState::new(1, 0, true)];
        apply(&snap, &mut tracks);
        assert!(tracks[0].data.step(0).contains_note(60));
        assert_eq!(tracks[0].shuffle_pos, 2);
    }

    #[test]
    fn malformed_document_is_rejected_atomically() {
        // "events" must be an array of arrays, not a number.
        let json = r#"{"tracks": [{"events": 5}]}"#;
        assert!(from_json(json).is_err());

        let mut tracks = vec![track_with(&[(0, 60)])];
        if let Ok(snap) = from_json(json) {
            apply(&snap, &mut tracks);
        }
        // Prior state intact because apply never ran.
        assert!(tracks[0].data.step(0).contains_note(60));
    }

    #[test]
    fn extra_tracks_are_discarded() {
        let source = vec![track_with(&[(0, 60)]), track_with(&[(0, 61)]), track_with(&[(0, 62)])];
        let snap = capture(&source);
        let mut small = vec![TrackState::new(2, 0, true)];
        apply(&snap, &mut small);
        assert!(small[0].data.step(0).contains_note(60));
    }

    #[test]
    fn short_events_array_keeps_uncovered_steps() {
        let json = r#"{"tracks": [{"events": [[{"n": 50, "v": 90, "d": 1}], []]}]}"#;
        let snap = from_json(json).unwrap();
        let mut tracks = vec![track_with(&[(0, 60), (1, 61), (5, 64)])];
        apply(&snap, &mut tracks);
        // Covered steps replaced (step 0) or cleared (step 1)...
        assert!(tracks[0].data.step(0).contains_note(50));
        assert!(!tracks[0].data.step(0).contains_note(60));
        assert!(tracks[0].data.step(1).is_empty());
        // ...steps beyond the document keep prior contents.
        assert!(tracks[0].data.step(5).contains_note(64));
    }

    #[test]
    fn invalid_events_and_positions_are_sanitized() {
        let json = r#"{"tracks": [{
            "events": [[{"n": 200, "v": 100, "d": 2}, {"n": 60, "v": 100, "d": 0}, {"n": 61, "v": 90, "d": 1}]],
            "shuffle_order": [0, 255, 7],
            "brownian_pos": 255
        }]}"#;
        let snap = from_json(json).unwrap();
        let mut tracks = vec![TrackState::new(1, 0, true)];
        apply(&snap, &mut tracks);
        // Only the valid event survives.
        assert_eq!(tracks[0].data.step(0).len(), 1);
        assert!(tracks[0].data.step(0).contains_note(61));
        // Shuffle entries clamp into 1..=MAX_STEPS.
        assert_eq!(tracks[0].shuffle_order[0], 1);
        assert_eq!(tracks[0].shuffle_order[1], MAX_STEPS as u8);
        assert_eq!(tracks[0].shuffle_order[2], 7);
        assert_eq!(tracks[0].brownian_pos, MAX_STEPS as u8);
    }

    #[test]
    fn version_is_stamped_on_export() {
        let tracks = vec![TrackState::new(1, 0, true)];
        let snap = capture(&tracks);
        assert_eq!(snap.version, SNAPSHOT_VERSION);
        assert_eq!(snap.num_tracks, 1);
        let json = to_json(&snap);
        assert!(json.contains("\"version\":2"));
    }
}

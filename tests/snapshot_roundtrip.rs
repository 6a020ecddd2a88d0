//! Snapshot round-trip through the public engine API and the JSON layer.

use gridloop::{from_json, to_json, Engine, EngineSpec, NoteEvent, MAX_STEPS, SNAPSHOT_VERSION};

fn engine_with_pattern(num_tracks: usize, seed: u32) -> Engine {
    let mut engine = Engine::new(EngineSpec { num_tracks, sample_rate: 48_000, seed });
    for t in 0..num_tracks {
        for s in [0usize, 3, 7, 15] {
            engine.track_mut(t).data.step_mut(s).insert(NoteEvent {
                note: 40 + (t * 12 + s) as u8,
                velocity: 64 + t as u8,
                duration: (s + 1) as u16,
            });
        }
        engine.track_mut(t).shuffle_pos = (t + 2) as u8;
        engine.track_mut(t).brownian_pos = (t + 3) as u8;
        engine.track_mut(t).shuffle_order.swap(0, 5);
    }
    engine
}

fn assert_tracks_equal(a: &Engine, b: &Engine, num_tracks: usize) {
    for t in 0..num_tracks {
        for s in 0..MAX_STEPS {
            let want: Vec<_> = a.track(t).data.step(s).iter().copied().collect();
            let got: Vec<_> = b.track(t).data.step(s).iter().copied().collect();
            assert_eq!(want, got, "track {t} step {s}");
        }
        assert_eq!(a.track(t).shuffle_order, b.track(t).shuffle_order, "track {t}");
        assert_eq!(a.track(t).shuffle_pos, b.track(t).shuffle_pos);
        assert_eq!(a.track(t).brownian_pos, b.track(t).brownian_pos);
    }
}

#[test]
fn json_round_trip_is_lossless() {
    let source = engine_with_pattern(4, 0x1111);
    let json = to_json(&source.save_snapshot());

    let mut restored = Engine::new(EngineSpec { num_tracks: 4, sample_rate: 48_000, seed: 0x2222 });
    restored.load_snapshot(&from_json(&json).unwrap());

    assert_tracks_equal(&source, &restored, 4);
}

#[test]
fn snapshot_reports_version_and_track_count() {
    let source = engine_with_pattern(3, 0x1111);
    let snap = source.save_snapshot();
    assert_eq!(snap.version, SNAPSHOT_VERSION);
    assert_eq!(snap.num_tracks, 3);
    assert_eq!(snap.tracks.len(), 3);
}

#[test]
fn larger_snapshot_loads_into_smaller_engine() {
    let source = engine_with_pattern(6, 0x1111);
    let json = to_json(&source.save_snapshot());

    let mut small = Engine::new(EngineSpec { num_tracks: 2, sample_rate: 48_000, seed: 0x2222 });
    small.load_snapshot(&from_json(&json).unwrap());

    assert_tracks_equal(&source, &small, 2);
}

#[test]
fn smaller_snapshot_leaves_extra_tracks_alone() {
    let source = engine_with_pattern(1, 0x1111);
    let json = to_json(&source.save_snapshot());

    let mut big = engine_with_pattern(3, 0x3333);
    let before: Vec<_> = big.track(2).data.step(3).iter().copied().collect();
    big.load_snapshot(&from_json(&json).unwrap());

    assert_tracks_equal(&source, &big, 1);
    let after: Vec<_> = big.track(2).data.step(3).iter().copied().collect();
    assert_eq!(before, after);
}

#[test]
fn malformed_json_fails_without_touching_state() {
    let mut engine = engine_with_pattern(2, 0x1111);
    let reference = to_json(&engine.save_snapshot());

    for bad in [
        "",
        "not json",
        "[1, 2, 3]",
        r#"{"tracks": 7}"#,
        r#"{"tracks": [{"events": 5}]}"#,
        r#"{"tracks": [{"events": [[{"n": 9999}]]}]}"#,
    ] {
        if let Ok(snap) = from_json(bad) {
            engine.load_snapshot(&snap);
        }
    }

    assert_eq!(to_json(&engine.save_snapshot()), reference);
}

#[test]
fn unknown_members_round_trip_as_skipped() {
    let json = r#"{
        "version": 2,
        "num_tracks": 1,
        "mystery": [1, {"deep": true}],
        "tracks": [{
            "events": [[{"n": 72, "v": 90, "d": 3}]],
            "brownian_pos": 5,
            "annotations": {"color": "red"}
        }]
    }"#;
    let snap = from_json(json).unwrap();
    let mut engine = Engine::new(EngineSpec { num_tracks: 1, sample_rate: 48_000, seed: 1 });
    engine.load_snapshot(&snap);
    assert!(engine.track(0).data.step(0).contains_note(72));
    assert_eq!(engine.track(0).brownian_pos, 5);
}

use beatline_core::{BpmChange, NoteItem, PitchId, Timeline, TimelineItem, beats};

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

fn tempo_map() -> Timeline {
    Timeline::from_items(vec![
        TimelineItem::BpmChange(BpmChange::new(0, 1, 120.0)),
        TimelineItem::BpmChange(BpmChange::new(4, 1, 60.0)),
        TimelineItem::BpmChange(BpmChange::new(13, 2, 180.0)),
        TimelineItem::Note(NoteItem::new(PitchId::Note(60), 8, 1, 1)),
    ])
}

#[test]
fn tempo_changes_are_scheduled_by_integrating_earlier_segments() {
    let timeline = tempo_map();
    let expected = [0.0, 2_000.0, 4_500.0, 5_000.0];
    assert_eq!(timeline.len(), expected.len());
    for (item, expected) in timeline.items().iter().zip(expected) {
        assert_close(item.scheduled_start_ms(), expected);
    }
}

#[test]
fn empty_timeline_uses_default_tempo() {
    let timeline = Timeline::new();
    assert_close(timeline.time_for_beats(3.0), 1_500.0);
    assert_close(timeline.beats_for_time(1_500.0), 3.0);
}

#[test]
fn time_for_beats_uses_the_segment_by_beat_position() {
    let timeline = tempo_map();
    assert_close(timeline.time_for_beats(2.0), 1_000.0);
    assert_close(timeline.time_for_beats(5.0), 3_000.0);
    assert_close(timeline.time_for_beats(7.5), 4_500.0 + 1_000.0 / 3.0);
}

#[test]
fn beats_for_time_uses_the_segment_by_scheduled_time() {
    let timeline = tempo_map();
    assert_close(timeline.beats_for_time(1_000.0), 2.0);
    assert_close(timeline.beats_for_time(3_000.0), 5.0);
    assert_close(timeline.beats_for_time(4_500.0), 6.5);
}

#[test]
fn conversions_invert_each_other() {
    let timeline = tempo_map();
    for step in 0..80 {
        let beat = f64::from(step) * 0.125;
        let restored = timeline.beats_for_time(timeline.time_for_beats(beat));
        assert!(
            beats::equal(restored, beat),
            "beat {beat} came back as {restored}"
        );
    }
}

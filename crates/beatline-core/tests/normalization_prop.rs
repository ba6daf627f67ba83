use beatline_core::{
    Beats, BpmChange, Measure, NoteItem, PitchId, Timeline, TimelineItem, beats,
    editor::{paint_off, paint_on},
    normalize,
};
use proptest::prelude::*;

fn pitch_strategy() -> impl Strategy<Value = PitchId> {
    prop_oneof![
        (58..64_i32).prop_map(PitchId::Note),
        prop::sample::select(vec!["kick", "snare"])
            .prop_map(|name| PitchId::Sample(name.to_string())),
    ]
}

fn item_strategy() -> impl Strategy<Value = TimelineItem> {
    let divisor = prop::sample::select(vec![1_i64, 2, 3, 4, 6, 8]);
    prop_oneof![
        4 => (0..64_i64, divisor.clone(), 0..12_i64, pitch_strategy()).prop_map(
            |(start, divisor, length, pitch)| {
                TimelineItem::Note(NoteItem::new(pitch, start, divisor, length))
            }
        ),
        1 => (0..64_i64, divisor.clone(), 40.0..240.0_f64)
            .prop_map(|(start, divisor, bpm)| TimelineItem::BpmChange(BpmChange::new(start, divisor, bpm))),
        1 => (0..64_i64, divisor)
            .prop_map(|(start, divisor)| TimelineItem::Measure(Measure::new(start, divisor))),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn normalized_items_are_sorted_and_stable(items in prop::collection::vec(item_strategy(), 0..48)) {
        let normalized = normalize(items);
        for pair in normalized.windows(2) {
            prop_assert!(pair[0].timeline_cmp(&pair[1]).is_le());
        }
        prop_assert_eq!(normalize(normalized.clone()), normalized);
    }

    #[test]
    fn same_pitch_notes_never_touch(items in prop::collection::vec(item_strategy(), 0..48)) {
        let normalized = normalize(items);
        let notes: Vec<&NoteItem> = normalized.iter().filter_map(TimelineItem::as_note).collect();
        for (position, note) in notes.iter().enumerate() {
            prop_assert!(note.length > 0);
            for other in &notes[position + 1..] {
                if other.pitch == note.pitch {
                    prop_assert!(
                        other.start_beats() > note.end_beats() || note.start_beats() > other.end_beats(),
                        "{:?} touches {:?}", note, other
                    );
                }
            }
        }
    }

    #[test]
    fn coalescing_keeps_covered_beats(items in prop::collection::vec(item_strategy(), 0..32)) {
        let normalized = normalize(items.clone());
        for note in items.iter().filter_map(TimelineItem::as_note).filter(|note| note.length > 0) {
            let covered = normalized.iter().filter_map(TimelineItem::as_note).any(|kept| {
                kept.pitch == note.pitch
                    && kept.start_beats() <= note.start_beats()
                    && note.end_beats() <= kept.end_beats()
            });
            prop_assert!(covered, "{:?} lost after normalization", note);
        }
    }

    #[test]
    fn lanes_never_overlap(items in prop::collection::vec(item_strategy(), 0..48)) {
        let timeline = Timeline::from_items(items);
        let mut assigned = 0;
        for lane in timeline.lanes() {
            assigned += lane.len();
            for pair in lane.windows(2) {
                prop_assert!(pair[0].end_beats() <= pair[1].start_beats());
            }
        }
        let notes = timeline.items().iter().filter(|item| item.is_note()).count();
        prop_assert_eq!(assigned, notes);
    }

    #[test]
    fn erase_after_paint_clears_the_region(
        items in prop::collection::vec(item_strategy(), 0..24),
        position in 0..64_i64,
        divisor in prop::sample::select(vec![1_i64, 2, 3, 4, 8]),
        length in 1..12_i64,
        pitch in pitch_strategy(),
    ) {
        let mut timeline = Timeline::from_items(items);
        timeline.mutate(|items| paint_on(items, position, divisor, pitch.clone(), length));
        timeline.mutate(|items| paint_off(items, position, divisor, &pitch, length));

        let start = Beats::new(position, divisor);
        let end = Beats::new(position + length, divisor);
        let overlapping = timeline
            .items()
            .iter()
            .filter_map(TimelineItem::as_note)
            .filter(|note| note.pitch == pitch)
            .any(|note| note.start_beats() < end && note.end_beats() > start);
        prop_assert!(!overlapping);
    }

    #[test]
    fn time_and_beats_round_trip(
        items in prop::collection::vec(item_strategy(), 0..24),
        beat in 0.0..80.0_f64,
    ) {
        let timeline = Timeline::from_items(items);
        let restored = timeline.beats_for_time(timeline.time_for_beats(beat));
        prop_assert!(beats::equal(restored, beat), "{} came back as {}", beat, restored);
    }
}

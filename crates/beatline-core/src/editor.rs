//! Edits applied inside a timeline transaction.
//!
//! Every function here works on the raw item vector handed out by
//! [`crate::timeline::Timeline::mutate`] and leaves ordering, merging and
//! scheduling to the normalization pass that follows.
//!
//! Positions with a non-positive divisor are ignored. Range edits take an
//! optional pitch filter; when it is set and non-empty only notes with a
//! listed pitch are touched.

use std::{collections::BTreeSet, ops::RangeInclusive};

use tracing::trace;

use crate::{
    beats::Beats,
    model::{BpmChange, ItemKind, Measure, NoteItem, PitchId, TimelineItem},
};

/// Appends a `pitch` note covering `[position, position + length) / divisor`.
pub fn paint_on(
    items: &mut Vec<TimelineItem>,
    position: i64,
    divisor: i64,
    pitch: PitchId,
    length: i64,
) {
    if divisor <= 0 || length <= 0 {
        return;
    }
    items.push(NoteItem::new(pitch, position, divisor, length).into());
}

/// Erases `pitch` from `[position, position + length) / divisor`.
///
/// Notes straddling the whole range are split in two, notes crossing one
/// boundary are trimmed, and notes inside the range are removed.
pub fn paint_off(
    items: &mut Vec<TimelineItem>,
    position: i64,
    divisor: i64,
    pitch: &PitchId,
    length: i64,
) {
    if divisor <= 0 || length <= 0 {
        return;
    }
    let range_start = Beats::new(position, divisor);
    let range_end = Beats::new(position.saturating_add(length), divisor);
    let mut splits = Vec::new();

    items.retain_mut(|item| {
        let TimelineItem::Note(note) = item else {
            return true;
        };
        if note.pitch != *pitch {
            return true;
        }

        let start = note.start_beats();
        let end = note.end_beats();
        if start >= range_end || end <= range_start {
            true
        } else if start < range_start && end > range_end {
            splits.push(NoteItem::spanning(note.pitch.clone(), range_end, end));
            note.set_span(start, range_start);
            true
        } else if range_start <= start && end <= range_end {
            false
        } else if start < range_start {
            note.set_span(start, range_start);
            true
        } else {
            note.set_span(range_end, end);
            true
        }
    });

    trace!(splits = splits.len(), "paint off scan finished");
    items.extend(splits.into_iter().map(TimelineItem::Note));
}

/// Adds a tempo change; an existing one at the same beat is replaced on
/// normalization.
pub fn set_bpm_change(items: &mut Vec<TimelineItem>, position: i64, divisor: i64, bpm: f64) {
    if divisor <= 0 || !bpm.is_finite() || bpm <= 0.0 {
        return;
    }
    items.push(TimelineItem::BpmChange(BpmChange::new(position, divisor, bpm)));
}

/// Returns whether a tempo change was removed.
pub fn remove_bpm_change(items: &mut Vec<TimelineItem>, position: i64, divisor: i64) -> bool {
    if divisor <= 0 {
        return false;
    }
    remove_at(items, ItemKind::BpmChange, Beats::new(position, divisor))
}

/// Removes the measure at the beat or inserts one. Returns whether a
/// measure exists there afterwards.
pub fn toggle_measure(items: &mut Vec<TimelineItem>, position: i64, divisor: i64) -> bool {
    if divisor <= 0 {
        return false;
    }
    if remove_at(items, ItemKind::Measure, Beats::new(position, divisor)) {
        return false;
    }
    items.push(TimelineItem::Measure(Measure::new(position, divisor)));
    true
}

/// Deletes everything but measure markers in the inclusive index range.
pub fn delete_range(
    items: &mut Vec<TimelineItem>,
    start_idx: usize,
    end_idx: usize,
    filter: Option<&BTreeSet<PitchId>>,
) -> usize {
    let Some(range) = clamp_range(items.len(), start_idx, end_idx) else {
        return 0;
    };
    let before = items.len();
    let mut idx = 0;
    items.retain(|item| {
        let keep = !range.contains(&idx)
            || item.kind() == ItemKind::Measure
            || !passes_filter(item, filter);
        idx += 1;
        keep
    });
    before - items.len()
}

/// Moves the items in the inclusive index range by `delta` beats.
///
/// Items that would land before beat 0 are clamped to it.
pub fn shift_range(
    items: &mut [TimelineItem],
    start_idx: usize,
    end_idx: usize,
    delta: Beats,
    filter: Option<&BTreeSet<PitchId>>,
) -> usize {
    let Some(range) = clamp_range(items.len(), start_idx, end_idx) else {
        return 0;
    };
    let mut moved = 0;
    for item in &mut items[range] {
        if !passes_filter(item, filter) {
            continue;
        }
        let target = (item.start_beats() + delta).max(Beats::ZERO);
        item.move_to(target);
        moved += 1;
    }
    moved
}

/// Transposes chromatic notes in the inclusive index range.
pub fn transpose_range(
    items: &mut [TimelineItem],
    start_idx: usize,
    end_idx: usize,
    half_steps: i32,
    filter: Option<&BTreeSet<PitchId>>,
) -> usize {
    let Some(range) = clamp_range(items.len(), start_idx, end_idx) else {
        return 0;
    };
    let mut transposed = 0;
    for item in &mut items[range] {
        if !passes_filter(item, filter) {
            continue;
        }
        if let TimelineItem::Note(note) = item
            && let PitchId::Note(_) = note.pitch
        {
            note.pitch = note.pitch.transposed(half_steps);
            transposed += 1;
        }
    }
    transposed
}

fn passes_filter(item: &TimelineItem, filter: Option<&BTreeSet<PitchId>>) -> bool {
    match filter {
        Some(pitches) if !pitches.is_empty() => item
            .as_note()
            .is_some_and(|note| pitches.contains(&note.pitch)),
        _ => true,
    }
}

fn remove_at(items: &mut Vec<TimelineItem>, kind: ItemKind, beats: Beats) -> bool {
    let before = items.len();
    items.retain(|item| !(item.kind() == kind && item.start_beats() == beats));
    items.len() != before
}

fn clamp_range(len: usize, start_idx: usize, end_idx: usize) -> Option<RangeInclusive<usize>> {
    let last = len.checked_sub(1)?;
    let end_idx = end_idx.min(last);
    (start_idx <= end_idx).then_some(start_idx..=end_idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn spans(items: &[TimelineItem]) -> Vec<(Beats, Beats)> {
        items
            .iter()
            .filter_map(TimelineItem::as_note)
            .map(|note| (note.start_beats(), note.end_beats()))
            .collect()
    }

    #[test]
    fn erasing_the_middle_splits_the_note() {
        let mut items = vec![TimelineItem::Note(NoteItem::new(PitchId::Note(60), 0, 2, 4))];
        paint_off(&mut items, 1, 2, &PitchId::Note(60), 2);
        let items = normalize(items);
        assert_eq!(
            spans(&items),
            vec![
                (Beats::ZERO, Beats::new(1, 2)),
                (Beats::new(3, 2), Beats::whole(2)),
            ]
        );
    }

    #[test]
    fn boundary_overlaps_are_trimmed() {
        let mut items = vec![
            TimelineItem::Note(NoteItem::new(PitchId::Note(60), 0, 1, 2)),
            TimelineItem::Note(NoteItem::new(PitchId::Note(60), 3, 1, 2)),
        ];
        paint_off(&mut items, 1, 1, &PitchId::Note(60), 3);
        let items = normalize(items);
        assert_eq!(
            spans(&items),
            vec![
                (Beats::ZERO, Beats::whole(1)),
                (Beats::whole(4), Beats::whole(5)),
            ]
        );
    }

    #[test]
    fn other_pitches_survive_erase() {
        let mut items = Vec::new();
        paint_on(&mut items, 0, 1, PitchId::Note(60), 1);
        paint_on(&mut items, 0, 1, PitchId::Note(62), 1);
        paint_off(&mut items, 0, 1, &PitchId::Note(60), 1);
        let items = normalize(items);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_note().map(|note| note.pitch.clone()), Some(PitchId::Note(62)));
    }

    #[test]
    fn toggling_a_measure_twice_removes_it() {
        let mut items = Vec::new();
        assert!(toggle_measure(&mut items, 4, 1));
        assert!(!toggle_measure(&mut items, 8, 2));
        assert!(items.is_empty());
    }

    #[test]
    fn delete_range_keeps_measures() {
        let mut items = normalize(vec![
            TimelineItem::Measure(Measure::new(0, 1)),
            TimelineItem::Note(NoteItem::new(PitchId::Note(60), 0, 1, 1)),
            TimelineItem::BpmChange(BpmChange::new(1, 1, 90.0)),
        ]);
        assert_eq!(delete_range(&mut items, 0, 10, None), 2);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind(), ItemKind::Measure);
    }

    #[test]
    fn shift_and_transpose_touch_only_the_range() {
        let mut items = normalize(vec![
            TimelineItem::Note(NoteItem::new(PitchId::Note(60), 0, 1, 1)),
            TimelineItem::Note(NoteItem::new(PitchId::Sample("kick".to_string()), 1, 1, 1)),
            TimelineItem::Note(NoteItem::new(PitchId::Note(64), 2, 1, 1)),
        ]);
        assert_eq!(transpose_range(&mut items, 0, 1, 2, None), 1);
        assert_eq!(shift_range(&mut items, 1, 1, Beats::new(1, 4), None), 1);
        let items = normalize(items);
        let pitches: Vec<PitchId> = items
            .iter()
            .filter_map(TimelineItem::as_note)
            .map(|note| note.pitch.clone())
            .collect();
        assert_eq!(
            pitches,
            vec![
                PitchId::Note(62),
                PitchId::Sample("kick".to_string()),
                PitchId::Note(64)
            ]
        );
        assert_eq!(items[1].start_beats(), Beats::new(5, 4));
    }

    #[test]
    fn zero_divisor_edits_are_ignored() {
        let mut items = Vec::new();
        paint_on(&mut items, 0, 0, PitchId::Note(60), 1);
        set_bpm_change(&mut items, 0, 0, 90.0);
        set_bpm_change(&mut items, 0, 1, 0.0);
        assert!(!toggle_measure(&mut items, 0, 0));
        assert!(!remove_bpm_change(&mut items, 0, 0));
        assert!(normalize(items).is_empty());
    }

    #[test]
    fn filtered_range_edits_skip_other_items() {
        let mut items = normalize(vec![
            TimelineItem::BpmChange(BpmChange::new(0, 1, 120.0)),
            TimelineItem::Note(NoteItem::new(PitchId::Note(60), 0, 1, 1)),
            TimelineItem::Note(NoteItem::new(PitchId::Note(62), 0, 1, 1)),
            TimelineItem::Note(NoteItem::new(PitchId::Note(64), 1, 1, 1)),
        ]);
        let filter = BTreeSet::from([PitchId::Note(62)]);

        assert_eq!(transpose_range(&mut items, 0, 3, 12, Some(&filter)), 1);
        let mut items = normalize(items);
        assert_eq!(shift_range(&mut items, 0, 3, Beats::whole(1), Some(&BTreeSet::new())), 4);
        let mut items = normalize(items);

        let only_high = BTreeSet::from([PitchId::Note(74)]);
        assert_eq!(delete_range(&mut items, 0, 3, Some(&only_high)), 1);
        let items = normalize(items);
        let pitches: Vec<PitchId> = items
            .iter()
            .filter_map(TimelineItem::as_note)
            .map(|note| note.pitch.clone())
            .collect();
        assert_eq!(pitches, vec![PitchId::Note(60), PitchId::Note(64)]);
        assert_eq!(items[0].kind(), ItemKind::BpmChange);
    }
}

//! The single gateway every timeline mutation passes through.
//!
//! Steps run in a fixed order: sort, dedup, coalesce, reschedule. Lane
//! partitioning is derived afterwards by [`crate::timeline::Timeline`].

use std::collections::BTreeMap;

use tracing::trace;

use crate::{
    beats::Beats,
    model::{ItemKind, PitchId, TimelineItem},
    time::TempoSegment,
};

#[must_use]
pub fn normalize(mut items: Vec<TimelineItem>) -> Vec<TimelineItem> {
    let before = items.len();
    sort_items(&mut items);
    let items = dedup_items(items);
    let mut items = coalesce_notes(items);
    reschedule(&mut items);
    trace!(before, after = items.len(), "timeline normalized");
    items
}

/// Stable sort by beat position, type priority, then pitch.
pub fn sort_items(items: &mut [TimelineItem]) {
    items.sort_by(TimelineItem::timeline_cmp);
}

/// Keeps the latest tempo change and measure per beat position and drops
/// notes without positive length. Expects sorted input.
#[must_use]
pub fn dedup_items(items: Vec<TimelineItem>) -> Vec<TimelineItem> {
    let mut kept: Vec<TimelineItem> = Vec::with_capacity(items.len());
    let mut last_bpm: Option<(Beats, usize)> = None;
    let mut last_measure: Option<(Beats, usize)> = None;

    for item in items {
        let start = item.start_beats();
        let last_of_kind = match item.kind() {
            ItemKind::BpmChange => &mut last_bpm,
            ItemKind::Measure => &mut last_measure,
            ItemKind::Note => {
                if item.as_note().is_some_and(|note| note.length > 0) {
                    kept.push(item);
                }
                continue;
            }
        };

        if let Some((position, slot)) = *last_of_kind
            && position == start
        {
            kept[slot] = item;
        } else {
            *last_of_kind = Some((start, kept.len()));
            kept.push(item);
        }
    }
    kept
}

/// Merges same-pitch notes that overlap or touch. Expects sorted input.
#[must_use]
pub fn coalesce_notes(items: Vec<TimelineItem>) -> Vec<TimelineItem> {
    let mut kept: Vec<TimelineItem> = Vec::with_capacity(items.len());
    let mut open: BTreeMap<PitchId, usize> = BTreeMap::new();

    for item in items {
        let TimelineItem::Note(note) = item else {
            kept.push(item);
            continue;
        };

        let start = note.start_beats();
        open.retain(|_, slot| kept[*slot].end_beats() >= start);

        if let Some(&slot) = open.get(&note.pitch)
            && let TimelineItem::Note(open_note) = &mut kept[slot]
            && start <= open_note.end_beats()
        {
            let end = open_note.end_beats().max(note.end_beats());
            open_note.extend_to(end);
            continue;
        }

        open.insert(note.pitch.clone(), kept.len());
        kept.push(TimelineItem::Note(note));
    }
    kept
}

/// Recomputes scheduled times and indexes by integrating tempo from beat 0.
///
/// A note's end uses the tempo active at its start, even when a tempo change
/// lands before the note ends.
pub fn reschedule(items: &mut [TimelineItem]) {
    let mut segment = TempoSegment::default();
    for (index, item) in items.iter_mut().enumerate() {
        let start = item.start_beats();
        let start_ms = segment.time_for(start);
        match item {
            TimelineItem::BpmChange(change) => {
                change.scheduled_start_ms = start_ms;
                change.index = index;
                segment = TempoSegment {
                    bpm: change.bpm,
                    start,
                    start_ms,
                };
            }
            TimelineItem::Measure(measure) => {
                measure.scheduled_start_ms = start_ms;
                measure.index = index;
            }
            TimelineItem::Note(note) => {
                note.scheduled_start_ms = start_ms;
                note.scheduled_end_ms = segment.time_for(note.end_beats());
                note.index = index;
            }
        }
    }
}

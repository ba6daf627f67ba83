use crate::{
    beats::{self, Beats},
    model::{NoteItem, TimelineItem},
};

/// Splits notes into lanes whose members never overlap.
///
/// Each pass opens a lane and sweeps the unassigned notes in timeline order,
/// taking every note that starts at or after the previous taken note's end.
/// Passes repeat until one takes nothing.
#[must_use]
pub fn partition_lanes(items: &[TimelineItem]) -> Vec<Vec<NoteItem>> {
    let notes: Vec<&NoteItem> = items.iter().filter_map(TimelineItem::as_note).collect();
    let mut assigned = vec![false; notes.len()];
    let mut lanes = Vec::new();

    loop {
        let mut lane = Vec::new();
        let mut last_end: Option<Beats> = None;

        for (slot, note) in notes.iter().enumerate() {
            if assigned[slot] {
                continue;
            }
            if last_end.is_some_and(|end| note.start_beats() < end) {
                continue;
            }

            last_end = Some(note.end_beats());
            assigned[slot] = true;
            lane.push((*note).clone());
        }

        if lane.is_empty() {
            break;
        }
        lanes.push(lane);
    }

    lanes
}

/// Restricts lanes to notes intersecting `[start_beats, end_beats]`,
/// dropping lanes left empty.
#[must_use]
pub fn lanes_in_window(
    lanes: &[Vec<NoteItem>],
    start_beats: f64,
    end_beats: f64,
) -> Vec<Vec<NoteItem>> {
    lanes
        .iter()
        .map(|lane| {
            lane.iter()
                .filter(|note| {
                    beats::gte(note.end_beats().as_f64(), start_beats)
                        && beats::lte(note.start_beats().as_f64(), end_beats)
                })
                .cloned()
                .collect::<Vec<_>>()
        })
        .filter(|lane| !lane.is_empty())
        .collect()
}

use std::mem;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    beats::{self, Beats},
    lanes::partition_lanes,
    model::{BpmChange, ItemKind, NoteItem, PitchId, TimelineItem},
    normalize::normalize,
    time::TempoSegment,
};

/// Applies `edit` to an owned collection and returns it normalized.
#[must_use]
pub fn transact<F>(mut items: Vec<TimelineItem>, edit: F) -> Vec<TimelineItem>
where
    F: FnOnce(&mut Vec<TimelineItem>),
{
    edit(&mut items);
    normalize(items)
}

/// The timeline item store.
///
/// Items are only reachable in normalized form; every edit goes through
/// [`Timeline::mutate`], which also refreshes the cached lane partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<TimelineItem>", into = "Vec<TimelineItem>")]
pub struct Timeline {
    items: Vec<TimelineItem>,
    lanes: Vec<Vec<NoteItem>>,
}

impl From<Vec<TimelineItem>> for Timeline {
    fn from(items: Vec<TimelineItem>) -> Self {
        Self::from_items(items)
    }
}

impl From<Timeline> for Vec<TimelineItem> {
    fn from(timeline: Timeline) -> Self {
        timeline.items
    }
}

impl Timeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_items(items: Vec<TimelineItem>) -> Self {
        let mut timeline = Self::default();
        timeline.mutate(|existing| *existing = items);
        timeline
    }

    /// Runs `edit` over the items, then the normalization pipeline and the
    /// lane repartition.
    pub fn mutate<F>(&mut self, edit: F)
    where
        F: FnOnce(&mut Vec<TimelineItem>),
    {
        let items = mem::take(&mut self.items);
        self.items = transact(items, edit);
        self.lanes = partition_lanes(&self.items);
        debug!(
            items = self.items.len(),
            lanes = self.lanes.len(),
            "timeline transaction committed"
        );
    }

    #[must_use]
    pub fn items(&self) -> &[TimelineItem] {
        &self.items
    }

    #[must_use]
    pub fn lanes(&self) -> &[Vec<NoteItem>] {
        &self.lanes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Index of the first item at or after `beats`.
    #[must_use]
    pub fn beat_idx_after(&self, beats: f64) -> Option<usize> {
        self.items
            .iter()
            .position(|item| beats::gte(item.start_beats().as_f64(), beats))
    }

    /// Index of the last item at or before `beats`.
    #[must_use]
    pub fn beat_idx_before(&self, beats: f64) -> Option<usize> {
        self.items
            .iter()
            .rposition(|item| beats::lte(item.start_beats().as_f64(), beats))
    }

    /// Inclusive index range of items inside `[start_beats, end_beats]`.
    ///
    /// Bounds may be given in either order. `None` when no item falls inside.
    #[must_use]
    pub fn beats_indexes(&self, start_beats: f64, end_beats: f64) -> Option<(usize, usize)> {
        let min = start_beats.min(end_beats);
        let max = start_beats.max(end_beats);
        let start_idx = self.beat_idx_after(min)?;
        let end_idx = self.beat_idx_before(max)?;
        (start_idx <= end_idx).then_some((start_idx, end_idx))
    }

    /// Like [`Self::beats_indexes`] but excludes items starting at the upper bound.
    #[must_use]
    pub fn beats_indexes_exclusive(
        &self,
        start_beats: f64,
        end_beats: f64,
    ) -> Option<(usize, usize)> {
        let min = start_beats.min(end_beats);
        let max = start_beats.max(end_beats);
        let start_idx = self.beat_idx_after(min)?;
        let end_idx = self
            .items
            .iter()
            .rposition(|item| beats::lt(item.start_beats().as_f64(), max))?;
        (start_idx <= end_idx).then_some((start_idx, end_idx))
    }

    #[must_use]
    pub fn item_idx_at_beat(&self, beats: f64, kind: Option<ItemKind>) -> Option<usize> {
        self.items.iter().position(|item| {
            kind.is_none_or(|kind| item.kind() == kind)
                && beats::equal(item.start_beats().as_f64(), beats)
        })
    }

    #[must_use]
    pub fn note_at_beats(&self, beats: f64) -> Option<&NoteItem> {
        let idx = self.item_idx_at_beat(beats, None)?;
        self.items[idx].as_note()
    }

    /// Last tempo change positioned at or before `beats`.
    #[must_use]
    pub fn bpm_change_before_beats(&self, beats: f64) -> Option<&BpmChange> {
        self.items.iter().rev().find_map(|item| match item {
            TimelineItem::BpmChange(change)
                if beats::lte(change.start_beats().as_f64(), beats) =>
            {
                Some(change)
            }
            _ => None,
        })
    }

    /// Last tempo change scheduled at or before `ms`.
    #[must_use]
    pub fn bpm_change_before_time(&self, ms: f64) -> Option<&BpmChange> {
        self.items.iter().rev().find_map(|item| match item {
            TimelineItem::BpmChange(change) if change.scheduled_start_ms <= ms => Some(change),
            _ => None,
        })
    }

    #[must_use]
    pub fn bpm_at_beats(&self, beats: f64) -> f64 {
        segment_from(self.bpm_change_before_beats(beats)).bpm
    }

    /// Start of the last measure at or before `beats`, or 0.
    #[must_use]
    pub fn last_measure_beats(&self, beats: f64) -> f64 {
        self.items
            .iter()
            .rev()
            .find(|item| {
                item.kind() == ItemKind::Measure && beats::lte(item.start_beats().as_f64(), beats)
            })
            .map_or(0.0, |item| item.start_beats().as_f64())
    }

    /// Whether a `pitch` note covers any of the grid cell `[position, position + 1) / divisor`.
    #[must_use]
    pub fn has_note_at_position(&self, position: i64, divisor: i64, pitch: &PitchId) -> bool {
        if divisor <= 0 {
            return false;
        }
        let cell_start = Beats::new(position, divisor);
        let cell_end = Beats::new(position.saturating_add(1), divisor);
        self.items.iter().filter_map(TimelineItem::as_note).any(|note| {
            note.pitch == *pitch && note.end_beats() > cell_start && note.start_beats() < cell_end
        })
    }

    /// Wall-clock length of the whole timeline.
    #[must_use]
    pub fn playback_duration_ms(&self) -> f64 {
        self.items
            .last()
            .map_or(0.0, TimelineItem::scheduled_end_ms)
    }

    /// Furthest beat any item reaches.
    #[must_use]
    pub fn extent_beats(&self) -> f64 {
        self.items
            .iter()
            .map(TimelineItem::end_beats)
            .max()
            .map_or(0.0, Beats::as_f64)
    }

    #[must_use]
    pub fn beats_for_time(&self, ms: f64) -> f64 {
        segment_from(self.bpm_change_before_time(ms)).beats_for(ms)
    }

    #[must_use]
    pub fn time_for_beats(&self, beats: f64) -> f64 {
        segment_from(self.bpm_change_before_beats(beats)).time_for_f64(beats)
    }
}

fn segment_from(change: Option<&BpmChange>) -> TempoSegment {
    change.map_or_else(TempoSegment::default, |change| TempoSegment {
        bpm: change.bpm,
        start: change.start_beats(),
        start_ms: change.scheduled_start_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Measure;

    fn sample_timeline() -> Timeline {
        Timeline::from_items(vec![
            TimelineItem::BpmChange(BpmChange::new(0, 1, 120.0)),
            TimelineItem::Measure(Measure::new(0, 1)),
            TimelineItem::Note(NoteItem::new(PitchId::Note(60), 0, 4, 4)),
            TimelineItem::Measure(Measure::new(4, 1)),
            TimelineItem::BpmChange(BpmChange::new(4, 1, 60.0)),
            TimelineItem::Note(NoteItem::new(PitchId::Note(62), 20, 4, 4)),
        ])
    }

    #[test]
    fn empty_timeline_has_no_range() {
        assert_eq!(Timeline::new().beats_indexes(0.0, 4.0), None);
    }

    #[test]
    fn beats_indexes_accept_reversed_bounds() {
        let timeline = sample_timeline();
        assert_eq!(timeline.beats_indexes(4.0, 0.0), Some((0, 4)));
        assert_eq!(timeline.beats_indexes_exclusive(0.0, 4.0), Some((0, 2)));
        assert_eq!(timeline.beats_indexes(1.5, 3.5), None);
    }

    #[test]
    fn tempo_change_scales_later_items() {
        let timeline = sample_timeline();
        assert_eq!(timeline.time_for_beats(4.0), 2_000.0);
        assert_eq!(timeline.time_for_beats(5.0), 3_000.0);
        assert_eq!(timeline.beats_for_time(3_000.0), 5.0);
        assert_eq!(timeline.playback_duration_ms(), 4_000.0);
        assert_eq!(timeline.extent_beats(), 6.0);
    }

    #[test]
    fn measure_and_note_lookups() {
        let timeline = sample_timeline();
        assert_eq!(timeline.last_measure_beats(3.9), 0.0);
        assert_eq!(timeline.last_measure_beats(4.5), 4.0);
        assert!(timeline.has_note_at_position(3, 4, &PitchId::Note(60)));
        assert!(!timeline.has_note_at_position(4, 4, &PitchId::Note(60)));
        assert_eq!(
            timeline.item_idx_at_beat(4.0, Some(ItemKind::Measure)),
            Some(4)
        );
        assert_eq!(timeline.bpm_at_beats(4.5), 60.0);
        assert!(timeline.note_at_beats(5.0).is_some());
    }
}

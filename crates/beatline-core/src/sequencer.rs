use std::{
    collections::BTreeSet,
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;
use rtrb::Consumer;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::{
    beats::Beats,
    config::BeatlineConfig,
    editor,
    model::{BpmChange, Chart, Cursor, PitchId, TimelineItem},
    persistence,
    playback::{self, KeyTable, PlaybackMessage, PlaybackSchedule, ScheduleSink},
    time::DEFAULT_BPM,
    timeline::Timeline,
};

#[derive(Debug, Error, PartialEq)]
pub enum SequencerError {
    #[error("invalid divisor: {0}")]
    InvalidDivisor(i64),
    #[error("invalid bpm: {0}")]
    InvalidBpm(f64),
    #[error("invalid note length: {0}")]
    InvalidLength(i64),
    #[error("invalid playback speed: {0}")]
    InvalidSpeed(f64),
    #[error("io error: {0}")]
    Io(String),
}

impl From<anyhow::Error> for SequencerError {
    fn from(value: anyhow::Error) -> Self {
        Self::Io(format!("{value:#}"))
    }
}

/// Range selection between the point it was started and the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Beats,
    pub head: Beats,
}

impl Selection {
    #[must_use]
    pub fn bounds(&self) -> (Beats, Beats) {
        (self.anchor.min(self.head), self.anchor.max(self.head))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clipboard {
    pub anchor: Beats,
    pub items: Vec<TimelineItem>,
}

fn active_filter(pitches: &BTreeSet<PitchId>) -> Option<&BTreeSet<PitchId>> {
    (!pitches.is_empty()).then_some(pitches)
}

pub type SharedSequencer = Arc<Mutex<Sequencer>>;

#[must_use]
pub fn shared(sequencer: Sequencer) -> SharedSequencer {
    Arc::new(Mutex::new(sequencer))
}

/// An editing session over one chart.
pub struct Sequencer {
    chart: Chart,
    selection: Option<Selection>,
    clipboard: Clipboard,
    notes_filter: BTreeSet<PitchId>,
    note_length: i64,
    speed: f64,
    keys: KeyTable,
    queue_capacity: usize,
    sink: Option<Box<dyn ScheduleSink + Send>>,
    playback: Option<PlaybackSchedule>,
}

impl fmt::Debug for Sequencer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequencer")
            .field("chart_id", &self.chart.id)
            .field("items", &self.chart.timeline.len())
            .field("cursor", &self.chart.cursor)
            .field("selection", &self.selection)
            .field("clipboard", &self.clipboard.items.len())
            .field("notes_filter", &self.notes_filter)
            .field("playing", &self.playback.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::with_config(Chart::new("Untitled"), &BeatlineConfig::default())
    }
}

impl Sequencer {
    #[must_use]
    pub fn new(chart: Chart) -> Self {
        Self::with_config(chart, &BeatlineConfig::default())
    }

    /// Builds a session with editor and playback settings from `config`.
    /// Out-of-range settings fall back to their defaults.
    #[must_use]
    pub fn with_config(mut chart: Chart, config: &BeatlineConfig) -> Self {
        if config.editor.cursor_divisor > 0 && chart.cursor.divisor != config.editor.cursor_divisor
        {
            chart.cursor = chart.cursor.rebased(config.editor.cursor_divisor);
        }
        let speed = if config.playback.speed.is_finite() && config.playback.speed > 0.0 {
            config.playback.speed
        } else {
            warn!(speed = config.playback.speed, "ignored invalid configured speed");
            1.0
        };
        Self {
            chart,
            selection: None,
            clipboard: Clipboard::default(),
            notes_filter: BTreeSet::new(),
            note_length: config.editor.note_length.max(1),
            speed,
            keys: KeyTable::chromatic(config.playback.first_key_note, config.playback.key_count),
            queue_capacity: config.playback.queue_capacity,
            sink: None,
            playback: None,
        }
    }

    /// Starts a chart with a single tempo change and measure at beat 0.
    /// An invalid configured tempo falls back to the default.
    #[must_use]
    pub fn new_chart(config: &BeatlineConfig) -> Self {
        let mut chart = Chart::new(config.editor.default_chart_name.clone());
        let bpm = if config.editor.default_bpm.is_finite() && config.editor.default_bpm > 0.0 {
            config.editor.default_bpm
        } else {
            warn!(bpm = config.editor.default_bpm, "ignored invalid configured tempo");
            DEFAULT_BPM
        };
        chart.timeline.mutate(|items| {
            editor::set_bpm_change(items, 0, 1, bpm);
            editor::toggle_measure(items, 0, 1);
        });
        Self::with_config(chart, config)
    }

    #[must_use]
    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    #[must_use]
    pub fn timeline(&self) -> &Timeline {
        &self.chart.timeline
    }

    #[must_use]
    pub fn cursor(&self) -> Cursor {
        self.chart.cursor
    }

    #[must_use]
    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    #[must_use]
    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    #[must_use]
    pub fn keys(&self) -> &KeyTable {
        &self.keys
    }

    pub fn set_keys(&mut self, keys: KeyTable) {
        self.keys = keys;
    }

    #[must_use]
    pub fn notes_filter(&self) -> &BTreeSet<PitchId> {
        &self.notes_filter
    }

    /// Limits painting and selection edits to `pitches`. An empty set edits
    /// everything.
    pub fn set_notes_filter(&mut self, pitches: BTreeSet<PitchId>) {
        debug!(pitches = pitches.len(), "notes filter changed");
        self.notes_filter = pitches;
    }

    pub fn attach_sink(&mut self, sink: Box<dyn ScheduleSink + Send>) {
        self.sink = Some(sink);
    }

    /// Attaches a ring buffer sink sized from the playback config and
    /// returns the audio thread's end of it.
    pub fn connect_audio(&mut self) -> Consumer<PlaybackMessage> {
        let (sink, rx) = playback::schedule_channel(self.queue_capacity);
        self.attach_sink(Box::new(sink));
        rx
    }

    #[must_use]
    pub fn playback(&self) -> Option<&PlaybackSchedule> {
        self.playback.as_ref()
    }

    #[must_use]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f64) -> Result<(), SequencerError> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(SequencerError::InvalidSpeed(speed));
        }
        self.speed = speed;
        Ok(())
    }

    #[must_use]
    pub fn note_length(&self) -> i64 {
        self.note_length
    }

    pub fn set_note_length(&mut self, length: i64) -> Result<(), SequencerError> {
        if length <= 0 {
            return Err(SequencerError::InvalidLength(length));
        }
        self.note_length = length;
        Ok(())
    }

    #[instrument(skip(self, chart), fields(chart_id = %chart.id))]
    pub fn replace_chart(&mut self, chart: Chart) {
        self.stop_playback();
        self.chart = chart;
        self.selection = None;
        info!(items = self.chart.timeline.len(), "chart replaced");
    }

    pub fn set_cursor(&mut self, start: i64) {
        self.chart.cursor.start = start.max(0);
        self.selection = None;
    }

    /// Changes the snap grid, keeping the cursor at (or just before) the
    /// same musical position.
    #[instrument(skip(self), fields(chart_id = %self.chart.id))]
    pub fn set_cursor_divisor(&mut self, divisor: i64) -> Result<(), SequencerError> {
        if divisor <= 0 {
            return Err(SequencerError::InvalidDivisor(divisor));
        }
        self.chart.cursor = self.chart.cursor.rebased(divisor);
        debug!(start = self.chart.cursor.start, "cursor rebased");
        Ok(())
    }

    pub fn move_cursor(&mut self, steps: i64, extend_selection: bool) {
        let from = self.chart.cursor.beats();
        self.chart.cursor.start = self.chart.cursor.start.saturating_add(steps).max(0);
        self.follow_cursor(from, extend_selection);
    }

    /// Moves the cursor onto the grid cell of the next (or previous) item.
    /// Returns whether the cursor moved.
    pub fn jump_to_adjacent_item(&mut self, forward: bool, extend_selection: bool) -> bool {
        let from = self.chart.cursor.beats();
        let items = self.chart.timeline.items();
        let target = if forward {
            items.iter().map(TimelineItem::start_beats).find(|beats| *beats > from)
        } else {
            items
                .iter()
                .rev()
                .map(TimelineItem::start_beats)
                .find(|beats| *beats < from)
        };
        let Some(target) = target else {
            return false;
        };

        let mut cursor = self.chart.cursor.snapped_to(target);
        if forward && cursor.start <= self.chart.cursor.start {
            cursor.start = self.chart.cursor.start.saturating_add(1);
        }
        self.chart.cursor = cursor;
        self.follow_cursor(from, extend_selection);
        true
    }

    fn follow_cursor(&mut self, from: Beats, extend_selection: bool) {
        let head = self.chart.cursor.beats();
        self.selection = if extend_selection {
            let anchor = self.selection.map_or(from, |selection| selection.anchor);
            Some(Selection { anchor, head })
        } else {
            None
        };
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    #[must_use]
    pub fn selection_bounds(&self) -> Option<(Beats, Beats)> {
        self.selection.map(|selection| selection.bounds())
    }

    /// Items starting inside the selection, excluding its upper bound.
    #[must_use]
    pub fn selection_indexes(&self) -> Option<(usize, usize)> {
        let (min, max) = self.selection_bounds()?;
        self.chart
            .timeline
            .beats_indexes_exclusive(min.as_f64(), max.as_f64())
    }

    #[must_use]
    pub fn has_note_at_cursor(&self, pitch: &PitchId) -> bool {
        let cursor = self.chart.cursor;
        self.chart
            .timeline
            .has_note_at_position(cursor.start, cursor.divisor, pitch)
    }

    #[must_use]
    pub fn current_item_index(&self) -> Option<usize> {
        self.chart
            .timeline
            .item_idx_at_beat(self.chart.cursor.beats().as_f64(), None)
    }

    /// Paints (or erases) `pitch` for the configured note length at the cursor.
    pub fn paint_note(&mut self, pitch: PitchId, on: bool) -> Result<(), SequencerError> {
        let cursor = self.chart.cursor;
        self.paint_range(cursor.start, cursor.divisor, pitch, self.note_length, on)
    }

    #[instrument(skip(self), fields(chart_id = %self.chart.id))]
    pub fn paint_range(
        &mut self,
        position: i64,
        divisor: i64,
        pitch: PitchId,
        length: i64,
        on: bool,
    ) -> Result<(), SequencerError> {
        if divisor <= 0 {
            return Err(SequencerError::InvalidDivisor(divisor));
        }
        if length <= 0 {
            return Err(SequencerError::InvalidLength(length));
        }
        if active_filter(&self.notes_filter).is_some_and(|pitches| !pitches.contains(&pitch)) {
            debug!("pitch outside notes filter");
            return Ok(());
        }

        self.chart.timeline.mutate(|items| {
            if on {
                editor::paint_on(items, position, divisor, pitch, length);
            } else {
                editor::paint_off(items, position, divisor, &pitch, length);
            }
        });
        self.chart.touch();
        info!(notes = self.chart.note_count(), "paint applied");
        Ok(())
    }

    #[instrument(skip(self), fields(chart_id = %self.chart.id))]
    pub fn set_bpm_at_cursor(&mut self, bpm: f64) -> Result<(), SequencerError> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(SequencerError::InvalidBpm(bpm));
        }
        let cursor = self.chart.cursor;
        self.chart
            .timeline
            .mutate(|items| editor::set_bpm_change(items, cursor.start, cursor.divisor, bpm));
        self.chart.touch();
        info!(beats = %cursor.beats(), "tempo change set");
        Ok(())
    }

    #[instrument(skip(self), fields(chart_id = %self.chart.id))]
    pub fn remove_bpm_at_cursor(&mut self) -> bool {
        let cursor = self.chart.cursor;
        let mut removed = false;
        self.chart.timeline.mutate(|items| {
            removed = editor::remove_bpm_change(items, cursor.start, cursor.divisor);
        });
        if removed {
            self.chart.touch();
            info!(beats = %cursor.beats(), "tempo change removed");
        }
        removed
    }

    /// Returns whether a measure sits at the cursor afterwards.
    #[instrument(skip(self), fields(chart_id = %self.chart.id))]
    pub fn toggle_measure_at_cursor(&mut self) -> bool {
        let cursor = self.chart.cursor;
        let mut present = false;
        self.chart.timeline.mutate(|items| {
            present = editor::toggle_measure(items, cursor.start, cursor.divisor);
        });
        self.chart.touch();
        info!(beats = %cursor.beats(), present, "measure toggled");
        present
    }

    /// Tempo at the cursor, falling back to the default tempo.
    #[must_use]
    pub fn bpm_at_cursor(&self) -> f64 {
        self.chart
            .timeline
            .bpm_at_beats(self.chart.cursor.beats().as_f64())
    }

    #[must_use]
    pub fn bpm_change_at_cursor(&self) -> Option<&BpmChange> {
        let beats = self.chart.cursor.beats();
        self.chart
            .timeline
            .bpm_change_before_beats(beats.as_f64())
            .filter(|change| change.start_beats() == beats)
    }

    /// Deletes selected items; measure markers are kept.
    #[instrument(skip(self), fields(chart_id = %self.chart.id))]
    pub fn delete_selection(&mut self) -> usize {
        let Some((start_idx, end_idx)) = self.selection_indexes() else {
            debug!("nothing selected");
            return 0;
        };
        let filter = active_filter(&self.notes_filter);
        let mut deleted = 0;
        self.chart.timeline.mutate(|items| {
            deleted = editor::delete_range(items, start_idx, end_idx, filter);
        });
        self.chart.touch();
        info!(deleted, "selection deleted");
        deleted
    }

    /// Moves the selected items and the selection itself by `delta`.
    #[instrument(skip(self), fields(chart_id = %self.chart.id))]
    pub fn shift_selection(&mut self, delta: Beats) -> usize {
        let (Some((start_idx, end_idx)), Some(selection)) =
            (self.selection_indexes(), self.selection)
        else {
            return 0;
        };
        let filter = active_filter(&self.notes_filter);
        let mut moved = 0;
        self.chart.timeline.mutate(|items| {
            moved = editor::shift_range(items, start_idx, end_idx, delta, filter);
        });
        self.selection = Some(Selection {
            anchor: (selection.anchor + delta).max(Beats::ZERO),
            head: (selection.head + delta).max(Beats::ZERO),
        });
        self.chart.touch();
        info!(moved, delta = %delta, "selection shifted");
        moved
    }

    #[instrument(skip(self), fields(chart_id = %self.chart.id))]
    pub fn transpose_selection(&mut self, half_steps: i32) -> usize {
        let Some((start_idx, end_idx)) = self.selection_indexes() else {
            return 0;
        };
        let filter = active_filter(&self.notes_filter);
        let mut transposed = 0;
        self.chart.timeline.mutate(|items| {
            transposed = editor::transpose_range(items, start_idx, end_idx, half_steps, filter);
        });
        self.chart.touch();
        info!(transposed, "selection transposed");
        transposed
    }

    /// Moves every item at or after the cursor by `delta`.
    #[instrument(skip(self), fields(chart_id = %self.chart.id))]
    pub fn shift_after_cursor(&mut self, delta: Beats) -> usize {
        let cursor = self.chart.cursor.beats().as_f64();
        let (Some(start_idx), Some(end_idx)) = (
            self.chart.timeline.beat_idx_after(cursor),
            self.chart.timeline.len().checked_sub(1),
        ) else {
            return 0;
        };
        let filter = active_filter(&self.notes_filter);
        let mut moved = 0;
        self.chart.timeline.mutate(|items| {
            moved = editor::shift_range(items, start_idx, end_idx, delta, filter);
        });
        self.chart.touch();
        info!(moved, delta = %delta, "items after cursor shifted");
        moved
    }

    /// Copies the selected items. The paste anchor is the earlier of the
    /// cursor and the first copied item.
    #[instrument(skip(self), fields(chart_id = %self.chart.id))]
    pub fn copy_selection(&mut self) -> usize {
        let Some((start_idx, end_idx)) = self.selection_indexes() else {
            return 0;
        };
        let items = self.chart.timeline.items()[start_idx..=end_idx].to_vec();
        let cursor = self.chart.cursor.beats();
        let anchor = items
            .first()
            .map_or(cursor, |first| first.start_beats().min(cursor));
        self.clipboard = Clipboard { anchor, items };
        info!(copied = self.clipboard.items.len(), anchor = %anchor, "selection copied");
        self.clipboard.items.len()
    }

    /// Pastes the clipboard so its anchor lands on the cursor.
    #[instrument(skip(self), fields(chart_id = %self.chart.id))]
    pub fn paste_at_cursor(&mut self) -> usize {
        if self.clipboard.items.is_empty() {
            return 0;
        }
        let delta = self.chart.cursor.beats() - self.clipboard.anchor;
        let pasted: Vec<TimelineItem> = self
            .clipboard
            .items
            .iter()
            .cloned()
            .map(|mut item| {
                let target = (item.start_beats() + delta).max(Beats::ZERO);
                item.move_to(target);
                item
            })
            .collect();
        let count = pasted.len();
        self.chart.timeline.mutate(|items| items.extend(pasted));
        self.chart.touch();
        info!(pasted = count, delta = %delta, "clipboard pasted");
        count
    }

    #[instrument(skip(self), fields(chart_id = %self.chart.id))]
    pub fn play_range(&mut self, start_beats: f64, end_beats: f64) -> Option<&PlaybackSchedule> {
        let schedule = playback::schedule_playback(
            &self.chart.timeline,
            start_beats,
            end_beats,
            self.speed,
            &self.keys,
        );
        self.start_playback(schedule)
    }

    #[instrument(skip(self), fields(chart_id = %self.chart.id))]
    pub fn play_all(&mut self) -> Option<&PlaybackSchedule> {
        let last = self.chart.timeline.len().checked_sub(1)?;
        let schedule =
            playback::schedule_indexes(&self.chart.timeline, 0, last, self.speed, &self.keys);
        self.start_playback(schedule)
    }

    /// Plays the selection, or from the last measure up to the cursor when
    /// nothing is selected.
    #[instrument(skip(self), fields(chart_id = %self.chart.id))]
    pub fn play_current_interval(&mut self) -> Option<&PlaybackSchedule> {
        if self.selection.is_some() {
            let (start_idx, end_idx) = self.selection_indexes()?;
            let schedule = playback::schedule_indexes(
                &self.chart.timeline,
                start_idx,
                end_idx,
                self.speed,
                &self.keys,
            );
            return self.start_playback(schedule);
        }

        let cursor = self.chart.cursor.beats().as_f64();
        let measure = self.chart.timeline.last_measure_beats(cursor);
        self.play_range(measure, cursor)
    }

    fn start_playback(&mut self, schedule: Option<PlaybackSchedule>) -> Option<&PlaybackSchedule> {
        let Some(schedule) = schedule else {
            debug!("nothing to play");
            return None;
        };
        if let Some(sink) = self.sink.as_mut() {
            sink.replace_schedule(schedule.presses.clone());
        }
        info!(
            start_idx = schedule.start_idx,
            end_idx = schedule.end_idx,
            presses = schedule.presses.len(),
            speed = schedule.speed,
            "playback started"
        );
        self.playback = Some(schedule);
        self.playback.as_ref()
    }

    pub fn stop_playback(&mut self) {
        if self.playback.take().is_some() {
            info!("playback stopped");
        }
        if let Some(sink) = self.sink.as_mut() {
            sink.cancel();
        }
    }

    /// Beat position of the playhead `elapsed_ms` after playback started.
    #[must_use]
    pub fn playback_beats_at(&self, elapsed_ms: f64) -> Option<f64> {
        let schedule = self.playback.as_ref()?;
        Some(
            self.chart
                .timeline
                .beats_for_time(schedule.chart_time_at(elapsed_ms)),
        )
    }

    #[must_use]
    pub fn is_item_being_played(&self, index: usize, elapsed_ms: f64) -> bool {
        let Some(schedule) = self.playback.as_ref() else {
            return false;
        };
        if elapsed_ms < 0.0 || !schedule.covers_index(index) {
            return false;
        }
        let Some(TimelineItem::Note(note)) = self.chart.timeline.items().get(index) else {
            return false;
        };
        let now = schedule.chart_time_at(elapsed_ms);
        note.scheduled_start_ms <= now && now <= note.scheduled_end_ms
    }

    #[instrument(skip(self), fields(chart_id = %self.chart.id, path = %path.display()))]
    pub fn save(&self, path: &Path) -> Result<(), SequencerError> {
        persistence::save_chart(path, &self.chart)?;
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn load(&mut self, path: &Path) -> Result<(), SequencerError> {
        let chart = persistence::load_chart(path)?;
        self.replace_chart(chart);
        Ok(())
    }

    #[instrument(skip(self), fields(chart_id = %self.chart.id, autosave_dir = %autosave_dir.display()))]
    pub fn autosave(&self, autosave_dir: &Path) -> Result<PathBuf, SequencerError> {
        Ok(persistence::autosave_chart(&self.chart, autosave_dir)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_inputs_are_rejected() {
        let mut sequencer = Sequencer::default();
        assert_eq!(
            sequencer.set_cursor_divisor(0),
            Err(SequencerError::InvalidDivisor(0))
        );
        assert_eq!(
            sequencer.set_bpm_at_cursor(f64::INFINITY),
            Err(SequencerError::InvalidBpm(f64::INFINITY))
        );
        assert_eq!(
            sequencer.paint_range(0, 4, PitchId::Note(60), -1, true),
            Err(SequencerError::InvalidLength(-1))
        );
        assert!(sequencer.timeline().is_empty());
    }

    #[test]
    fn moving_with_extend_grows_selection_from_start() {
        let mut sequencer = Sequencer::default();
        sequencer.move_cursor(2, false);
        sequencer.move_cursor(3, true);
        sequencer.move_cursor(1, true);
        assert_eq!(
            sequencer.selection_bounds(),
            Some((Beats::new(2, 4), Beats::new(6, 4)))
        );
        sequencer.move_cursor(-10, false);
        assert_eq!(sequencer.cursor().start, 0);
        assert_eq!(sequencer.selection(), None);
    }

    #[test]
    fn jump_lands_on_adjacent_items() {
        let mut sequencer = Sequencer::default();
        sequencer
            .paint_range(5, 4, PitchId::Note(60), 1, true)
            .expect("paint should apply");
        sequencer
            .paint_range(9, 8, PitchId::Note(62), 1, true)
            .expect("paint should apply");

        // 9/8 sits between grid lines, so the first jump floors onto 4/4.
        assert!(sequencer.jump_to_adjacent_item(true, false));
        assert_eq!(sequencer.cursor().start, 4);
        assert!(sequencer.jump_to_adjacent_item(true, false));
        assert_eq!(sequencer.cursor().start, 5);
        assert!(!sequencer.jump_to_adjacent_item(true, false));
        assert!(sequencer.jump_to_adjacent_item(false, false));
        assert_eq!(sequencer.cursor().start, 4);
    }

    #[test]
    fn new_chart_starts_with_tempo_and_measure() {
        let sequencer = Sequencer::new_chart(&BeatlineConfig::default());
        assert_eq!(sequencer.timeline().len(), 2);
        assert_eq!(sequencer.bpm_at_cursor(), 120.0);
        assert!(sequencer.bpm_change_at_cursor().is_some());
    }

    #[test]
    fn new_chart_replaces_an_unusable_default_tempo() {
        for bpm in [0.0, -30.0, f64::NAN] {
            let mut config = BeatlineConfig::default();
            config.editor.default_bpm = bpm;
            let mut sequencer = Sequencer::new_chart(&config);
            sequencer
                .paint_range(4, 4, PitchId::Note(60), 4, true)
                .expect("paint should apply");

            assert_eq!(sequencer.bpm_at_cursor(), DEFAULT_BPM);
            assert!(sequencer.timeline().items().iter().all(|item| {
                let start = item.scheduled_start_ms();
                start.is_finite()
                    && item
                        .as_note()
                        .is_none_or(|note| note.scheduled_end_ms.is_finite())
            }));
            let schedule = sequencer.play_all().expect("chart has a note");
            assert!(schedule.presses.iter().all(|press| press.time_ms.is_finite()));
        }
    }
}

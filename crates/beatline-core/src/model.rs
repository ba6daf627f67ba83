use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{beats::Beats, persistence::TimelineItemRecord, timeline::Timeline};

pub const DEFAULT_CURSOR_DIVISOR: i64 = 4;

/// What a note plays.
///
/// Chromatic notes sustain until released; samples are one-shots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PitchId {
    Note(i32),
    Sample(String),
}

impl PitchId {
    #[must_use]
    pub const fn requires_release(&self) -> bool {
        matches!(self, Self::Note(_))
    }

    #[must_use]
    pub fn transposed(&self, half_steps: i32) -> Self {
        match self {
            Self::Note(index) => Self::Note(index.saturating_add(half_steps)),
            Self::Sample(_) => self.clone(),
        }
    }
}

/// Item type codes, declared in tie-break priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    BpmChange,
    Measure,
    Note,
}

impl ItemKind {
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::BpmChange => 1,
            Self::Measure => 2,
            Self::Note => 3,
        }
    }

    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::BpmChange),
            2 => Some(Self::Measure),
            3 => Some(Self::Note),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteItem {
    pub start: i64,
    pub divisor: i64,
    pub length: i64,
    pub pitch: PitchId,
    pub scheduled_start_ms: f64,
    pub scheduled_end_ms: f64,
    pub index: usize,
}

impl NoteItem {
    #[must_use]
    pub fn new(pitch: PitchId, start: i64, divisor: i64, length: i64) -> Self {
        Self {
            start,
            divisor,
            length,
            pitch,
            scheduled_start_ms: 0.0,
            scheduled_end_ms: 0.0,
            index: 0,
        }
    }

    /// Builds a note covering `[start, end)` at the coarsest exact divisor.
    #[must_use]
    pub fn spanning(pitch: PitchId, start: Beats, end: Beats) -> Self {
        let (start, end, divisor) = Beats::align(start, end);
        Self::new(pitch, start, divisor, end.saturating_sub(start))
    }

    #[must_use]
    pub fn start_beats(&self) -> Beats {
        Beats::new(self.start, self.divisor)
    }

    #[must_use]
    pub fn length_beats(&self) -> Beats {
        Beats::new(self.length, self.divisor)
    }

    #[must_use]
    pub fn end_beats(&self) -> Beats {
        Beats::new(self.start.saturating_add(self.length), self.divisor)
    }

    pub fn set_span(&mut self, start: Beats, end: Beats) {
        let (start, end, divisor) = Beats::align(start, end);
        self.start = start;
        self.divisor = divisor;
        self.length = end.saturating_sub(start);
    }

    pub fn extend_to(&mut self, end: Beats) {
        self.set_span(self.start_beats(), end);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BpmChange {
    pub start: i64,
    pub divisor: i64,
    pub bpm: f64,
    pub scheduled_start_ms: f64,
    pub index: usize,
}

impl BpmChange {
    #[must_use]
    pub fn new(start: i64, divisor: i64, bpm: f64) -> Self {
        Self {
            start,
            divisor,
            bpm,
            scheduled_start_ms: 0.0,
            index: 0,
        }
    }

    #[must_use]
    pub fn start_beats(&self) -> Beats {
        Beats::new(self.start, self.divisor)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Measure {
    pub start: i64,
    pub divisor: i64,
    pub scheduled_start_ms: f64,
    pub index: usize,
}

impl Measure {
    #[must_use]
    pub fn new(start: i64, divisor: i64) -> Self {
        Self {
            start,
            divisor,
            scheduled_start_ms: 0.0,
            index: 0,
        }
    }

    #[must_use]
    pub fn start_beats(&self) -> Beats {
        Beats::new(self.start, self.divisor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TimelineItemRecord", into = "TimelineItemRecord")]
pub enum TimelineItem {
    BpmChange(BpmChange),
    Measure(Measure),
    Note(NoteItem),
}

impl TimelineItem {
    #[must_use]
    pub const fn kind(&self) -> ItemKind {
        match self {
            Self::BpmChange(_) => ItemKind::BpmChange,
            Self::Measure(_) => ItemKind::Measure,
            Self::Note(_) => ItemKind::Note,
        }
    }

    #[must_use]
    pub const fn start(&self) -> i64 {
        match self {
            Self::BpmChange(item) => item.start,
            Self::Measure(item) => item.start,
            Self::Note(item) => item.start,
        }
    }

    #[must_use]
    pub const fn divisor(&self) -> i64 {
        match self {
            Self::BpmChange(item) => item.divisor,
            Self::Measure(item) => item.divisor,
            Self::Note(item) => item.divisor,
        }
    }

    #[must_use]
    pub fn start_beats(&self) -> Beats {
        Beats::new(self.start(), self.divisor())
    }

    #[must_use]
    pub fn end_beats(&self) -> Beats {
        match self {
            Self::Note(note) => note.end_beats(),
            Self::BpmChange(_) | Self::Measure(_) => self.start_beats(),
        }
    }

    #[must_use]
    pub const fn scheduled_start_ms(&self) -> f64 {
        match self {
            Self::BpmChange(item) => item.scheduled_start_ms,
            Self::Measure(item) => item.scheduled_start_ms,
            Self::Note(item) => item.scheduled_start_ms,
        }
    }

    #[must_use]
    pub const fn scheduled_end_ms(&self) -> f64 {
        match self {
            Self::Note(item) => item.scheduled_end_ms,
            Self::BpmChange(item) => item.scheduled_start_ms,
            Self::Measure(item) => item.scheduled_start_ms,
        }
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            Self::BpmChange(item) => item.index,
            Self::Measure(item) => item.index,
            Self::Note(item) => item.index,
        }
    }

    #[must_use]
    pub const fn as_note(&self) -> Option<&NoteItem> {
        match self {
            Self::Note(note) => Some(note),
            Self::BpmChange(_) | Self::Measure(_) => None,
        }
    }

    #[must_use]
    pub const fn is_note(&self) -> bool {
        matches!(self, Self::Note(_))
    }

    /// Moves the item so it starts at `start`, keeping a note's length.
    pub fn move_to(&mut self, start: Beats) {
        match self {
            Self::Note(note) => {
                let end = start + note.length_beats();
                note.set_span(start, end);
            }
            Self::BpmChange(item) => {
                let start = start.reduced();
                item.start = start.numerator();
                item.divisor = start.divisor();
            }
            Self::Measure(item) => {
                let start = start.reduced();
                item.start = start.numerator();
                item.divisor = start.divisor();
            }
        }
    }

    /// Timeline ordering: beat position, then type priority, then pitch.
    #[must_use]
    pub fn timeline_cmp(&self, other: &Self) -> Ordering {
        self.start_beats()
            .cmp(&other.start_beats())
            .then_with(|| self.kind().cmp(&other.kind()))
            .then_with(|| match (self, other) {
                (Self::Note(a), Self::Note(b)) => a.pitch.cmp(&b.pitch),
                _ => Ordering::Equal,
            })
    }
}

impl From<NoteItem> for TimelineItem {
    fn from(note: NoteItem) -> Self {
        Self::Note(note)
    }
}

impl From<BpmChange> for TimelineItem {
    fn from(change: BpmChange) -> Self {
        Self::BpmChange(change)
    }
}

impl From<Measure> for TimelineItem {
    fn from(measure: Measure) -> Self {
        Self::Measure(measure)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub start: i64,
    pub divisor: i64,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            start: 0,
            divisor: DEFAULT_CURSOR_DIVISOR,
        }
    }
}

impl Cursor {
    #[must_use]
    pub fn beats(&self) -> Beats {
        Beats::new(self.start, self.divisor)
    }

    #[must_use]
    pub fn rebased(&self, divisor: i64) -> Self {
        Self {
            start: crate::beats::rebase(self.start, self.divisor, divisor),
            divisor,
        }
    }

    #[must_use]
    pub fn snapped_to(&self, beats: Beats) -> Self {
        Self {
            start: beats.floor_units(self.divisor),
            divisor: self.divisor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub cursor: Cursor,
    pub timeline: Timeline,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chart {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            cursor: Cursor::default(),
            timeline: Timeline::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    #[must_use]
    pub fn note_count(&self) -> usize {
        self.timeline
            .items()
            .iter()
            .filter(|item| item.is_note())
            .count()
    }
}

use std::collections::BTreeMap;

use rtrb::{Consumer, Producer, PushError, RingBuffer};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::{
    model::{PitchId, TimelineItem},
    timeline::Timeline,
};

pub type KeyId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBinding {
    pub key_id: KeyId,
    pub requires_release: bool,
}

/// Resolves which physical key plays a pitch.
pub trait KeyLookup {
    fn binding(&self, pitch: &PitchId) -> Option<KeyBinding>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyTable {
    bindings: BTreeMap<PitchId, KeyBinding>,
}

impl KeyTable {
    /// Binds `count` consecutive chromatic notes from `first_note` to keys `0..count`.
    #[must_use]
    pub fn chromatic(first_note: i32, count: u32) -> Self {
        let mut table = Self::default();
        for offset in 0..count {
            let Ok(step) = i32::try_from(offset) else {
                break;
            };
            table.bind(PitchId::Note(first_note.saturating_add(step)), offset);
        }
        table
    }

    /// Binds a pitch; the release requirement follows the pitch kind.
    pub fn bind(&mut self, pitch: PitchId, key_id: KeyId) -> &mut Self {
        let binding = KeyBinding {
            key_id,
            requires_release: pitch.requires_release(),
        };
        self.bindings.insert(pitch, binding);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl KeyLookup for KeyTable {
    fn binding(&self, pitch: &PitchId) -> Option<KeyBinding> {
        self.bindings.get(pitch).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledKeyPress {
    pub time_ms: f64,
    pub key_id: KeyId,
    pub pressed: bool,
    pub pitch_id: PitchId,
}

/// A press list together with the window it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSchedule {
    pub presses: Vec<ScheduledKeyPress>,
    pub start_idx: usize,
    pub end_idx: usize,
    /// Chart time, in milliseconds, that elapsed time 0 corresponds to.
    pub origin_ms: f64,
    pub lead_in_ms: f64,
    pub speed: f64,
}

impl PlaybackSchedule {
    /// Maps wall-clock time since playback started back onto the chart.
    #[must_use]
    pub fn chart_time_at(&self, elapsed_ms: f64) -> f64 {
        self.origin_ms + elapsed_ms * self.speed
    }

    #[must_use]
    pub fn covers_index(&self, index: usize) -> bool {
        (self.start_idx..=self.end_idx).contains(&index)
    }
}

/// Schedules the items inside the beat window `[start_beats, end_beats]`.
///
/// Times are relative to `start_beats`, so a window opening after the first
/// item's start gets a lead-in. `None` when the window holds no item or the
/// speed is not a positive number.
#[instrument(skip(timeline, keys), fields(items = timeline.len()))]
pub fn schedule_playback(
    timeline: &Timeline,
    start_beats: f64,
    end_beats: f64,
    speed: f64,
    keys: &impl KeyLookup,
) -> Option<PlaybackSchedule> {
    let (start_idx, end_idx) = timeline.beats_indexes(start_beats, end_beats)?;
    let origin_ms = timeline.time_for_beats(start_beats.min(end_beats));
    build_schedule(timeline, start_idx, end_idx, origin_ms, speed, keys)
}

/// Schedules the inclusive index range, starting at the first item.
#[instrument(skip(timeline, keys), fields(items = timeline.len()))]
pub fn schedule_indexes(
    timeline: &Timeline,
    start_idx: usize,
    end_idx: usize,
    speed: f64,
    keys: &impl KeyLookup,
) -> Option<PlaybackSchedule> {
    let first = timeline.items().get(start_idx)?;
    let end_idx = end_idx.min(timeline.len().saturating_sub(1));
    if end_idx < start_idx {
        return None;
    }
    build_schedule(
        timeline,
        start_idx,
        end_idx,
        first.scheduled_start_ms(),
        speed,
        keys,
    )
}

fn build_schedule(
    timeline: &Timeline,
    start_idx: usize,
    end_idx: usize,
    origin_ms: f64,
    speed: f64,
    keys: &impl KeyLookup,
) -> Option<PlaybackSchedule> {
    if !speed.is_finite() || speed <= 0.0 {
        warn!(speed, "rejected playback speed");
        return None;
    }
    let first = timeline.items().get(start_idx)?;
    let lead_in_ms = first.scheduled_start_ms() - origin_ms;

    let mut presses = Vec::new();
    let mut unbound = 0_usize;
    for item in &timeline.items()[start_idx..=end_idx] {
        let note = match item {
            TimelineItem::BpmChange(_) | TimelineItem::Measure(_) => continue,
            TimelineItem::Note(note) => note,
        };
        let Some(binding) = keys.binding(&note.pitch) else {
            unbound += 1;
            continue;
        };

        presses.push(ScheduledKeyPress {
            time_ms: note.scheduled_start_ms - origin_ms,
            key_id: binding.key_id,
            pressed: true,
            pitch_id: note.pitch.clone(),
        });
        if binding.requires_release {
            presses.push(ScheduledKeyPress {
                time_ms: note.scheduled_end_ms - origin_ms,
                key_id: binding.key_id,
                pressed: false,
                pitch_id: note.pitch.clone(),
            });
        }
    }

    for press in &mut presses {
        press.time_ms /= speed;
    }
    presses.sort_by(|a, b| a.time_ms.total_cmp(&b.time_ms));

    debug!(
        start_idx,
        end_idx,
        presses = presses.len(),
        unbound,
        lead_in_ms,
        "playback scheduled"
    );
    Some(PlaybackSchedule {
        presses,
        start_idx,
        end_idx,
        origin_ms,
        lead_in_ms,
        speed,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackMessage {
    /// Replaces whatever the renderer was playing. Empty means stop.
    Schedule(Vec<ScheduledKeyPress>),
}

/// Receives finished schedules. Each call supersedes the previous one.
pub trait ScheduleSink {
    fn replace_schedule(&mut self, presses: Vec<ScheduledKeyPress>);

    fn cancel(&mut self) {
        self.replace_schedule(Vec::new());
    }
}

/// Forwards schedules to an audio thread over a lock-free ring buffer.
pub struct RingBufferSink {
    tx: Producer<PlaybackMessage>,
}

impl RingBufferSink {
    #[must_use]
    pub fn new(tx: Producer<PlaybackMessage>) -> Self {
        Self { tx }
    }
}

impl std::fmt::Debug for RingBufferSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBufferSink")
            .field("slots", &self.tx.slots())
            .finish()
    }
}

impl ScheduleSink for RingBufferSink {
    fn replace_schedule(&mut self, presses: Vec<ScheduledKeyPress>) {
        let count = presses.len();
        if let Err(PushError::Full(_)) = self.tx.push(PlaybackMessage::Schedule(presses)) {
            warn!(presses = count, "playback queue full, schedule dropped");
        }
    }
}

#[must_use]
pub fn schedule_channel(capacity: usize) -> (RingBufferSink, Consumer<PlaybackMessage>) {
    let (tx, rx) = RingBuffer::new(capacity.max(1));
    (RingBufferSink::new(tx), rx)
}

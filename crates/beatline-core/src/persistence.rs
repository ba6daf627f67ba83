use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::{
    model::{BpmChange, Chart, ItemKind, Measure, NoteItem, PitchId, TimelineItem},
    timeline::Timeline,
};

#[derive(Debug, Error, PartialEq)]
pub enum TimelineError {
    #[error("unknown timeline item type code: {0}")]
    UnknownItemType(u8),
    #[error("{kind:?} record is missing `{field}`")]
    MissingField { kind: ItemKind, field: &'static str },
    #[error("invalid divisor: {0}")]
    InvalidDivisor(i64),
    #[error("invalid bpm: {0}")]
    InvalidBpm(f64),
}

/// Persisted shape of a timeline item: a record tagged by an integer type
/// code. Scheduled times and indexes are derived and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineItemRecord {
    #[serde(rename = "type")]
    pub kind: u8,
    pub start: i64,
    pub divisor: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch_id: Option<PitchId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpm: Option<f64>,
}

impl TryFrom<TimelineItemRecord> for TimelineItem {
    type Error = TimelineError;

    fn try_from(record: TimelineItemRecord) -> Result<Self, Self::Error> {
        let kind =
            ItemKind::from_code(record.kind).ok_or(TimelineError::UnknownItemType(record.kind))?;
        if record.divisor <= 0 {
            return Err(TimelineError::InvalidDivisor(record.divisor));
        }

        let item = match kind {
            ItemKind::BpmChange => {
                let bpm = record.bpm.ok_or(TimelineError::MissingField {
                    kind,
                    field: "bpm",
                })?;
                if !bpm.is_finite() || bpm <= 0.0 {
                    return Err(TimelineError::InvalidBpm(bpm));
                }
                Self::BpmChange(BpmChange::new(record.start, record.divisor, bpm))
            }
            ItemKind::Measure => Self::Measure(Measure::new(record.start, record.divisor)),
            ItemKind::Note => {
                let length = record.length.ok_or(TimelineError::MissingField {
                    kind,
                    field: "length",
                })?;
                let pitch = record.pitch_id.ok_or(TimelineError::MissingField {
                    kind,
                    field: "pitch_id",
                })?;
                Self::Note(NoteItem::new(pitch, record.start, record.divisor, length))
            }
        };
        Ok(item)
    }
}

impl From<TimelineItem> for TimelineItemRecord {
    fn from(item: TimelineItem) -> Self {
        let kind = item.kind().code();
        match item {
            TimelineItem::BpmChange(change) => Self {
                kind,
                start: change.start,
                divisor: change.divisor,
                length: None,
                pitch_id: None,
                bpm: Some(change.bpm),
            },
            TimelineItem::Measure(measure) => Self {
                kind,
                start: measure.start,
                divisor: measure.divisor,
                length: None,
                pitch_id: None,
                bpm: None,
            },
            TimelineItem::Note(note) => Self {
                kind,
                start: note.start,
                divisor: note.divisor,
                length: Some(note.length),
                pitch_id: Some(note.pitch),
                bpm: None,
            },
        }
    }
}

/// Decodes a persisted item array into a normalized timeline.
pub fn decode_items(bytes: &[u8]) -> Result<Timeline> {
    let items: Vec<TimelineItem> =
        serde_json::from_slice(bytes).context("invalid timeline item json")?;
    Ok(Timeline::from_items(items))
}

pub fn encode_items(timeline: &Timeline) -> Result<Vec<u8>> {
    serde_json::to_vec(timeline.items()).context("failed to serialize timeline items")
}

#[instrument(skip(chart), fields(chart_id = %chart.id, path = %path.display()))]
pub fn save_chart(path: &Path, chart: &Chart) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }

    let json = serde_json::to_vec_pretty(chart).context("failed to serialize chart")?;
    let mut temp_file = tempfile::NamedTempFile::new_in(
        path.parent()
            .map_or_else(|| Path::new(".").to_path_buf(), Path::to_path_buf),
    )
    .context("failed to create temp chart file")?;

    use std::io::Write;
    temp_file
        .write_all(&json)
        .context("failed to write temp chart file")?;
    temp_file
        .persist(path)
        .map_err(|error| anyhow::anyhow!(error.error))
        .with_context(|| format!("failed to persist chart: {}", path.display()))?;

    info!(items = chart.timeline.len(), "chart saved");
    Ok(())
}

#[instrument(fields(path = %path.display()))]
pub fn load_chart(path: &Path) -> Result<Chart> {
    let content =
        fs::read(path).with_context(|| format!("failed to read chart: {}", path.display()))?;
    let chart: Chart = serde_json::from_slice(&content).context("invalid chart json")?;
    info!(chart_id = %chart.id, items = chart.timeline.len(), "chart loaded");
    Ok(chart)
}

#[instrument(skip(chart), fields(chart_id = %chart.id, autosave_dir = %autosave_dir.display()))]
pub fn autosave_chart(chart: &Chart, autosave_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(autosave_dir).with_context(|| {
        format!(
            "failed to create autosave directory: {}",
            autosave_dir.display()
        )
    })?;

    let file_name = format!("{}.autosave.beatline.json", chart.id);
    let autosave_path = autosave_dir.join(file_name);
    save_chart(&autosave_path, chart)?;

    debug!(path = %autosave_path.display(), "autosave complete");
    Ok(autosave_path)
}

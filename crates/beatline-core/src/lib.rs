pub mod beats;
pub mod config;
pub mod diagnostics;
pub mod editor;
pub mod fixtures;
pub mod lanes;
pub mod model;
pub mod normalize;
pub mod persistence;
pub mod playback;
pub mod sequencer;
pub mod time;
pub mod timeline;

pub use beats::{Beats, EPSILON_BEATS};
pub use config::BeatlineConfig;
pub use diagnostics::{
    TelemetryGuard, init_tracing, init_tracing_with_config, init_tracing_with_options,
};
pub use lanes::{lanes_in_window, partition_lanes};
pub use model::{BpmChange, Chart, Cursor, ItemKind, Measure, NoteItem, PitchId, TimelineItem};
pub use normalize::normalize;
pub use persistence::{TimelineError, TimelineItemRecord};
pub use playback::{
    KeyBinding, KeyId, KeyLookup, KeyTable, PlaybackMessage, PlaybackSchedule, RingBufferSink,
    ScheduleSink, ScheduledKeyPress, schedule_channel, schedule_indexes, schedule_playback,
};
pub use sequencer::{Clipboard, Selection, Sequencer, SequencerError, SharedSequencer};
pub use timeline::{Timeline, transact};

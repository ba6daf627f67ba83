use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    editor,
    model::{Chart, PitchId},
};

const DEMO_CHART_ID: Uuid = Uuid::from_u128(0x9ed0_a3fa_4064_458f_b95f_1fdd_0bc4_f0be);
// 2026-02-23T00:00:00Z
const DEMO_TIMESTAMP_SECS: i64 = 1_771_804_800;

/// A fixed four-bar chart with a tempo change, a chord, and a sample
/// kick on every beat.
#[must_use]
pub fn demo_chart() -> Chart {
    let mut chart = Chart::new("Beatline Demo");
    chart.id = DEMO_CHART_ID;
    let fixed_timestamp = DateTime::<Utc>::from_timestamp(DEMO_TIMESTAMP_SECS, 0).unwrap_or_default();
    chart.created_at = fixed_timestamp;
    chart.updated_at = fixed_timestamp;

    chart.timeline.mutate(|items| {
        editor::set_bpm_change(items, 0, 1, 138.0);
        editor::set_bpm_change(items, 8, 1, 150.0);
        for bar in 0..4 {
            editor::toggle_measure(items, bar * 4, 1);
        }
        for beat in 0..16 {
            editor::paint_on(items, beat * 2, 2, PitchId::Sample("kick".to_string()), 1);
        }

        // (position in eighths, note, length in eighths)
        let lead = [
            (0, 72, 2),
            (2, 74, 2),
            (4, 79, 6),
            (10, 81, 6),
            (16, 79, 4),
            (20, 77, 4),
            (24, 76, 8),
        ];
        for (position, note, length) in lead {
            editor::paint_on(items, position, 2, PitchId::Note(note), length);
        }

        for note in [60, 64, 67] {
            editor::paint_on(items, 8, 1, PitchId::Note(note), 4);
        }
    });
    chart
}

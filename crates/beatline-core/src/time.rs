use crate::beats::Beats;

pub const DEFAULT_BPM: f64 = 120.0;

#[must_use]
pub fn beats_to_ms(beats: f64, bpm: f64) -> f64 {
    beats / (bpm / 60_000.0)
}

#[must_use]
pub fn ms_to_beats(ms: f64, bpm: f64) -> f64 {
    ms * (bpm / 60_000.0)
}

/// A constant-tempo stretch of the timeline, anchored at the tempo change
/// that opened it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoSegment {
    pub bpm: f64,
    pub start: Beats,
    pub start_ms: f64,
}

impl Default for TempoSegment {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            start: Beats::ZERO,
            start_ms: 0.0,
        }
    }
}

impl TempoSegment {
    #[must_use]
    pub fn time_for(&self, beats: Beats) -> f64 {
        self.start_ms + beats_to_ms((beats - self.start).as_f64(), self.bpm)
    }

    #[must_use]
    pub fn time_for_f64(&self, beats: f64) -> f64 {
        self.start_ms + beats_to_ms(beats - self.start.as_f64(), self.bpm)
    }

    #[must_use]
    pub fn beats_for(&self, ms: f64) -> f64 {
        self.start.as_f64() + ms_to_beats(ms - self.start_ms, self.bpm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tempo_is_half_a_second_per_beat() {
        assert_eq!(beats_to_ms(1.0, DEFAULT_BPM), 500.0);
        assert_eq!(ms_to_beats(500.0, DEFAULT_BPM), 1.0);
    }

    #[test]
    fn segment_round_trip_is_stable() {
        let segment = TempoSegment {
            bpm: 174.0,
            start: Beats::new(17, 4),
            start_ms: 2_125.0,
        };
        let time = segment.time_for(Beats::new(45, 8));
        let restored = segment.beats_for(time);
        assert!((restored - 45.0 / 8.0).abs() < 1e-9);
    }
}

//! Measured heart rate from heartbeat cycle timings

/// Timestamps, in milliseconds, of recently completed heartbeat cycles
///
/// Needs two entries to produce a rate. After every measurement the record
/// keeps only the latest timestamp, which becomes the start of the next one.
#[derive(Debug, Clone, Default)]
pub struct CycleTimingRecord {
    timestamps: Vec<u64>,
}

impl CycleTimingRecord {
    pub fn new() -> Self {
        CycleTimingRecord::default()
    }

    /// Records a completed cycle and returns the unclamped rate once measurable
    pub fn record(&mut self, at_ms: u64) -> Option<u32> {
        self.timestamps.push(at_ms);
        if self.timestamps.len() < 2 {
            return None;
        }

        let bpm = cycles_per_minute(&self.timestamps);
        self.timestamps.clear();
        self.timestamps.push(at_ms);
        bpm
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn clear(&mut self) {
        self.timestamps.clear();
    }
}

/// Cycles per minute over a run of cycle timestamps
///
/// The average cycle length uses whole-millisecond integer division. Cycles
/// shorter than a millisecond read as `u32::MAX`, left for the clamp to bound.
pub fn cycles_per_minute(timestamps: &[u64]) -> Option<u32> {
    if timestamps.len() < 2 {
        return None;
    }
    let first = *timestamps.first()?;
    let last = *timestamps.last()?;

    let per_cycle = last.saturating_sub(first) / (timestamps.len() as u64 - 1);
    if per_cycle == 0 {
        return Some(u32::MAX);
    }
    Some((60_000.0 / per_cycle as f64) as u32)
}

/// Pulls a measured rate into the configured bounds
///
/// Bounds truncate to whole beats. If `min` ends up above `max`, `max` wins.
pub fn clamp_bpm(bpm: u32, min: f32, max: f32) -> u32 {
    bpm.max(min as u32).min(max as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycles_per_minute() {
        assert_eq!(cycles_per_minute(&[0, 1000]), Some(60));
        assert_eq!(cycles_per_minute(&[0, 500, 1000]), Some(120));
        assert_eq!(cycles_per_minute(&[200, 1180]), Some(61));
    }

    #[test]
    fn test_cycles_per_minute_needs_two() {
        assert_eq!(cycles_per_minute(&[]), None);
        assert_eq!(cycles_per_minute(&[1000]), None);
    }

    #[test]
    fn test_zero_length_cycle() {
        assert_eq!(cycles_per_minute(&[5, 5]), Some(u32::MAX));
        assert_eq!(clamp_bpm(u32::MAX, 60.0, 180.0), 180);
    }

    #[test]
    fn test_record_reseeds_after_measurement() {
        let mut record = CycleTimingRecord::new();
        assert_eq!(record.record(0), None);
        assert_eq!(record.len(), 1);

        assert_eq!(record.record(1000), Some(60));
        assert_eq!(record.len(), 1); // Only the latest timestamp is kept

        assert_eq!(record.record(1500), Some(120));
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_clamp_bpm() {
        assert_eq!(clamp_bpm(500, 60.0, 180.0), 180);
        assert_eq!(clamp_bpm(20, 60.0, 180.0), 60);
        assert_eq!(clamp_bpm(90, 60.0, 180.0), 90);
        assert_eq!(clamp_bpm(90, 60.9, 180.9), 90);
    }

    #[test]
    fn test_clamp_bpm_inverted_bounds() {
        assert_eq!(clamp_bpm(90, 200.0, 100.0), 100);
    }
}

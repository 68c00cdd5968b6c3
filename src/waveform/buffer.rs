use std::collections::VecDeque;

/// Fixed-length window of the visible trace, oldest sample first
///
/// Starts filled with zeros. Every advance drops the oldest sample and
/// appends the new one, so the length only changes through [`resize`].
///
/// [`resize`]: WaveformBuffer::resize
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformBuffer {
    samples: VecDeque<f32>,
}

impl WaveformBuffer {
    pub fn new(capacity: usize) -> Self {
        WaveformBuffer {
            samples: std::iter::repeat_n(0.0, capacity).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Drops the oldest sample and appends `sample` as the newest
    pub fn advance(&mut self, sample: f32) {
        if self.samples.pop_front().is_some() {
            self.samples.push_back(sample);
        }
    }

    /// Most recent sample
    pub fn latest(&self) -> Option<f32> {
        self.samples.back().copied()
    }

    /// Ordered copy of the samples, oldest first
    pub fn snapshot(&self) -> Vec<f32> {
        self.samples.iter().copied().collect()
    }

    /// Changes the window length, keeping the newest samples
    ///
    /// Growing pads with zeros on the oldest side.
    pub fn resize(&mut self, capacity: usize) {
        let len = self.samples.len();
        if capacity < len {
            self.samples.drain(..len - capacity);
        } else {
            for _ in len..capacity {
                self.samples.push_front(0.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer_is_flat() {
        let buffer = WaveformBuffer::new(135);
        assert_eq!(buffer.capacity(), 135);
        assert!(buffer.snapshot().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_length_is_invariant() {
        let mut buffer = WaveformBuffer::new(135);
        for i in 0..1000 {
            buffer.advance(i as f32);
        }
        assert_eq!(buffer.capacity(), 135);
        assert_eq!(buffer.snapshot().len(), 135);
    }

    #[test]
    fn test_advance_is_fifo() {
        let mut buffer = WaveformBuffer::new(3);
        buffer.advance(1.0);
        assert_eq!(buffer.latest(), Some(1.0));
        buffer.advance(2.0);
        buffer.advance(3.0);
        buffer.advance(4.0);

        assert_eq!(buffer.snapshot(), vec![2.0, 3.0, 4.0]);
        assert_eq!(buffer.latest(), Some(4.0));
    }

    #[test]
    fn test_zero_capacity_ignores_samples() {
        let mut buffer = WaveformBuffer::new(0);
        buffer.advance(5.0);
        assert_eq!(buffer.capacity(), 0);
        assert_eq!(buffer.latest(), None);
    }

    #[test]
    fn test_resize_keeps_newest() {
        let mut buffer = WaveformBuffer::new(4);
        for s in [1.0, 2.0, 3.0, 4.0] {
            buffer.advance(s);
        }

        buffer.resize(2);
        assert_eq!(buffer.snapshot(), vec![3.0, 4.0]);

        buffer.resize(4);
        assert_eq!(buffer.snapshot(), vec![0.0, 0.0, 3.0, 4.0]);
    }
}

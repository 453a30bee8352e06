//! Sliding window of recent gaze measurements.
//!
//! Four parallel sequences (yaw, pitch, blink, gaze-x) are appended together,
//! only on frames where a face was tracked, and share one fixed capacity.

use std::collections::VecDeque;

/// Samples retained for temporal intent classification.
pub const WINDOW_CAPACITY: usize = 30;

/// Fixed-capacity FIFO. Appending to a full buffer evicts the oldest value.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Create a buffer holding at most `capacity` items (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a value, returning the evicted oldest value if the buffer was full.
    pub fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(value);
        evicted
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &T> + Clone + '_ {
        self.items.iter()
    }
}

/// One face-present frame's contribution to the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeSample {
    pub yaw: f64,
    pub pitch: f64,
    pub blink: bool,
    pub gaze_x: f64,
}

/// The per-session sliding window.
#[derive(Debug, Clone)]
pub struct GazeWindow {
    yaw: RingBuffer<f64>,
    pitch: RingBuffer<f64>,
    blink: RingBuffer<bool>,
    gaze_x: RingBuffer<f64>,
}

impl Default for GazeWindow {
    fn default() -> Self {
        Self::with_capacity(WINDOW_CAPACITY)
    }
}

impl GazeWindow {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            yaw: RingBuffer::new(capacity),
            pitch: RingBuffer::new(capacity),
            blink: RingBuffer::new(capacity),
            gaze_x: RingBuffer::new(capacity),
        }
    }

    /// Append to all four sequences at once.
    pub fn push(&mut self, sample: GazeSample) {
        self.yaw.push(sample.yaw);
        self.pitch.push(sample.pitch);
        self.blink.push(sample.blink);
        self.gaze_x.push(sample.gaze_x);
    }

    pub fn len(&self) -> usize {
        self.yaw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.yaw.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.yaw.capacity()
    }

    pub fn yaw(&self) -> impl ExactSizeIterator<Item = f64> + Clone + '_ {
        self.yaw.iter().copied()
    }

    pub fn pitch(&self) -> impl ExactSizeIterator<Item = f64> + Clone + '_ {
        self.pitch.iter().copied()
    }

    pub fn blink(&self) -> impl ExactSizeIterator<Item = bool> + Clone + '_ {
        self.blink.iter().copied()
    }

    pub fn gaze_x(&self) -> impl ExactSizeIterator<Item = f64> + Clone + '_ {
        self.gaze_x.iter().copied()
    }

    /// Reassemble the retained samples, oldest first.
    pub fn samples(&self) -> Vec<GazeSample> {
        self.yaw()
            .zip(self.pitch())
            .zip(self.blink())
            .zip(self.gaze_x())
            .map(|(((yaw, pitch), blink), gaze_x)| GazeSample {
                yaw,
                pitch,
                blink,
                gaze_x,
            })
            .collect()
    }
}

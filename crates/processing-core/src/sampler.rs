//! Frame sampling policy.

use std::num::NonZeroU32;

/// Selects every Kth decoded frame for analysis.
///
/// Stateless: the decode index is counted by the session driver, starting
/// at 1 for the first decoded frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameSampler {
    every: NonZeroU32,
}

impl FrameSampler {
    pub fn new(every: NonZeroU32) -> Self {
        Self { every }
    }

    /// Whether the frame at `index` is analyzed.
    pub fn should_sample(&self, index: u64) -> bool {
        index % u64::from(self.every.get()) == 0
    }

    /// How many of the first `decoded` frames are analyzed.
    pub fn sampled_count(&self, decoded: u64) -> u64 {
        decoded / u64::from(self.every.get())
    }

    pub fn every(&self) -> u32 {
        self.every.get()
    }
}

use std::collections::VecDeque;

use common::*;

/// A single sample of a region's load, as reported by the storage server hosting it.
#[derive(Debug, Copy, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct LoadSample {
    pub read_requests_count: i64,
    pub write_requests_count: i64,
    pub mem_store_size_mb: i32,
    pub storefile_size_mb: i32,
}

/// A bounded, oldest-evicted-first history of a single region's load samples. Mirrors the
/// teacher's `DoubleSidedVec`-style "push and evict" shape, but over a plain `VecDeque` since
/// there is no need for negative indices here.
#[derive(Debug, Clone)]
pub struct LoadHistory {
    samples: VecDeque<LoadSample>,
    capacity: usize,
}

impl LoadHistory {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "load history capacity must be positive");
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: LoadSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoadSample> {
        self.samples.iter()
    }

    /// Mean of first-differences of `extract` over the window, floored at 0 — turns a
    /// monotonically increasing counter into a per-sample rate. Returns 0 if fewer than two
    /// samples are present.
    pub fn mean_rate(&self, extract: impl Fn(&LoadSample) -> i64) -> f64 {
        if self.samples.len() < 2 {
            return 0.0;
        }

        let values: Vec<i64> = self.samples.iter().map(&extract).collect();
        let diffs_sum: i64 = values.windows(2).map(|w| w[1] - w[0]).sum();
        let mean = diffs_sum as f64 / (values.len() - 1) as f64;
        mean.max(0.0)
    }

    /// Latest absolute value, for non-rate stats like `storefile_size_mb`.
    pub fn latest(&self, extract: impl Fn(&LoadSample) -> i64) -> i64 {
        self.samples.back().map(&extract).unwrap_or(0)
    }
}

// Copyright (c) Facebook, Inc. and its affiliates.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::time::Duration;
use std::time::Instant;

/// One traffic direction's history, bucketed into fixed-width intervals.
///
/// Timestamps map to bucket keys by elapsed time since `start`; the
/// mapping is pure and monotonic, so the same instant always lands in
/// the same bucket no matter what was written before. Storage is a
/// fixed-capacity ring indexed `key % capacity`: buckets older than the
/// retained window are discarded, which bounds memory while
/// `get_slice_from_end` still sees exactly the history a chart can show.
#[derive(Debug)]
pub struct TimeSeries {
    interval: Duration,
    start: Instant,
    slots: Vec<u64>,
    max_key: Option<usize>,
}

impl TimeSeries {
    pub fn new(interval: Duration, start: Instant, capacity: usize) -> TimeSeries {
        assert!(!interval.is_zero(), "bucket interval must be non-zero");
        assert!(capacity > 0, "ring capacity must be non-zero");
        TimeSeries {
            interval,
            start,
            slots: vec![0; capacity],
            max_key: None,
        }
    }

    /// Bucket key for `at`: `floor((at - start) / interval)`. Instants
    /// before `start` saturate into bucket 0.
    pub fn calculate_key(&self, at: Instant) -> usize {
        let elapsed = at.saturating_duration_since(self.start);
        (elapsed.as_micros() / self.interval.as_micros()) as usize
    }

    /// Stores `value` in the bucket `at` falls into, overwriting any
    /// earlier value for that bucket. Buckets skipped since the last
    /// write are zero-filled; writes older than the retained window are
    /// dropped.
    pub fn set(&mut self, at: Instant, value: u64) {
        let key = self.calculate_key(at);
        let capacity = self.slots.len();
        match self.max_key {
            Some(max_key) if key <= max_key => {
                if max_key - key < capacity {
                    self.slots[key % capacity] = value;
                }
                return;
            }
            Some(max_key) => {
                // Only the last `capacity` of the skipped buckets still
                // have a slot; the rest would be overwritten anyway.
                let first_new = (max_key + 1).max(key.saturating_sub(capacity - 1));
                for k in first_new..key {
                    self.slots[k % capacity] = 0;
                }
            }
            None => {}
        }
        self.slots[key % capacity] = value;
        self.max_key = Some(key);
    }

    pub fn get(&self, at: Instant) -> u64 {
        let key = self.calculate_key(at);
        let capacity = self.slots.len();
        match self.max_key {
            Some(max_key) if key <= max_key && max_key - key < capacity => {
                self.slots[key % capacity]
            }
            _ => 0,
        }
    }

    /// The most recent `len` bucket values in chronological order,
    /// zero-padded at the head when the series is shorter than `len`.
    pub fn get_slice_from_end(&self, len: usize) -> Vec<u64> {
        let mut slice = vec![0u64; len];
        let Some(max_key) = self.max_key else {
            return slice;
        };
        let capacity = self.slots.len();
        for (i, value) in slice.iter_mut().enumerate() {
            let back = len - 1 - i;
            if back > max_key || back >= capacity {
                continue;
            }
            *value = self.slots[(max_key - back) % capacity];
        }
        slice
    }

    /// Number of buckets written so far, including zero-filled gaps.
    pub fn size(&self) -> usize {
        self.max_key.map_or(0, |k| k + 1)
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

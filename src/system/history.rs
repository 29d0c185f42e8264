use std::collections::VecDeque;

use super::snapshot::SystemSnapshot;

pub const DEFAULT_CAPACITY: usize = 20;

/// Observer-side rolling window of usage samples for trend charts.
///
/// The poller keeps only the latest snapshot; anything that wants a history
/// records it here. Appending to a full window evicts the oldest sample.
#[derive(Debug, Clone)]
pub struct UsageHistory {
    pub cpu: VecDeque<f32>,
    pub memory: VecDeque<f32>,
    pub battery: VecDeque<f32>,
    capacity: usize,
}

impl UsageHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            cpu: VecDeque::with_capacity(capacity),
            memory: VecDeque::with_capacity(capacity),
            battery: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.cpu.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cpu.is_empty()
    }

    pub fn record(&mut self, snapshot: &SystemSnapshot) {
        push_bounded(&mut self.cpu, snapshot.cpu.usage, self.capacity);
        push_bounded(&mut self.memory, snapshot.memory.usage, self.capacity);
        push_bounded(&mut self.battery, snapshot.battery.level, self.capacity);
    }
}

impl Default for UsageHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

fn push_bounded(buf: &mut VecDeque<f32>, value: f32, capacity: usize) {
    if buf.len() == capacity {
        buf.pop_front();
    }
    buf.push_back(value);
}

//! Fixed-capacity moving-average filter.
//!
//! A ring buffer with a running sum.  Each insert subtracts the evicted
//! slot before overwriting it, so `add` is O(1) regardless of capacity and
//! the sum always equals the total of the occupied slots.

/// Default window (samples).
pub const FILTER_SIZE: usize = 5;

/// Moving average over the most recent `N` samples.
#[derive(Debug, Clone)]
pub struct MovingAverage<const N: usize = FILTER_SIZE> {
    ring: [f32; N],
    head: usize,
    count: usize,
    sum: f32,
}

impl<const N: usize> Default for MovingAverage<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> MovingAverage<N> {
    pub const fn new() -> Self {
        assert!(N > 0, "filter capacity must be non-zero");
        Self {
            ring: [0.0; N],
            head: 0,
            count: 0,
            sum: 0.0,
        }
    }

    /// Insert a sample and return the updated average.
    pub fn add(&mut self, value: f32) -> f32 {
        // Unoccupied slots hold 0.0, so subtracting them is a no-op.
        self.sum -= self.ring[self.head];
        self.ring[self.head] = value;
        self.sum += value;

        self.head = (self.head + 1) % N;
        if self.count < N {
            self.count += 1;
        }

        self.average()
    }

    /// Current average; 0.0 when empty.
    pub fn average(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum / self.count as f32
    }

    /// Drop every sample.
    pub fn reset(&mut self) {
        self.ring = [0.0; N];
        self.head = 0;
        self.count = 0;
        self.sum = 0.0;
    }

    /// Number of occupied slots (saturates at `N`).
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

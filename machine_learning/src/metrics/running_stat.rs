/// Weighted running average of a metric.
///
/// `avg` is `sum / count` once something has been counted and `0` before that.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct RunningStat {
    val: f64,
    sum: f64,
    count: usize,
    avg: f64,
}

impl RunningStat {
    /// Creates an empty `RunningStat`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accounts for `value` observed `weight` times, e.g. a batch mean weighted by the batch size.
    pub fn update(&mut self, value: f64, weight: usize) {
        self.val = value;
        self.sum += value * weight as f64;
        self.count += weight;

        if self.count > 0 {
            self.avg = self.sum / self.count as f64;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// The last value passed to `update`.
    pub fn val(&self) -> f64 {
        self.val
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn avg(&self) -> f64 {
        self.avg
    }
}

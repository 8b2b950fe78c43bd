//! Running numeric statistics.
//!
//! Single-pass mean/variance via Welford's algorithm; partial accumulators
//! are combined with Chan's parallel algorithm so chunk order never changes
//! the result beyond floating-point rounding.

/// Welford state for one column's numeric interpretation.
#[derive(Debug, Clone, Copy)]
pub struct NumericStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl Default for NumericStats {
    fn default() -> Self {
        Self::new()
    }
}

impl NumericStats {
    pub fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;

        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    /// Chan's algorithm for combining two partial summaries.
    ///
    /// The combined mean uses the weighted average of means rather than a
    /// delta-based update, which keeps precision when both sides are large:
    /// - n_c = n_a + n_b
    /// - mu_c = (n_a * mu_a + n_b * mu_b) / n_c
    /// - M2_c = M2_a + M2_b + (mu_b - mu_a)^2 * n_a * n_b / n_c
    pub fn merge(&mut self, other: &NumericStats) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }

        let count = self.count + other.count;
        let mean = (self.count as f64 * self.mean + other.count as f64 * other.mean)
            / count as f64;
        let delta = other.mean - self.mean;
        let m2 = self.m2
            + other.m2
            + delta * delta * (self.count as f64 * other.count as f64) / count as f64;

        self.count = count;
        self.mean = mean;
        self.m2 = m2;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    pub fn min(&self) -> Option<f64> {
        (self.count > 0).then_some(self.min)
    }

    pub fn max(&self) -> Option<f64> {
        (self.count > 0).then_some(self.max)
    }

    /// Sample variance (divides by N-1)
    pub fn sample_variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.sample_variance().sqrt()
    }
}

//! Fixed-capacity quantile sketch.
//!
//! Keeps at most `capacity` weighted centroids regardless of how many values
//! are pushed, so the memory cost of median/quartile estimation is constant.
//! Merging two sketches concatenates centroids and re-compresses, which keeps
//! the estimate independent of chunk arrival order up to compression error.

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy)]
struct Centroid {
    mean: f64,
    weight: u64,
}

#[derive(Debug, Clone)]
pub struct QuantileSketch {
    capacity: usize,
    centroids: Vec<Centroid>,
    buffer: Vec<f64>,
}

impl Default for QuantileSketch {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl QuantileSketch {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(8);
        Self {
            capacity,
            centroids: Vec::new(),
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.buffer.push(value);
        if self.buffer.len() >= self.capacity {
            self.compress();
        }
    }

    pub fn merge(&mut self, other: &QuantileSketch) {
        self.centroids.extend_from_slice(&other.centroids);
        self.buffer.extend_from_slice(&other.buffer);
        self.compress();
    }

    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty() && self.buffer.is_empty()
    }

    fn total_weight(&self) -> u64 {
        self.centroids.iter().map(|c| c.weight).sum::<u64>() + self.buffer.len() as u64
    }

    /// Fold the buffer into the centroid list and shrink back to capacity by
    /// repeatedly joining the lightest adjacent pair.
    fn compress(&mut self) {
        self.centroids
            .extend(self.buffer.drain(..).map(|v| Centroid { mean: v, weight: 1 }));
        self.centroids
            .sort_by(|a, b| a.mean.total_cmp(&b.mean));

        while self.centroids.len() > self.capacity {
            let mut best = 0;
            let mut best_weight = u64::MAX;
            for i in 0..self.centroids.len() - 1 {
                let w = self.centroids[i].weight + self.centroids[i + 1].weight;
                if w < best_weight {
                    best_weight = w;
                    best = i;
                }
            }
            let b = self.centroids.remove(best + 1);
            let a = &mut self.centroids[best];
            let w = a.weight + b.weight;
            a.mean = (a.mean * a.weight as f64 + b.mean * b.weight as f64) / w as f64;
            a.weight = w;
        }
    }

    /// Estimate the q-quantile (q in [0,1]) by linear interpolation between
    /// centroid midpoints.
    pub fn quantile(&mut self, q: f64) -> Option<f64> {
        if !self.buffer.is_empty() {
            self.compress();
        }
        if self.centroids.is_empty() {
            return None;
        }
        let q = q.clamp(0.0, 1.0);
        let total = self.total_weight() as f64;
        let target = q * total;

        let mut cumulative = 0.0;
        let mut prev_mid = self.centroids[0].mean;
        let mut prev_cum = 0.0;
        for c in &self.centroids {
            let mid = cumulative + c.weight as f64 / 2.0;
            if target <= mid {
                if mid == prev_cum {
                    return Some(c.mean);
                }
                let fraction = (target - prev_cum) / (mid - prev_cum);
                return Some(prev_mid + fraction * (c.mean - prev_mid));
            }
            cumulative += c.weight as f64;
            prev_mid = c.mean;
            prev_cum = mid;
        }
        Some(self.centroids[self.centroids.len() - 1].mean)
    }

    pub fn median(&mut self) -> Option<f64> {
        self.quantile(0.5)
    }
}

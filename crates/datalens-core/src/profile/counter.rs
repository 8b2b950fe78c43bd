//! Bounded frequency counter (space-saving).
//!
//! Tracks approximate counts for at most `capacity` distinct keys. When a new
//! key arrives at capacity, the least-frequent entry is evicted and the new
//! key inherits its count plus one, the standard space-saving overestimate.

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct BoundedCounter {
    capacity: usize,
    counts: HashMap<String, u64>,
    total: u64,
}

impl BoundedCounter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            counts: HashMap::new(),
            total: 0,
        }
    }

    pub fn record(&mut self, key: &str) {
        self.total += 1;
        if let Some(count) = self.counts.get_mut(key) {
            *count += 1;
            return;
        }
        if self.counts.len() < self.capacity {
            self.counts.insert(key.to_string(), 1);
            return;
        }
        // Evict the least-frequent entry; ties broken by key so the result
        // is deterministic.
        let victim = self
            .counts
            .iter()
            .min_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)))
            .map(|(k, v)| (k.clone(), *v));
        if let Some((key_out, count_out)) = victim {
            self.counts.remove(&key_out);
            self.counts.insert(key.to_string(), count_out + 1);
        }
    }

    pub fn merge(&mut self, other: &BoundedCounter) {
        self.total += other.total;
        for (key, count) in &other.counts {
            *self.counts.entry(key.clone()).or_insert(0) += count;
        }
        if self.counts.len() > self.capacity {
            let mut entries: Vec<(String, u64)> = self.counts.drain().collect();
            entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            entries.truncate(self.capacity);
            self.counts = entries.into_iter().collect();
        }
    }

    /// Top entries, highest count first, ties by key.
    pub fn top(&self, n: usize) -> Vec<(String, u64)> {
        let mut entries: Vec<(String, u64)> =
            self.counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.truncate(n);
        entries
    }

    pub fn most_common(&self) -> Option<(String, u64)> {
        self.top(1).into_iter().next()
    }

    /// Number of recorded observations (not distinct keys).
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_within_capacity() {
        let mut counter = BoundedCounter::with_capacity(10);
        for key in ["a", "b", "a", "c", "a", "b"] {
            counter.record(key);
        }
        assert_eq!(counter.total(), 6);
        assert_eq!(
            counter.top(2),
            vec![("a".to_string(), 3), ("b".to_string(), 2)]
        );
    }

    #[test]
    fn test_eviction_keeps_capacity() {
        let mut counter = BoundedCounter::with_capacity(3);
        for i in 0..100 {
            counter.record(&format!("key{}", i));
        }
        assert_eq!(counter.len(), 3);
        assert_eq!(counter.total(), 100);
    }

    #[test]
    fn test_heavy_hitter_survives_eviction() {
        let mut counter = BoundedCounter::with_capacity(4);
        for i in 0..200 {
            counter.record("hot");
            counter.record(&format!("cold{}", i));
        }
        let top = counter.most_common().unwrap();
        assert_eq!(top.0, "hot");
        assert!(top.1 >= 200);
    }

    #[test]
    fn test_merge_sums_counts() {
        let mut a = BoundedCounter::with_capacity(10);
        let mut b = BoundedCounter::with_capacity(10);
        a.record("x");
        a.record("x");
        b.record("x");
        b.record("y");
        a.merge(&b);
        assert_eq!(a.total(), 4);
        assert_eq!(
            a.top(2),
            vec![("x".to_string(), 3), ("y".to_string(), 1)]
        );
    }

    #[test]
    fn test_top_ordering_is_deterministic() {
        let mut counter = BoundedCounter::with_capacity(10);
        for key in ["b", "a", "c"] {
            counter.record(key);
        }
        // Equal counts are ordered by key
        assert_eq!(
            counter.top(3),
            vec![
                ("a".to_string(), 1),
                ("b".to_string(), 1),
                ("c".to_string(), 1)
            ]
        );
    }
}

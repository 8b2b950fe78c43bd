//! Cross-column correlation via running co-moments.
//!
//! The pairwise Welford extension accumulates co-moment sums in one pass;
//! Pearson coefficients are derived only at finalize time. The column set is
//! capped (default 20 numeric candidates) so memory stays O(N²) in the cap,
//! never in the file width.

use serde::Serialize;

/// Running moments for one column pair. Rows where either side is null are
/// skipped entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct PairMoments {
    n: u64,
    mean_x: f64,
    mean_y: f64,
    m2x: f64,
    m2y: f64,
    cxy: f64,
}

impl PairMoments {
    pub fn push(&mut self, x: f64, y: f64) {
        self.n += 1;
        let n = self.n as f64;
        let dx = x - self.mean_x;
        self.mean_x += dx / n;
        let dx2 = x - self.mean_x;
        let dy = y - self.mean_y;
        self.mean_y += dy / n;
        let dy2 = y - self.mean_y;
        self.m2x += dx * dx2;
        self.m2y += dy * dy2;
        self.cxy += dx * dy2;
    }

    /// Chan-style combination, mirroring `NumericStats::merge`.
    pub fn merge(&mut self, other: &PairMoments) {
        if other.n == 0 {
            return;
        }
        if self.n == 0 {
            *self = *other;
            return;
        }
        let n = self.n + other.n;
        let na = self.n as f64;
        let nb = other.n as f64;
        let nc = n as f64;
        let dx = other.mean_x - self.mean_x;
        let dy = other.mean_y - self.mean_y;

        self.m2x += other.m2x + dx * dx * na * nb / nc;
        self.m2y += other.m2y + dy * dy * na * nb / nc;
        self.cxy += other.cxy + dx * dy * na * nb / nc;
        self.mean_x = (na * self.mean_x + nb * other.mean_x) / nc;
        self.mean_y = (na * self.mean_y + nb * other.mean_y) / nc;
        self.n = n;
    }

    pub fn pearson(&self) -> Option<f64> {
        if self.n < 2 {
            return None;
        }
        let denom = (self.m2x * self.m2y).sqrt();
        if denom == 0.0 {
            return None;
        }
        Some((self.cxy / denom).clamp(-1.0, 1.0))
    }
}

/// One finalized correlation entry.
#[derive(Debug, Clone, Serialize)]
pub struct Correlation {
    pub left: String,
    pub right: String,
    pub coefficient: f64,
}

/// Upper-triangle accumulator over the capped numeric column set.
#[derive(Debug, Clone)]
pub struct CorrelationAccumulator {
    columns: Vec<String>,
    pairs: Vec<PairMoments>,
}

impl CorrelationAccumulator {
    pub fn new(columns: Vec<String>) -> Self {
        let n = columns.len();
        Self {
            columns,
            pairs: vec![PairMoments::default(); n * n.saturating_sub(1) / 2],
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    fn pair_index(&self, i: usize, j: usize) -> usize {
        // upper triangle, row-major: (i, j) with i < j
        debug_assert!(i < j && j < self.columns.len());
        let n = self.columns.len();
        i * n - i * (i + 1) / 2 + (j - i - 1)
    }

    /// Feed one row of values, indexed like `columns()`.
    pub fn push_row(&mut self, values: &[Option<f64>]) {
        debug_assert_eq!(values.len(), self.columns.len());
        for i in 0..values.len() {
            let Some(x) = values[i] else { continue };
            for j in (i + 1)..values.len() {
                let Some(y) = values[j] else { continue };
                let index = self.pair_index(i, j);
                self.pairs[index].push(x, y);
            }
        }
    }

    pub fn merge(&mut self, other: &CorrelationAccumulator) {
        debug_assert_eq!(self.columns, other.columns);
        for (a, b) in self.pairs.iter_mut().zip(other.pairs.iter()) {
            a.merge(b);
        }
    }

    pub fn finalize(&self) -> Vec<Correlation> {
        let mut out = Vec::new();
        for i in 0..self.columns.len() {
            for j in (i + 1)..self.columns.len() {
                let index = self.pair_index(i, j);
                if let Some(coefficient) = self.pairs[index].pearson() {
                    out.push(Correlation {
                        left: self.columns[i].clone(),
                        right: self.columns[j].clone(),
                        coefficient,
                    });
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_positive_correlation() {
        let mut acc = CorrelationAccumulator::new(vec!["x".into(), "y".into()]);
        for i in 0..100 {
            acc.push_row(&[Some(i as f64), Some(2.0 * i as f64 + 1.0)]);
        }
        let out = acc.finalize();
        assert_eq!(out.len(), 1);
        assert!((out[0].coefficient - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_perfect_negative_correlation() {
        let mut acc = CorrelationAccumulator::new(vec!["x".into(), "y".into()]);
        for i in 0..50 {
            acc.push_row(&[Some(i as f64), Some(-(i as f64))]);
        }
        assert!((acc.finalize()[0].coefficient + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_null_rows_skipped() {
        let mut acc = CorrelationAccumulator::new(vec!["x".into(), "y".into()]);
        acc.push_row(&[Some(1.0), Some(1.0)]);
        acc.push_row(&[Some(2.0), None]);
        acc.push_row(&[Some(3.0), Some(3.0)]);
        acc.push_row(&[None, Some(4.0)]);
        acc.push_row(&[Some(5.0), Some(5.0)]);
        let out = acc.finalize();
        assert!((out[0].coefficient - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_column_yields_no_entry() {
        let mut acc = CorrelationAccumulator::new(vec!["x".into(), "y".into()]);
        for i in 0..10 {
            acc.push_row(&[Some(i as f64), Some(7.0)]);
        }
        assert!(acc.finalize().is_empty());
    }

    #[test]
    fn test_merge_matches_single_pass() {
        let columns = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let mut left = CorrelationAccumulator::new(columns.clone());
        let mut right = CorrelationAccumulator::new(columns.clone());
        let mut single = CorrelationAccumulator::new(columns);

        let rows: Vec<[Option<f64>; 3]> = (0..200)
            .map(|i| {
                let x = i as f64;
                [Some(x), Some(x * x), Some(100.0 - x)]
            })
            .collect();
        for (i, row) in rows.iter().enumerate() {
            single.push_row(row);
            if i < 100 {
                left.push_row(row);
            } else {
                right.push_row(row);
            }
        }
        left.merge(&right);

        let merged = left.finalize();
        let direct = single.finalize();
        assert_eq!(merged.len(), direct.len());
        for (m, d) in merged.iter().zip(direct.iter()) {
            assert!((m.coefficient - d.coefficient).abs() < 1e-9);
        }
    }
}

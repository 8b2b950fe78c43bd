//! Quality scoring.
//!
//! All scores are percentages in [0,100]. A zero-row column reports
//! completeness 100 by convention: an empty column raises no quality signal
//! on its own, EmptyFileCheck is the rule that catches empty inputs. The
//! same convention applies to the other scores when there is nothing to
//! measure.

use serde::Serialize;

const WEIGHT_COMPLETENESS: f64 = 0.3;
const WEIGHT_VALIDITY: f64 = 0.3;
const WEIGHT_UNIQUENESS: f64 = 0.2;
const WEIGHT_CONSISTENCY: f64 = 0.2;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct QualityScores {
    pub completeness: f64,
    pub validity: f64,
    pub uniqueness: f64,
    pub consistency: f64,
    pub overall: f64,
}

/// Derive the score set from finalized accumulator counts.
///
/// * `count` — total values including nulls
/// * `null_count` — nulls among them
/// * `unique_count` — distinct non-null values
/// * `type_confidence` — validity input from type inference (100 for known types)
/// * `top_pattern_count` — frequency of the most common generalized pattern
pub fn score_column(
    count: u64,
    null_count: u64,
    unique_count: u64,
    type_confidence: f64,
    top_pattern_count: u64,
) -> QualityScores {
    let non_null = count - null_count;

    let completeness = if count == 0 {
        100.0
    } else {
        (non_null as f64 / count as f64) * 100.0
    };
    let validity = type_confidence;
    let uniqueness = if count == 0 {
        100.0
    } else {
        (unique_count as f64 / count as f64) * 100.0
    };
    let consistency = if non_null == 0 {
        100.0
    } else {
        (top_pattern_count as f64 / non_null as f64) * 100.0
    };

    let clamp = |v: f64| v.clamp(0.0, 100.0);
    let completeness = clamp(completeness);
    let validity = clamp(validity);
    let uniqueness = clamp(uniqueness);
    let consistency = clamp(consistency);

    let overall = WEIGHT_COMPLETENESS * completeness
        + WEIGHT_VALIDITY * validity
        + WEIGHT_UNIQUENESS * uniqueness
        + WEIGHT_CONSISTENCY * consistency;

    QualityScores {
        completeness,
        validity,
        uniqueness,
        consistency,
        overall: clamp(overall),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_a_completeness_and_uniqueness() {
        // [1,2,null,4,5,6,7,8,null,10]: 10 values, 2 null, 8 distinct
        let scores = score_column(10, 2, 8, 100.0, 8);
        assert_eq!(scores.completeness, 80.0);
        assert_eq!(scores.uniqueness, 80.0);
        assert_eq!(scores.consistency, 100.0);
    }

    #[test]
    fn test_zero_row_column_scores_100() {
        let scores = score_column(0, 0, 0, 100.0, 0);
        assert_eq!(scores.completeness, 100.0);
        assert_eq!(scores.uniqueness, 100.0);
        assert_eq!(scores.consistency, 100.0);
        assert_eq!(scores.overall, 100.0);
    }

    #[test]
    fn test_overall_weighting() {
        let scores = score_column(100, 0, 100, 50.0, 100);
        // completeness 100, validity 50, uniqueness 100, consistency 100
        assert!((scores.overall - (0.3 * 100.0 + 0.3 * 50.0 + 0.2 * 100.0 + 0.2 * 100.0)).abs() < 1e-9);
    }

    #[test]
    fn test_score_bounds() {
        for (count, nulls, unique, conf, pattern) in [
            (0u64, 0u64, 0u64, 0.0f64, 0u64),
            (10, 10, 0, 0.0, 0),
            (10, 0, 10, 100.0, 10),
            (3, 1, 2, 66.6, 2),
        ] {
            let s = score_column(count, nulls, unique, conf, pattern);
            for v in [s.completeness, s.validity, s.uniqueness, s.consistency, s.overall] {
                assert!((0.0..=100.0).contains(&v), "score out of bounds: {}", v);
            }
        }
    }
}

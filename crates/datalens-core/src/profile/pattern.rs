//! Pattern generalization for consistency scoring.
//!
//! Each value is normalized by character class: digits become `9`, uppercase
//! letters `A`, lowercase letters `a`, everything else is kept as-is. Two
//! values share a pattern when they have the same shape, e.g. `AB-4821` and
//! `XY-1000` both generalize to `AA-9999`.

pub fn generalize(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_digit() {
                '9'
            } else if c.is_ascii_uppercase() {
                'A'
            } else if c.is_ascii_lowercase() {
                'a'
            } else {
                c
            }
        })
        .collect()
}

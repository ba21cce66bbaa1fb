//! Head-to-head comparison of two engines
//!
//! Built on top of the summary rows: for every operation measured on both
//! engines, pick the faster one and compute how much faster it is.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::stats::SummaryRow;

/// How many times faster the winner is
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Speedup(pub f64);

impl Speedup {
    /// Ratio of the slower time over the faster one
    pub fn between(a: f64, b: f64) -> Self {
        let (fast, slow) = if a <= b { (a, b) } else { (b, a) };
        if slow == 0.0 {
            Speedup(1.0)
        } else if fast == 0.0 {
            Speedup(f64::INFINITY)
        } else {
            Speedup(slow / fast)
        }
    }
}

impl fmt::Display for Speedup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_infinite() {
            write!(f, "inf")
        } else {
            write!(f, "{:.2}x", self.0)
        }
    }
}

/// One line of the direct comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub operation: String,
    pub baseline_time: f64,
    pub contender_time: f64,
    pub winner: String,
    pub speedup: Speedup,
}

/// Direct comparison between two engines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub baseline: String,
    pub contender: String,
    pub rows: Vec<ComparisonRow>,
}

impl Comparison {
    /// Number of operations won by the given engine
    pub fn wins(&self, engine: &str) -> usize {
        self.rows.iter().filter(|row| row.winner == engine).count()
    }
}

/// Compare `baseline` against `contender` on every operation both have.
///
/// The baseline wins only when strictly faster; ties go to the contender.
/// Operations missing on either side are skipped.
pub fn compare(summary: &[SummaryRow], baseline: &str, contender: &str) -> Comparison {
    let mut times: BTreeMap<&str, (Option<f64>, Option<f64>)> = BTreeMap::new();
    for row in summary {
        let entry = times.entry(row.operation.as_str()).or_insert((None, None));
        if row.engine == baseline {
            entry.0 = Some(row.avg_time);
        } else if row.engine == contender {
            entry.1 = Some(row.avg_time);
        }
    }

    let rows = times.into_iter()
        .filter_map(|(operation, pair)| match pair {
            (Some(baseline_time), Some(contender_time)) => {
                let winner = if baseline_time < contender_time { baseline } else { contender };
                Some(ComparisonRow {
                    operation: operation.to_string(),
                    baseline_time,
                    contender_time,
                    winner: winner.to_string(),
                    speedup: Speedup::between(baseline_time, contender_time),
                })
            },
            _ => None,
        })
        .collect();

    Comparison {
        baseline: baseline.to_string(),
        contender: contender.to_string(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(operation: &str, engine: &str, avg_time: f64) -> SummaryRow {
        SummaryRow {
            operation: operation.to_string(),
            engine: engine.to_string(),
            samples: 1,
            avg_time,
            time_std: None,
            avg_results: 1.0,
        }
    }

    #[test]
    fn test_winner_and_speedup() {
        let summary = vec![
            row("by_category", "SQLite", 0.004),
            row("by_category", "Sled", 0.001),
            row("by_id", "SQLite", 0.001),
            row("by_id", "Sled", 0.003),
        ];

        let comparison = compare(&summary, "Sled", "SQLite");
        assert_eq!(comparison.rows.len(), 2);

        let category = &comparison.rows[0];
        assert_eq!(category.operation, "by_category");
        assert_eq!(category.winner, "Sled");
        assert_eq!(category.speedup.to_string(), "4.00x");

        let by_id = &comparison.rows[1];
        assert_eq!(by_id.winner, "SQLite");
        assert_eq!(by_id.speedup.to_string(), "3.00x");

        assert_eq!(comparison.wins("Sled"), 1);
    }

    #[test]
    fn test_missing_side_is_skipped() {
        let summary = vec![
            row("only_sql", "SQLite", 0.1),
            row("both", "SQLite", 0.1),
            row("both", "Sled", 0.2),
        ];

        let comparison = compare(&summary, "Sled", "SQLite");
        assert_eq!(comparison.rows.len(), 1);
        assert_eq!(comparison.rows[0].operation, "both");
    }

    #[test]
    fn test_tie_goes_to_contender() {
        let comparison = compare(&[row("op", "A", 0.5), row("op", "B", 0.5)], "A", "B");
        assert_eq!(comparison.rows[0].winner, "B");
        assert_eq!(comparison.rows[0].speedup.to_string(), "1.00x");
    }

    #[test]
    fn test_zero_times() {
        assert_eq!(Speedup::between(0.0, 0.0), Speedup(1.0));
        assert_eq!(Speedup::between(0.0, 0.2).to_string(), "inf");
    }
}

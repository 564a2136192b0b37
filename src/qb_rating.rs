use std::io::{self, Write};

use crate::correlation::{CorrelationMatrix, correlation_matrix};
use crate::dataset::QuarterbackSeasonRecord;
use crate::error::{AnalysisError, Result};
use crate::league::CORRELATION_HEADING;
use crate::report;

/// Rating points per net yard per attempt.
pub const NET_YARDS_WEIGHT: f64 = 1.543;
/// Rating points lost per unit of interception rate.
pub const INTERCEPTION_WEIGHT: f64 = 50.0957;

pub const TABLE_HEADERS: [&str; 4] = ["Player", "OldQBR", "TOTALQBR", "OurRating"];

#[derive(Debug, Clone, PartialEq)]
pub struct QuarterbackRating {
    pub player: String,
    /// (yards - sack yards) / attempts
    pub true_net_ypa: f64,
    /// interceptions / attempts
    pub interception_rate: f64,
    pub rating: f64,
    pub old_qbr: f64,
    pub total_qbr: f64,
}

impl QuarterbackRating {
    pub fn from_record(record: &QuarterbackSeasonRecord) -> Result<Self> {
        if record.attempts <= 0 {
            return Err(AnalysisError::ZeroAttempts {
                player: record.player.clone(),
                attempts: record.attempts,
            });
        }
        let attempts = record.attempts as f64;
        let true_net_ypa = (record.yards - record.sack_yards) as f64 / attempts;
        let interception_rate = record.interceptions as f64 / attempts;
        Ok(Self {
            player: record.player.clone(),
            true_net_ypa,
            interception_rate,
            rating: custom_rating(true_net_ypa, interception_rate),
            old_qbr: record.old_qbr,
            total_qbr: record.total_qbr,
        })
    }
}

pub fn custom_rating(true_net_ypa: f64, interception_rate: f64) -> f64 {
    NET_YARDS_WEIGHT * true_net_ypa - INTERCEPTION_WEIGHT * interception_rate
}

#[derive(Debug, Clone)]
pub struct QbComparison {
    pub ratings: Vec<QuarterbackRating>,
    pub correlation: CorrelationMatrix,
}

pub fn rate_all(records: &[QuarterbackSeasonRecord]) -> Result<Vec<QuarterbackRating>> {
    records.iter().map(QuarterbackRating::from_record).collect()
}

pub fn analyze(records: &[QuarterbackSeasonRecord]) -> Result<QbComparison> {
    let ratings = rate_all(records)?;
    let correlation = rating_correlation(&ratings)?;
    Ok(QbComparison {
        ratings,
        correlation,
    })
}

/// Pairwise correlation of the two reference ratings and the custom one.
pub fn rating_correlation(ratings: &[QuarterbackRating]) -> Result<CorrelationMatrix> {
    correlation_matrix(&[
        (
            "OldQBR".to_string(),
            ratings.iter().map(|r| r.old_qbr).collect(),
        ),
        (
            "TOTALQBR".to_string(),
            ratings.iter().map(|r| r.total_qbr).collect(),
        ),
        (
            "OurRating".to_string(),
            ratings.iter().map(|r| r.rating).collect(),
        ),
    ])
}

pub fn table_rows(ratings: &[QuarterbackRating]) -> Vec<Vec<String>> {
    ratings
        .iter()
        .map(|r| {
            vec![
                r.player.clone(),
                format!("{:.1}", r.old_qbr),
                format!("{:.1}", r.total_qbr),
                format!("{:.1}", r.rating),
            ]
        })
        .collect()
}

pub fn write_report(out: &mut impl Write, comparison: &QbComparison) -> io::Result<()> {
    report::write_table(out, &TABLE_HEADERS, &table_rows(&comparison.ratings))?;
    writeln!(out)?;
    writeln!(out, "{CORRELATION_HEADING}")?;
    report::write_correlation(out, &comparison.correlation)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(player: &str, yards: i32, sack_yards: i32, attempts: i32, ints: i32) -> QuarterbackSeasonRecord {
        QuarterbackSeasonRecord {
            player: player.to_string(),
            yards,
            sack_yards,
            attempts,
            interceptions: ints,
            old_qbr: 90.0,
            total_qbr: 60.0,
        }
    }

    #[test]
    fn worked_example_matches_published_weights() {
        let r = QuarterbackRating::from_record(&record("Example", 4000, 100, 500, 10))
            .expect("rating");
        assert!((r.true_net_ypa - 7.8).abs() < 1e-12);
        assert!((r.interception_rate - 0.02).abs() < 1e-12);
        // 1.543 * 7.8 - 50.0957 * 0.02 = 12.0354 - 1.001914
        assert!((r.rating - 11.033486).abs() < 1e-9);
        assert_eq!(format!("{:.3}", r.rating), "11.033");
    }

    #[test]
    fn zero_attempts_fail_fast() {
        let err = QuarterbackRating::from_record(&record("Backup", 0, 0, 0, 0))
            .expect_err("division by zero");
        match err {
            AnalysisError::ZeroAttempts { player, attempts } => {
                assert_eq!(player, "Backup");
                assert_eq!(attempts, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn one_bad_row_fails_the_whole_table() {
        let rows = vec![record("A", 3000, 150, 400, 8), record("B", 10, 0, 0, 0)];
        assert!(rate_all(&rows).is_err());
    }
}

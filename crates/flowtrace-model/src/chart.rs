//! Daily aggregate chart series
//!
//! Per-day completion counts for the current month of one family. The series
//! is received from the query service; this module recomputes its cross-field
//! invariants (total vs. sum, full calendar coverage) and reports divergences
//! as [`IntegrityWarning`]s instead of silently trusting either side.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::IntegrityWarning;

/// Completion count for a single calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u64,
}

/// Per-day aggregate completion counts for one month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSeries {
    /// Display label for the month, as supplied by the service
    pub month: String,

    pub year: i32,

    /// One entry per calendar day of the month. An empty collection means
    /// zero activity, which is valid data rather than a failure.
    #[serde(default)]
    pub daily_counts: Vec<DailyCount>,

    /// Total reported by the service; cross-checked against the daily sum
    pub total_count: u64,
}

impl ChartSeries {
    /// Recomputed sum of the daily counts
    pub fn computed_total(&self) -> u64 {
        self.daily_counts.iter().map(|d| d.count).sum()
    }

    /// Recomputes the series invariants and reports every violation.
    ///
    /// A day with zero completions must still appear in a non-empty series;
    /// a gap is a data-integrity defect to surface, not to zero-fill. The
    /// caller decides whether to display the discrepancy or prefer the
    /// recomputed sum.
    pub fn integrity_warnings(&self) -> Vec<IntegrityWarning> {
        let mut warnings = Vec::new();

        let computed = self.computed_total();
        if computed != self.total_count {
            warnings.push(IntegrityWarning::TotalMismatch {
                reported: self.total_count,
                computed,
            });
        }

        if let Some(first) = self.daily_counts.first() {
            let year = first.date.year();
            let month = first.date.month();
            for date in days_of_month(year, month) {
                if !self.daily_counts.iter().any(|d| d.date == date) {
                    warnings.push(IntegrityWarning::MissingDay { date });
                }
            }
        }

        warnings
    }
}

/// Every calendar day of the given month, in order
fn days_of_month(year: i32, month: u32) -> impl Iterator<Item = NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    std::iter::successors(first, move |d| {
        d.succ_opt().filter(|next| next.month() == month)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn march_series() -> ChartSeries {
        let daily_counts = (1..=31)
            .map(|day| DailyCount {
                date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
                count: if day <= 10 { 5 } else { 0 },
            })
            .collect();
        ChartSeries {
            month: "March".to_string(),
            year: 2024,
            daily_counts,
            total_count: 50,
        }
    }

    #[test]
    fn consistent_series_yields_no_warnings() {
        assert!(march_series().integrity_warnings().is_empty());
    }

    #[test]
    fn total_mismatch_is_reported_alongside_the_series() {
        let mut series = march_series();
        series.daily_counts[0].count = 2;
        assert_eq!(series.computed_total(), 47);
        assert_eq!(
            series.integrity_warnings(),
            vec![IntegrityWarning::TotalMismatch {
                reported: 50,
                computed: 47
            }]
        );
    }

    #[test]
    fn missing_day_is_reported() {
        let mut series = march_series();
        series.daily_counts.remove(14);
        series.total_count = series.computed_total();
        assert_eq!(
            series.integrity_warnings(),
            vec![IntegrityWarning::MissingDay {
                date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
            }]
        );
    }

    #[test]
    fn empty_series_means_zero_activity_not_failure() {
        let series = ChartSeries {
            month: "March".to_string(),
            year: 2024,
            daily_counts: Vec::new(),
            total_count: 0,
        };
        assert!(series.integrity_warnings().is_empty());
    }

    #[test]
    fn absent_daily_counts_deserialize_as_empty() {
        let series: ChartSeries = serde_json::from_str(
            r#"{"month": "March", "year": 2024, "total_count": 0}"#,
        )
        .unwrap();
        assert!(series.daily_counts.is_empty());
        assert!(series.integrity_warnings().is_empty());
    }

    #[test]
    fn leap_february_is_fully_covered() {
        let daily_counts: Vec<DailyCount> = (1..=29)
            .map(|day| DailyCount {
                date: NaiveDate::from_ymd_opt(2024, 2, day).unwrap(),
                count: 1,
            })
            .collect();
        let series = ChartSeries {
            month: "February".to_string(),
            year: 2024,
            daily_counts,
            total_count: 29,
        };
        assert!(series.integrity_warnings().is_empty());
    }
}

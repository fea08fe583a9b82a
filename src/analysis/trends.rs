use chrono::NaiveDate;
use std::path::Path;
use tracing::{info, instrument, warn};

use crate::error::{DashboardError, Result};
use crate::records::daily_record::{DATE_COLUMN, DATE_FORMAT, OCCUPANCY_COLUMN, REVENUE_COLUMN};

/// Trailing window of the revenue trend line
pub const MOVING_AVERAGE_WINDOW: usize = 7;
/// Rows summarised for the operations advisor
pub const SUMMARY_WINDOW: usize = 30;

/// One day of history as the trend view needs it
#[derive(Debug, Clone, PartialEq)]
pub struct TrendRow {
    pub date: NaiveDate,
    pub revenue: f64, // Hand-entered files may hold "3500.0"
    pub occupancy: f64,
}

/// Revenue and occupancy over the most recent rows
#[derive(Debug, Clone, PartialEq)]
pub struct OperatingSummary {
    pub days: usize,
    pub revenue_total: f64,
    pub mean_occupancy: f64,
}

impl OperatingSummary {
    /// Summarises the last `window` rows; `None` when there is no history.
    pub fn from_rows(rows: &[TrendRow], window: usize) -> Option<Self> {
        let recent = &rows[rows.len().saturating_sub(window)..];
        if recent.is_empty() {
            return None;
        }
        let revenue_total = recent.iter().map(|r| r.revenue).sum::<f64>();
        let mean_occupancy = recent.iter().map(|r| r.occupancy).sum::<f64>() / recent.len() as f64;
        Some(Self {
            days: recent.len(),
            revenue_total,
            mean_occupancy,
        })
    }
}

/// Trailing mean over `window` values; `None` until the window is full.
pub fn moving_average(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    let mut running = 0.0;
    values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            running += value;
            if i >= window {
                running -= values[i - window];
            }
            (i + 1 >= window).then(|| running / window as f64)
        })
        .collect()
}

/// Reads the history store and orders it by date.
///
/// Rows keep the store's append order among equal dates. Only the date, revenue
/// and occupancy columns are required.
#[instrument(fields(path = %path.display(), on_close = true))]
pub fn load_history(path: &Path) -> Result<Vec<TrendRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|e| DashboardError::csv(path, e))?;

    let headers = reader.headers().map_err(|e| DashboardError::csv(path, e))?.clone();
    let required = [DATE_COLUMN, REVENUE_COLUMN, OCCUPANCY_COLUMN];
    let indices: Vec<Option<usize>> = required
        .iter()
        .map(|column| headers.iter().position(|h| h == *column))
        .collect();

    let (date_idx, revenue_idx, occupancy_idx) = match indices[..] {
        [Some(d), Some(r), Some(o)] => (d, r, o),
        _ => {
            let missing = required
                .iter()
                .zip(&indices)
                .filter(|(_, idx)| idx.is_none())
                .map(|(column, _)| column.to_string())
                .collect();
            return Err(DashboardError::MissingColumns {
                path: path.to_path_buf(),
                missing,
            });
        }
    };

    let mut rows = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result.map_err(|e| DashboardError::csv(path, e))?;
        let field = |idx: usize| record.get(idx).unwrap_or("");

        let date = parse_date(field(date_idx))
            .ok_or_else(|| DashboardError::input("history date", field(date_idx), format!("row {}", line + 1)))?;
        let revenue = field(revenue_idx)
            .parse::<f64>()
            .map_err(|_| DashboardError::input("history revenue", field(revenue_idx), format!("row {}", line + 1)))?;
        let occupancy = field(occupancy_idx)
            .parse::<f64>()
            .map_err(|_| DashboardError::input("history occupancy", field(occupancy_idx), format!("row {}", line + 1)))?;

        rows.push(TrendRow { date, revenue, occupancy });
    }

    rows.sort_by_key(|row| row.date);
    if rows.windows(2).any(|pair| pair[0].date == pair[1].date) {
        warn!("History contains duplicate dates");
    }
    info!(rows = rows.len(), "Loaded operating history");
    Ok(rows)
}

/// Accepts plain dates and dates followed by a time of day
fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_and_remainder(raw, DATE_FORMAT)
        .ok()
        .filter(|(_, rest)| rest.is_empty() || rest.starts_with([' ', 'T']))
        .map(|(date, _)| date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn row(day: u32, revenue: f64, occupancy: f64) -> TrendRow {
        TrendRow {
            date: NaiveDate::from_ymd_opt(2023, 10, day).unwrap(),
            revenue,
            occupancy,
        }
    }

    #[test]
    fn moving_average_waits_for_full_window() {
        let values: Vec<f64> = (1..=9).map(f64::from).collect();
        let ma = moving_average(&values, 7);
        assert!(ma[..6].iter().all(Option::is_none));
        assert_eq!(ma[6], Some(4.0));
        assert_eq!(ma[7], Some(5.0));
        assert_eq!(ma[8], Some(6.0));
    }

    #[test]
    fn moving_average_short_series() {
        assert_eq!(moving_average(&[1.0, 2.0], 7), vec![None, None]);
        assert!(moving_average(&[], 7).is_empty());
    }

    #[test]
    fn summary_uses_most_recent_rows() {
        let rows: Vec<TrendRow> = (1..=31).map(|d| row(d, 100.0 * d as f64, 0.5)).collect();
        let summary = OperatingSummary::from_rows(&rows, 30).unwrap();
        assert_eq!(summary.days, 30);
        assert_eq!(summary.revenue_total, (2..=31).map(|d| 100.0 * d as f64).sum::<f64>());
        assert!((summary.mean_occupancy - 0.5).abs() < 1e-12);

        assert!(OperatingSummary::from_rows(&[], 30).is_none());
        assert_eq!(OperatingSummary::from_rows(&rows[..3], 30).unwrap().days, 3);
    }

    #[test]
    fn history_is_sorted_by_date() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        fs::write(
            &path,
            "\u{feff}日期,營收,住房率,轉換率\n2023-10-03,3600,0.31,2.10\n2023-10-01,9100,0.88,3.90\n2023-10-02 00:00:00,3500.0,0.35,1.80\n",
        )
        .unwrap();

        let rows = load_history(&path).unwrap();
        let dates: Vec<u32> = rows.iter().map(|r| chrono::Datelike::day(&r.date)).collect();
        assert_eq!(dates, [1, 2, 3]);
        assert_eq!(rows[1].revenue, 3500.0);
    }

    #[test]
    fn history_requires_core_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        fs::write(&path, "日期,營收\n2023-10-01,100\n").unwrap();

        match load_history(&path) {
            Err(DashboardError::MissingColumns { missing, .. }) => assert_eq!(missing, ["住房率"]),
            other => panic!("expected missing column error, got {:?}", other),
        }
    }

    #[test]
    fn malformed_date_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        fs::write(&path, "日期,營收,住房率\n10/01/2023,100,0.5\n").unwrap();
        assert!(matches!(load_history(&path), Err(DashboardError::Input { .. })));
    }
}

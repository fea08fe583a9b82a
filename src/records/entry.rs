use chrono::NaiveDate;
use std::path::Path;
use tracing::info;

use super::daily_record::{DailyRecord, DATE_FORMAT};
use super::store::{self, AppendOutcome};
use crate::error::{DashboardError, Result};

/// A bookkeeping entry typed in by hand
#[derive(Debug, Clone, PartialEq)]
pub struct ManualEntry {
    pub date: NaiveDate,
    pub revenue: i64,
    pub occupancy: f64,
    pub conversion_rate: f64,
}

impl ManualEntry {
    /// Parses the four text fields of an entry. A blank date means `today`.
    pub fn parse(date: &str, revenue: &str, occupancy: &str, conversion_rate: &str, today: NaiveDate) -> Result<Self> {
        let date = match date.trim() {
            "" => today,
            raw => NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .map_err(|_| DashboardError::input("date", raw, "expected YYYY-MM-DD"))?,
        };
        let revenue = revenue
            .trim()
            .parse::<i64>()
            .map_err(|_| DashboardError::input("revenue", revenue, "expected a whole number"))?;
        let occupancy = occupancy
            .trim()
            .parse::<f64>()
            .map_err(|_| DashboardError::input("occupancy", occupancy, "expected a number between 0 and 1"))?;
        let conversion_rate = conversion_rate
            .trim()
            .parse::<f64>()
            .map_err(|_| DashboardError::input("conversion rate", conversion_rate, "expected a number"))?;

        let entry = ManualEntry {
            date,
            revenue,
            occupancy,
            conversion_rate,
        };
        entry.validate()?;
        Ok(entry)
    }

    pub fn validate(&self) -> Result<()> {
        if self.revenue < 0 {
            return Err(DashboardError::input("revenue", self.revenue.to_string(), "must not be negative"));
        }
        if !(0.0..=1.0).contains(&self.occupancy) {
            return Err(DashboardError::input("occupancy", self.occupancy.to_string(), "must be within 0-1"));
        }
        if !self.conversion_rate.is_finite() {
            return Err(DashboardError::input("conversion rate", self.conversion_rate.to_string(), "must be finite"));
        }
        Ok(())
    }

    fn into_record(self) -> DailyRecord {
        DailyRecord {
            date: self.date,
            revenue: self.revenue,
            occupancy: self.occupancy,
            conversion_rate: self.conversion_rate,
        }
    }
}

/// Validates `entry` and appends it to the history store at `path`.
pub fn record_entry(path: &Path, entry: ManualEntry) -> Result<AppendOutcome> {
    entry.validate()?;
    let date = entry.date;
    let outcome = store::append(path, &[entry.into_record()])?;
    info!(%date, path = %path.display(), "Recorded manual entry");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 20).unwrap()
    }

    #[test]
    fn blank_date_defaults_to_today() {
        let entry = ManualEntry::parse("", "8800", "0.92", "3.4", today()).unwrap();
        assert_eq!(entry.date, today());
        assert_eq!(entry.revenue, 8800);
    }

    #[test]
    fn occupancy_above_one_is_rejected() {
        let err = ManualEntry::parse("2024-07-19", "8800", "1.2", "3.4", today()).unwrap_err();
        assert!(err.to_string().contains("occupancy"));
    }

    #[test]
    fn negative_revenue_is_rejected() {
        assert!(ManualEntry::parse("2024-07-19", "-100", "0.5", "3.4", today()).is_err());
    }

    #[test]
    fn entry_lands_in_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");

        let entry = ManualEntry::parse("2024-07-19", "8800", "0.92", "3.4", today()).unwrap();
        assert_eq!(record_entry(&path, entry).unwrap(), AppendOutcome::Created { rows: 1 });

        let entry = ManualEntry::parse("2024-07-18", "3100", "0.3", "1.9", today()).unwrap();
        assert_eq!(record_entry(&path, entry).unwrap(), AppendOutcome::Appended { rows: 1 });

        let records = store::read_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].revenue, 3100);
        assert_eq!(records[1].occupancy, 0.3);
    }
}

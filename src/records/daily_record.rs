use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

pub const DATE_COLUMN: &str = "日期";
pub const REVENUE_COLUMN: &str = "營收";
pub const OCCUPANCY_COLUMN: &str = "住房率";
pub const CONVERSION_COLUMN: &str = "轉換率";

/// Column order of the history store
pub const STORE_HEADER: [&str; 4] = [DATE_COLUMN, REVENUE_COLUMN, OCCUPANCY_COLUMN, CONVERSION_COLUMN];

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One day of operating data as kept in the history store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    #[serde(rename = "日期")]
    pub date: NaiveDate,
    #[serde(rename = "營收")]
    pub revenue: i64, // Currency units, not clamped at zero
    #[serde(rename = "住房率")]
    pub occupancy: f64, // Fraction of rooms sold, within [0, 1]
    #[serde(rename = "轉換率")]
    pub conversion_rate: f64,
}

impl DailyRecord {
    pub fn regime(&self) -> Regime {
        Regime::of(self.date)
    }

    /// Store row with fixed two-decimal formatting for the real-valued columns
    pub fn to_row(&self) -> [String; 4] {
        [
            self.date.format(DATE_FORMAT).to_string(),
            self.revenue.to_string(),
            format!("{:.2}", self.occupancy),
            format!("{:.2}", self.conversion_rate),
        ]
    }
}

/// Demand regime of a calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Regime {
    Weekday,
    Weekend,
}

impl Regime {
    pub fn of(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Sat | Weekday::Sun => Regime::Weekend,
            _ => Regime::Weekday,
        }
    }

    /// Revenue before noise
    pub fn revenue_base(self) -> i64 {
        match self {
            Regime::Weekday => 3500,
            Regime::Weekend => 9000,
        }
    }

    /// Occupancy before noise
    pub fn occupancy_base(self) -> f64 {
        match self {
            Regime::Weekday => 0.35,
            Regime::Weekend => 0.90,
        }
    }

    /// Added on top of the sampled conversion rate
    pub fn conversion_bonus(self) -> f64 {
        match self {
            Regime::Weekday => 0.0,
            Regime::Weekend => 0.8,
        }
    }
}

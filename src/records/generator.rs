use chrono::{Days, NaiveDate};
use rand::Rng;
use std::ops::RangeInclusive;
use tracing::{debug, instrument};

use super::daily_record::{DailyRecord, Regime, DATE_FORMAT};
use crate::error::{DashboardError, Result};

pub const DEFAULT_START_DATE: &str = "2023-10-01";
pub const DEFAULT_DAY_COUNT: &str = "90";
/// Upper bound on a single batch, roughly a century of days
pub const MAX_DAY_COUNT: u32 = 36_600;

/// Integer noise added to the revenue base, both ends included
pub const REVENUE_NOISE: RangeInclusive<i64> = -800..=1500;
/// Real-valued noise added to the occupancy base
pub const OCCUPANCY_NOISE: (f64, f64) = (-0.10, 0.05);
/// Conversion rate draw before the weekend bonus
pub const CONVERSION_RANGE: (f64, f64) = (1.0, 3.5);

/// Builds `day_count` consecutive days of synthetic operating data starting at `start`.
///
/// Each day draws its values around the base of its [`Regime`]. Revenue keeps
/// whatever the noise produces, occupancy is clamped into [0, 1], and both
/// real-valued metrics are rounded to two decimals.
///
/// Fails when the batch exceeds [`MAX_DAY_COUNT`] or its last day falls past
/// the end of the calendar, so the result always holds exactly `day_count` days.
#[instrument(skip(rng))]
pub fn generate<R: Rng>(start: NaiveDate, day_count: u32, rng: &mut R) -> Result<Vec<DailyRecord>> {
    check_range(start, day_count)?;

    let records: Vec<DailyRecord> = start
        .iter_days()
        .take(day_count as usize)
        .map(|date| sample_day(date, rng))
        .collect();

    debug!(generated = records.len(), "Generated synthetic daily records");
    Ok(records)
}

fn check_range(start: NaiveDate, day_count: u32) -> Result<()> {
    if day_count > MAX_DAY_COUNT {
        return Err(DashboardError::input(
            "day count",
            day_count.to_string(),
            format!("at most {} days per batch", MAX_DAY_COUNT),
        ));
    }
    if day_count > 0 && start.checked_add_days(Days::new(u64::from(day_count) - 1)).is_none() {
        return Err(DashboardError::input(
            "day count",
            day_count.to_string(),
            format!("runs past the last representable date from {}", start),
        ));
    }
    Ok(())
}

/// Same as [`generate`], but starting from the raw prompt answers.
///
/// Blank answers fall back to [`DEFAULT_START_DATE`] and [`DEFAULT_DAY_COUNT`].
pub fn generate_from_input<R: Rng>(start: &str, day_count: &str, rng: &mut R) -> Result<Vec<DailyRecord>> {
    let start = parse_start_date(start)?;
    let day_count = parse_day_count(day_count)?;
    generate(start, day_count, rng)
}

pub fn parse_start_date(input: &str) -> Result<NaiveDate> {
    let input = match input.trim() {
        "" => DEFAULT_START_DATE,
        trimmed => trimmed,
    };
    NaiveDate::parse_from_str(input, DATE_FORMAT)
        .map_err(|e| DashboardError::input("start date", input, format!("expected YYYY-MM-DD: {}", e)))
}

pub fn parse_day_count(input: &str) -> Result<u32> {
    let input = match input.trim() {
        "" => DEFAULT_DAY_COUNT,
        trimmed => trimmed,
    };
    let count: i64 = input
        .parse()
        .map_err(|_| DashboardError::input("day count", input, "expected a whole number"))?;
    if count <= 0 {
        return Err(DashboardError::input("day count", input, "must be positive"));
    }
    u32::try_from(count).map_err(|_| DashboardError::input("day count", input, "too large"))
}

fn sample_day<R: Rng>(date: NaiveDate, rng: &mut R) -> DailyRecord {
    let regime = Regime::of(date);

    let revenue = regime.revenue_base() + rng.random_range(REVENUE_NOISE);

    let occupancy = regime.occupancy_base() + rng.random_range(OCCUPANCY_NOISE.0..OCCUPANCY_NOISE.1);
    let occupancy = round2(occupancy.clamp(0.0, 1.0));

    let conversion_rate = rng.random_range(CONVERSION_RANGE.0..CONVERSION_RANGE.1) + regime.conversion_bonus();
    let conversion_rate = round2(conversion_rate);

    DailyRecord {
        date,
        revenue,
        occupancy,
        conversion_rate,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

use std::path::Path;
use tracing::{debug, info, instrument};

use super::tally::{tally, Tally};
use crate::error::{DashboardError, Result};

pub const PROS_COLUMN: &str = "民宿優點";
pub const CONS_COLUMN: &str = "民宿缺點";
pub const COMPANION_COLUMN: &str = "同行類型";

/// Tags that mean "nothing mentioned"
const PLACEHOLDER_TAGS: [&str; 3] = ["无", "無", "無提及"];

/// How many pros/cons the insight keeps
pub const TOP_TAGS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRow {
    pub pros: Option<String>,
    pub cons: Option<String>,
    pub companion: Option<String>,
}

/// Summary of the review file used by the report and the advisor prompt
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewInsights {
    pub review_count: usize,
    pub companion_mix: Vec<Tally>, // Sorted by count, most common first
    pub top_pros: Vec<Tally>,
    pub top_cons: Vec<Tally>,
}

impl ReviewInsights {
    pub fn from_rows(rows: &[ReviewRow]) -> Self {
        let companions = rows
            .iter()
            .filter_map(|row| row.companion.as_deref())
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        let pros = parse_tags(rows.iter().filter_map(|row| row.pros.as_deref()));
        let cons = parse_tags(rows.iter().filter_map(|row| row.cons.as_deref()));

        let mut top_pros = tally(pros);
        top_pros.truncate(TOP_TAGS);
        let mut top_cons = tally(cons);
        top_cons.truncate(TOP_TAGS);

        Self {
            review_count: rows.len(),
            companion_mix: tally(companions),
            top_pros,
            top_cons,
        }
    }

    /// Most frequent companion type, if any review names one
    pub fn main_audience(&self) -> Option<&str> {
        self.companion_mix.first().map(|t| t.label.as_str())
    }
}

/// Splits free-text tag cells into individual tags.
///
/// Full-width commas and enumeration commas count as separators; blank pieces
/// and "nothing mentioned" placeholders are dropped.
pub fn parse_tags<'a>(cells: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    cells
        .into_iter()
        .flat_map(|cell| {
            cell.replace(['、', '，'], ",")
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty() && !PLACEHOLDER_TAGS.contains(tag))
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Reads the review export. All three review columns must be present.
#[instrument(fields(path = %path.display(), on_close = true))]
pub fn load_reviews(path: &Path) -> Result<Vec<ReviewRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| DashboardError::csv(path, e))?;

    let headers = reader.headers().map_err(|e| DashboardError::csv(path, e))?.clone();
    let position = |name: &str| headers.iter().position(|h| h.trim() == name);

    let (pros_idx, cons_idx, companion_idx) = match (position(PROS_COLUMN), position(CONS_COLUMN), position(COMPANION_COLUMN)) {
        (Some(p), Some(c), Some(t)) => (p, c, t),
        (p, c, t) => {
            let missing = [(p, PROS_COLUMN), (c, CONS_COLUMN), (t, COMPANION_COLUMN)]
                .into_iter()
                .filter(|(idx, _)| idx.is_none())
                .map(|(_, name)| name.to_string())
                .collect();
            return Err(DashboardError::MissingColumns {
                path: path.to_path_buf(),
                missing,
            });
        }
    };

    let cell = |record: &csv::StringRecord, idx: usize| {
        record
            .get(idx)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| DashboardError::csv(path, e))?;
        rows.push(ReviewRow {
            pros: cell(&record, pros_idx),
            cons: cell(&record, cons_idx),
            companion: cell(&record, companion_idx),
        });
    }

    debug!(rows = rows.len(), "Parsed review rows");
    info!(reviews = rows.len(), "Loaded reviews");
    Ok(rows)
}

//! CSV history store: create-or-append writer and a reader for full records.
//!
//! Writes are neither atomic nor deduplicating. Appending an overlapping date
//! range adds duplicate rows, and a failure mid-flush can leave a truncated
//! file behind. Only one writer per path is assumed.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::{info, instrument};

use super::daily_record::{DailyRecord, STORE_HEADER};
use crate::error::{DashboardError, Result};

/// UTF-8 byte-order mark, so spreadsheet tools detect the CJK header correctly
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// What [`append`] did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The file did not exist; it was created with a header row
    Created { rows: usize },
    /// Rows were added after the existing content
    Appended { rows: usize },
    /// Empty batch, nothing was touched
    Skipped,
}

impl AppendOutcome {
    pub fn rows(&self) -> usize {
        match self {
            AppendOutcome::Created { rows } | AppendOutcome::Appended { rows } => *rows,
            AppendOutcome::Skipped => 0,
        }
    }
}

/// Creates (or truncates) `path` and writes the BOM, the header, then `records`.
#[instrument(skip(records), fields(path = %path.display(), rows = records.len(), on_close = true))]
pub fn create_with_header(path: &Path, records: &[DailyRecord]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| DashboardError::io(path, e))?;
    file.write_all(UTF8_BOM).map_err(|e| DashboardError::io(path, e))?;

    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    writer
        .write_record(STORE_HEADER)
        .map_err(|e| DashboardError::csv(path, e))?;
    write_rows(&mut writer, path, records)
}

/// Adds `records` after the existing content of `path` without writing a header.
///
/// The existing header is not inspected; rows always use the current column order.
#[instrument(skip(records), fields(path = %path.display(), rows = records.len(), on_close = true))]
pub fn append_rows(path: &Path, records: &[DailyRecord]) -> Result<()> {
    let file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| DashboardError::io(path, e))?;

    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    write_rows(&mut writer, path, records)
}

/// Picks [`create_with_header`] or [`append_rows`] from a single existence check.
///
/// An empty batch never creates the file.
pub fn append(path: &Path, records: &[DailyRecord]) -> Result<AppendOutcome> {
    if records.is_empty() {
        info!(path = %path.display(), "No records to write, store left untouched");
        return Ok(AppendOutcome::Skipped);
    }

    let rows = records.len();
    if path.exists() {
        append_rows(path, records)?;
        info!(path = %path.display(), rows, "Appended records to existing store");
        Ok(AppendOutcome::Appended { rows })
    } else {
        create_with_header(path, records)?;
        info!(path = %path.display(), rows, "Created store with header");
        Ok(AppendOutcome::Created { rows })
    }
}

/// Reads every row of a four-column store in file order.
#[instrument(fields(path = %path.display()))]
pub fn read_records(path: &Path) -> Result<Vec<DailyRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| DashboardError::csv(path, e))?;

    let headers = reader.headers().map_err(|e| DashboardError::csv(path, e))?.clone();
    let missing: Vec<String> = STORE_HEADER
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DashboardError::MissingColumns {
            path: path.to_path_buf(),
            missing,
        });
    }

    reader
        .deserialize::<DailyRecord>()
        .map(|row| row.map_err(|e| DashboardError::csv(path, e)))
        .collect()
}

fn write_rows<W: Write>(writer: &mut csv::Writer<W>, path: &Path, records: &[DailyRecord]) -> Result<()> {
    for record in records {
        writer
            .write_record(record.to_row())
            .map_err(|e| DashboardError::csv(path, e))?;
    }
    writer.flush().map_err(|e| DashboardError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;

    fn sample(day: u32, revenue: i64) -> DailyRecord {
        DailyRecord {
            date: NaiveDate::from_ymd_opt(2023, 10, day).unwrap(),
            revenue,
            occupancy: 0.35,
            conversion_rate: 2.5,
        }
    }

    #[test]
    fn first_write_creates_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");

        let outcome = append(&path, &[sample(1, 9100), sample(2, 3600)]).unwrap();
        assert_eq!(outcome, AppendOutcome::Created { rows: 2 });

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, ["日期,營收,住房率,轉換率", "2023-10-01,9100,0.35,2.50", "2023-10-02,3600,0.35,2.50"]);
    }

    #[test]
    fn second_write_appends_without_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let batch = [sample(1, 9100), sample(2, 3600), sample(3, 2900)];

        append(&path, &batch).unwrap();
        let outcome = append(&path, &batch).unwrap();
        assert_eq!(outcome, AppendOutcome::Appended { rows: 3 });

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("日期").count(), 1);
        assert_eq!(text.lines().count(), 1 + 2 * batch.len());

        // Duplicates are kept as-is
        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 6);
        assert_eq!(records[0], records[3]);
    }

    #[test]
    fn empty_batch_does_not_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");

        assert_eq!(append(&path, &[]).unwrap(), AppendOutcome::Skipped);
        assert!(!path.exists());
    }

    #[test]
    fn append_rows_ignores_existing_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.csv");
        fs::write(&path, "date,amount\n").unwrap();

        append(&path, &[sample(5, 4000)]).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "date,amount\n2023-10-05,4000,0.35,2.50\n");
    }

    #[test]
    fn directory_path_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = create_with_header(dir.path(), &[sample(1, 1)]).unwrap_err();
        assert!(matches!(err, DashboardError::Io { .. }));
    }

    #[test]
    fn read_rejects_foreign_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.csv");
        fs::write(&path, "日期,營收\n2023-10-01,100\n").unwrap();

        match read_records(&path) {
            Err(DashboardError::MissingColumns { missing, .. }) => {
                assert_eq!(missing, ["住房率", "轉換率"]);
            }
            other => panic!("expected missing columns, got {:?}", other),
        }
    }
}

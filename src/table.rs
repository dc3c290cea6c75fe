//! Working Table Data Model and CSV Storage
//!
//! Schema-light tabular model for review datasets: an ordered header row plus
//! ordered string records, mirroring the source file. The only column the
//! core interprets are `comments` (classification input), `id` (stable
//! external identity used during checkpoint reconciliation) and `sentiment`
//! (the mutable result column, appended on demand and never removed).
//!
//! An unset sentiment is an empty cell; every recorded value is one of the
//! [`Label`] display strings.

use std::fmt;
use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SentimentError};

/// Column carrying the free-text input for classification
pub const COMMENTS_COLUMN: &str = "comments";

/// Optional column carrying a stable external row identifier
pub const ID_COLUMN: &str = "id";

/// Result column added by the core
pub const SENTIMENT_COLUMN: &str = "sentiment";

/// Classification result for a single row
///
/// Three true sentiment classes plus three sentinel values. Sentinels are
/// recorded data, not faults: `NoContent` for blank input, `Unknown` when
/// every classification attempt was exhausted, `Error` when a batch task
/// failed outside the classifier itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Positive,
    Negative,
    Neutral,
    NoContent,
    Unknown,
    Error,
}

impl Label {
    /// Canonical cell value written to the sentiment column
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Positive => "Positive",
            Label::Negative => "Negative",
            Label::Neutral => "Neutral",
            Label::NoContent => "No content",
            Label::Unknown => "Unknown",
            Label::Error => "Error",
        }
    }

    /// Parse a cell value back into a label (case-insensitive)
    ///
    /// Returns `None` for empty or unrecognized values, which the table
    /// treats as "not yet labeled".
    pub fn parse(value: &str) -> Option<Label> {
        match value.trim().to_ascii_lowercase().as_str() {
            "positive" => Some(Label::Positive),
            "negative" => Some(Label::Negative),
            "neutral" => Some(Label::Neutral),
            "no content" => Some(Label::NoContent),
            "unknown" => Some(Label::Unknown),
            "error" => Some(Label::Error),
            _ => None,
        }
    }

    /// True for the three real sentiment classes, false for sentinels
    pub fn is_sentiment(&self) -> bool {
        matches!(self, Label::Positive | Label::Negative | Label::Neutral)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-memory working table: full-width copy of the source dataset plus the
/// mutable sentiment column
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewTable {
    headers: Vec<String>,
    records: Vec<Vec<String>>,
}

impl ReviewTable {
    /// Build a table from headers and records
    ///
    /// Records shorter than the header row are padded with empty cells;
    /// longer records are truncated. A `comments` column is required.
    pub fn new(headers: Vec<String>, mut records: Vec<Vec<String>>) -> Result<Self> {
        if !headers.iter().any(|h| h == COMMENTS_COLUMN) {
            return Err(SentimentError::TableError(format!(
                "required column '{COMMENTS_COLUMN}' not present"
            )));
        }
        let width = headers.len();
        for record in &mut records {
            record.resize(width, String::new());
        }
        Ok(Self { headers, records })
    }

    /// Number of data rows
    pub fn row_count(&self) -> usize {
        self.records.len()
    }

    /// Header row
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Position of a named column, if present
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Whether the sentiment column has been added yet
    pub fn has_sentiment_column(&self) -> bool {
        self.column_index(SENTIMENT_COLUMN).is_some()
    }

    /// Append an empty sentiment column if the table does not carry one
    pub fn ensure_sentiment_column(&mut self) {
        if self.has_sentiment_column() {
            return;
        }
        self.headers.push(SENTIMENT_COLUMN.to_string());
        for record in &mut self.records {
            record.push(String::new());
        }
        debug!(rows = self.records.len(), "Added empty sentiment column");
    }

    fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.records.get(row).and_then(|r| r.get(column)).map(String::as_str)
    }

    /// Comment text at a row, `None` when the row or column is absent
    pub fn comment_at(&self, row: usize) -> Option<&str> {
        let column = self.column_index(COMMENTS_COLUMN)?;
        self.cell(row, column)
    }

    /// External identifier at a row, `None` when absent or blank
    ///
    /// Blank identifiers are not usable for matching, so they are reported
    /// as missing.
    pub fn id_at(&self, row: usize) -> Option<&str> {
        let column = self.column_index(ID_COLUMN)?;
        self.cell(row, column).filter(|v| !v.trim().is_empty())
    }

    /// Recorded label at a row, `None` when unset or unrecognized
    pub fn sentiment_at(&self, row: usize) -> Option<Label> {
        let column = self.column_index(SENTIMENT_COLUMN)?;
        self.cell(row, column).and_then(Label::parse)
    }

    /// Record a label for a row
    pub fn set_sentiment(&mut self, row: usize, label: Label) -> Result<()> {
        let column = self.column_index(SENTIMENT_COLUMN).ok_or_else(|| {
            SentimentError::TableError(format!(
                "column '{SENTIMENT_COLUMN}' not present; call ensure_sentiment_column first"
            ))
        })?;
        let record = self.records.get_mut(row).ok_or_else(|| {
            SentimentError::TableError(format!("row index {row} out of range"))
        })?;
        record[column] = label.as_str().to_string();
        Ok(())
    }

    /// Positions already carrying a real or sentinel label
    pub fn processed_indices(&self) -> Vec<usize> {
        (0..self.row_count())
            .filter(|&row| self.sentiment_at(row).is_some())
            .collect()
    }

    /// Positions not yet labeled, in original row order
    pub fn pending_indices(&self) -> Vec<usize> {
        (0..self.row_count())
            .filter(|&row| self.sentiment_at(row).is_none())
            .collect()
    }

    /// Load a table from a CSV file
    pub fn load_csv(path: &Path) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| {
                SentimentError::StorageError(format!("failed to open {}: {e}", path.display()))
            })?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| {
                SentimentError::StorageError(format!(
                    "failed to read headers from {}: {e}",
                    path.display()
                ))
            })?
            .iter()
            .map(str::to_string)
            .collect();

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| {
                SentimentError::StorageError(format!(
                    "failed to read record from {}: {e}",
                    path.display()
                ))
            })?;
            records.push(record.iter().map(str::to_string).collect());
        }

        let table = Self::new(headers, records)?;
        debug!(
            path = %path.display(),
            rows = table.row_count(),
            "Loaded table from CSV"
        );
        Ok(table)
    }

    /// Persist the full table to a CSV file
    ///
    /// Writes to a temporary sibling first and renames over the target, so
    /// an interrupted save never leaves a truncated checkpoint behind.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    SentimentError::StorageError(format!(
                        "failed to create directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        let mut tmp_path = path.as_os_str().to_owned();
        tmp_path.push(".tmp");
        let tmp_path = std::path::PathBuf::from(tmp_path);

        {
            let mut writer = WriterBuilder::new().from_path(&tmp_path).map_err(|e| {
                SentimentError::StorageError(format!(
                    "failed to create {}: {e}",
                    tmp_path.display()
                ))
            })?;
            writer.write_record(&self.headers).map_err(|e| {
                SentimentError::StorageError(format!("failed to write headers: {e}"))
            })?;
            for record in &self.records {
                writer.write_record(record).map_err(|e| {
                    SentimentError::StorageError(format!("failed to write record: {e}"))
                })?;
            }
            writer.flush().map_err(|e| {
                SentimentError::StorageError(format!("failed to flush {}: {e}", tmp_path.display()))
            })?;
        }

        fs::rename(&tmp_path, path).map_err(|e| {
            SentimentError::StorageError(format!(
                "failed to move {} into place: {e}",
                tmp_path.display()
            ))
        })?;

        debug!(path = %path.display(), rows = self.row_count(), "Wrote table to CSV");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_table() -> ReviewTable {
        ReviewTable::new(
            vec!["id".to_string(), "comments".to_string()],
            vec![
                vec!["r1".to_string(), "Great stay".to_string()],
                vec!["r2".to_string(), "Terrible".to_string()],
                vec!["r3".to_string(), String::new()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_label_round_trip() {
        for label in [
            Label::Positive,
            Label::Negative,
            Label::Neutral,
            Label::NoContent,
            Label::Unknown,
            Label::Error,
        ] {
            assert_eq!(Label::parse(label.as_str()), Some(label));
        }
        assert_eq!(Label::parse("positive"), Some(Label::Positive));
        assert_eq!(Label::parse("NO CONTENT"), Some(Label::NoContent));
        assert_eq!(Label::parse(""), None);
        assert_eq!(Label::parse("mixed"), None);
    }

    #[test]
    fn test_sentiment_sentinels_are_not_sentiment() {
        assert!(Label::Positive.is_sentiment());
        assert!(!Label::Unknown.is_sentiment());
        assert!(!Label::Error.is_sentiment());
        assert!(!Label::NoContent.is_sentiment());
    }

    #[test]
    fn test_requires_comments_column() {
        let result = ReviewTable::new(vec!["id".to_string()], vec![]);
        assert!(matches!(result, Err(SentimentError::TableError(_))));
    }

    #[test]
    fn test_ensure_sentiment_column_is_idempotent() {
        let mut table = sample_table();
        assert!(!table.has_sentiment_column());

        table.ensure_sentiment_column();
        assert!(table.has_sentiment_column());
        assert_eq!(table.headers().len(), 3);

        table.ensure_sentiment_column();
        assert_eq!(table.headers().len(), 3);
    }

    #[test]
    fn test_pending_and_processed_indices() {
        let mut table = sample_table();
        table.ensure_sentiment_column();
        assert_eq!(table.pending_indices(), vec![0, 1, 2]);
        assert!(table.processed_indices().is_empty());

        table.set_sentiment(1, Label::Negative).unwrap();
        // Sentinels count as processed: they are recorded outcomes
        table.set_sentiment(2, Label::NoContent).unwrap();

        assert_eq!(table.pending_indices(), vec![0]);
        assert_eq!(table.processed_indices(), vec![1, 2]);
    }

    #[test]
    fn test_set_sentiment_requires_column() {
        let mut table = sample_table();
        assert!(table.set_sentiment(0, Label::Positive).is_err());
        table.ensure_sentiment_column();
        assert!(table.set_sentiment(0, Label::Positive).is_ok());
        assert!(table.set_sentiment(99, Label::Positive).is_err());
    }

    #[test]
    fn test_blank_id_is_reported_missing() {
        let table = ReviewTable::new(
            vec!["id".to_string(), "comments".to_string()],
            vec![vec![" ".to_string(), "ok".to_string()]],
        )
        .unwrap();
        assert_eq!(table.id_at(0), None);
    }

    #[test]
    fn test_csv_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reviews.csv");

        let mut table = sample_table();
        table.ensure_sentiment_column();
        table.set_sentiment(0, Label::Positive).unwrap();
        table.write_csv(&path).unwrap();

        let loaded = ReviewTable::load_csv(&path).unwrap();
        assert_eq!(loaded, table);
        assert_eq!(loaded.sentiment_at(0), Some(Label::Positive));
        assert_eq!(loaded.sentiment_at(1), None);
    }

    #[test]
    fn test_load_csv_rejects_missing_comments_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.csv");
        std::fs::write(&path, "id,text\n1,hello\n").unwrap();

        assert!(ReviewTable::load_csv(&path).is_err());
    }

    #[test]
    fn test_write_csv_overwrites_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint.csv");

        let table = sample_table();
        table.write_csv(&path).unwrap();

        let mut updated = table.clone();
        updated.ensure_sentiment_column();
        updated.set_sentiment(2, Label::NoContent).unwrap();
        updated.write_csv(&path).unwrap();

        let loaded = ReviewTable::load_csv(&path).unwrap();
        assert_eq!(loaded.row_count(), 3);
        assert_eq!(loaded.sentiment_at(2), Some(Label::NoContent));
    }
}

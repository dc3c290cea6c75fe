//! # Checkpoint Reconciler
//!
//! Turns the authoritative source table plus whatever checkpoint survives on
//! disk into a full-width working table. The checkpoint is authoritative for
//! label values only, never for row count: a checkpoint that fell behind the
//! source dataset is repaired by rebuilding the full table and transferring
//! known labels across by stable row identity.
//!
//! Nothing here is fatal. A missing or unreadable checkpoint degrades to a
//! fresh copy of the source, and a short checkpoint is logged and repaired.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::table::ReviewTable;

/// Startup reconciliation between source table and on-disk checkpoint
pub struct CheckpointReconciler {
    checkpoint_path: PathBuf,
}

impl CheckpointReconciler {
    pub fn new(checkpoint_path: impl Into<PathBuf>) -> Self {
        Self {
            checkpoint_path: checkpoint_path.into(),
        }
    }

    /// Build the working table for a run
    ///
    /// The result always contains every source row by position (the primary
    /// correctness property of this component) and carries a sentiment
    /// column. When the checkpoint has at least as many rows as the source,
    /// positional alignment is assumed still valid and the checkpoint is
    /// used directly.
    pub fn reconcile(&self, source: &ReviewTable) -> ReviewTable {
        if !self.checkpoint_path.exists() {
            info!(
                checkpoint = %self.checkpoint_path.display(),
                "No checkpoint found; starting from a fresh copy of the source"
            );
            return Self::fresh_copy(source);
        }

        let checkpoint = match ReviewTable::load_csv(&self.checkpoint_path) {
            Ok(checkpoint) => checkpoint,
            Err(error) => {
                warn!(
                    checkpoint = %self.checkpoint_path.display(),
                    error = %error,
                    "Failed to load checkpoint; falling back to a fresh copy of the source"
                );
                return Self::fresh_copy(source);
            }
        };

        info!(
            checkpoint = %self.checkpoint_path.display(),
            rows = checkpoint.row_count(),
            "Loaded checkpoint"
        );

        if checkpoint.row_count() >= source.row_count() {
            let mut working = checkpoint;
            working.ensure_sentiment_column();
            return working;
        }

        warn!(
            checkpoint_rows = checkpoint.row_count(),
            source_rows = source.row_count(),
            "Checkpoint has fewer rows than the source dataset; rebuilding full table"
        );

        let mut working = Self::fresh_copy(source);
        let transferred = Self::transfer_labels(&checkpoint, &mut working);
        info!(transferred, "Transferred labels from checkpoint to full table");
        working
    }

    fn fresh_copy(source: &ReviewTable) -> ReviewTable {
        let mut working = source.clone();
        working.ensure_sentiment_column();
        working
    }

    /// Copy recorded labels across by `id`, first match wins
    fn transfer_labels(checkpoint: &ReviewTable, working: &mut ReviewTable) -> usize {
        let mut id_positions: HashMap<String, usize> = HashMap::new();
        for row in 0..working.row_count() {
            if let Some(id) = working.id_at(row) {
                id_positions.entry(id.to_string()).or_insert(row);
            }
        }

        let mut transferred = 0;
        for row in 0..checkpoint.row_count() {
            let Some(label) = checkpoint.sentiment_at(row) else {
                continue;
            };
            let Some(id) = checkpoint.id_at(row) else {
                continue;
            };
            if let Some(&target) = id_positions.get(id) {
                if working.set_sentiment(target, label).is_ok() {
                    transferred += 1;
                }
            }
        }
        transferred
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Label;
    use tempfile::tempdir;

    fn table_with_ids(count: usize) -> ReviewTable {
        ReviewTable::new(
            vec!["id".to_string(), "comments".to_string()],
            (0..count)
                .map(|i| vec![format!("r{i}"), format!("comment {i}")])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_missing_checkpoint_yields_fresh_copy() {
        let dir = tempdir().unwrap();
        let reconciler = CheckpointReconciler::new(dir.path().join("absent.csv"));
        let source = table_with_ids(4);

        let working = reconciler.reconcile(&source);

        assert_eq!(working.row_count(), 4);
        assert!(working.has_sentiment_column());
        assert_eq!(working.pending_indices().len(), 4);
    }

    #[test]
    fn test_unreadable_checkpoint_falls_back_to_fresh_copy() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbled.csv");
        // Readable CSV but missing the required comments column
        std::fs::write(&path, "id,text\nr0,whatever\n").unwrap();

        let reconciler = CheckpointReconciler::new(&path);
        let source = table_with_ids(3);

        let working = reconciler.reconcile(&source);
        assert_eq!(working.row_count(), 3);
        assert_eq!(working.pending_indices().len(), 3);
    }

    #[test]
    fn test_full_checkpoint_is_used_directly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint.csv");

        let mut checkpoint = table_with_ids(5);
        checkpoint.ensure_sentiment_column();
        checkpoint.set_sentiment(2, Label::Positive).unwrap();
        checkpoint.write_csv(&path).unwrap();

        let reconciler = CheckpointReconciler::new(&path);
        let source = table_with_ids(5);

        let working = reconciler.reconcile(&source);
        assert_eq!(working.row_count(), 5);
        assert_eq!(working.sentiment_at(2), Some(Label::Positive));
        assert_eq!(working.pending_indices(), vec![0, 1, 3, 4]);
    }

    #[test]
    fn test_short_checkpoint_transfers_labels_by_id() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint.csv");

        // Checkpoint knows rows r0..r2 and has labeled all three
        let mut checkpoint = table_with_ids(3);
        checkpoint.ensure_sentiment_column();
        checkpoint.set_sentiment(0, Label::Positive).unwrap();
        checkpoint.set_sentiment(1, Label::Negative).unwrap();
        checkpoint.set_sentiment(2, Label::Neutral).unwrap();
        checkpoint.write_csv(&path).unwrap();

        let reconciler = CheckpointReconciler::new(&path);
        let source = table_with_ids(10);

        let working = reconciler.reconcile(&source);

        assert_eq!(working.row_count(), 10);
        assert_eq!(working.sentiment_at(0), Some(Label::Positive));
        assert_eq!(working.sentiment_at(1), Some(Label::Negative));
        assert_eq!(working.sentiment_at(2), Some(Label::Neutral));
        assert_eq!(working.pending_indices().len(), 7);
    }

    #[test]
    fn test_unlabeled_checkpoint_rows_are_not_transferred() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint.csv");

        let mut checkpoint = table_with_ids(2);
        checkpoint.ensure_sentiment_column();
        checkpoint.set_sentiment(1, Label::Positive).unwrap();
        checkpoint.write_csv(&path).unwrap();

        let reconciler = CheckpointReconciler::new(&path);
        let source = table_with_ids(6);

        let working = reconciler.reconcile(&source);
        assert_eq!(working.sentiment_at(0), None);
        assert_eq!(working.sentiment_at(1), Some(Label::Positive));
    }

    #[test]
    fn test_duplicate_ids_first_match_wins() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint.csv");

        let mut checkpoint = ReviewTable::new(
            vec!["id".to_string(), "comments".to_string()],
            vec![vec!["dup".to_string(), "from checkpoint".to_string()]],
        )
        .unwrap();
        checkpoint.ensure_sentiment_column();
        checkpoint.set_sentiment(0, Label::Negative).unwrap();
        checkpoint.write_csv(&path).unwrap();

        let source = ReviewTable::new(
            vec!["id".to_string(), "comments".to_string()],
            vec![
                vec!["dup".to_string(), "first".to_string()],
                vec!["dup".to_string(), "second".to_string()],
                vec!["other".to_string(), "third".to_string()],
            ],
        )
        .unwrap();

        let reconciler = CheckpointReconciler::new(&path);
        let working = reconciler.reconcile(&source);

        assert_eq!(working.sentiment_at(0), Some(Label::Negative));
        assert_eq!(working.sentiment_at(1), None);
    }

    #[test]
    fn test_source_without_id_column_stays_unset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint.csv");

        let mut checkpoint = table_with_ids(2);
        checkpoint.ensure_sentiment_column();
        checkpoint.set_sentiment(0, Label::Positive).unwrap();
        checkpoint.write_csv(&path).unwrap();

        let source = ReviewTable::new(
            vec!["comments".to_string()],
            (0..5).map(|i| vec![format!("comment {i}")]).collect(),
        )
        .unwrap();

        let reconciler = CheckpointReconciler::new(&path);
        let working = reconciler.reconcile(&source);

        assert_eq!(working.row_count(), 5);
        assert_eq!(working.pending_indices().len(), 5);
    }
}

//! # Resumable Run Controller
//!
//! Owns the overall run loop: reconcile the checkpoint against the source
//! table, split the still-pending rows into consecutive batches, drive the
//! batch executor over them in order, merge results back by index, persist
//! the checkpoint periodically and write the final output once.
//!
//! The controller is safely re-invocable: a re-run with an existing
//! checkpoint resumes from exactly the rows still unset, re-does no
//! already-labeled row and never shrinks the row count.

use std::sync::Arc;

use tracing::{info, warn};

use crate::classifier::{ChatCapability, SentimentAnalyzer};
use crate::config::SentimentConfig;
use crate::error::{Result, SentimentError};
use crate::executor::BatchExecutor;
use crate::reconciler::CheckpointReconciler;
use crate::table::ReviewTable;

/// Root controller for one resumable sentiment analysis run
pub struct RunController<C: ChatCapability + 'static> {
    executor: BatchExecutor<C>,
    reconciler: CheckpointReconciler,
    config: SentimentConfig,
}

impl<C: ChatCapability + 'static> RunController<C> {
    /// Wire up the full component stack around an injected capability
    pub fn new(capability: C, config: SentimentConfig) -> Self {
        let analyzer = Arc::new(SentimentAnalyzer::new(capability, config.classifier.clone()));
        let executor = BatchExecutor::new(analyzer, config.execution.max_concurrent);
        let reconciler = CheckpointReconciler::new(config.storage.checkpoint_path.clone());
        Self {
            executor,
            reconciler,
            config,
        }
    }

    /// Access the analyzer wired into this controller
    pub fn analyzer(&self) -> &SentimentAnalyzer<C> {
        self.executor.analyzer()
    }

    /// Run the full pipeline over a source table
    ///
    /// The periodic checkpoint uses the best-effort trigger
    /// `processed % save_interval < batch_size`, checked once per batch.
    /// Depending on the ratio of the two values it can skip a boundary or
    /// fire twice around one; that is the documented behavior, not a bug.
    /// A failed periodic save is logged and the run continues; only the
    /// final output write is allowed to fail the run.
    pub async fn run(&self, source: &ReviewTable) -> Result<ReviewTable> {
        self.config
            .validate()
            .map_err(|e| SentimentError::ConfigurationError(e.to_string()))?;

        let mut working = self.reconciler.reconcile(source);
        let pending = working.pending_indices();
        let total_pending = pending.len();

        info!(
            rows = working.row_count(),
            already_processed = working.row_count() - total_pending,
            pending = total_pending,
            "Starting sentiment run"
        );

        let batch_size = self.config.execution.batch_size;
        let save_interval = self.config.execution.save_interval;
        let checkpoint_path = &self.config.storage.checkpoint_path;
        let mut processed = 0usize;

        for chunk in pending.chunks(batch_size) {
            let items: Vec<(usize, Option<String>)> = chunk
                .iter()
                .map(|&index| (index, working.comment_at(index).map(str::to_string)))
                .collect();

            let results = self.executor.run_batch(items).await;
            for (index, label) in results {
                working.set_sentiment(index, label)?;
            }

            processed += chunk.len();
            info!(processed, total = total_pending, "Batch merged into working table");

            if processed % save_interval < batch_size {
                match working.write_csv(checkpoint_path) {
                    Ok(()) => info!(
                        rows = working.row_count(),
                        checkpoint = %checkpoint_path.display(),
                        "Saved checkpoint"
                    ),
                    Err(error) => warn!(
                        checkpoint = %checkpoint_path.display(),
                        error = %error,
                        "Failed to save checkpoint; continuing"
                    ),
                }
            }
        }

        let output_path = &self.config.storage.output_path;
        working.write_csv(output_path)?;
        info!(
            rows = working.row_count(),
            output = %output_path.display(),
            "Run complete; wrote final output"
        );

        Ok(working)
    }
}

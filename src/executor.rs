//! # Batch Executor
//!
//! Fans a batch of (row index, comment) pairs out to the classifier adapter
//! concurrently, bounded by a fixed in-flight ceiling. Results are keyed by
//! original row index, so completion order never matters, and one failing
//! task degrades to [`Label::Error`] for its own row instead of aborting
//! the batch.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, error};

use crate::classifier::{ChatCapability, SentimentAnalyzer};
use crate::table::Label;

/// Concurrent executor for one batch of classifications
pub struct BatchExecutor<C: ChatCapability + 'static> {
    analyzer: Arc<SentimentAnalyzer<C>>,
    max_concurrent: usize,
}

impl<C: ChatCapability + 'static> BatchExecutor<C> {
    /// Create an executor with a fixed concurrency ceiling
    pub fn new(analyzer: Arc<SentimentAnalyzer<C>>, max_concurrent: usize) -> Self {
        Self {
            analyzer,
            max_concurrent,
        }
    }

    /// Access the analyzer driving this executor
    pub fn analyzer(&self) -> &SentimentAnalyzer<C> {
        &self.analyzer
    }

    /// Classify every item in the batch and return labels keyed by index
    ///
    /// Spawns one task per item; a semaphore scoped to this batch caps the
    /// number of simultaneous in-flight classifications regardless of batch
    /// size. Returns once every submitted task has resolved to a label,
    /// a sentinel, or `Error` on unexpected task failure.
    pub async fn run_batch(&self, items: Vec<(usize, Option<String>)>) -> HashMap<usize, Label> {
        let batch_len = items.len();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));

        let handles: Vec<(usize, tokio::task::JoinHandle<Label>)> = items
            .into_iter()
            .map(|(index, comment)| {
                let analyzer = Arc::clone(&self.analyzer);
                let semaphore = Arc::clone(&semaphore);
                let handle = tokio::spawn(async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        // Closed semaphore means the batch is being torn down
                        Err(_) => return Label::Error,
                    };
                    analyzer.classify(comment.as_deref()).await
                });
                (index, handle)
            })
            .collect();

        let mut results = HashMap::with_capacity(batch_len);
        for (index, handle) in handles {
            match handle.await {
                Ok(label) => {
                    results.insert(index, label);
                }
                Err(join_error) => {
                    error!(
                        index,
                        error = %join_error,
                        "Classification task failed unexpectedly; recording Error for this row"
                    );
                    results.insert(index, Label::Error);
                }
            }
        }

        debug!(batch_len, "Batch completed");
        results
    }
}

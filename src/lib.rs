#![allow(clippy::doc_markdown)] // Allow technical terms like OpenAI, CSV in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Sentiment Core
//!
//! Resumable, checkpointed batch sentiment analysis of free-text comments
//! in a tabular dataset, delegating the classification itself to an
//! external chat-completion capability.
//!
//! ## Overview
//!
//! The sentiment call is the easy part; the core of this crate is the
//! resumable batch-processing loop around it: partitioning a large row set
//! into concurrently-processed batches, merging partial results into a
//! durable checkpoint, detecting and repairing a checkpoint that fell
//! behind the source dataset, and guaranteeing idempotent re-entry after
//! interruption.
//!
//! ## Module Organization
//!
//! - [`table`] - Working table data model, labels, and CSV storage
//! - [`classifier`] - Classifier adapter over an injected chat capability
//! - [`executor`] - Bounded-concurrency batch executor
//! - [`reconciler`] - Checkpoint reconciliation and repair
//! - [`controller`] - Resumable run controller
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging setup
//! - [`error`] - Structured error handling
//!
//! ## Failure Philosophy
//!
//! No classification failure is fatal to a run. Transport errors and
//! malformed responses are retried inside the adapter and exhaust to the
//! `Unknown` sentinel; an unexpected task failure marks its own row
//! `Error`; a broken or stale checkpoint is repaired, never trusted for
//! row count. Forward progress and resumability always win.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sentiment_core::classifier::OpenAiChatClient;
//! use sentiment_core::config::SentimentConfig;
//! use sentiment_core::controller::RunController;
//! use sentiment_core::table::ReviewTable;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = ReviewTable::load_csv("reviews_sample.csv".as_ref())?;
//!
//! let config = SentimentConfig::default();
//! let capability = OpenAiChatClient::new(std::env::var("OPENAI_API_KEY")?);
//!
//! let controller = RunController::new(capability, config);
//! let labeled = controller.run(&source).await?;
//! println!("labeled {} rows", labeled.row_count());
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod config;
pub mod controller;
pub mod error;
pub mod executor;
pub mod logging;
pub mod reconciler;
pub mod table;

pub use classifier::{ChatCapability, OpenAiChatClient, SentimentAnalyzer};
pub use config::{ClassifierConfig, ExecutionConfig, SentimentConfig, StorageConfig};
pub use controller::RunController;
pub use error::{Result, SentimentError};
pub use executor::BatchExecutor;
pub use reconciler::CheckpointReconciler;
pub use table::{Label, ReviewTable};

//! Batched generate-and-upload pipeline.
//!
//! The zip-code list is cut into fixed-size batches. Every batch runs as its
//! own task: sleep for a random jitter, synthesize readings, serialize them
//! and upload the file. Tasks share nothing but the read-only store handle,
//! and a failing task never stops its siblings.

use std::{sync::Arc, time::Duration};

use rand::Rng;
use smart_grid_client::FileSystem;

use crate::{
    sinks::{self, WriteFailure},
    sources::synthetic,
};

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("serialize error: {0}")]
    Serialize(String),
    #[error(transparent)]
    Write(#[from] WriteFailure),
    #[error("batch task failed: {0}")]
    Task(String),
}

/// Split `zip_codes` into contiguous batches of at most `batch_size`,
/// preserving order. Only the last batch may be shorter.
pub fn partition_zip_codes(zip_codes: &[String], batch_size: usize) -> Vec<Vec<String>> {
    zip_codes.chunks(batch_size.max(1)).map(<[String]>::to_vec).collect()
}

/// One batch of work, planned before any task starts.
///
/// Holds everything the batch needs to generate its readings. The meter-index
/// list is shared between the tasks of a run.
#[derive(Debug, Clone)]
pub struct UploadTask {
    pub zip_codes: Vec<String>,
    pub meter_ids: Arc<[u32]>,
    pub readings_per_zip: usize,
    pub delay: Duration,
}

pub struct BatchPipeline {
    fs: Arc<dyn FileSystem>,
    folder: Arc<str>,
    meter_ids: Arc<[u32]>,
    readings_per_zip: usize,
    max_sleep_secs: u64,
}

impl BatchPipeline {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        folder: impl Into<Arc<str>>,
        meter_ids: Vec<u32>,
        readings_per_zip: usize,
        max_sleep_secs: u64,
    ) -> Self {
        Self {
            fs,
            folder: folder.into(),
            meter_ids: meter_ids.into(),
            readings_per_zip,
            max_sleep_secs: max_sleep_secs.max(1),
        }
    }

    /// Turn every batch into an [`UploadTask`] with a jitter delay in
    /// `[1, max_sleep_secs]` seconds.
    pub fn plan<R>(&self, batches: Vec<Vec<String>>, rng: &mut R) -> Vec<UploadTask>
    where
        R: Rng + ?Sized,
    {
        batches
            .into_iter()
            .map(|zip_codes| UploadTask {
                zip_codes,
                meter_ids: self.meter_ids.clone(),
                readings_per_zip: self.readings_per_zip,
                delay: Duration::from_secs(rng.random_range(1..=self.max_sleep_secs)),
            })
            .collect()
    }

    /// Run every batch concurrently and wait for all of them.
    ///
    /// Outcomes come back in batch order: the written path, or why the batch
    /// did not make it. Nothing here is fatal to the run.
    pub async fn run(&self, batches: Vec<Vec<String>>) -> Vec<Result<String, PipelineError>> {
        let tasks = self.plan(batches, &mut rand::rng());
        self.run_tasks(tasks).await
    }

    pub async fn run_tasks(&self, tasks: Vec<UploadTask>) -> Vec<Result<String, PipelineError>> {
        let mut joins = Vec::with_capacity(tasks.len());

        for (batch, task) in tasks.into_iter().enumerate() {
            let fs = self.fs.clone();
            let folder = self.folder.clone();

            joins.push(tokio::spawn(async move { run_batch(batch, task, fs.as_ref(), &folder).await }));
        }

        let mut outcomes = Vec::with_capacity(joins.len());
        for (batch, join) in joins.into_iter().enumerate() {
            let outcome = match join.await {
                Ok(res) => res,
                Err(e) => Err(PipelineError::Task(e.to_string())),
            };

            match &outcome {
                Ok(_) => {}
                Err(PipelineError::Write(_)) => {
                    // Already reported by the writer.
                }
                Err(e) => {
                    metrics::counter!("smart_grid_batch_faults_total").increment(1);
                    tracing::error!(batch, error = %e, "batch did not complete");
                }
            }
            outcomes.push(outcome);
        }

        outcomes
    }
}

async fn run_batch(
    batch: usize,
    task: UploadTask,
    fs: &dyn FileSystem,
    folder: &str,
) -> Result<String, PipelineError> {
    tracing::debug!(batch, zip_codes = task.zip_codes.len(), delay_secs = task.delay.as_secs(), "batch scheduled");
    tokio::time::sleep(task.delay).await;

    let readings = synthetic::synthesize_readings(
        &task.zip_codes,
        &task.meter_ids,
        task.readings_per_zip,
        &mut rand::rng(),
    );
    tracing::info!(batch, readings = readings.len(), "readings generated");

    let serialized = sinks::serialize_batch(&readings, folder)?;
    let path = sinks::write_batch(fs, &serialized).await?;
    Ok(path)
}

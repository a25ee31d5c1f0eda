use smart_grid_client::{FileSystem, StoreError};

use super::ndjson::SerializedBatch;

/// A batch that could not be written. The run carries on without it.
#[derive(thiserror::Error, Debug)]
#[error("failed writing file {path}: {source}")]
pub struct WriteFailure {
    pub path: String,
    pub source: StoreError,
}

/// Upload one serialized batch: create the file, append the whole body at
/// offset 0, then flush its length.
///
/// Errors from any step are logged and returned; nothing is retried and a
/// partially written file is left as is.
pub async fn write_batch(fs: &dyn FileSystem, batch: &SerializedBatch) -> Result<String, WriteFailure> {
    let path = batch.path.as_str();
    let len = batch.body.len() as u64;

    tracing::info!(path, bytes = len, "writing file");

    match upload(fs, batch).await {
        Ok(()) => {
            metrics::counter!("smart_grid_files_written_total").increment(1);
            metrics::counter!("smart_grid_bytes_written_total").increment(len);
            tracing::info!(path, "wrote file");
            Ok(batch.path.clone())
        }
        Err(e) => {
            metrics::counter!("smart_grid_file_write_errors_total").increment(1);
            tracing::error!(path, error = %e, "failed writing file");
            Err(WriteFailure {
                path: batch.path.clone(),
                source: e,
            })
        }
    }
}

async fn upload(fs: &dyn FileSystem, batch: &SerializedBatch) -> Result<(), StoreError> {
    let mut file = fs.create_file(&batch.path).await?;
    file.append_data(batch.body.clone(), 0).await?;
    file.flush_data(batch.body.len() as u64).await
}

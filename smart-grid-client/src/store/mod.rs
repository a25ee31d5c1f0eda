//! File-oriented access to the remote data lake.
//!
//! Writers follow the create / append / flush protocol of a hierarchical
//! object store: a file is created, its content appended at explicit
//! offsets, and the final length flushed to commit it.

pub mod object_store_fs;

use bytes::Bytes;

pub use object_store_fs::ObjectStoreFileSystem;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("invalid path '{0}'")]
    InvalidPath(String),
    #[error("append at offset {offset} but {appended} bytes already appended to '{path}'")]
    OffsetMismatch { path: String, offset: u64, appended: u64 },
    #[error("flush of {length} bytes but {appended} bytes appended to '{path}'")]
    LengthMismatch { path: String, length: u64, appended: u64 },
    #[error("failed to connect to store: {0}")]
    Connect(String),
    #[error("store backend error: {0}")]
    Backend(#[from] object_store::Error),
}

/// Handle on a remote store container, shared read-only by every writer.
#[async_trait::async_trait]
pub trait FileSystem: Send + Sync {
    async fn create_file(&self, path: &str) -> Result<Box<dyn RemoteFile>, StoreError>;
}

/// A file created on the remote store that has not been committed yet.
#[async_trait::async_trait]
pub trait RemoteFile: Send {
    fn path(&self) -> &str;

    async fn append_data(&mut self, data: Bytes, offset: u64) -> Result<(), StoreError>;

    /// Commit the file; `length` must equal the total number of bytes appended.
    async fn flush_data(&mut self, length: u64) -> Result<(), StoreError>;
}

use std::{path::Path, sync::Arc};

use bytes::Bytes;
use object_store::{
    azure::MicrosoftAzureBuilder, local::LocalFileSystem, memory::InMemory, path::Path as ObjectPath,
    MultipartUpload, ObjectStore,
};

use super::{FileSystem, RemoteFile, StoreError};

/// [`FileSystem`] backed by any `object_store` implementation.
///
/// Files map onto multipart uploads: creating a file starts the upload, each
/// append uploads one part and flushing completes it.
#[derive(Clone, Debug)]
pub struct ObjectStoreFileSystem {
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreFileSystem {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Connect to an Azure Data Lake / Blob container using a shared key.
    pub fn azure(account_name: &str, access_key: &str, container: &str) -> Result<Self, StoreError> {
        let store = MicrosoftAzureBuilder::new()
            .with_account(account_name)
            .with_access_key(access_key)
            .with_container_name(container)
            .build()
            .map_err(|e| StoreError::Connect(format!("failed to build azure client: {e}")))?;
        Ok(Self::new(Arc::new(store)))
    }

    /// Write files under a directory on the local disk.
    pub fn local(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)
            .map_err(|e| StoreError::Connect(format!("failed to create '{}': {e}", root.display())))?;
        let store = LocalFileSystem::new_with_prefix(root)
            .map_err(|e| StoreError::Connect(format!("failed to open '{}': {e}", root.display())))?;
        Ok(Self::new(Arc::new(store)))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()))
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }
}

#[async_trait::async_trait]
impl FileSystem for ObjectStoreFileSystem {
    async fn create_file(&self, path: &str) -> Result<Box<dyn RemoteFile>, StoreError> {
        let location = ObjectPath::parse(path).map_err(|_| StoreError::InvalidPath(path.to_string()))?;
        let upload = self.store.put_multipart(&location).await?;
        tracing::debug!(path, "created remote file");

        Ok(Box::new(ObjectStoreFile {
            path: path.to_string(),
            upload,
            appended: 0,
        }))
    }
}

struct ObjectStoreFile {
    path: String,
    upload: Box<dyn MultipartUpload>,
    appended: u64,
}

#[async_trait::async_trait]
impl RemoteFile for ObjectStoreFile {
    fn path(&self) -> &str {
        &self.path
    }

    async fn append_data(&mut self, data: Bytes, offset: u64) -> Result<(), StoreError> {
        if offset != self.appended {
            return Err(StoreError::OffsetMismatch {
                path: self.path.clone(),
                offset,
                appended: self.appended,
            });
        }

        let len = data.len() as u64;
        self.upload.put_part(data.into()).await?;
        self.appended += len;
        Ok(())
    }

    async fn flush_data(&mut self, length: u64) -> Result<(), StoreError> {
        if length != self.appended {
            return Err(StoreError::LengthMismatch {
                path: self.path.clone(),
                length,
                appended: self.appended,
            });
        }

        self.upload.complete().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn read(fs: &ObjectStoreFileSystem, path: &str) -> Bytes {
        fs.store()
            .get(&ObjectPath::parse(path).unwrap())
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_append_flush_commits_file() {
        let fs = ObjectStoreFileSystem::in_memory();
        let body = Bytes::from_static(b"{\"a\":1}\n{\"a\":2}");

        let mut file = fs.create_file("grid/out.json").await.unwrap();
        file.append_data(body.clone(), 0).await.unwrap();
        file.flush_data(body.len() as u64).await.unwrap();

        assert_eq!(file.path(), "grid/out.json");
        assert_eq!(read(&fs, "grid/out.json").await, body);
    }

    #[tokio::test]
    async fn file_is_not_visible_before_flush() {
        let fs = ObjectStoreFileSystem::in_memory();

        let mut file = fs.create_file("grid/pending.json").await.unwrap();
        file.append_data(Bytes::from_static(b"x"), 0).await.unwrap();

        let location = ObjectPath::parse("grid/pending.json").unwrap();
        assert!(fs.store().head(&location).await.is_err());
    }

    #[tokio::test]
    async fn append_rejects_wrong_offset() {
        let fs = ObjectStoreFileSystem::in_memory();
        let mut file = fs.create_file("grid/out.json").await.unwrap();

        let res = file.append_data(Bytes::from_static(b"abc"), 5).await;
        assert!(matches!(res, Err(StoreError::OffsetMismatch { offset: 5, appended: 0, .. })));
    }

    #[tokio::test]
    async fn flush_rejects_length_mismatch() {
        let fs = ObjectStoreFileSystem::in_memory();
        let mut file = fs.create_file("grid/out.json").await.unwrap();
        file.append_data(Bytes::from_static(b"abc"), 0).await.unwrap();

        let res = file.flush_data(2).await;
        assert!(matches!(res, Err(StoreError::LengthMismatch { length: 2, appended: 3, .. })));
    }

    #[tokio::test]
    async fn create_rejects_malformed_path() {
        let fs = ObjectStoreFileSystem::in_memory();
        let res = fs.create_file("grid//out.json").await;
        assert!(matches!(res, Err(StoreError::InvalidPath(_))));
    }
}

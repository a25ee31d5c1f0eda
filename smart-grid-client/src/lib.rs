pub mod domain;
pub mod store;

pub use domain::MeterReading;
pub use store::{FileSystem, ObjectStoreFileSystem, RemoteFile, StoreError};

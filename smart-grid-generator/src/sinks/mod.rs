pub mod data_lake;
pub mod ndjson;

pub use data_lake::{write_batch, WriteFailure};
pub use ndjson::{serialize_batch, SerializedBatch};

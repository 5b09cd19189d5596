pub mod csv_file;
pub mod object_store;
pub mod sink;

pub use object_store::{ObjectStore, S3ObjectStore};
pub use sink::{ArtifactSink, DataSink, SinkError};

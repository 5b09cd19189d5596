//! The persisted form of a [`Dataset`](crate::models::dataset::Dataset).

use std::path::PathBuf;

use crate::models::dataset::RunTimestamp;

/// `stocks_<YYYY-MM-DD_HH-MM-SS>.csv`, unique per run at second precision.
pub fn artifact_filename(timestamp: RunTimestamp) -> String {
    format!("stocks_{timestamp}.csv")
}

/// Where an uploaded artifact lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLocation {
    pub bucket: String,
    pub key: String,
}

impl RemoteLocation {
    pub fn uri(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    /// Where the CSV was written. Still meaningful after the local copy is
    /// removed, as a record of the write.
    pub local_path: PathBuf,
    /// Set only after a confirmed upload.
    pub remote: Option<RemoteLocation>,
    /// Whether the local file is still on disk.
    pub local_retained: bool,
}

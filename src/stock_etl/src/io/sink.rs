use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use snafu::{Backtrace, ResultExt, Snafu};
use tokio::{fs, io::AsyncWriteExt};
use tracing::{info, warn};

use crate::{
    io::{
        csv_file::write_dataset,
        object_store::{ObjectStore, ObjectStoreError},
    },
    models::{
        artifact::{Artifact, RemoteLocation, artifact_filename},
        dataset::Dataset,
    },
};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SinkError {
    /// An error occurred while writing the local artifact.
    #[snafu(display("Failed to write {}: {source}", path.display()))]
    LocalWrite {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// An error occurred while converting the dataset into CSV.
    #[snafu(display("Failed to encode dataset for {}: {source}", path.display()))]
    Encode {
        path: PathBuf,
        source: csv::Error,
        backtrace: Backtrace,
    },

    /// A previous run already produced this artifact.
    #[snafu(display("Refusing to overwrite existing artifact {}", path.display()))]
    AlreadyExists { path: PathBuf, backtrace: Backtrace },

    /// The upload failed; the local artifact at `path` was kept.
    #[snafu(display("Failed to upload {}: {source}", path.display()))]
    Upload {
        path: PathBuf,
        source: ObjectStoreError,
    },
}

impl SinkError {
    /// True for failures that happened before any upload was attempted.
    pub fn is_local_write(&self) -> bool {
        !matches!(self, SinkError::Upload { .. })
    }
}

#[async_trait]
pub trait DataSink: Send + Sync {
    /// The type of output returned after a successful write operation.
    ///
    /// This makes the trait flexible. For example:
    /// - A file sink might return the [`Artifact`] it produced.
    /// - A database sink might return `usize`, the number of rows inserted.
    type Output;

    /// Writes the dataset to the destination.
    async fn write(&self, data: &Dataset) -> Result<Self::Output, SinkError>;
}

struct UploadTarget {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

/// Writes each dataset to `<output_dir>/stocks_<timestamp>.csv` and, when an
/// upload target is set, moves it to object storage.
pub struct ArtifactSink {
    output_dir: PathBuf,
    upload: Option<UploadTarget>,
}

impl ArtifactSink {
    pub fn local(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            upload: None,
        }
    }

    pub fn with_upload(mut self, store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        self.upload = Some(UploadTarget {
            store,
            bucket: bucket.into(),
        });
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Writes locally, then uploads and removes the local copy if configured.
    ///
    /// A failed upload leaves the local file in place and returns
    /// [`SinkError::Upload`]. Once the upload is acknowledged, failing to
    /// remove the local copy is only logged; the returned artifact has
    /// `local_retained` set.
    pub async fn persist(&self, dataset: &Dataset) -> Result<Artifact, SinkError> {
        let filename = artifact_filename(dataset.timestamp());
        let local_path = self.output_dir.join(&filename);

        write_local(&self.output_dir, &local_path, dataset).await?;
        info!(path = %local_path.display(), rows = dataset.len(), "wrote local artifact");

        let Some(target) = &self.upload else {
            return Ok(Artifact {
                filename,
                local_path,
                remote: None,
                local_retained: true,
            });
        };

        if let Err(source) = target
            .store
            .put_file(&target.bucket, &filename, &local_path)
            .await
        {
            warn!(path = %local_path.display(), "upload failed, keeping local artifact");
            return Err(SinkError::Upload {
                path: local_path,
                source,
            });
        }
        let remote = RemoteLocation {
            bucket: target.bucket.clone(),
            key: filename.clone(),
        };
        info!(uri = %remote.uri(), "uploaded artifact");

        let local_retained = match fs::remove_file(&local_path).await {
            Ok(()) => false,
            Err(e) => {
                warn!(
                    path = %local_path.display(),
                    error = %e,
                    "could not remove uploaded local artifact"
                );
                true
            }
        };

        Ok(Artifact {
            filename,
            local_path,
            remote: Some(remote),
            local_retained,
        })
    }
}

#[async_trait]
impl DataSink for ArtifactSink {
    type Output = Artifact;

    async fn write(&self, data: &Dataset) -> Result<Artifact, SinkError> {
        self.persist(data).await
    }
}

/// Encodes in memory, writes to a `.partial` sibling, then links it into place
/// so a reader never sees a half-written artifact.
async fn write_local(output_dir: &Path, path: &Path, dataset: &Dataset) -> Result<(), SinkError> {
    let mut encoded = Vec::new();
    write_dataset(dataset, &mut encoded).context(EncodeSnafu { path })?;

    fs::create_dir_all(output_dir)
        .await
        .context(LocalWriteSnafu { path: output_dir })?;
    if fs::try_exists(path).await.context(LocalWriteSnafu { path })? {
        return AlreadyExistsSnafu { path }.fail();
    }

    let partial = path.with_extension("csv.partial");
    let mut file = match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&partial)
        .await
    {
        Ok(file) => file,
        // Another run with the same timestamp is mid-write; its partial is not ours.
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return AlreadyExistsSnafu { path }.fail();
        }
        Err(source) => return Err(source).context(LocalWriteSnafu { path }),
    };

    let written = async {
        file.write_all(&encoded).await?;
        file.sync_all().await
    }
    .await;
    drop(file);

    if let Err(source) = written {
        let _ = fs::remove_file(&partial).await;
        return Err(source).context(LocalWriteSnafu { path });
    }
    publish(&partial, path).await
}

/// Moves a finished `partial` to `path` without replacing anything there.
///
/// `hard_link` fails when `path` exists, unlike `rename`. The partial is
/// removed whatever the outcome.
async fn publish(partial: &Path, path: &Path) -> Result<(), SinkError> {
    let linked = fs::hard_link(partial, path).await;
    if let Err(e) = fs::remove_file(partial).await {
        warn!(path = %partial.display(), error = %e, "could not remove partial artifact");
    }
    match linked {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => AlreadyExistsSnafu { path }.fail(),
        Err(source) => Err(source).context(LocalWriteSnafu { path }),
    }
}

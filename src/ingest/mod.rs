//! Media ingest
//!
//! Turns a user-selected file handle into [`SourceMedia`]: the raw bytes the
//! engine can consume plus the playable duration that bounds the clip range.
//! Each successful load also publishes a preview resource for the selected
//! file, releasing the previous one so repeated selections never leak.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

use crate::error::IngestError;
use crate::publish::{LocalResource, OutputPublisher};

pub mod ffprobe;

pub use ffprobe::FfprobeDurationProbe;

/// An ingested media file, immutable once constructed.
#[derive(Debug, Clone)]
pub struct SourceMedia {
    bytes: Bytes,
    duration_seconds: f64,
}

impl SourceMedia {
    /// Wrap already-loaded media bytes and their probed duration.
    pub fn new(bytes: Bytes, duration_seconds: f64) -> Self {
        Self {
            bytes,
            duration_seconds,
        }
    }

    /// Raw container bytes.
    pub fn bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    /// Playable duration in seconds. Zero is legal (and distinct from
    /// unreadable media, which fails ingest instead).
    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }
}

/// Probes the playable duration of a media file.
///
/// Probing may require decoding enough of the file to reach its metadata, so
/// it is asynchronous and can fail on corrupt or unsupported containers.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    async fn duration_seconds(&self, path: &Path) -> Result<f64, IngestError>;
}

/// Loads user-selected files into [`SourceMedia`].
pub struct MediaIngest {
    probe: Arc<dyn DurationProbe>,
    preview: OutputPublisher,
}

impl MediaIngest {
    pub fn new(probe: Arc<dyn DurationProbe>) -> Self {
        Self {
            probe,
            preview: OutputPublisher::new(),
        }
    }

    /// Read the file's bytes, probe its duration, and replace the preview slot.
    ///
    /// A missing file is `NoFile`; anything unreadable or unprobeable is
    /// `Unreadable` with detail. The previous preview resource is released
    /// at the point the new file's metadata has loaded.
    pub async fn load_file(&mut self, path: &Path) -> Result<SourceMedia, IngestError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => Bytes::from(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(IngestError::NoFile)
            }
            Err(e) => {
                return Err(IngestError::Unreadable {
                    detail: format!("{}: {e}", path.display()),
                })
            }
        };

        let duration_seconds = self.probe.duration_seconds(path).await?;
        if !duration_seconds.is_finite() || duration_seconds < 0.0 {
            return Err(IngestError::Unreadable {
                detail: format!("probe reported invalid duration {duration_seconds}"),
            });
        }

        self.preview
            .publish(&bytes)
            .map_err(|e| IngestError::Unreadable {
                detail: format!("could not publish preview: {e}"),
            })?;

        info!(
            path = %path.display(),
            len = bytes.len(),
            duration_seconds,
            "media ingested"
        );
        Ok(SourceMedia {
            bytes,
            duration_seconds,
        })
    }

    /// Preview resource for the most recently loaded file.
    pub fn preview(&self) -> Option<&LocalResource> {
        self.preview.current()
    }
}

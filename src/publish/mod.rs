//! Output publisher
//!
//! Wraps result bytes as a locally addressable resource the presentation
//! layer can play back or offer for download. A publisher owns one slot:
//! publishing into it releases whatever resource was there before, so two
//! live handles never exist for the same slot.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::PublishError;

/// A playable/downloadable handle over published bytes.
///
/// The backing file lives only as long as the handle; dropping it releases
/// the resource.
pub struct LocalResource {
    file: NamedTempFile,
    url: String,
    len: usize,
}

impl LocalResource {
    fn materialize(bytes: &[u8]) -> Result<Self, PublishError> {
        let mut file = NamedTempFile::new()?;
        file.write_all(bytes)?;
        file.flush()?;
        let url = format!("file://{}", file.path().display());
        Ok(Self {
            file,
            url,
            len: bytes.len(),
        })
    }

    /// Locally addressable URL of the resource.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Filesystem path backing the resource.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Size of the published payload in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the published payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl std::fmt::Debug for LocalResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalResource")
            .field("url", &self.url)
            .field("len", &self.len)
            .finish()
    }
}

/// Single-slot publisher with release-on-replace semantics.
#[derive(Debug, Default)]
pub struct OutputPublisher {
    current: Option<LocalResource>,
}

impl OutputPublisher {
    pub fn new() -> Self {
        Self { current: None }
    }

    /// Publish `bytes`, releasing the previously published resource first.
    pub fn publish(&mut self, bytes: &[u8]) -> Result<&LocalResource, PublishError> {
        // Release before materializing the replacement.
        if let Some(old) = self.current.take() {
            debug!(url = %old.url(), "releasing published resource");
        }
        let resource = LocalResource::materialize(bytes)?;
        debug!(url = %resource.url(), len = resource.len(), "published resource");
        Ok(self.current.insert(resource))
    }

    /// Currently published resource, if any.
    pub fn current(&self) -> Option<&LocalResource> {
        self.current.as_ref()
    }

    /// Explicitly release the current resource.
    pub fn release(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_exposes_bytes_behind_a_file_url() {
        let mut publisher = OutputPublisher::new();
        let resource = publisher.publish(b"clip bytes").unwrap();
        assert!(resource.url().starts_with("file://"));
        assert_eq!(resource.len(), 10);
        assert_eq!(std::fs::read(resource.path()).unwrap(), b"clip bytes");
    }

    #[test]
    fn republishing_releases_the_previous_resource() {
        let mut publisher = OutputPublisher::new();
        let first_path = publisher.publish(b"first").unwrap().path().to_path_buf();
        assert!(first_path.exists());

        publisher.publish(b"second").unwrap();
        assert!(!first_path.exists());
        assert_eq!(publisher.current().unwrap().len(), 6);
    }

    #[test]
    fn release_drops_the_slot() {
        let mut publisher = OutputPublisher::new();
        let path = publisher.publish(b"bytes").unwrap().path().to_path_buf();
        publisher.release();
        assert!(publisher.current().is_none());
        assert!(!path.exists());
    }
}

//! Pipeline facade
//!
//! Wires the pipeline components together for a single user session and
//! exposes the three observable signals the presentation layer renders:
//! engine readiness, the clip range with its bounds, and export status, plus
//! resource handles for the preview and the exported clip.
//!
//! One instance serves one logical session; there is no internal parallelism.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use crate::engine::{EngineBackend, EngineConfig, EngineSession, Readiness};
use crate::error::{ClipKitResult, ExportError};
use crate::export::{ExportConfig, ExportOrchestrator, ExportStatus};
use crate::ingest::{DurationProbe, MediaIngest, SourceMedia};
use crate::publish::{LocalResource, OutputPublisher};
use crate::range::{ClipRange, ClipRangeModel};

/// End-to-end clip extraction pipeline for one session.
pub struct ClipPipeline {
    session: Arc<EngineSession>,
    ingest: MediaIngest,
    range: ClipRangeModel,
    orchestrator: ExportOrchestrator,
    publisher: OutputPublisher,
    media: Option<SourceMedia>,
}

impl ClipPipeline {
    /// Assemble a pipeline over the given engine backend and duration probe.
    pub fn new(backend: Arc<dyn EngineBackend>, probe: Arc<dyn DurationProbe>) -> Self {
        Self::with_export_config(backend, probe, ExportConfig::default())
    }

    /// Assemble with explicit export tuning (slot names, execute timeout).
    pub fn with_export_config(
        backend: Arc<dyn EngineBackend>,
        probe: Arc<dyn DurationProbe>,
        config: ExportConfig,
    ) -> Self {
        let session = Arc::new(EngineSession::new(backend));
        let orchestrator = ExportOrchestrator::with_config(Arc::clone(&session), config);
        Self {
            session,
            ingest: MediaIngest::new(probe),
            range: ClipRangeModel::new(),
            orchestrator,
            publisher: OutputPublisher::new(),
            media: None,
        }
    }

    /// Load the engine runtime. Called once at session start; idempotent.
    pub async fn init_engine(&self, config: &EngineConfig) -> ClipKitResult<()> {
        self.session.initialize(config).await?;
        Ok(())
    }

    /// Ingest a user-selected file; discards the previous selection and
    /// resets the clip range to `[0, min(5, duration)]`.
    pub async fn select_file(&mut self, path: &Path) -> ClipKitResult<()> {
        let media = self.ingest.load_file(path).await?;
        self.range.set_duration(media.duration_seconds());
        self.media = Some(media);
        Ok(())
    }

    /// Update the selected clip interval, in seconds.
    pub fn set_range(&mut self, start: f64, end: f64) -> ClipKitResult<()> {
        self.range.set_range(start, end)?;
        Ok(())
    }

    /// Export the currently selected interval and publish the result.
    ///
    /// Uses the range value current at this call. The previous output
    /// resource, if any, is released when the new one is published.
    pub async fn export(&mut self) -> ClipKitResult<&LocalResource> {
        let media = self.media.as_ref().ok_or(ExportError::NotReady)?;
        let range = self.range.current();
        let bytes = self.orchestrator.export_clip(media, range).await?;
        let resource = self.publisher.publish(&bytes)?;
        info!(url = %resource.url(), "clip exported");
        Ok(resource)
    }

    /// Best-effort cancel of the in-flight export, if any.
    pub fn cancel_export(&self) {
        self.orchestrator.cancel();
    }

    // Observable signals for the presentation layer.

    pub fn engine_readiness(&self) -> Readiness {
        self.session.readiness()
    }

    pub fn readiness_watch(&self) -> watch::Receiver<Readiness> {
        self.session.readiness_watch()
    }

    pub fn export_status(&self) -> ExportStatus {
        self.orchestrator.status()
    }

    pub fn status_watch(&self) -> watch::Receiver<ExportStatus> {
        self.orchestrator.status_watch()
    }

    /// Current clip range selection.
    pub fn clip_range(&self) -> ClipRange {
        self.range.current()
    }

    /// Slider bounds `(0, duration)` in seconds.
    pub fn clip_bounds(&self) -> (f64, f64) {
        self.range.bounds()
    }

    /// Preview resource for the selected source file.
    pub fn preview(&self) -> Option<&LocalResource> {
        self.ingest.preview()
    }

    /// Most recently exported clip resource.
    pub fn output(&self) -> Option<&LocalResource> {
        self.publisher.current()
    }
}

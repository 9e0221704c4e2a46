//! ClipKit: in-process video clip extraction
//!
//! Pick a local video file, choose a sub-interval by time, and produce a new
//! video containing only that interval via a lossless stream-copy trim. The
//! heavy lifting is delegated to an opaque external processing engine; this
//! crate owns the pipeline around it: engine lifecycle, media ingest, the
//! clip range model, the export state machine, and output publishing.
//!
//! # Overview
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use clipkit::{ClipPipeline, EngineConfig, FfmpegCliEngine, FfprobeDurationProbe};
//!
//! # async fn demo() -> clipkit::ClipKitResult<()> {
//! let backend = Arc::new(FfmpegCliEngine::new()?);
//! let probe = Arc::new(FfprobeDurationProbe::discover()?);
//! let mut pipeline = ClipPipeline::new(backend, probe);
//!
//! pipeline.init_engine(&EngineConfig::default()).await?;
//! pipeline.select_file(Path::new("movie.mp4")).await?;
//! pipeline.set_range(1.5, 4.2)?;
//! let clip = pipeline.export().await?;
//! println!("clip at {}", clip.url());
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod error;
pub mod export;
pub mod ingest;
pub mod pipeline;
pub mod publish;
pub mod range;
pub mod utils;

// Re-export commonly used types
pub use engine::{EngineBackend, EngineConfig, EngineSession, FfmpegCliEngine, Readiness};
pub use error::{
    ClipKitError, ClipKitResult, EngineError, ExportError, IngestError, PublishError, RangeError,
};
pub use export::{ExportConfig, ExportOrchestrator, ExportStatus};
pub use ingest::{DurationProbe, FfprobeDurationProbe, MediaIngest, SourceMedia};
pub use pipeline::ClipPipeline;
pub use publish::{LocalResource, OutputPublisher};
pub use range::{ClipRange, ClipRangeModel};

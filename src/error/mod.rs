//! Error handling module for ClipKit
//!
//! Each pipeline component has its own error enum; the orchestrator translates
//! lower-level failures into `ExportError` variants so nothing below it leaks
//! past the pipeline boundary unhandled.

use thiserror::Error;

/// Errors reported by the engine session and its backend
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    /// Engine runtime or binary payload could not be loaded
    #[error("engine load failed: {detail}")]
    LoadFailed { detail: String },

    /// The session has not reached Ready
    #[error("engine session is not ready")]
    NotReady,

    /// Writing a buffer into the engine's private storage failed
    #[error("engine write failed: {detail}")]
    WriteFailed { detail: String },

    /// The engine reported a command failure
    #[error("engine command failed: {detail}")]
    ExecFailed { detail: String },

    /// The named output does not exist or could not be read back
    #[error("engine read failed: {detail}")]
    ReadFailed { detail: String },
}

/// Errors reported while ingesting a user-selected file
#[derive(Error, Debug, Clone)]
pub enum IngestError {
    /// No file at the given handle
    #[error("no file selected")]
    NoFile,

    /// File bytes or metadata could not be read (corrupt/unsupported media)
    #[error("media is unreadable: {detail}")]
    Unreadable { detail: String },

    /// No duration probe is available on this system
    #[error("duration probe unavailable: {detail}")]
    ProbeUnavailable { detail: String },
}

/// Errors reported by the clip range model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RangeError {
    /// Start is after end
    #[error("inverted range: start {start}s is after end {end}s")]
    Inverted { start: f64, end: f64 },

    /// A bound lies outside [0, duration]
    #[error("range [{start}s, {end}s] is outside [0, {duration}s]")]
    OutOfBounds { start: f64, end: f64, duration: f64 },
}

/// Errors surfaced by the export orchestrator
///
/// Every variant carries enough detail for the presentation layer to show an
/// actionable message; silent failures are a correctness bug.
#[derive(Error, Debug, Clone)]
pub enum ExportError {
    /// Engine session is not Ready, or no media has been loaded
    #[error("engine session is not ready")]
    NotReady,

    /// Another export job is still in WritingInput/Executing/ReadingOutput
    #[error("an export is already in flight")]
    InFlight,

    /// The job's cancel token fired before the next step committed
    #[error("export was cancelled")]
    Cancelled,

    /// Writing the source bytes into engine storage failed
    #[error("failed to write input to engine storage: {detail}")]
    WriteFailed { detail: String },

    /// The trim command failed; `detail` is the engine-reported message
    #[error("trim command failed: {detail}")]
    ExecutionFailed { detail: String },

    /// The trim command produced no readable output
    #[error("failed to read trim output: {detail}")]
    ReadFailed { detail: String },

    /// The trim command exceeded the configured execute timeout
    #[error("trim command timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

/// Errors reported while publishing output bytes as a local resource
#[derive(Error, Debug)]
pub enum PublishError {
    /// Backing temp file could not be created or written
    #[error("failed to materialize local resource: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level error type aggregating all pipeline components
#[derive(Error, Debug)]
pub enum ClipKitError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Result type alias for ClipKit operations
pub type ClipKitResult<T> = std::result::Result<T, ClipKitError>;

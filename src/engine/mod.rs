//! Engine session module
//!
//! The engine that actually decodes and encodes video is an opaque external
//! processing service. [`EngineBackend`] is its contract: load once, then
//! write named inputs, run commands, and read named outputs against the
//! engine's private storage. [`EngineSession`] owns the lifecycle on top of a
//! backend: a readiness state machine, idempotent-guarded initialization, and
//! a watch channel so callers can observe "not yet ready" without blocking.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::EngineError;

pub mod ffmpeg_cli;

pub use ffmpeg_cli::FfmpegCliEngine;

/// Engine session lifecycle state.
///
/// Transitions `Unloaded -> Loading -> {Ready | Failed}` exactly once; only an
/// explicit [`EngineSession::reset`] leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Readiness {
    Unloaded,
    Loading,
    Ready,
    Failed,
}

/// Configuration for loading the engine runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Explicit path to the engine binary payload. When `None`, the backend
    /// discovers it from the environment.
    pub binary: Option<PathBuf>,
}

/// Contract of the external processing engine.
///
/// Implementations must not require Ready-state checks of their own; the
/// session performs those before delegating.
#[async_trait]
pub trait EngineBackend: Send + Sync {
    /// Fetch/load the engine runtime and binary payload. May be slow.
    async fn load(&self, config: &EngineConfig) -> Result<(), EngineError>;

    /// Store a byte buffer under a logical name in the engine's private storage.
    async fn write_input(&self, name: &str, bytes: Bytes) -> Result<(), EngineError>;

    /// Run a transformation command against previously written inputs.
    ///
    /// Engine-reported failures must surface as `ExecFailed` with the engine's
    /// own message, never be swallowed.
    async fn execute(&self, args: &[String]) -> Result<(), EngineError>;

    /// Read a named output produced by a prior `execute`.
    async fn read_output(&self, name: &str) -> Result<Bytes, EngineError>;
}

/// Owns the external engine's lifecycle and gates all access on readiness.
pub struct EngineSession {
    backend: Arc<dyn EngineBackend>,
    // Serializes initialize/reset; a second initialize during Loading parks
    // here and receives the in-flight outcome.
    init_lock: tokio::sync::Mutex<()>,
    readiness_tx: watch::Sender<Readiness>,
    error_detail: std::sync::Mutex<Option<String>>,
}

impl EngineSession {
    /// Create a session over the given backend. No loading happens yet.
    pub fn new(backend: Arc<dyn EngineBackend>) -> Self {
        let (readiness_tx, _) = watch::channel(Readiness::Unloaded);
        Self {
            backend,
            init_lock: tokio::sync::Mutex::new(()),
            readiness_tx,
            error_detail: std::sync::Mutex::new(None),
        }
    }

    /// Load the engine runtime, once.
    ///
    /// Idempotent-guarded: once Ready this returns `Ok` immediately; callers
    /// arriving while a load is in flight await the same outcome; after a
    /// failure the stored error is returned until [`reset`](Self::reset).
    pub async fn initialize(&self, config: &EngineConfig) -> Result<(), EngineError> {
        let _guard = self.init_lock.lock().await;
        match *self.readiness_tx.borrow() {
            Readiness::Ready => return Ok(()),
            Readiness::Failed => {
                let detail = self
                    .error_detail
                    .lock()
                    .expect("error detail lock poisoned")
                    .clone()
                    .unwrap_or_else(|| "previous load failed".to_string());
                return Err(EngineError::LoadFailed { detail });
            }
            Readiness::Unloaded | Readiness::Loading => {}
        }

        info!("loading engine runtime");
        self.readiness_tx.send_replace(Readiness::Loading);
        match self.backend.load(config).await {
            Ok(()) => {
                info!("engine runtime ready");
                self.readiness_tx.send_replace(Readiness::Ready);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "engine load failed");
                let detail = err.to_string();
                *self
                    .error_detail
                    .lock()
                    .expect("error detail lock poisoned") = Some(detail.clone());
                self.readiness_tx.send_replace(Readiness::Failed);
                Err(EngineError::LoadFailed { detail })
            }
        }
    }

    /// Return a Failed (or Ready) session to Unloaded so it can load again.
    pub async fn reset(&self) {
        let _guard = self.init_lock.lock().await;
        *self
            .error_detail
            .lock()
            .expect("error detail lock poisoned") = None;
        self.readiness_tx.send_replace(Readiness::Unloaded);
    }

    /// Current readiness, read without blocking.
    pub fn readiness(&self) -> Readiness {
        *self.readiness_tx.borrow()
    }

    /// Subscribe to readiness transitions (the `engineReadiness` signal).
    pub fn readiness_watch(&self) -> watch::Receiver<Readiness> {
        self.readiness_tx.subscribe()
    }

    /// Whether the session has reached Ready.
    pub fn is_ready(&self) -> bool {
        self.readiness() == Readiness::Ready
    }

    /// Human-readable detail of the last load failure, if any.
    pub fn error_detail(&self) -> Option<String> {
        self.error_detail
            .lock()
            .expect("error detail lock poisoned")
            .clone()
    }

    /// Store a byte buffer under `name` in engine storage. Fails when not Ready.
    pub async fn write_input(&self, name: &str, bytes: Bytes) -> Result<(), EngineError> {
        if !self.is_ready() {
            return Err(EngineError::NotReady);
        }
        self.backend.write_input(name, bytes).await
    }

    /// Run a command against previously written inputs. Fails when not Ready.
    pub async fn execute(&self, args: &[String]) -> Result<(), EngineError> {
        if !self.is_ready() {
            return Err(EngineError::NotReady);
        }
        self.backend.execute(args).await
    }

    /// Read a named output. Fails when not Ready or when the output is missing.
    pub async fn read_output(&self, name: &str) -> Result<Bytes, EngineError> {
        if !self.is_ready() {
            return Err(EngineError::NotReady);
        }
        self.backend.read_output(name).await
    }
}

//! Export orchestrator
//!
//! The core state machine of the pipeline. One export job walks
//! WritingInput -> Executing -> ReadingOutput -> Done, with Failed reachable
//! from every non-terminal step and absorbing until a new export starts. At
//! most one job may be in flight per orchestrator; a second call fails fast.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::EngineSession;
use crate::error::{EngineError, ExportError};
use crate::ingest::SourceMedia;
use crate::range::ClipRange;
use crate::utils::time;

/// Observable state of the current (or last) export job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExportStatus {
    Idle,
    WritingInput,
    Executing,
    ReadingOutput,
    Done,
    Failed,
}

/// Orchestrator tuning: logical slot names and the execute timeout.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Logical name the source bytes are written under.
    pub input_name: String,
    /// Logical name the trim output is read from.
    pub output_name: String,
    /// Upper bound on the engine execute step; `None` waits indefinitely.
    /// Malformed input can make engine commands hang, so hosts should set one.
    pub execute_timeout: Option<Duration>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            input_name: "input.mp4".to_string(),
            output_name: "output.mp4".to_string(),
            execute_timeout: None,
        }
    }
}

/// Sequences one export at a time against an [`EngineSession`].
pub struct ExportOrchestrator {
    session: Arc<EngineSession>,
    config: ExportConfig,
    status_tx: watch::Sender<ExportStatus>,
    // Some(token) while a job is in flight; doubles as the reentrancy guard.
    active: std::sync::Mutex<Option<CancellationToken>>,
}

impl ExportOrchestrator {
    pub fn new(session: Arc<EngineSession>) -> Self {
        Self::with_config(session, ExportConfig::default())
    }

    pub fn with_config(session: Arc<EngineSession>, config: ExportConfig) -> Self {
        let (status_tx, _) = watch::channel(ExportStatus::Idle);
        Self {
            session,
            config,
            status_tx,
            active: std::sync::Mutex::new(None),
        }
    }

    /// Trim `media` to `range` and return the resulting bytes.
    ///
    /// The range snapshot passed in is the one used; callers read it from the
    /// model at invocation time. Preconditions (session Ready, no job in
    /// flight) fail without mutating the status machine. A zero-length range
    /// and a full `[0, duration]` range both perform a real trim.
    pub async fn export_clip(
        &self,
        media: &SourceMedia,
        range: ClipRange,
    ) -> Result<Bytes, ExportError> {
        if !self.session.is_ready() {
            return Err(ExportError::NotReady);
        }
        let cancel = {
            let mut slot = self.active.lock().expect("job slot lock poisoned");
            if slot.is_some() {
                return Err(ExportError::InFlight);
            }
            let token = CancellationToken::new();
            *slot = Some(token.clone());
            token
        };

        info!(
            start = range.start_seconds(),
            end = range.end_seconds(),
            "export started"
        );
        let result = self.run_job(media, range, &cancel).await;
        *self.active.lock().expect("job slot lock poisoned") = None;

        match &result {
            Ok(bytes) => {
                self.status_tx.send_replace(ExportStatus::Done);
                info!(len = bytes.len(), "export done");
            }
            Err(err) => {
                self.status_tx.send_replace(ExportStatus::Failed);
                warn!(error = %err, "export failed");
            }
        }
        result
    }

    async fn run_job(
        &self,
        media: &SourceMedia,
        range: ClipRange,
        cancel: &CancellationToken,
    ) -> Result<Bytes, ExportError> {
        if cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }
        self.status_tx.send_replace(ExportStatus::WritingInput);
        self.session
            .write_input(&self.config.input_name, media.bytes())
            .await
            .map_err(write_error)?;

        if cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }
        self.status_tx.send_replace(ExportStatus::Executing);
        let args = trim_args(&self.config.input_name, &self.config.output_name, &range);
        debug!(?args, "executing trim command");
        let execute = self.session.execute(&args);
        match self.config.execute_timeout {
            Some(limit) => match tokio::time::timeout(limit, execute).await {
                Ok(result) => result.map_err(exec_error)?,
                Err(_) => {
                    return Err(ExportError::Timeout {
                        seconds: limit.as_secs(),
                    })
                }
            },
            None => execute.await.map_err(exec_error)?,
        }

        if cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }
        self.status_tx.send_replace(ExportStatus::ReadingOutput);
        let bytes = self
            .session
            .read_output(&self.config.output_name)
            .await
            .map_err(read_error)?;

        if cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }
        Ok(bytes)
    }

    /// Fire the in-flight job's cancel token, if any.
    ///
    /// Cooperative: the step already issued to the engine is not aborted, but
    /// no later step will commit.
    pub fn cancel(&self) {
        if let Some(token) = self
            .active
            .lock()
            .expect("job slot lock poisoned")
            .as_ref()
        {
            token.cancel();
        }
    }

    /// Current status, read without blocking.
    pub fn status(&self) -> ExportStatus {
        *self.status_tx.borrow()
    }

    /// Subscribe to status transitions (the `exportStatus` signal).
    pub fn status_watch(&self) -> watch::Receiver<ExportStatus> {
        self.status_tx.subscribe()
    }
}

/// Build the stream-copy trim command for `range`.
///
/// The flag names and order are a compatibility surface with the external
/// engine binary and must stay `-i <in> -ss <start> -to <end> -c copy <out>`.
/// Times render as fixed-point seconds with one decimal, so arguments are
/// deterministic for a given range. Stream copy means cut points snap to the
/// nearest keyframe rather than the exact requested boundary; that precision
/// tradeoff is inherited from the trim mode, not corrected here.
fn trim_args(input_name: &str, output_name: &str, range: &ClipRange) -> Vec<String> {
    vec![
        "-i".to_string(),
        input_name.to_string(),
        "-ss".to_string(),
        time::format_deciseconds(range.start_deciseconds()),
        "-to".to_string(),
        time::format_deciseconds(range.end_deciseconds()),
        "-c".to_string(),
        "copy".to_string(),
        output_name.to_string(),
    ]
}

fn write_error(err: EngineError) -> ExportError {
    match err {
        EngineError::NotReady => ExportError::NotReady,
        EngineError::WriteFailed { detail } => ExportError::WriteFailed { detail },
        other => ExportError::WriteFailed {
            detail: other.to_string(),
        },
    }
}

fn exec_error(err: EngineError) -> ExportError {
    match err {
        EngineError::NotReady => ExportError::NotReady,
        // Detail passes through untouched so the presentation layer sees the
        // engine's own message.
        EngineError::ExecFailed { detail } => ExportError::ExecutionFailed { detail },
        other => ExportError::ExecutionFailed {
            detail: other.to_string(),
        },
    }
}

fn read_error(err: EngineError) -> ExportError {
    match err {
        EngineError::NotReady => ExportError::NotReady,
        EngineError::ReadFailed { detail } => ExportError::ReadFailed { detail },
        other => ExportError::ReadFailed {
            detail: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::ClipRangeModel;

    #[test]
    fn trim_args_follow_the_engine_grammar() {
        let mut model = ClipRangeModel::new();
        model.set_duration(10.0);
        model.set_range(3.2, 7.0).unwrap();

        let args = trim_args("input.mp4", "output.mp4", &model.current());
        assert_eq!(
            args,
            vec!["-i", "input.mp4", "-ss", "3.2", "-to", "7.0", "-c", "copy", "output.mp4"]
        );
    }

    #[test]
    fn trim_args_are_stable_for_default_range() {
        let mut model = ClipRangeModel::new();
        model.set_duration(10.0);

        let args = trim_args("input.mp4", "output.mp4", &model.current());
        assert_eq!(args[3], "0.0");
        assert_eq!(args[5], "5.0");
    }
}

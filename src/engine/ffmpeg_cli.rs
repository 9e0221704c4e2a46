//! External `ffmpeg` backend
//!
//! Addresses a real ffmpeg binary through a private scratch directory that
//! plays the role of the engine's addressable storage: logical names map to
//! files inside it, and commands run with it as their working directory.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use bytes::Bytes;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::debug;

use crate::engine::{EngineBackend, EngineConfig};
use crate::error::EngineError;

/// How many trailing diagnostic lines to keep for failure details.
const LOG_TAIL_LINES: usize = 8;

/// ffmpeg subprocess backend with tempdir-backed private storage.
pub struct FfmpegCliEngine {
    storage: TempDir,
    binary: std::sync::Mutex<Option<PathBuf>>,
    log_tx: Option<mpsc::UnboundedSender<String>>,
}

impl FfmpegCliEngine {
    /// Create a backend with fresh private storage.
    pub fn new() -> Result<Self, EngineError> {
        let storage = TempDir::new().map_err(|e| EngineError::LoadFailed {
            detail: format!("could not create engine storage: {e}"),
        })?;
        Ok(Self {
            storage,
            binary: std::sync::Mutex::new(None),
            log_tx: None,
        })
    }

    /// Forward engine diagnostic lines to `sink` as they are produced.
    ///
    /// Sends never block; a dropped receiver is ignored.
    pub fn with_log_sink(mut self, sink: mpsc::UnboundedSender<String>) -> Self {
        self.log_tx = Some(sink);
        self
    }

    /// Path of the private storage directory.
    pub fn storage_path(&self) -> &Path {
        self.storage.path()
    }

    fn binary(&self) -> Result<PathBuf, EngineError> {
        self.binary
            .lock()
            .expect("binary lock poisoned")
            .clone()
            .ok_or_else(|| EngineError::ExecFailed {
                detail: "engine binary not loaded".to_string(),
            })
    }

    fn slot_path(&self, name: &str) -> Result<PathBuf, EngineError> {
        validate_logical_name(name)?;
        Ok(self.storage.path().join(name))
    }
}

/// Logical names address slots in flat storage, never paths.
fn validate_logical_name(name: &str) -> Result<(), EngineError> {
    if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
        return Err(EngineError::WriteFailed {
            detail: format!("invalid logical name: {name:?}"),
        });
    }
    Ok(())
}

#[async_trait]
impl EngineBackend for FfmpegCliEngine {
    async fn load(&self, config: &EngineConfig) -> Result<(), EngineError> {
        let binary = match &config.binary {
            Some(path) => path.clone(),
            None => which::which("ffmpeg").map_err(|e| EngineError::LoadFailed {
                detail: format!("ffmpeg binary not found: {e}"),
            })?,
        };

        // A version run proves the payload is actually executable.
        let output = Command::new(&binary)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| EngineError::LoadFailed {
                detail: format!("could not run {}: {e}", binary.display()),
            })?;
        if !output.status.success() {
            return Err(EngineError::LoadFailed {
                detail: format!("{} -version exited with {}", binary.display(), output.status),
            });
        }

        debug!(binary = %binary.display(), "engine binary verified");
        *self.binary.lock().expect("binary lock poisoned") = Some(binary);
        Ok(())
    }

    async fn write_input(&self, name: &str, bytes: Bytes) -> Result<(), EngineError> {
        let path = self.slot_path(name)?;
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| EngineError::WriteFailed {
                detail: format!("write {name}: {e}"),
            })
    }

    async fn execute(&self, args: &[String]) -> Result<(), EngineError> {
        let binary = self.binary()?;

        // -y/-nostdin are invocation plumbing; the command grammar itself is
        // entirely the caller's. kill_on_drop ties the subprocess to this
        // future: if a caller abandons it (timeout, cancel), the engine must
        // not keep writing into shared storage.
        let mut child = Command::new(&binary)
            .args(["-hide_banner", "-nostdin", "-y"])
            .args(args)
            .current_dir(self.storage.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineError::ExecFailed {
                detail: format!("could not spawn engine: {e}"),
            })?;

        // Drain diagnostics as they appear; they are observable but must
        // never alter control flow.
        let mut tail: Vec<String> = Vec::new();
        if let Some(stderr) = child.stderr.take() {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(target: "clipkit::engine", "{line}");
                if let Some(tx) = &self.log_tx {
                    let _ = tx.send(line.clone());
                }
                if tail.len() == LOG_TAIL_LINES {
                    tail.remove(0);
                }
                tail.push(line);
            }
        }

        let status = child.wait().await.map_err(|e| EngineError::ExecFailed {
            detail: format!("engine did not exit cleanly: {e}"),
        })?;
        if !status.success() {
            let detail = if tail.is_empty() {
                format!("engine exited with {status}")
            } else {
                tail.join("\n")
            };
            return Err(EngineError::ExecFailed { detail });
        }
        Ok(())
    }

    async fn read_output(&self, name: &str) -> Result<Bytes, EngineError> {
        let path = self.slot_path(name).map_err(|e| EngineError::ReadFailed {
            detail: e.to_string(),
        })?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| EngineError::ReadFailed {
                detail: format!("read {name}: {e}"),
            })?;
        Ok(Bytes::from(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_names_must_be_flat() {
        assert!(validate_logical_name("input.mp4").is_ok());
        assert!(validate_logical_name("").is_err());
        assert!(validate_logical_name("a/b.mp4").is_err());
        assert!(validate_logical_name("..\\evil").is_err());
        assert!(validate_logical_name("..").is_err());
    }
}

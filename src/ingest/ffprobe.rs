//! ffprobe duration probe
//!
//! Shells out to `ffprobe` and parses its JSON format section.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::error::IngestError;
use crate::ingest::DurationProbe;

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Duration probe backed by the `ffprobe` binary.
pub struct FfprobeDurationProbe {
    binary: PathBuf,
}

impl FfprobeDurationProbe {
    /// Locate `ffprobe` on the system.
    pub fn discover() -> Result<Self, IngestError> {
        let binary = which::which("ffprobe").map_err(|e| IngestError::ProbeUnavailable {
            detail: format!("ffprobe binary not found: {e}"),
        })?;
        debug!(binary = %binary.display(), "ffprobe located");
        Ok(Self { binary })
    }

    /// Use an explicit `ffprobe` binary.
    pub fn with_binary(binary: PathBuf) -> Self {
        Self { binary }
    }
}

#[async_trait]
impl DurationProbe for FfprobeDurationProbe {
    async fn duration_seconds(&self, path: &Path) -> Result<f64, IngestError> {
        let output = Command::new(&self.binary)
            .args(["-v", "error", "-print_format", "json", "-show_format"])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| IngestError::ProbeUnavailable {
                detail: format!("could not run {}: {e}", self.binary.display()),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(IngestError::Unreadable {
                detail: stderr.trim().to_string(),
            });
        }

        let parsed: ProbeOutput =
            serde_json::from_slice(&output.stdout).map_err(|e| IngestError::Unreadable {
                detail: format!("unparseable probe output: {e}"),
            })?;
        let duration = parsed
            .format
            .and_then(|f| f.duration)
            .ok_or_else(|| IngestError::Unreadable {
                detail: "probe output has no duration".to_string(),
            })?;
        duration
            .trim()
            .parse::<f64>()
            .map_err(|e| IngestError::Unreadable {
                detail: format!("unparseable duration {duration:?}: {e}"),
            })
    }
}

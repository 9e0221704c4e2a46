//! Backend tests against a scripted stand-in for the real ffmpeg binary.
//!
//! Each test writes a small shell script that answers `-version` (so load
//! succeeds) and then plays one engine behavior: emitting diagnostics,
//! failing with a message, or hanging.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::time::Duration;

use assert_matches::assert_matches;
use tempfile::TempDir;
use tokio::sync::mpsc;

use clipkit::{EngineBackend, EngineConfig, EngineError, FfmpegCliEngine};

/// Write an executable script that exits 0 on `-version` and otherwise runs
/// `body`. The tempdir must outlive the engine using the script.
fn scripted_binary(body: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("script dir");
    let path = dir.path().join("fake-ffmpeg");
    let script = format!(
        "#!/bin/sh\ncase \"$1\" in\n  -version) exit 0 ;;\nesac\n{body}\n"
    );
    std::fs::write(&path, script).expect("write script");
    let mut perms = std::fs::metadata(&path).expect("script metadata").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod script");
    (dir, path)
}

async fn loaded_engine(engine: FfmpegCliEngine, binary: PathBuf) -> FfmpegCliEngine {
    engine
        .load(&EngineConfig {
            binary: Some(binary),
        })
        .await
        .expect("scripted binary loads");
    engine
}

fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Ok(line) = rx.try_recv() {
        lines.push(line);
    }
    lines
}

#[tokio::test]
async fn diagnostics_reach_the_sink_without_changing_the_outcome() {
    let (_dir, binary) = scripted_binary(
        "echo \"frame=1 fps=0.0\" >&2\n\
         echo \"progress continuing\" >&2\n\
         exit 0",
    );
    let (tx, mut rx) = mpsc::unbounded_channel();
    let engine = FfmpegCliEngine::new().expect("engine").with_log_sink(tx);
    let engine = loaded_engine(engine, binary).await;

    engine
        .execute(&["run".to_string()])
        .await
        .expect("noisy stderr must not fail a successful run");

    let lines = drain(&mut rx);
    assert_eq!(
        lines,
        vec!["frame=1 fps=0.0".to_string(), "progress continuing".to_string()]
    );
}

#[tokio::test]
async fn failure_detail_carries_the_engine_diagnostics_verbatim() {
    let (_dir, binary) = scripted_binary(
        "echo \"frame=1 fps=0.0\" >&2\n\
         echo \"moov atom not found\" >&2\n\
         exit 1",
    );
    let (tx, mut rx) = mpsc::unbounded_channel();
    let engine = FfmpegCliEngine::new().expect("engine").with_log_sink(tx);
    let engine = loaded_engine(engine, binary).await;

    let err = engine.execute(&["run".to_string()]).await.unwrap_err();
    assert_matches!(err, EngineError::ExecFailed { detail } => {
        assert_eq!(detail, "frame=1 fps=0.0\nmoov atom not found");
    });

    // The same lines were forwarded live, independent of the failure.
    let lines = drain(&mut rx);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1], "moov atom not found");
}

#[tokio::test]
async fn failure_detail_keeps_only_the_trailing_lines() {
    let (_dir, binary) = scripted_binary(
        "i=1\n\
         while [ $i -le 12 ]; do\n\
           printf 'diag line %02d\\n' $i >&2\n\
           i=$((i+1))\n\
         done\n\
         exit 1",
    );
    let engine = FfmpegCliEngine::new().expect("engine");
    let engine = loaded_engine(engine, binary).await;

    let err = engine.execute(&["run".to_string()]).await.unwrap_err();
    assert_matches!(err, EngineError::ExecFailed { detail } => {
        assert_eq!(detail.lines().count(), 8);
        assert!(!detail.contains("diag line 04"));
        assert!(detail.starts_with("diag line 05"));
        assert!(detail.ends_with("diag line 12"));
    });
}

#[cfg(target_os = "linux")]
fn still_running(pid: u32) -> bool {
    // A killed process is gone from /proc or parked as a zombie.
    let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) else {
        return false;
    };
    let state = stat
        .rsplit_once(')')
        .and_then(|(_, rest)| rest.trim_start().chars().next());
    !matches!(state, Some('Z') | None)
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn abandoned_execute_does_not_leave_the_engine_running() {
    // The script records its pid in engine storage, then hangs.
    let (_dir, binary) = scripted_binary("echo $$ > pid\nexec sleep 30");
    let engine = FfmpegCliEngine::new().expect("engine");
    let engine = loaded_engine(engine, binary).await;
    let pid_file = engine.storage_path().join("pid");

    let args = ["run".to_string()];
    let run = engine.execute(&args);
    let timed_out = tokio::time::timeout(Duration::from_millis(300), run).await;
    assert!(timed_out.is_err(), "scripted engine must still be hanging");

    let pid: u32 = std::fs::read_to_string(&pid_file)
        .expect("hanging script recorded its pid")
        .trim()
        .parse()
        .expect("pid file holds a pid");

    // Dropping the timed-out run must take the subprocess down with it.
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while still_running(pid) {
        assert!(
            std::time::Instant::now() < deadline,
            "engine process {pid} survived its abandoned run"
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

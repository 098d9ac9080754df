use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;

/// Errors raised by the transcoding engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to create engine workspace: {0}")]
    Workspace(#[source] std::io::Error),

    #[error("failed to stage engine input '{name}': {source}")]
    StageInput {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read engine output '{name}': {source}")]
    ReadOutput {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to launch '{binary}': {source}")]
    Launch {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("transcoding failed ({status}): {detail}")]
    Failed { status: String, detail: String },
}

/// Diagnostic progress hook, called with a fraction in 0..=1
pub type ProgressFn = Arc<dyn Fn(f64) + Send + Sync>;

/// External media-conversion capability
///
/// Inputs and outputs live in the engine's own namespace: callers stage
/// bytes under a name, run an instruction set referring to those names, and
/// read results back by name.
#[async_trait]
pub trait TranscodingEngine: Send + Sync {
    /// Stage `bytes` as an engine input under `name`
    async fn load_input(&self, name: &str, bytes: &[u8]) -> Result<(), EngineError>;

    /// Execute one transcoding run with the given instruction set
    async fn run(&self, args: &[String], progress: Option<ProgressFn>) -> Result<(), EngineError>;

    /// Read a produced output back as a byte buffer
    async fn read_output(&self, name: &str) -> Result<Vec<u8>, EngineError>;
}

/// FFmpeg-backed transcoding engine
///
/// An isolated scratch directory acts as the engine's virtual filesystem;
/// every staged input and produced output is a file in that directory.
pub struct FfmpegEngine {
    binary: String,
    probe_binary: String,
    workspace: TempDir,
}

impl FfmpegEngine {
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let workspace = tempfile::Builder::new()
            .prefix("transcode-workspace-")
            .tempdir()
            .map_err(EngineError::Workspace)?;

        debug!("🔧 Engine workspace at {}", workspace.path().display());

        Ok(Self {
            binary: config.ffmpeg_path.clone(),
            probe_binary: config.ffprobe_path.clone(),
            workspace,
        })
    }

    /// Check that the ffmpeg binary responds
    pub async fn is_available(&self) -> bool {
        match Command::new(&self.binary)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
        {
            Ok(status) => status.success(),
            Err(_) => false,
        }
    }

    /// Probe the duration of a staged input, for progress fractions
    async fn probe_duration(&self, input: &Path) -> Option<Duration> {
        let output = Command::new(&self.probe_binary)
            .args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(input)
            .output()
            .await
            .ok()?;

        if !output.status.success() {
            debug!("ffprobe failed for {}", input.display());
            return None;
        }

        let data: serde_json::Value = serde_json::from_slice(&output.stdout).ok()?;
        let seconds: f64 = data["format"]["duration"].as_str()?.parse().ok()?;
        if !seconds.is_finite() || seconds < 0.0 {
            return None;
        }
        Some(Duration::from_secs_f64(seconds))
    }
}

#[async_trait]
impl TranscodingEngine for FfmpegEngine {
    async fn load_input(&self, name: &str, bytes: &[u8]) -> Result<(), EngineError> {
        tokio::fs::write(self.workspace.path().join(name), bytes)
            .await
            .map_err(|source| EngineError::StageInput {
                name: name.to_string(),
                source,
            })
    }

    async fn run(&self, args: &[String], progress: Option<ProgressFn>) -> Result<(), EngineError> {
        let total = match input_arg(args) {
            Some(name) => self.probe_duration(&self.workspace.path().join(name)).await,
            None => None,
        };

        debug!("🚀 Running {} {}", self.binary, args.join(" "));

        let mut child = Command::new(&self.binary)
            .current_dir(self.workspace.path())
            .args(["-y", "-nostats", "-progress", "pipe:1"])
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| EngineError::Launch {
                binary: self.binary.clone(),
                source,
            })?;

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let fraction = if line.trim() == "progress=end" {
                    Some(1.0)
                } else {
                    match (parse_out_time_us(&line), total) {
                        (Some(done_us), Some(total)) if total.as_secs_f64() > 0.0 => {
                            Some((done_us as f64 / 1_000_000.0 / total.as_secs_f64()).clamp(0.0, 1.0))
                        }
                        _ => None,
                    }
                };

                if let (Some(fraction), Some(hook)) = (fraction, progress.as_ref()) {
                    hook(fraction);
                }
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| EngineError::Launch {
                binary: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("Transcoding run failed with {}", output.status);
            return Err(EngineError::Failed {
                status: output.status.to_string(),
                detail: stderr_tail(&stderr),
            });
        }

        Ok(())
    }

    async fn read_output(&self, name: &str) -> Result<Vec<u8>, EngineError> {
        tokio::fs::read(self.workspace.path().join(name))
            .await
            .map_err(|source| EngineError::ReadOutput {
                name: name.to_string(),
                source,
            })
    }
}

/// The name following `-i` in an instruction set
fn input_arg(args: &[String]) -> Option<&str> {
    args.iter()
        .position(|arg| arg == "-i")
        .and_then(|index| args.get(index + 1))
        .map(String::as_str)
}

/// Parse an `out_time_us=<micros>` progress line
fn parse_out_time_us(line: &str) -> Option<u64> {
    line.trim().strip_prefix("out_time_us=")?.parse().ok()
}

/// Last few stderr lines, for error detail
fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|line| !line.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(3);
    lines[start..].join("\n")
}

static SHARED_ENGINE: OnceCell<Arc<FfmpegEngine>> = OnceCell::const_new();

/// Process-wide shared engine handle, initialized on first use
///
/// Concurrent callers await the same initialization instead of creating
/// duplicate engines. The configuration of the first caller wins.
pub async fn get_engine(config: &EngineConfig) -> Result<Arc<FfmpegEngine>, EngineError> {
    let engine = SHARED_ENGINE
        .get_or_try_init(|| async {
            info!("🔌 Initializing shared transcoding engine ({})", config.ffmpeg_path);
            FfmpegEngine::new(config).map(Arc::new)
        })
        .await?;
    Ok(Arc::clone(engine))
}

//! FFmpeg execution adapter
//!
//! Every operation is one ffmpeg subprocess. Progress comes from
//! `-progress pipe:1` on stdout, stderr is drained on its own task and kept
//! for error messages, and a raised cancel flag kills the process.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::domain::model::SegmentMode;
use crate::engine::cancel::CancelFlag;
use crate::ports::{ExecError, ExecutePort, SegmentTask, StepProgress, VideoEncoder};

/// Lines of ffmpeg stderr kept in error messages
const STDERR_TAIL_LINES: usize = 12;

/// FFmpeg-based execution adapter
pub struct FfmpegExecAdapter {
    ffmpeg: PathBuf,
    encoders: OnceCell<String>,
}

impl FfmpegExecAdapter {
    /// Create new FFmpeg adapter
    pub fn new(ffmpeg: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            encoders: OnceCell::new(),
        }
    }

    fn program(&self) -> String {
        self.ffmpeg.display().to_string()
    }

    async fn run(
        &self,
        args: &[OsString],
        cancel: Option<&CancelFlag>,
        progress: Option<StepProgress<'_>>,
    ) -> Result<(), ExecError> {
        debug!(
            "Running {} {}",
            self.program(),
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let mut child = Command::new(&self.ffmpeg)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecError::Spawn {
                program: self.program(),
                source,
            })?;

        // Drained concurrently so a full stderr pipe cannot stall ffmpeg
        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let _ = stderr.read_to_end(&mut buf).await;
                String::from_utf8_lossy(&buf).into_owned()
            })
        });
        let stdout = child.stdout.take();

        let outcome = {
            let work = async {
                if let Some(stdout) = stdout {
                    let mut lines = BufReader::new(stdout).lines();
                    while let Some(line) = lines.next_line().await? {
                        if let (Some(report), Some(seconds)) = (progress, parse_progress_time(&line)) {
                            report(seconds);
                        }
                    }
                }
                child.wait().await
            };
            tokio::select! {
                status = work => Some(status),
                _ = wait_for_cancel(cancel) => None,
            }
        };

        let status: ExitStatus = match outcome {
            None => {
                if let Err(e) = child.kill().await {
                    warn!("Could not kill {}: {}", self.program(), e);
                }
                info!("Stopped {} after cancel", self.program());
                return Err(ExecError::Cancelled);
            }
            Some(status) => status?,
        };

        if status.success() {
            return Ok(());
        }
        let stderr = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };
        Err(ExecError::Failed {
            program: self.program(),
            status: status.to_string(),
            stderr: stderr_tail(&stderr, STDERR_TAIL_LINES),
        })
    }

    async fn encoder_list(&self) -> &str {
        self.encoders
            .get_or_init(|| async {
                match Command::new(&self.ffmpeg)
                    .args(["-hide_banner", "-encoders"])
                    .stdin(Stdio::null())
                    .output()
                    .await
                {
                    Ok(output) => String::from_utf8_lossy(&output.stdout).into_owned(),
                    Err(e) => {
                        warn!("Could not list ffmpeg encoders: {}", e);
                        String::new()
                    }
                }
            })
            .await
    }
}

async fn wait_for_cancel(cancel: Option<&CancelFlag>) {
    match cancel {
        Some(flag) => flag.cancelled().await,
        None => std::future::pending().await,
    }
}

#[async_trait]
impl ExecutePort for FfmpegExecAdapter {
    async fn extract_segment(
        &self,
        task: &SegmentTask,
        cancel: &CancelFlag,
        progress: StepProgress<'_>,
    ) -> Result<(), ExecError> {
        if task.segment.mode == SegmentMode::Reencode && task.encoder.is_none() {
            return Err(ExecError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("segment {} is re-encoded but no encoder was chosen", task.index),
            )));
        }
        self.run(&extract_args(task), Some(cancel), Some(progress)).await
    }

    async fn concat(
        &self,
        parts: &[PathBuf],
        destination: &Path,
        faststart: bool,
        cancel: &CancelFlag,
    ) -> Result<(), ExecError> {
        let list = destination.with_extension("concat.txt");
        tokio::fs::write(&list, concat_list(parts)).await?;
        let result = self
            .run(&concat_args(&list, destination, faststart), Some(cancel), None)
            .await;
        if let Err(e) = tokio::fs::remove_file(&list).await {
            debug!("Could not remove {}: {}", list.display(), e);
        }
        result
    }

    async fn copy_metadata(
        &self,
        source: &Path,
        media: &Path,
        destination: &Path,
        cancel: &CancelFlag,
    ) -> Result<(), ExecError> {
        self.run(&metadata_args(source, media, destination), Some(cancel), None)
            .await
    }

    async fn supports_encoder(&self, name: &str) -> bool {
        let available = self
            .encoder_list()
            .await
            .lines()
            .any(|line| line.split_whitespace().nth(1) == Some(name));
        debug!("Encoder {} available: {}", name, available);
        available
    }
}

fn seconds_arg(seconds: f64) -> OsString {
    format!("{:.6}", seconds).into()
}

fn common_args() -> Vec<OsString> {
    ["-hide_banner", "-nostdin", "-y"]
        .into_iter()
        .map(OsString::from)
        .collect()
}

fn progress_args() -> [OsString; 3] {
    ["-progress".into(), "pipe:1".into(), "-nostats".into()]
}

/// Arguments for cutting one segment; only video is ever re-encoded
pub fn extract_args(task: &SegmentTask) -> Vec<OsString> {
    let segment = &task.segment;
    let mut args = common_args();
    args.extend([
        "-ss".into(),
        seconds_arg(segment.source_start),
        "-to".into(),
        seconds_arg(segment.source_end),
        "-i".into(),
        task.source.clone().into_os_string(),
        "-map".into(),
        "0".into(),
        "-c".into(),
        "copy".into(),
    ]);

    if let (SegmentMode::Reencode, Some(encoder)) = (segment.mode, &task.encoder) {
        args.extend(["-c:v".into(), OsString::from(&encoder.name)]);
        args.extend(quality_args(encoder));
        if !encoder.is_hardware() && encoder.threads > 0 {
            args.extend(["-threads".into(), encoder.threads.to_string().into()]);
        }
    }

    args.extend(["-avoid_negative_ts".into(), "make_zero".into()]);
    args.extend(progress_args());
    args.push(task.destination.clone().into_os_string());
    args
}

/// Rate control for `encoder`; each family spells quality differently
fn quality_args(encoder: &VideoEncoder) -> Vec<OsString> {
    let quality = encoder.quality.to_string();
    let args: Vec<String> = match encoder.name.as_str() {
        name if name.ends_with("_nvenc") => {
            vec!["-preset".into(), encoder.preset.clone(), "-cq".into(), quality]
        }
        // Constant quality mode needs the bitrate cap lifted
        "libvpx-vp9" => vec!["-crf".into(), quality, "-b:v".into(), "0".into()],
        // SVT-AV1 presets are numeric, so the x264-style preset is not passed
        "libsvtav1" => vec!["-crf".into(), quality],
        "mpeg2video" | "mpeg4" => {
            let qscale = (encoder.quality / 6).clamp(2, 31);
            vec!["-q:v".into(), qscale.to_string()]
        }
        // HQ profile
        "prores_ks" => vec!["-profile:v".into(), "3".into()],
        _ => vec!["-preset".into(), encoder.preset.clone(), "-crf".into(), quality],
    };
    args.into_iter().map(OsString::from).collect()
}

/// Arguments for joining parts listed in `list` with the concat demuxer
pub fn concat_args(list: &Path, destination: &Path, faststart: bool) -> Vec<OsString> {
    let mut args = common_args();
    args.extend([
        "-f".into(),
        "concat".into(),
        "-safe".into(),
        "0".into(),
        "-i".into(),
        list.as_os_str().to_os_string(),
        "-map".into(),
        "0".into(),
        "-c".into(),
        "copy".into(),
    ]);
    if faststart {
        args.extend(["-movflags".into(), "+faststart".into()]);
    }
    args.extend(progress_args());
    args.push(destination.as_os_str().to_os_string());
    args
}

/// Arguments for remuxing `media` with metadata and chapters taken from `source`
pub fn metadata_args(source: &Path, media: &Path, destination: &Path) -> Vec<OsString> {
    let mut args = common_args();
    args.extend([
        "-i".into(),
        media.as_os_str().to_os_string(),
        "-i".into(),
        source.as_os_str().to_os_string(),
        "-map".into(),
        "0".into(),
        "-map_metadata".into(),
        "1".into(),
        "-map_chapters".into(),
        "1".into(),
        "-c".into(),
        "copy".into(),
        destination.as_os_str().to_os_string(),
    ]);
    args
}

/// Concat demuxer list body with single quotes escaped
pub fn concat_list(parts: &[PathBuf]) -> String {
    parts
        .iter()
        .map(|p| {
            let path = p.to_string_lossy().replace('\\', "/").replace('\'', r"'\''");
            format!("file '{}'\n", path)
        })
        .collect()
}

/// Seconds of output written so far, from one `-progress` line
pub fn parse_progress_time(line: &str) -> Option<f64> {
    let (key, value) = line.trim().split_once('=')?;
    // out_time_ms is in microseconds despite the name
    match key {
        "out_time_us" | "out_time_ms" => value
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|us| *us >= 0)
            .map(|us| us as f64 / 1_000_000.0),
        _ => None,
    }
}

fn stderr_tail(stderr: &str, lines: usize) -> String {
    let all: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}

//! Stage B: preview videos transcoded from streaming manifests.
//!
//! Each video is produced by a blocking [`Transcoder`] call on tokio's
//! blocking pool, fed by a fixed-size [`WorkerPool`]. A failed transcode is
//! logged and counted; it never aborts the pass.

use std::ffi::OsString;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use cloudshelf_core::ArtifactKey;
use cloudshelf_lib::worker_pool::PoolOutput;
use cloudshelf_lib::{CancelToken, WorkerPool};

use crate::events::{ProgressReporter, SyncEvent};
use crate::planner::VideoTask;

/// Default wall-clock limit for one ffmpeg run.
pub const DEFAULT_TRANSCODE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Bytes of ffmpeg's stderr kept for the error message.
const STDERR_TAIL: usize = 4096;

#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    #[error("cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Turns a streaming manifest into a local preview video.
///
/// Implementations block; they are always called from the blocking pool.
/// On success `dest` must hold the finished file, on failure it must not
/// exist.
pub trait Transcoder: Send + Sync {
    /// Check that the tool is usable before any work is scheduled.
    fn validate(&self) -> Result<(), String>;

    fn transcode(
        &self,
        manifest: &str,
        dest: &Path,
        cancel: &CancelToken,
    ) -> Result<(), TranscodeError>;
}

/// [`Transcoder`] backed by an `ffmpeg` executable.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: PathBuf,
    timeout: Duration,
}

impl FfmpegTranscoder {
    /// Use `ffmpeg` from `PATH`.
    pub fn new() -> Self {
        Self::with_program("ffmpeg")
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: DEFAULT_TRANSCODE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    /// Arguments for one encode: 640x480 video, audio copied, mp4 forced
    /// so the `.part` output name does not confuse format detection.
    fn args(manifest: &str, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "-nostdin", "-y", "-loglevel", "error", "-i", manifest, "-vf", "scale=640:480",
            "-preset", "fast", "-c:a", "copy", "-f", "mp4",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push(output.as_os_str().to_owned());
        args
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Hidden sibling of `dest` that ffmpeg writes into.
/// Drain `pipe` on its own thread so the child never blocks on a full
/// stderr pipe. The thread returns the last [`STDERR_TAIL`] bytes.
fn spawn_stderr_reader(pipe: impl Read + Send + 'static) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut tail: Vec<u8> = Vec::new();
        let mut reader = BufReader::new(pipe);
        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    tail.extend_from_slice(&line);
                    if tail.len() > STDERR_TAIL {
                        tail.drain(..tail.len() - STDERR_TAIL);
                    }
                }
            }
        }
        String::from_utf8_lossy(&tail).into_owned()
    })
}

fn part_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!(".{name}.part"))
}

impl Transcoder for FfmpegTranscoder {
    fn validate(&self) -> Result<(), String> {
        let status = Command::new(&self.program)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| format!("{}: {e}", self.program_name()))?;
        if status.success() {
            Ok(())
        } else {
            Err(format!("{} -version exited with {status}", self.program_name()))
        }
    }

    fn transcode(
        &self,
        manifest: &str,
        dest: &Path,
        cancel: &CancelToken,
    ) -> Result<(), TranscodeError> {
        let part = part_path(dest);
        let mut child = Command::new(&self.program)
            .args(Self::args(manifest, &part))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| TranscodeError::Spawn {
                program: self.program_name(),
                source,
            })?;

        let stderr_reader = child.stderr.take().map(spawn_stderr_reader);

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            let interrupted = if cancel.is_cancelled() {
                Some(TranscodeError::Cancelled)
            } else if started.elapsed() > self.timeout {
                Some(TranscodeError::TimedOut(self.timeout))
            } else {
                None
            };
            if let Some(err) = interrupted {
                let _ = child.kill();
                let _ = child.wait();
                // The reader ends on its own once the pipe closes.
                drop(stderr_reader);
                let _ = std::fs::remove_file(&part);
                return Err(err);
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        let stderr = stderr_reader
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        if !status.success() {
            let _ = std::fs::remove_file(&part);
            return Err(TranscodeError::Exit {
                program: self.program_name(),
                status: status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        if let Err(e) = std::fs::rename(&part, dest) {
            let _ = std::fs::remove_file(&part);
            return Err(e.into());
        }
        Ok(())
    }
}

/// Outcome of the transcode stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranscodeReport {
    pub succeeded: usize,
    pub failed: usize,
}

/// Transcode every task with at most `workers` encodes running.
///
/// Tasks whose destination already exists are skipped without counting.
pub(crate) async fn execute(
    tasks: Vec<VideoTask>,
    transcoder: Arc<dyn Transcoder>,
    workers: usize,
    cancel: &CancelToken,
    progress: &mut ProgressReporter,
    span: (u8, u8),
) -> TranscodeReport {
    let tasks: Vec<VideoTask> = tasks.into_iter().filter(|t| !t.dest.exists()).collect();
    let total = tasks.len();
    let mut report = TranscodeReport::default();
    if total == 0 {
        progress.progress(span.1);
        return report;
    }

    log::info!("Transcoding {total} videos with {workers} workers");
    progress.emit(SyncEvent::TranscodeStarted { total });

    let worker_cancel = cancel.clone();
    let mut pool = WorkerPool::start(workers, tasks, cancel.clone(), move |task: VideoTask| {
        let transcoder = transcoder.clone();
        let cancel = worker_cancel.clone();
        async move {
            let key = task.key.clone();
            let result = tokio::task::spawn_blocking(move || {
                transcoder.transcode(&task.manifest, &task.dest, &cancel)
            })
            .await;
            (key, result)
        }
    });

    let mut done = 0usize;
    while let Some(output) = pool.recv().await {
        done += 1;
        match output {
            PoolOutput::Done((key, Ok(Ok(())))) => {
                log::debug!("{key}: video ready");
                report.succeeded += 1;
            }
            PoolOutput::Done((key, Ok(Err(TranscodeError::Cancelled)))) => {
                log::debug!("{key}: transcode cancelled");
            }
            PoolOutput::Done((key, Ok(Err(e)))) => {
                record_failure(&mut report, progress, key, e.to_string());
            }
            PoolOutput::Done((key, Err(join_err))) => {
                record_failure(&mut report, progress, key, join_err.to_string());
            }
            PoolOutput::TimedOut => {
                report.failed += 1;
            }
        }
        progress.span(span.0, span.1, done, total);
    }

    log::info!(
        "Transcoding finished: {} succeeded, {} failed",
        report.succeeded,
        report.failed
    );
    report
}

fn record_failure(
    report: &mut TranscodeReport,
    progress: &ProgressReporter,
    key: ArtifactKey,
    reason: String,
) {
    log::error!("{key}: transcode failed: {reason}");
    report.failed += 1;
    progress.emit(SyncEvent::TranscodeFailed { key, reason });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_path_is_hidden_sibling() {
        assert_eq!(
            part_path(Path::new("/media/videos/HALO.mp4")),
            PathBuf::from("/media/videos/.HALO.mp4.part")
        );
    }

    #[test]
    fn test_ffmpeg_args() {
        let args = FfmpegTranscoder::args("https://v/manifest.mpd", Path::new("/v/.HALO.mp4.part"));
        let args: Vec<String> = args
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args.join(" "),
            "-nostdin -y -loglevel error -i https://v/manifest.mpd -vf scale=640:480 \
             -preset fast -c:a copy -f mp4 /v/.HALO.mp4.part"
        );
    }

    #[test]
    fn test_missing_program_fails_validation() {
        let t = FfmpegTranscoder::with_program("/nonexistent/cloudshelf-ffmpeg");
        assert!(t.validate().is_err());
    }

    /// Write an executable shell script standing in for ffmpeg.
    #[cfg(unix)]
    fn fake_ffmpeg(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("fake-ffmpeg");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_noisy_failure_reports_exit_not_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_ffmpeg(
            dir.path(),
            "head -c 300000 /dev/zero | tr '\\0' 'x' >&2\necho 'Invalid data found' >&2\nexit 1",
        );
        let dest = dir.path().join("HALO.mp4");
        let t = FfmpegTranscoder::with_program(program).with_timeout(Duration::from_secs(20));

        let started = Instant::now();
        let err = t
            .transcode("https://v/manifest.mpd", &dest, &CancelToken::new())
            .unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(10));
        match err {
            TranscodeError::Exit { stderr, .. } => {
                assert!(stderr.ends_with("Invalid data found"));
                assert!(stderr.len() <= STDERR_TAIL);
            }
            other => panic!("expected exit error, got {other:?}"),
        }
        assert!(!dest.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_run_renames_part_file() {
        let dir = tempfile::tempdir().unwrap();
        // The output path is the last argument.
        let program = fake_ffmpeg(
            dir.path(),
            "for arg; do out=$arg; done\nhead -c 100000 /dev/zero >&2\nprintf video > \"$out\"",
        );
        let dest = dir.path().join("HALO.mp4");
        let t = FfmpegTranscoder::with_program(program);

        t.transcode("https://v/manifest.mpd", &dest, &CancelToken::new())
            .unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "video");
        assert!(!part_path(&dest).exists());
    }

    #[test]
    fn test_missing_program_fails_transcode_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("HALO.mp4");
        let t = FfmpegTranscoder::with_program("/nonexistent/cloudshelf-ffmpeg");
        let err = t
            .transcode("https://v/manifest.mpd", &dest, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, TranscodeError::Spawn { .. }));
        assert!(!dest.exists());
    }
}

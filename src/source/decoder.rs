//! ffmpeg subprocess decoder
//!
//! Decodes the source file to 8-bit grayscale rawvideo on stdout, one
//! frame every `width * height` bytes. Resizing happens later in the
//! pipeline so the decode stage stays a plain byte pump.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tracing::{debug, warn};

use crate::config::StreamConfig;
use crate::error::{Result, SourceError};

use super::probe::{probe, SourceInfo};

/// A decoded grayscale video source
#[derive(Debug)]
pub struct VideoSource {
    child: Child,
    stdout: BufReader<ChildStdout>,
    frame_len: usize,
    info: SourceInfo,
    frames_read: u64,
}

impl VideoSource {
    /// Probe `path` and spawn the decoder
    pub async fn open(config: &StreamConfig, path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(SourceError::FileNotFound(path.display().to_string()).into());
        }

        let ffprobe = resolve_binary(config.ffprobe_path.as_deref(), "ffprobe");
        let info = probe(&ffprobe, path).await?;

        let ffmpeg = resolve_binary(config.ffmpeg_path.as_deref(), "ffmpeg");
        let args = build_args(path);
        debug!(ffmpeg = %ffmpeg.display(), ?args, "Spawning decoder");

        let mut child = Command::new(&ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SourceError::DecoderExited("no stdout".into()))?;

        // Drain stderr so ffmpeg never blocks on it; surface its complaints
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let reader = BufReader::new(stderr);
                let mut lines = tokio::io::AsyncBufReadExt::lines(reader);
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!("ffmpeg: {}", line);
                }
            });
        }

        Ok(Self {
            child,
            stdout: BufReader::new(stdout),
            frame_len: info.width as usize * info.height as usize,
            info,
            frames_read: 0,
        })
    }

    /// Source stream properties
    pub fn info(&self) -> SourceInfo {
        self.info
    }

    /// Frames read so far
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Read the next grayscale frame.
    ///
    /// Returns `None` at end of stream. A stream that ends mid-frame is an
    /// error.
    pub async fn next_frame(&mut self) -> Result<Option<Bytes>> {
        let mut buf = vec![0u8; self.frame_len];
        let mut filled = 0;

        while filled < self.frame_len {
            let n = self.stdout.read(&mut buf[filled..]).await?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(SourceError::ShortFrame {
                    expected: self.frame_len,
                    got: filled,
                }
                .into());
            }
            filled += n;
        }

        self.frames_read += 1;
        Ok(Some(Bytes::from(buf)))
    }

    /// Wait for the decoder to exit, reporting a non-zero status
    pub async fn finish(mut self) -> Result<()> {
        let status = self.child.wait().await?;
        if !status.success() {
            return Err(SourceError::DecoderExited(status.to_string()).into());
        }
        Ok(())
    }
}

/// ffmpeg arguments for grayscale rawvideo output on stdout
fn build_args(path: &Path) -> Vec<String> {
    let mut args: Vec<String> = ["-hide_banner", "-loglevel", "warning"]
        .iter()
        .map(ToString::to_string)
        .collect();

    args.push("-i".to_string());
    args.push(path.display().to_string());

    args.extend(
        ["-f", "rawvideo", "-pix_fmt", "gray", "-an", "pipe:1"]
            .iter()
            .map(ToString::to_string),
    );

    args
}

/// Resolve a binary path: explicit override, then PATH lookup, then bare name
fn resolve_binary(override_path: Option<&Path>, name: &str) -> PathBuf {
    match override_path {
        Some(p) => p.to_path_buf(),
        None => which::which(name).unwrap_or_else(|_| PathBuf::from(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args() {
        let args = build_args(Path::new("clip.mp4"));

        assert!(args.contains(&"-i".to_string()));
        assert!(args.contains(&"clip.mp4".to_string()));
        assert!(args.contains(&"rawvideo".to_string()));
        assert!(args.contains(&"gray".to_string()));
        assert!(args.contains(&"pipe:1".to_string()));
        // Audio is dropped
        assert!(args.contains(&"-an".to_string()));
    }

    #[test]
    fn test_build_args_order() {
        let args = build_args(Path::new("clip.mp4"));

        // Input must come before output options
        let input_idx = args.iter().position(|a| a == "-i").unwrap();
        let format_idx = args.iter().position(|a| a == "-f").unwrap();
        assert!(input_idx < format_idx);
    }

    #[test]
    fn test_resolve_binary_override() {
        let path = resolve_binary(Some(Path::new("/opt/ffmpeg/bin/ffmpeg")), "ffmpeg");
        assert_eq!(path, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let config = StreamConfig::default();
        let err = VideoSource::open(&config, Path::new("/no/such/clip.mp4"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("not found"));
    }

    #[cfg(unix)]
    fn source_over(byte_count: usize, frame_len: usize) -> VideoSource {
        let mut child = Command::new("head")
            .args(["-c", &byte_count.to_string(), "/dev/zero"])
            .stdout(Stdio::piped())
            .spawn()
            .unwrap();
        let stdout = child.stdout.take().unwrap();

        VideoSource {
            child,
            stdout: BufReader::new(stdout),
            frame_len,
            info: SourceInfo {
                width: 2,
                height: 2,
                fps: 30.0,
            },
            frames_read: 0,
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_frames_read_counts_full_frames() {
        let mut source = source_over(12, 4);

        while source.next_frame().await.unwrap().is_some() {}

        assert_eq!(source.frames_read(), 3);
        source.finish().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_short_frame_is_an_error() {
        let mut source = source_over(10, 4);

        assert!(source.next_frame().await.unwrap().is_some());
        assert!(source.next_frame().await.unwrap().is_some());
        let err = source.next_frame().await.unwrap_err();

        assert!(err.to_string().contains("Short frame"));
        assert_eq!(source.frames_read(), 2);
    }
}

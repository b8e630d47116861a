//! Source probing via ffprobe
//!
//! We need the source dimensions (to size raw frame reads) and the average
//! frame rate (to pick the frame step) before decoding starts.

use std::path::Path;
use std::process::Stdio;

use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, SourceError};

/// Fallback when the container reports no usable frame rate
pub const DEFAULT_SOURCE_FPS: f64 = 30.0;

/// Properties of the source video stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Average frame rate
    pub fps: f64,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
}

/// Probe the first video stream of `path`
pub async fn probe(ffprobe: &Path, path: &Path) -> Result<SourceInfo> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,avg_frame_rate,r_frame_rate",
            "-of",
            "json",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SourceError::ProbeFailed(stderr.trim().to_string()).into());
    }

    let json = String::from_utf8_lossy(&output.stdout);
    let info = parse_probe_json(&json)?;
    debug!(
        width = info.width,
        height = info.height,
        fps = info.fps,
        "Probed source"
    );
    Ok(info)
}

fn parse_probe_json(json: &str) -> Result<SourceInfo> {
    let parsed: ProbeOutput = serde_json::from_str(json)
        .map_err(|e| SourceError::ProbeFailed(e.to_string()))?;

    let stream = parsed
        .streams
        .into_iter()
        .next()
        .ok_or(SourceError::NoVideoStream)?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(SourceError::ProbeFailed("missing dimensions".into()).into()),
    };

    let fps = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_rate)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_rate))
        .unwrap_or(DEFAULT_SOURCE_FPS);

    Ok(SourceInfo { width, height, fps })
}

/// Parse an ffprobe rate fraction ("30000/1001", "25/1", "25")
fn parse_rate(s: &str) -> Option<f64> {
    let rate = match s.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => s.trim().parse().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rate_fraction() {
        assert_eq!(parse_rate("25/1"), Some(25.0));
        let ntsc = parse_rate("30000/1001").unwrap();
        assert!((ntsc - 29.97).abs() < 0.01);
    }

    #[test]
    fn test_parse_rate_plain() {
        assert_eq!(parse_rate("24"), Some(24.0));
    }

    #[test]
    fn test_parse_rate_invalid() {
        assert_eq!(parse_rate("0/0"), None);
        assert_eq!(parse_rate("N/A"), None);
        assert_eq!(parse_rate(""), None);
    }

    #[test]
    fn test_parse_probe_json() {
        let json = r#"{
            "streams": [
                {
                    "width": 1920,
                    "height": 1080,
                    "r_frame_rate": "30000/1001",
                    "avg_frame_rate": "30000/1001"
                }
            ]
        }"#;

        let info = parse_probe_json(json).unwrap();
        assert_eq!(info.width, 1920);
        assert_eq!(info.height, 1080);
        assert!((info.fps - 29.97).abs() < 0.01);
    }

    #[test]
    fn test_parse_probe_json_fps_fallback() {
        // Some containers report "0/0" for avg_frame_rate
        let json = r#"{
            "streams": [
                {"width": 640, "height": 480, "avg_frame_rate": "0/0", "r_frame_rate": "0/0"}
            ]
        }"#;

        let info = parse_probe_json(json).unwrap();
        assert_eq!(info.fps, DEFAULT_SOURCE_FPS);
    }

    #[test]
    fn test_parse_probe_json_no_streams() {
        let err = parse_probe_json(r#"{"streams": []}"#).unwrap_err();
        assert!(err.to_string().contains("No video stream"));
    }

    #[test]
    fn test_parse_probe_json_missing_dimensions() {
        let json = r#"{"streams": [{"avg_frame_rate": "25/1"}]}"#;
        assert!(parse_probe_json(json).is_err());
    }
}

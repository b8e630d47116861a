//! Streaming statistics

use std::time::{Duration, Instant};

/// Counters for a streaming session
#[derive(Debug, Clone)]
pub struct StreamStats {
    /// Time streaming started
    pub started_at: Instant,
    /// Frames sent to the device
    pub frames_sent: u64,
    /// Source frames skipped by decimation
    pub frames_skipped: u64,
    /// Payload bytes sent (before chunking overhead)
    pub bytes_sent: u64,
}

impl StreamStats {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            frames_sent: 0,
            frames_skipped: 0,
            bytes_sent: 0,
        }
    }

    /// Record one transmitted frame
    pub fn on_frame(&mut self, payload_bytes: usize) {
        self.frames_sent += 1;
        self.bytes_sent += payload_bytes as u64;
    }

    /// Time since streaming started
    pub fn duration(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Achieved frame rate
    pub fn fps(&self) -> f64 {
        let secs = self.duration().as_secs_f64();
        if secs > 0.0 {
            self.frames_sent as f64 / secs
        } else {
            0.0
        }
    }

    /// Achieved bitrate in bits per second
    pub fn bitrate(&self) -> u64 {
        let secs = self.duration().as_secs();
        if secs > 0 {
            (self.bytes_sent * 8) / secs
        } else {
            0
        }
    }

    /// A point-in-time copy for progress reporting
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            frames_sent: self.frames_sent,
            frames_skipped: self.frames_skipped,
            bytes_sent: self.bytes_sent,
            elapsed: self.duration(),
            fps: self.fps(),
            bitrate: self.bitrate(),
        }
    }
}

impl Default for StreamStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress report emitted while streaming
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    pub frames_sent: u64,
    pub frames_skipped: u64,
    pub bytes_sent: u64,
    pub elapsed: Duration,
    pub fps: f64,
    pub bitrate: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = StreamStats::new();

        assert_eq!(stats.frames_sent, 0);
        assert_eq!(stats.frames_skipped, 0);
        assert_eq!(stats.bytes_sent, 0);
    }

    #[test]
    fn test_on_frame() {
        let mut stats = StreamStats::new();
        stats.on_frame(2579);
        stats.on_frame(2579);

        assert_eq!(stats.frames_sent, 2);
        assert_eq!(stats.bytes_sent, 5158);
    }

    #[test]
    fn test_fps_zero_duration() {
        let stats = StreamStats::new();

        // Must not divide by zero
        let fps = stats.fps();
        assert!(fps >= 0.0);
    }

    #[test]
    fn test_bitrate_zero_duration() {
        let stats = StreamStats::new();

        assert_eq!(stats.bitrate(), 0);
    }

    #[test]
    fn test_snapshot_copies_counters() {
        let mut stats = StreamStats::new();
        stats.on_frame(100);
        stats.frames_skipped = 3;

        let snap = stats.snapshot();
        assert_eq!(snap.frames_sent, 1);
        assert_eq!(snap.frames_skipped, 3);
        assert_eq!(snap.bytes_sent, 100);
    }
}

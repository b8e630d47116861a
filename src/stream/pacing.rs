//! Frame-rate pacing
//!
//! Two mechanisms keep the stream at the target rate: the producer skips
//! source frames down to the nearest achievable rate ([`frame_step`]), and
//! the consumer ticks an interval timer before each send ([`FramePacer`]).

use std::time::Duration;

use tokio::time::{interval, Interval, MissedTickBehavior};

/// Decimation factor: forward every `step`-th source frame
pub fn frame_step(source_fps: f64, target_fps: u32) -> u64 {
    if source_fps <= 0.0 || target_fps == 0 {
        return 1;
    }
    ((source_fps / target_fps as f64).round() as u64).max(1)
}

/// Frame rate actually produced after decimation
pub fn effective_fps(source_fps: f64, step: u64) -> f64 {
    if step == 0 {
        return source_fps;
    }
    source_fps / step as f64
}

/// Interval-based send pacer
pub struct FramePacer {
    interval: Interval,
}

impl FramePacer {
    /// Create a pacer ticking at `fps` frames per second
    pub fn new(fps: f64) -> Self {
        let period = if fps > 0.0 {
            Duration::from_secs_f64(1.0 / fps)
        } else {
            Duration::from_millis(1)
        };
        let mut interval = interval(period);
        // A slow BLE link must not cause a burst of catch-up sends
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    /// Wait until the next frame slot
    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

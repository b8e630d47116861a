//! Video streamer
//!
//! Orchestrates the pipeline: connect to the device, install and start the
//! receiver app, then run a bounded producer/consumer pair: the producer
//! decodes and decimates source frames, the consumer quantizes them and
//! sends sprite blocks at the paced rate.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use bytes::Bytes;
use image::imageops::{self, FilterType};
use image::GrayImage;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::StreamConfig;
use crate::device::FrameDevice;
use crate::error::{CodecError, Result};
use crate::protocol::constants::SPRITE_BLOCK_MSG;
use crate::protocol::SpriteBlock;
use crate::source::{SourceInfo, VideoSource};
use crate::sprite::{Palette, Sprite};

use super::pacing::{effective_fps, frame_step, FramePacer};
use super::stats::{ProgressSnapshot, StreamStats};

/// Extra headroom for the receiver app to boot
const APP_START_WAIT: Duration = Duration::from_secs(10);

/// Interval between progress reports
const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Events from the streamer
#[derive(Debug)]
pub enum StreamEvent {
    /// Connected to the device
    Connected,

    /// Receiver app uploaded and running
    AppReady,

    /// Streaming started
    Streaming {
        /// Source frame rate
        source_fps: f64,
        /// Decimation factor
        step: u64,
        /// Rate actually sent
        effective_fps: f64,
    },

    /// Periodic progress report
    Progress(ProgressSnapshot),

    /// Stream completed
    Finished(ProgressSnapshot),
}

/// Video streamer
///
/// Streams a local video file to a Frame device as 2-bit grayscale sprite
/// blocks.
///
/// # Example
/// ```no_run
/// use framecast::{StreamConfig, VideoStreamer};
///
/// # async fn example() -> framecast::Result<()> {
/// let config = StreamConfig::default();
/// let (mut streamer, mut events) = VideoStreamer::new("clip.mp4", config);
///
/// tokio::spawn(async move {
///     while let Some(event) = events.recv().await {
///         println!("Event: {:?}", event);
///     }
/// });
///
/// streamer.run().await?;
/// # Ok(())
/// # }
/// ```
pub struct VideoStreamer {
    video_path: PathBuf,
    config: StreamConfig,
    event_tx: mpsc::Sender<StreamEvent>,
}

impl VideoStreamer {
    /// Create a new streamer.
    ///
    /// Returns the streamer and a receiver for events.
    pub fn new(
        video_path: impl Into<PathBuf>,
        config: StreamConfig,
    ) -> (Self, mpsc::Receiver<StreamEvent>) {
        let (tx, rx) = mpsc::channel(256);

        let streamer = Self {
            video_path: video_path.into(),
            config,
            event_tx: tx,
        };

        (streamer, rx)
    }

    /// Stream the whole file
    pub async fn run(&mut self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Stream until the file ends or `shutdown` resolves.
    ///
    /// The device is stopped and disconnected cleanly in both cases.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let mut device = FrameDevice::connect(&self.config).await?;
        let _ = self.event_tx.send(StreamEvent::Connected).await;

        let result = tokio::select! {
            result = self.stream_to(&mut device) => result,
            _ = shutdown => {
                info!("Shutdown signal received");
                Ok(())
            }
        };

        // Best-effort teardown: stop the app and clear device state
        if device.is_connected().await {
            let _ = device.send_break_signal().await;
            let _ = device.send_reset_signal().await;
            info!("Disconnecting");
            let _ = device.disconnect().await;
        }

        result
    }

    async fn stream_to(&mut self, device: &mut FrameDevice) -> Result<()> {
        // A leftover app from an earlier run would swallow our REPL commands
        device.send_break_signal().await?;
        tokio::time::sleep(Duration::from_millis(100)).await;

        if self.config.upload_app {
            device.upload_sprite_player().await?;
        }
        device.start_sprite_player(APP_START_WAIT).await?;
        let _ = self.event_tx.send(StreamEvent::AppReady).await;

        let source = VideoSource::open(&self.config, &self.video_path).await?;
        let info = source.info();

        let step = frame_step(info.fps, self.config.fps_limit);
        let target = effective_fps(info.fps, step).min(self.config.fps_limit as f64);
        info!(
            source_fps = info.fps,
            step,
            target_fps = target,
            "Source opened"
        );
        let _ = self
            .event_tx
            .send(StreamEvent::Streaming {
                source_fps: info.fps,
                step,
                effective_fps: target,
            })
            .await;

        let (frame_tx, frame_rx) = mpsc::channel(self.config.queue_depth);
        let producer = tokio::spawn(produce(source, frame_tx, step));

        let mut stats = self.send_frames(device, info, target, frame_rx).await?;

        stats.frames_skipped = producer
            .await
            .map_err(|e| std::io::Error::other(e.to_string()))??;

        let snapshot = stats.snapshot();
        info!(
            frames = snapshot.frames_sent,
            skipped = snapshot.frames_skipped,
            fps = snapshot.fps,
            "Stream finished"
        );
        let _ = self.event_tx.send(StreamEvent::Finished(snapshot)).await;

        Ok(())
    }

    /// Consumer loop: quantize, pack and send each frame at the paced rate
    async fn send_frames(
        &self,
        device: &FrameDevice,
        info: SourceInfo,
        target_fps: f64,
        mut frames: mpsc::Receiver<Bytes>,
    ) -> Result<StreamStats> {
        let palette = Palette::gray4();
        let mut pacer = FramePacer::new(target_fps);
        let mut stats = StreamStats::new();
        let mut last_report = Instant::now();

        while let Some(raw) = frames.recv().await {
            pacer.tick().await;

            let gray = GrayImage::from_raw(info.width, info.height, raw.to_vec()).ok_or(
                CodecError::FrameSizeMismatch {
                    expected: info.width as usize * info.height as usize,
                    got: raw.len(),
                },
            )?;
            let resized = imageops::resize(
                &gray,
                self.config.width as u32,
                self.config.height as u32,
                FilterType::Nearest,
            );
            let sprite = Sprite::from_gray(&resized, &palette)?;
            let block = SpriteBlock::new(
                sprite,
                Some(self.config.effective_line_height()),
                self.config.progressive_render,
            );

            device
                .send_message(SPRITE_BLOCK_MSG, &block.header())
                .await?;
            for line in block.lines()? {
                device.send_message(SPRITE_BLOCK_MSG, &line.pack()).await?;
            }

            stats.on_frame(block.payload_len()?);

            if last_report.elapsed() >= PROGRESS_INTERVAL {
                last_report = Instant::now();
                let snapshot = stats.snapshot();
                debug!(
                    frames = snapshot.frames_sent,
                    fps = snapshot.fps,
                    kbps = snapshot.bitrate / 1000,
                    "Streaming"
                );
                let _ = self.event_tx.send(StreamEvent::Progress(snapshot)).await;
            }
        }

        Ok(stats)
    }
}

/// Producer: decode frames, forward every `step`-th one.
///
/// Returns the number of frames skipped by decimation. Backpressure comes
/// from the bounded channel; a dropped receiver ends the task early.
async fn produce(mut source: VideoSource, tx: mpsc::Sender<Bytes>, step: u64) -> Result<u64> {
    let mut index = 0u64;
    let mut skipped = 0u64;

    while let Some(frame) = source.next_frame().await? {
        if index % step == 0 {
            if tx.send(frame).await.is_err() {
                debug!("Frame receiver dropped; stopping decode");
                return Ok(skipped);
            }
        } else {
            skipped += 1;
        }
        index += 1;
    }

    debug!(decoded = source.frames_read(), skipped, "Source drained");
    source.finish().await?;
    Ok(skipped)
}

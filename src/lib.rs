//! framecast: stream video to Brilliant Labs Frame glasses over BLE
//!
//! Frames are decoded by an ffmpeg subprocess, resized and quantized to a
//! fixed 4-level grayscale palette (2 bits per pixel), packed into
//! ImageSpriteBlock messages and written over the Frame's BLE service. A
//! small Lua app, uploaded at startup, renders the blocks on the display.
//!
//! ```no_run
//! use framecast::{StreamConfig, VideoStreamer};
//!
//! # async fn example() -> framecast::Result<()> {
//! let config = StreamConfig::default().fps_limit(14);
//! let (mut streamer, _events) = VideoStreamer::new("clip.mp4", config);
//! streamer.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod protocol;
pub mod source;
pub mod sprite;
pub mod stream;

pub use config::StreamConfig;
pub use error::{Error, Result};
pub use stream::{StreamEvent, VideoStreamer};

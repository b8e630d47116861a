//! Streaming pipeline
//!
//! ```text
//!  VideoSource ──► bounded channel ──► quantize ──► SpriteBlock ──► FrameDevice
//!  (ffmpeg)        (queue_depth)       (2bpp)       (header+lines)   (BLE)
//!        │                                │
//!   frame_step skip                  FramePacer tick
//! ```

pub mod pacing;
pub mod stats;
pub mod streamer;

pub use pacing::{effective_fps, frame_step, FramePacer};
pub use stats::{ProgressSnapshot, StreamStats};
pub use streamer::{StreamEvent, VideoStreamer};

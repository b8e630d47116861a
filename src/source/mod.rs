//! Video input
//!
//! Decoding is delegated to an ffmpeg subprocess (grayscale rawvideo over
//! a pipe); ffprobe supplies the stream geometry and frame rate up front.

pub mod decoder;
pub mod probe;

pub use decoder::VideoSource;
pub use probe::SourceInfo;

//! Error types for framecast
//!
//! Errors are grouped by pipeline stage: video source (ffmpeg/ffprobe),
//! sprite codec, and the BLE device. Failures propagate to the caller;
//! there is no retry layer.

use std::fmt;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(std::io::Error),
    /// BLE stack error
    Ble(btleplug::Error),
    /// Video source error
    Source(SourceError),
    /// Sprite/wire codec error
    Codec(CodecError),
    /// Frame device error
    Device(DeviceError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Ble(e) => write!(f, "BLE error: {}", e),
            Error::Source(e) => write!(f, "Source error: {}", e),
            Error::Codec(e) => write!(f, "Codec error: {}", e),
            Error::Device(e) => write!(f, "Device error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Ble(e) => Some(e),
            Error::Source(e) => Some(e),
            Error::Codec(e) => Some(e),
            Error::Device(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<btleplug::Error> for Error {
    fn from(e: btleplug::Error) -> Self {
        Error::Ble(e)
    }
}

impl From<SourceError> for Error {
    fn from(e: SourceError) -> Self {
        Error::Source(e)
    }
}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Error::Codec(e)
    }
}

impl From<DeviceError> for Error {
    fn from(e: DeviceError) -> Self {
        Error::Device(e)
    }
}

/// Errors from the video source (ffmpeg/ffprobe subprocesses)
#[derive(Debug)]
pub enum SourceError {
    /// Video file not found
    FileNotFound(String),
    /// ffprobe produced unusable output
    ProbeFailed(String),
    /// The source has no video stream
    NoVideoStream,
    /// ffmpeg exited with a non-zero status
    DecoderExited(String),
    /// Stream ended mid-frame
    ShortFrame { expected: usize, got: usize },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::FileNotFound(path) => write!(f, "Video file not found: {}", path),
            SourceError::ProbeFailed(msg) => write!(f, "ffprobe failed: {}", msg),
            SourceError::NoVideoStream => write!(f, "No video stream in source"),
            SourceError::DecoderExited(status) => {
                write!(f, "ffmpeg exited with status: {}", status)
            }
            SourceError::ShortFrame { expected, got } => {
                write!(f, "Short frame: expected {} bytes, got {}", expected, got)
            }
        }
    }
}

impl std::error::Error for SourceError {}

/// Errors from the sprite and message codecs
#[derive(Debug)]
pub enum CodecError {
    /// Message payload exceeds the u16 length field
    PayloadTooLarge(usize),
    /// Chunk capacity too small to carry any data
    MaxPayloadTooSmall(usize),
    /// Sprite has zero width or height
    EmptySprite,
    /// Palette size is not representable (must be 2..=16 colors)
    BadPaletteSize(usize),
    /// Sprite line height must be non-zero
    BadLineHeight,
    /// Raw frame length does not match the declared dimensions
    FrameSizeMismatch { expected: usize, got: usize },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::PayloadTooLarge(len) => {
                write!(f, "Message payload too large: {} bytes", len)
            }
            CodecError::MaxPayloadTooSmall(max) => {
                write!(f, "Max BLE payload too small: {} bytes", max)
            }
            CodecError::EmptySprite => write!(f, "Sprite has zero width or height"),
            CodecError::BadPaletteSize(n) => write!(f, "Unsupported palette size: {}", n),
            CodecError::BadLineHeight => write!(f, "Sprite line height must be non-zero"),
            CodecError::FrameSizeMismatch { expected, got } => {
                write!(f, "Frame size mismatch: expected {} bytes, got {}", expected, got)
            }
        }
    }
}

impl std::error::Error for CodecError {}

/// Errors from the BLE transport and device conversation
#[derive(Debug)]
pub enum DeviceError {
    /// No Bluetooth adapter available
    NoAdapter,
    /// Device not found within the scan timeout
    NotFound(String),
    /// Connection attempt timed out
    ConnectTimeout,
    /// Frame service missing on the connected peripheral
    ServiceMissing,
    /// Expected characteristic missing
    CharacteristicMissing(&'static str),
    /// No reply from the device within the response timeout
    ResponseTimeout(String),
    /// Lua command too long for a single BLE write
    CommandTooLong(usize),
    /// Device disconnected
    Disconnected,
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::NoAdapter => write!(f, "No Bluetooth adapter available"),
            DeviceError::NotFound(name) => {
                write!(f, "Device not found: {}", name)
            }
            DeviceError::ConnectTimeout => write!(f, "Connection timed out"),
            DeviceError::ServiceMissing => write!(f, "Frame service not found on device"),
            DeviceError::CharacteristicMissing(which) => {
                write!(f, "Characteristic missing: {}", which)
            }
            DeviceError::ResponseTimeout(waiting_for) => {
                write!(f, "No response from device (waiting for {:?})", waiting_for)
            }
            DeviceError::CommandTooLong(len) => {
                write!(f, "Lua command too long for one write: {} bytes", len)
            }
            DeviceError::Disconnected => write!(f, "Device disconnected"),
        }
    }
}

impl std::error::Error for DeviceError {}

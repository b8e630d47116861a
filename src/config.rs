//! Streamer configuration

use std::path::PathBuf;
use std::time::Duration;

use crate::protocol::constants::*;

/// Streamer configuration options
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Target frame width on the display
    pub width: u16,

    /// Target frame height on the display
    pub height: u16,

    /// Target frame rate (frames per second)
    pub fps_limit: u32,

    /// Depth of the decode→send channel (frames buffered ahead)
    pub queue_depth: usize,

    /// Maximum bytes per BLE write (including the data marker)
    pub max_payload: usize,

    /// Advertised device name prefix to match during scan
    pub device_name: String,

    /// Sprite line height per block message (None = full frame height)
    pub line_height: Option<u16>,

    /// Render each sprite line as it arrives instead of per-frame
    pub progressive_render: bool,

    /// Upload the receiver app before streaming
    pub upload_app: bool,

    /// BLE scan timeout
    pub scan_timeout: Duration,

    /// BLE connect timeout
    pub connect_timeout: Duration,

    /// Timeout waiting for a printed reply from the device
    pub response_timeout: Duration,

    /// ffmpeg binary (None = resolve from PATH)
    pub ffmpeg_path: Option<PathBuf>,

    /// ffprobe binary (None = resolve from PATH)
    pub ffprobe_path: Option<PathBuf>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            width: 128,
            height: 80,
            fps_limit: 14,
            queue_depth: 4,
            max_payload: DEFAULT_MAX_PAYLOAD,
            device_name: "Frame".to_string(),
            line_height: None,
            progressive_render: false,
            upload_app: true,
            scan_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(10),
            response_timeout: Duration::from_secs(5),
            ffmpeg_path: None,
            ffprobe_path: None,
        }
    }
}

impl StreamConfig {
    /// Create a config with custom display dimensions
    pub fn with_dimensions(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Set the display dimensions
    pub fn dimensions(mut self, width: u16, height: u16) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the target frame rate
    pub fn fps_limit(mut self, fps: u32) -> Self {
        self.fps_limit = fps.max(1);
        self
    }

    /// Set the decode→send queue depth
    pub fn queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth.max(1);
        self
    }

    /// Set the maximum bytes per BLE write
    pub fn max_payload(mut self, max: usize) -> Self {
        self.max_payload = max;
        self
    }

    /// Set the device name prefix to scan for
    pub fn device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = name.into();
        self
    }

    /// Set the sprite line height
    pub fn line_height(mut self, height: u16) -> Self {
        self.line_height = Some(height);
        self
    }

    /// Render sprite lines as they arrive
    pub fn progressive(mut self) -> Self {
        self.progressive_render = true;
        self
    }

    /// Skip uploading the receiver app (assume it is already on the device)
    pub fn keep_app(mut self) -> Self {
        self.upload_app = false;
        self
    }

    /// Set the BLE scan timeout
    pub fn scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    /// Set the BLE connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Effective sprite line height for the configured frame size
    pub fn effective_line_height(&self) -> u16 {
        match self.line_height {
            Some(h) if h > 0 => h.min(self.height),
            _ => self.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StreamConfig::default();

        assert_eq!(config.width, 128);
        assert_eq!(config.height, 80);
        assert_eq!(config.fps_limit, 14);
        assert_eq!(config.queue_depth, 4);
        assert_eq!(config.max_payload, DEFAULT_MAX_PAYLOAD);
        assert_eq!(config.device_name, "Frame");
        assert!(config.upload_app);
        assert!(!config.progressive_render);
    }

    #[test]
    fn test_with_dimensions() {
        let config = StreamConfig::with_dimensions(64, 40);

        assert_eq!(config.width, 64);
        assert_eq!(config.height, 40);
        assert_eq!(config.fps_limit, 14);
    }

    #[test]
    fn test_builder_fps_floor() {
        // fps 0 is clamped to 1
        let config = StreamConfig::default().fps_limit(0);

        assert_eq!(config.fps_limit, 1);
    }

    #[test]
    fn test_builder_keep_app() {
        let config = StreamConfig::default().keep_app();

        assert!(!config.upload_app);
    }

    #[test]
    fn test_effective_line_height_default() {
        let config = StreamConfig::default();

        assert_eq!(config.effective_line_height(), 80);
    }

    #[test]
    fn test_effective_line_height_capped() {
        // Line height larger than the frame is capped to the frame height
        let config = StreamConfig::default().line_height(200);

        assert_eq!(config.effective_line_height(), 80);
    }

    #[test]
    fn test_builder_chaining() {
        let config = StreamConfig::default()
            .dimensions(96, 64)
            .fps_limit(10)
            .queue_depth(8)
            .device_name("Frame AB")
            .line_height(16)
            .progressive()
            .scan_timeout(Duration::from_secs(5))
            .connect_timeout(Duration::from_secs(3));

        assert_eq!(config.width, 96);
        assert_eq!(config.height, 64);
        assert_eq!(config.fps_limit, 10);
        assert_eq!(config.queue_depth, 8);
        assert_eq!(config.device_name, "Frame AB");
        assert_eq!(config.effective_line_height(), 16);
        assert!(config.progressive_render);
        assert_eq!(config.scan_timeout, Duration::from_secs(5));
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
    }
}

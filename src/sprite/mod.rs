//! Sprite conversion for the Frame display
//!
//! This module provides:
//! - The fixed 4-level grayscale palette (2 bits per pixel)
//! - Quantization of grayscale frames to palette indices
//! - The sprite wire format sent inside ImageSpriteBlock messages

pub mod palette;
pub mod sprite;

pub use palette::{Palette, Rgb};
pub use sprite::Sprite;

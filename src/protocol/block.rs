//! ImageSpriteBlock packing
//!
//! A frame is transmitted as one block: a header message describing the
//! block geometry, followed by one sprite message per line. The receiver
//! renders when every line has arrived (or line-by-line in progressive
//! mode).
//!
//! ```text
//! Block header message payload:
//! +----------+-----------+----------------+----------------+--------------+
//! | Width(2) | Height(2) | LineHeight(2)  | Progressive(1) | Updatable(1) |
//! +----------+-----------+----------------+----------------+--------------+
//! ```
//! All integers big-endian. Line messages use the sprite wire format.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::Result;
use crate::sprite::Sprite;

use super::constants::BLOCK_HEADER_LEN;

/// A sprite block ready for transmission
#[derive(Debug, Clone)]
pub struct SpriteBlock {
    sprite: Sprite,
    line_height: u16,
    progressive: bool,
    updatable: bool,
}

impl SpriteBlock {
    /// Build a block from a full-frame sprite.
    ///
    /// `line_height` of `None` sends the whole frame as a single line.
    pub fn new(sprite: Sprite, line_height: Option<u16>, progressive: bool) -> Self {
        let line_height = match line_height {
            Some(h) if h > 0 => h.min(sprite.height),
            _ => sprite.height,
        };
        Self {
            sprite,
            line_height,
            progressive,
            updatable: true,
        }
    }

    /// Number of line messages this block produces
    pub fn total_lines(&self) -> u16 {
        self.sprite.height.div_ceil(self.line_height)
    }

    /// Pack the block header message payload
    pub fn header(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(BLOCK_HEADER_LEN);
        buf.put_u16(self.sprite.width);
        buf.put_u16(self.sprite.height);
        buf.put_u16(self.line_height);
        buf.put_u8(self.progressive as u8);
        buf.put_u8(self.updatable as u8);
        buf.freeze()
    }

    /// The sprite line messages, in transmission order
    pub fn lines(&self) -> Result<Vec<Sprite>> {
        self.sprite.split_lines(self.line_height)
    }

    /// Total payload bytes across header and lines
    pub fn payload_len(&self) -> Result<usize> {
        let lines: usize = self.lines()?.iter().map(|l| l.pack().len()).sum();
        Ok(BLOCK_HEADER_LEN + lines)
    }
}

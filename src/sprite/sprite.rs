//! Sprite quantization and wire format
//!
//! A sprite is a paletted bitmap ready for transmission. Pixels are packed
//! at `bpp` bits per pixel, most significant bits first, with each row
//! padded to a whole byte.
//!
//! Wire layout (sprite message payload):
//! ```text
//! +----------+-----------+-------------+--------+---------------+
//! | Width(2) | Height(2) | Compress(1) | Bpp(1) | NumColors(1)  |
//! +----------+-----------+-------------+--------+---------------+
//! | Palette (NumColors * 3, RGB triples)                        |
//! +-------------------------------------------------------------+
//! | PixelData (Height rows, ceil(Width * Bpp / 8) bytes each)   |
//! +-------------------------------------------------------------+
//! ```
//! All multi-byte integers are big-endian.

use bytes::{BufMut, Bytes, BytesMut};
use image::GrayImage;

use crate::error::{CodecError, Result};

use super::palette::Palette;

/// A quantized, paletted bitmap
#[derive(Debug, Clone)]
pub struct Sprite {
    /// Width in pixels
    pub width: u16,
    /// Height in pixels
    pub height: u16,
    /// Bits per pixel (matches the palette size)
    pub bpp: u8,
    /// Display palette
    pub palette: Palette,
    /// Packed pixel data (row-padded)
    pub pixels: Bytes,
}

impl Sprite {
    /// Quantize a grayscale image against the given palette.
    ///
    /// Every pixel resolves to one of the palette indices.
    pub fn from_gray(img: &GrayImage, palette: &Palette) -> Result<Self> {
        let width = img.width() as u16;
        let height = img.height() as u16;
        if width == 0 || height == 0 {
            return Err(CodecError::EmptySprite.into());
        }
        let n = palette.len();
        if !(2..=16).contains(&n) {
            return Err(CodecError::BadPaletteSize(n).into());
        }

        let bpp = palette.bpp();
        let row_bytes = row_bytes(width, bpp);
        let mut packed = vec![0u8; row_bytes * height as usize];

        for (y, row) in img.rows().enumerate() {
            let base = y * row_bytes;
            for (x, px) in row.enumerate() {
                let index = palette.nearest(px.0[0]);
                let bit = x * bpp as usize;
                // MSB-first within each byte
                let shift = 8 - bpp as usize - (bit % 8);
                packed[base + bit / 8] |= index << shift;
            }
        }

        Ok(Self {
            width,
            height,
            bpp,
            palette: palette.clone(),
            pixels: Bytes::from(packed),
        })
    }

    /// Bytes per pixel row
    pub fn row_bytes(&self) -> usize {
        row_bytes(self.width, self.bpp)
    }

    /// Serialize to the sprite wire format
    pub fn pack(&self) -> Bytes {
        let palette_bytes = self.palette.to_bytes();
        let mut buf =
            BytesMut::with_capacity(7 + palette_bytes.len() + self.pixels.len());

        buf.put_u16(self.width);
        buf.put_u16(self.height);
        buf.put_u8(0); // compress: not used
        buf.put_u8(self.bpp);
        buf.put_u8(self.palette.len() as u8);
        buf.put_slice(&palette_bytes);
        buf.put_slice(&self.pixels);

        buf.freeze()
    }

    /// Split into horizontal strips of at most `line_height` rows.
    ///
    /// The final strip is shorter when the height is not a multiple of
    /// `line_height`. Each strip shares this sprite's palette.
    pub fn split_lines(&self, line_height: u16) -> Result<Vec<Sprite>> {
        if line_height == 0 {
            return Err(CodecError::BadLineHeight.into());
        }

        let row_bytes = self.row_bytes();
        let mut lines = Vec::new();
        let mut y = 0u16;
        while y < self.height {
            let rows = line_height.min(self.height - y);
            let start = y as usize * row_bytes;
            let end = (y + rows) as usize * row_bytes;
            lines.push(Sprite {
                width: self.width,
                height: rows,
                bpp: self.bpp,
                palette: self.palette.clone(),
                pixels: self.pixels.slice(start..end),
            });
            y += rows;
        }
        Ok(lines)
    }
}

/// Packed bytes per row for the given width and depth
pub fn row_bytes(width: u16, bpp: u8) -> usize {
    (width as usize * bpp as usize).div_ceil(8)
}

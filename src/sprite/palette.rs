//! Display palettes
//!
//! The Frame display renders paletted bitmaps. For video we use a fixed
//! 4-level grayscale palette: the best trade-off between image information
//! and data size at 2 bits per pixel.

use bytes::Bytes;

/// The four gray levels of the default video palette
pub const GRAY_LEVELS: [u8; 4] = [0, 85, 170, 255];

/// An RGB palette entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// A gray entry (r = g = b)
    pub fn gray(level: u8) -> Self {
        Self {
            r: level,
            g: level,
            b: level,
        }
    }
}

/// A display palette (2 to 16 colors)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    /// The fixed 4-level grayscale palette
    pub fn gray4() -> Self {
        Self {
            colors: GRAY_LEVELS.iter().map(|&l| Rgb::gray(l)).collect(),
        }
    }

    /// Number of palette entries
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Bits per pixel needed to index this palette
    pub fn bpp(&self) -> u8 {
        match self.colors.len() {
            0..=2 => 1,
            3..=4 => 2,
            _ => 4,
        }
    }

    /// Index of the entry closest to the given gray level
    ///
    /// Distance is measured against the red channel, which equals the gray
    /// level for grayscale palettes.
    pub fn nearest(&self, luma: u8) -> u8 {
        let mut best = 0u8;
        let mut best_dist = u8::MAX;
        for (i, c) in self.colors.iter().enumerate() {
            let dist = luma.abs_diff(c.r);
            if dist < best_dist {
                best_dist = dist;
                best = i as u8;
            }
        }
        best
    }

    /// Palette entries as wire bytes (RGB triples)
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = Vec::with_capacity(self.colors.len() * 3);
        for c in &self.colors {
            buf.push(c.r);
            buf.push(c.g);
            buf.push(c.b);
        }
        Bytes::from(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gray4_palette() {
        let palette = Palette::gray4();

        assert_eq!(palette.len(), 4);
        assert_eq!(palette.bpp(), 2);
        assert_eq!(palette.to_bytes().len(), 12);
    }

    #[test]
    fn test_nearest_exact_levels() {
        let palette = Palette::gray4();

        assert_eq!(palette.nearest(0), 0);
        assert_eq!(palette.nearest(85), 1);
        assert_eq!(palette.nearest(170), 2);
        assert_eq!(palette.nearest(255), 3);
    }

    #[test]
    fn test_nearest_boundaries() {
        let palette = Palette::gray4();

        // Midpoint between 0 and 85 is 42.5; ties go to the lower index
        assert_eq!(palette.nearest(42), 0);
        assert_eq!(palette.nearest(43), 1);
        assert_eq!(palette.nearest(127), 1);
        assert_eq!(palette.nearest(128), 2);
        assert_eq!(palette.nearest(212), 2);
        assert_eq!(palette.nearest(213), 3);
    }

    #[test]
    fn test_nearest_always_in_range() {
        let palette = Palette::gray4();

        for luma in 0..=255u8 {
            assert!(palette.nearest(luma) < 4);
        }
    }

    #[test]
    fn test_palette_wire_bytes() {
        let palette = Palette::gray4();
        let bytes = palette.to_bytes();

        assert_eq!(&bytes[0..3], &[0, 0, 0]);
        assert_eq!(&bytes[3..6], &[85, 85, 85]);
        assert_eq!(&bytes[9..12], &[255, 255, 255]);
    }
}

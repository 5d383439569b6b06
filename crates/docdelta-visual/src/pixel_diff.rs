//! Binary change mask from two equally sized rasters.

use image::RgbImage;

/// Grayscale difference above which a pixel counts as changed.
pub const DEFAULT_THRESHOLD: u8 = 30;

/// A per-pixel changed/unchanged mask, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffMask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl DiffMask {
    /// Build a mask from row-major bits. Returns `None` if the length does
    /// not match the dimensions.
    pub fn from_bits(width: u32, height: u32, bits: Vec<bool>) -> Option<Self> {
        (bits.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            bits,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the pixel at (`x`, `y`) changed. Out-of-bounds is `false`.
    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.bits[self.index(x, y)]
    }

    pub fn changed_pixels(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    pub fn is_clear(&self) -> bool {
        !self.bits.iter().any(|b| *b)
    }

    pub(crate) fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub(crate) fn bits(&self) -> &[bool] {
        &self.bits
    }
}

/// Luma of an RGB triple with BT.601 weights, in the 14-bit fixed-point
/// form used by common imaging libraries.
fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = (r as u32 * 4899 + g as u32 * 9617 + b as u32 * 1868 + (1 << 13)) >> 14;
    y.min(255) as u8
}

/// Per-channel absolute difference, converted to grayscale, thresholded.
///
/// Both images must have the same dimensions; align them first with
/// [`crate::raster::align_pair`]. Pixels outside the common area of
/// mismatched inputs are treated as changed.
pub fn diff_mask(a: &RgbImage, b: &RgbImage, threshold: u8) -> DiffMask {
    let width = a.width().max(b.width());
    let height = a.height().max(b.height());
    let mut bits = Vec::with_capacity(width as usize * height as usize);

    for y in 0..height {
        for x in 0..width {
            let changed = match (a.get_pixel_checked(x, y), b.get_pixel_checked(x, y)) {
                (Some(pa), Some(pb)) => {
                    let [r0, g0, b0] = pa.0;
                    let [r1, g1, b1] = pb.0;
                    luma(r0.abs_diff(r1), g0.abs_diff(g1), b0.abs_diff(b1)) > threshold
                }
                _ => true,
            };
            bits.push(changed);
        }
    }

    DiffMask {
        width,
        height,
        bits,
    }
}

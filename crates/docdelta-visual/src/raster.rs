//! Page raster alignment.

use image::{imageops, Rgb, RgbImage};

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// A blank white page.
pub fn blank_page(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, WHITE)
}

/// Pad `image` with white to `width` x `height`, keeping it anchored at the
/// top-left corner. Returns the image unchanged if it is already that size.
pub fn pad_to(image: RgbImage, width: u32, height: u32) -> RgbImage {
    if image.dimensions() == (width, height) {
        return image;
    }
    let mut canvas = blank_page(width, height);
    imageops::replace(&mut canvas, &image, 0, 0);
    canvas
}

/// Bring one page index of both documents to a common size.
///
/// A side that has no page at this index becomes a white page matching the
/// other side. Pages of different sizes are both padded to the larger width
/// and the larger height.
pub fn align_pair(left: Option<RgbImage>, right: Option<RgbImage>) -> Option<(RgbImage, RgbImage)> {
    let (left, right) = match (left, right) {
        (Some(l), Some(r)) => (l, r),
        (Some(l), None) => {
            let filler = blank_page(l.width(), l.height());
            (l, filler)
        }
        (None, Some(r)) => (blank_page(r.width(), r.height()), r),
        (None, None) => return None,
    };

    let width = left.width().max(right.width());
    let height = left.height().max(right.height());
    Some((pad_to(left, width, height), pad_to(right, width, height)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb<u8> = Rgb([255, 0, 0]);

    #[test]
    fn padding_is_anchored_top_left() {
        let small = RgbImage::from_pixel(4, 3, RED);
        let padded = pad_to(small, 6, 5);

        assert_eq!(padded.dimensions(), (6, 5));
        assert_eq!(*padded.get_pixel(0, 0), RED);
        assert_eq!(*padded.get_pixel(3, 2), RED);
        assert_eq!(*padded.get_pixel(4, 0), WHITE);
        assert_eq!(*padded.get_pixel(0, 3), WHITE);
        assert_eq!(*padded.get_pixel(5, 4), WHITE);
    }

    #[test]
    fn missing_side_gets_matching_filler() {
        let page = RgbImage::from_pixel(10, 20, RED);
        let (left, right) = align_pair(None, Some(page)).unwrap();
        assert_eq!(left.dimensions(), (10, 20));
        assert!(left.pixels().all(|p| *p == WHITE));
        assert_eq!(*right.get_pixel(0, 0), RED);
    }

    #[test]
    fn different_sizes_meet_at_the_larger_extent() {
        let wide = RgbImage::from_pixel(30, 10, RED);
        let tall = RgbImage::from_pixel(10, 40, RED);
        let (l, r) = align_pair(Some(wide), Some(tall)).unwrap();
        assert_eq!(l.dimensions(), (30, 40));
        assert_eq!(r.dimensions(), (30, 40));
        assert_eq!(*l.get_pixel(29, 9), RED);
        assert_eq!(*l.get_pixel(29, 10), WHITE);
        assert_eq!(*r.get_pixel(10, 0), WHITE);
    }

    #[test]
    fn nothing_to_align() {
        assert!(align_pair(None, None).is_none());
    }
}

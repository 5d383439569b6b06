//! Drawing: region outlines, text-change border, labels, side-by-side
//! composition, PNG encoding.

use std::io::Cursor;

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{imageops, ImageFormat, Rgb, RgbImage};

use crate::raster::blank_page;
use crate::report::DiffRegion;

pub const REGION_COLOR: Rgb<u8> = Rgb([255, 165, 0]);
pub const BORDER_COLOR: Rgb<u8> = Rgb([160, 82, 45]);
pub const LABEL_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

pub const OUTLINE_THICKNESS: u32 = 2;
pub const BORDER_INSET: u32 = 10;
pub const LABEL_HEIGHT: u32 = 50;
const LABEL_SCALE: u32 = 4;
const GLYPH_SIZE: u32 = 8;

/// Draw a rectangle outline whose outer edge spans `x..=x+w`, `y..=y+h`,
/// growing inward by `thickness`. Clipped to the image.
pub fn draw_rect_outline(
    img: &mut RgbImage,
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    color: Rgb<u8>,
    thickness: u32,
) {
    let (img_w, img_h) = img.dimensions();
    if img_w == 0 || img_h == 0 {
        return;
    }
    let max_x = img_w - 1;
    let max_y = img_h - 1;

    for t in 0..thickness.max(1) {
        let x0 = x + t;
        let y0 = y + t;
        let Some(x1) = (x + w).checked_sub(t) else { break };
        let Some(y1) = (y + h).checked_sub(t) else { break };
        if x0 > x1 || y0 > y1 {
            break;
        }

        for xx in x0..=x1.min(max_x) {
            if y0 <= max_y {
                img.put_pixel(xx, y0, color);
            }
            if y1 <= max_y {
                img.put_pixel(xx, y1, color);
            }
        }
        for yy in y0..=y1.min(max_y) {
            if x0 <= max_x {
                img.put_pixel(x0, yy, color);
            }
            if x1 <= max_x {
                img.put_pixel(x1, yy, color);
            }
        }
    }
}

/// Outline every region.
pub fn outline_regions(img: &mut RgbImage, regions: &[DiffRegion]) {
    for r in regions {
        draw_rect_outline(
            img,
            r.x,
            r.y,
            r.width,
            r.height,
            REGION_COLOR,
            OUTLINE_THICKNESS,
        );
    }
}

/// Full-page border marking a text change that produced no pixel regions.
pub fn draw_text_change_border(img: &mut RgbImage) {
    let (w, h) = img.dimensions();
    if w <= 2 * BORDER_INSET || h <= 2 * BORDER_INSET {
        return;
    }
    draw_rect_outline(
        img,
        BORDER_INSET,
        BORDER_INSET,
        w - 2 * BORDER_INSET,
        h - 2 * BORDER_INSET,
        BORDER_COLOR,
        OUTLINE_THICKNESS,
    );
}

fn draw_bitmap_text(img: &mut RgbImage, x: u32, y: u32, text: &str, color: Rgb<u8>, scale: u32) {
    let scale = scale.max(1);
    let mut cursor_x = x;
    for ch in text.chars() {
        let Some(glyph) = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?')) else {
            cursor_x += GLYPH_SIZE * scale;
            continue;
        };
        for (row_idx, &row) in glyph.iter().enumerate() {
            for col in 0..GLYPH_SIZE {
                if (row >> col) & 1 == 0 {
                    continue;
                }
                let px = cursor_x + col * scale;
                let py = y + row_idx as u32 * scale;
                for sy in 0..scale {
                    for sx in 0..scale {
                        let (tx, ty) = (px + sx, py + sy);
                        if tx < img.width() && ty < img.height() {
                            img.put_pixel(tx, ty, color);
                        }
                    }
                }
            }
        }
        cursor_x += GLYPH_SIZE * scale;
    }
}

/// Place `page` under a white band carrying `name`, centered.
///
/// The text shrinks if it would not fit the page width.
pub fn label(page: &RgbImage, name: &str) -> RgbImage {
    let (w, h) = page.dimensions();
    let mut out = blank_page(w, h + LABEL_HEIGHT);
    imageops::replace(&mut out, page, 0, LABEL_HEIGHT as i64);

    let chars = name.chars().count() as u32;
    if chars == 0 {
        return out;
    }
    let mut scale = LABEL_SCALE;
    while scale > 1 && chars * GLYPH_SIZE * scale > w {
        scale -= 1;
    }
    let text_w = chars * GLYPH_SIZE * scale;
    let x = w.saturating_sub(text_w) / 2;
    let y = LABEL_HEIGHT.saturating_sub(GLYPH_SIZE * scale) / 2;
    draw_bitmap_text(&mut out, x, y, name, LABEL_COLOR, scale);
    out
}

/// Place two images next to each other on a white background.
pub fn side_by_side(left: &RgbImage, right: &RgbImage) -> RgbImage {
    let width = left.width() + right.width();
    let height = left.height().max(right.height());
    let mut out = blank_page(width, height);
    imageops::replace(&mut out, left, 0, 0);
    imageops::replace(&mut out, right, left.width() as i64, 0);
    out
}

/// Encode as PNG in memory.
pub fn encode_png(img: &RgbImage) -> image::ImageResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Burn detection boxes and labels into an image
//!
//! Boxes get a 2-pixel red outline drawn inward from their corners; labels are
//! rendered with a built-in 5x7 bitmap font starting 4px inside the top-left
//! corner. Everything is clipped to the image bounds.

use image::{Rgb, RgbImage};

use super::collaborators::PixelBox;

pub const OUTLINE_WIDTH: i64 = 2;
pub const LABEL_OFFSET: i64 = 4;
pub const ANNOTATION_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

const GLYPH_WIDTH: i64 = 5;
const GLYPH_HEIGHT: i64 = 7;
const GLYPH_SPACING: i64 = 1;

/// Draw every box with its label; returns how many boxes were drawn
pub fn draw_detections<'a, I>(img: &mut RgbImage, boxes: I) -> usize
where
    I: IntoIterator<Item = (PixelBox, &'a str)>,
{
    let mut drawn = 0;
    for (bbox, label) in boxes {
        draw_box(img, bbox, ANNOTATION_COLOR);
        draw_text(
            img,
            bbox.x1.saturating_add(LABEL_OFFSET),
            bbox.y1.saturating_add(LABEL_OFFSET),
            label,
            ANNOTATION_COLOR,
        );
        drawn += 1;
    }
    drawn
}

fn put_clipped(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x < 0 || y < 0 || x >= img.width() as i64 || y >= img.height() as i64 {
        return;
    }
    img.put_pixel(x as u32, y as u32, color);
}

/// Pull corners in to just outside the image; the visible outline is unchanged
fn clamp_to_canvas(img: &RgbImage, bbox: PixelBox) -> PixelBox {
    let max_x = img.width() as i64 + OUTLINE_WIDTH;
    let max_y = img.height() as i64 + OUTLINE_WIDTH;
    PixelBox {
        x1: bbox.x1.clamp(-OUTLINE_WIDTH, max_x),
        y1: bbox.y1.clamp(-OUTLINE_WIDTH, max_y),
        x2: bbox.x2.clamp(-OUTLINE_WIDTH, max_x),
        y2: bbox.y2.clamp(-OUTLINE_WIDTH, max_y),
    }
}

/// Rectangle outline of [`OUTLINE_WIDTH`] pixels, growing inward
pub fn draw_box(img: &mut RgbImage, bbox: PixelBox, color: Rgb<u8>) {
    let bbox = clamp_to_canvas(img, bbox);
    for inset in 0..OUTLINE_WIDTH {
        let (x1, y1) = (bbox.x1 + inset, bbox.y1 + inset);
        let (x2, y2) = (bbox.x2 - inset, bbox.y2 - inset);
        if x1 > x2 || y1 > y2 {
            break;
        }
        for x in x1..=x2 {
            put_clipped(img, x, y1, color);
            put_clipped(img, x, y2, color);
        }
        for y in y1..=y2 {
            put_clipped(img, x1, y, color);
            put_clipped(img, x2, y, color);
        }
    }
}

/// Render text with the bitmap font; lowercase is drawn as uppercase
pub fn draw_text(img: &mut RgbImage, x: i64, y: i64, text: &str, color: Rgb<u8>) {
    let mut pen_x = x;
    for ch in text.chars() {
        if pen_x >= img.width() as i64 {
            break;
        }
        let rows = glyph(ch.to_ascii_uppercase());
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) != 0 {
                    let (px, py) = (pen_x.saturating_add(col), y.saturating_add(row as i64));
                    put_clipped(img, px, py, color);
                }
            }
        }
        pen_x = pen_x.saturating_add(GLYPH_WIDTH + GLYPH_SPACING);
    }
}

fn glyph(ch: char) -> [u8; GLYPH_HEIGHT as usize] {
    match ch {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '_' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '%' => [0x18, 0x19, 0x02, 0x04, 0x08, 0x13, 0x03],
        ' ' => [0x00; 7],
        _ => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
    }
}

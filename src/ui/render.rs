//! Software drawing primitives for the softbuffer framebuffer
//! (u32 per pixel, 0x00RRGGBB).

use crate::transform::{Matrix, Rect};

const TILE_SIZE: u32 = 16;
const TILE_LIGHT: u32 = rgb(40, 40, 40);
const TILE_DARK: u32 = rgb(30, 30, 30);

/// Pack RGB into softbuffer u32 format: 0x00RRGGBB.
pub const fn rgb(r: u8, g: u8, b: u8) -> u32 {
    (r as u32) << 16 | (g as u32) << 8 | b as u32
}

fn unpack_rgb(v: u32) -> (u8, u8, u8) {
    ((v >> 16) as u8, (v >> 8) as u8, v as u8)
}

/// Dark checkered backdrop so transparency is visible.
pub fn draw_checkerboard(frame: &mut [u32], fb_w: u32, fb_h: u32) {
    for y in 0..fb_h {
        let row = (y / TILE_SIZE) & 1;
        for x in 0..fb_w {
            let light = ((x / TILE_SIZE) & 1) == row;
            frame[(y * fb_w + x) as usize] = if light { TILE_LIGHT } else { TILE_DARK };
        }
    }
}

/// Draw an RGBA source into `rect` with the orientation matrix applied.
///
/// Inverse mapping: every framebuffer pixel inside the transformed rect's
/// bounding box is mapped back through the matrix into rect space, then
/// into source coordinates. Nearest-neighbor sampling, alpha blended over
/// the backdrop.
pub fn blit_oriented(
    dst: &mut [u32],
    dst_w: u32,
    dst_h: u32,
    src: &[u8],
    src_w: u32,
    src_h: u32,
    rect: Rect,
    matrix: &Matrix,
) {
    if rect.w <= 0.0 || rect.h <= 0.0 || src_w == 0 || src_h == 0 {
        return;
    }
    let Some(inverse) = matrix.invert() else {
        return;
    };

    let corners = [
        matrix.apply(rect.x, rect.y),
        matrix.apply(rect.x + rect.w, rect.y),
        matrix.apply(rect.x, rect.y + rect.h),
        matrix.apply(rect.x + rect.w, rect.y + rect.h),
    ];
    let min_x = corners.iter().map(|c| c.0).fold(f32::INFINITY, f32::min);
    let max_x = corners.iter().map(|c| c.0).fold(f32::NEG_INFINITY, f32::max);
    let min_y = corners.iter().map(|c| c.1).fold(f32::INFINITY, f32::min);
    let max_y = corners.iter().map(|c| c.1).fold(f32::NEG_INFINITY, f32::max);

    let x0 = min_x.floor().max(0.0) as u32;
    let y0 = min_y.floor().max(0.0) as u32;
    let x1 = (max_x.ceil().max(0.0) as u32).min(dst_w);
    let y1 = (max_y.ceil().max(0.0) as u32).min(dst_h);

    let sx_scale = src_w as f32 / rect.w;
    let sy_scale = src_h as f32 / rect.h;

    for dy in y0..y1 {
        for dx in x0..x1 {
            let (qx, qy) = inverse.apply(dx as f32 + 0.5, dy as f32 + 0.5);
            if !rect.contains(qx, qy) {
                continue;
            }
            let sx = ((qx - rect.x) * sx_scale) as u32;
            let sy = ((qy - rect.y) * sy_scale) as u32;
            if sx >= src_w || sy >= src_h {
                continue;
            }

            let si = (sy as usize * src_w as usize + sx as usize) * 4;
            let di = dy as usize * dst_w as usize + dx as usize;

            let sa = src[si + 3] as u32;
            if sa == 255 {
                dst[di] = rgb(src[si], src[si + 1], src[si + 2]);
            } else if sa > 0 {
                let inv = 255 - sa;
                let (dr, dg, db) = unpack_rgb(dst[di]);
                let r = ((src[si] as u32 * sa + dr as u32 * inv) / 255) as u8;
                let g = ((src[si + 1] as u32 * sa + dg as u32 * inv) / 255) as u8;
                let b = ((src[si + 2] as u32 * sa + db as u32 * inv) / 255) as u8;
                dst[di] = rgb(r, g, b);
            }
        }
    }
}

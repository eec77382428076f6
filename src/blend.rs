use image::{Rgba, RgbaImage};

/// Source-over blend of a straight-alpha `src` pixel onto `dst` in place.
pub fn blend_pixel(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let src_a = src[3] as f32 / 255.0;
    if src_a <= 0.0 {
        return;
    }
    if src_a >= 1.0 {
        *dst = src;
        return;
    }

    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);

    let mut rgba = [0u8; 4];
    if out_a > 0.0 {
        let src_weight = src_a / out_a;
        let dst_weight = (dst_a * (1.0 - src_a)) / out_a;
        for c in 0..3 {
            let blended = src[c] as f32 * src_weight + dst[c] as f32 * dst_weight;
            rgba[c] = blended.round().clamp(0.0, 255.0) as u8;
        }
    }
    rgba[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    *dst = Rgba(rgba);
}

/// Blend `src` onto `dst` with its top-left corner at `(x, y)`, clipping to `dst`.
pub fn draw_over(dst: &mut RgbaImage, src: &RgbaImage, x: i64, y: i64) {
    let (dw, dh) = (i64::from(dst.width()), i64::from(dst.height()));
    for (sx, sy, px) in src.enumerate_pixels() {
        let tx = x + i64::from(sx);
        let ty = y + i64::from(sy);
        if tx < 0 || ty < 0 || tx >= dw || ty >= dh {
            continue;
        }
        blend_pixel(dst.get_pixel_mut(tx as u32, ty as u32), *px);
    }
}

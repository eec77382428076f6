use image::{GrayImage, Rgba, RgbaImage};

use crate::{BacktextError, BacktextResult};

/// Cut the subject out of `original` using a grayscale matte as its alpha.
///
/// RGB comes from `original`; its own alpha channel is replaced by the matte.
pub fn compose_foreground(original: &RgbaImage, matte: &GrayImage) -> BacktextResult<RgbaImage> {
    let expected = original.dimensions();
    let found = matte.dimensions();
    if expected != found {
        return Err(BacktextError::DimensionMismatch { expected, found });
    }

    let (w, h) = original.dimensions();
    let mut rgba = RgbaImage::new(w, h);
    for ((src_px, matte_px), out_px) in original
        .pixels()
        .zip(matte.pixels())
        .zip(rgba.pixels_mut())
    {
        *out_px = Rgba([src_px[0], src_px[1], src_px[2], matte_px[0]]);
    }

    Ok(rgba)
}

use image::RgbaImage;

use crate::mask::MaskSet;
use crate::{BacktextError, BacktextResult};

/// Produce the background layer: a copy of `original` with every masked pixel
/// made fully transparent. RGB channels and unmasked pixels pass through.
pub fn extract_background(original: &RgbaImage, mask: &MaskSet) -> BacktextResult<RgbaImage> {
    let expected = original.dimensions();
    let found = mask.dimensions();
    if expected != found {
        return Err(BacktextError::DimensionMismatch { expected, found });
    }

    let mut background = original.clone();
    let raw: &mut [u8] = &mut background;
    for index in mask.iter() {
        raw[index.offset() + 3] = 0;
    }

    Ok(background)
}

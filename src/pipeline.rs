//! The background, text, subject draw sequence.

use std::sync::Arc;

use image::RgbaImage;
use log::debug;

use crate::background::extract_background;
use crate::config::CompositionSettings;
use crate::font::FontBook;
use crate::mask::compute_mask;
use crate::style::TextStyle;
use crate::surface::DrawingSurface;
use crate::surface::raster::RasterSurface;
use crate::text::{render_text, reset_shadow};
use crate::{BacktextError, BacktextResult};

/// Composite `style`'s text between `original` and the `foreground` cutout.
///
/// The result has `original`'s dimensions. `foreground` must match them.
pub fn compose(
    original: &RgbaImage,
    foreground: &RgbaImage,
    style: &TextStyle,
    settings: &CompositionSettings,
    fonts: Arc<FontBook>,
) -> BacktextResult<RgbaImage> {
    check_layers(original, foreground)?;
    let (width, height) = original.dimensions();
    let mut surface = RasterSurface::new(width, height, fonts);
    compose_onto(&mut surface, original, foreground, style, settings)?;
    Ok(surface.into_image())
}

/// Run the composition draw sequence against any surface.
///
/// Nothing is drawn if the layers disagree in size.
pub fn compose_onto<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    original: &RgbaImage,
    foreground: &RgbaImage,
    style: &TextStyle,
    settings: &CompositionSettings,
) -> BacktextResult<()> {
    check_layers(original, foreground)?;
    let (width, height) = original.dimensions();

    let background = if settings.subtract_background {
        let mask = compute_mask(foreground, settings.mask.margin);
        debug!(
            margin = settings.mask.margin,
            masked = mask.len();
            "Subtracting subject from background"
        );
        Some(extract_background(original, &mask)?)
    } else {
        None
    };

    debug!(width = width, height = height; "Drawing background");
    surface.draw_image(background.as_ref().unwrap_or(original), 0.0, 0.0);

    debug!("Drawing text");
    render_text(surface, style, width, height, settings.line_centering);
    reset_shadow(surface);

    debug!("Drawing foreground");
    surface.draw_image(foreground, 0.0, 0.0);
    Ok(())
}

fn check_layers(original: &RgbaImage, foreground: &RgbaImage) -> BacktextResult<()> {
    let expected = original.dimensions();
    let found = foreground.dimensions();
    if expected != found {
        return Err(BacktextError::DimensionMismatch { expected, found });
    }
    Ok(())
}

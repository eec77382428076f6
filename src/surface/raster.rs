//! CPU rasterizer backing the [`DrawingSurface`] trait with an RGBA canvas.

use std::sync::Arc;

use ab_glyph::{Font, FontArc, GlyphId, OutlinedGlyph, PxScale, ScaleFont, point};
use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::filter::gaussian_blur_f32;
use kurbo::{Affine, Point, Rect};
use log::trace;

use crate::blend::draw_over;
use crate::font::FontBook;
use crate::style::Paint;

use super::{DrawingSurface, Shadow, StateStack, TextAlign, TextBaseline};

/// Upper bound on glyph oversampling for magnified text.
const MAX_OVERSAMPLE: f64 = 8.0;

/// Largest em size, in raster pixels, glyphs are rasterized at. Larger text is
/// rasterized at this size and magnified.
const MAX_RASTER_EM: f64 = 4096.0;

const MAX_SHADOW_BLUR: f64 = 100.0;
const MAX_SHADOW_OFFSET: f64 = 1024.0;

/// An RGBA canvas with canvas-style state, text and image drawing.
#[derive(Debug)]
pub struct RasterSurface {
    canvas: RgbaImage,
    state: StateStack,
    fonts: Arc<FontBook>,
}

impl RasterSurface {
    /// A fully transparent canvas.
    pub fn new(width: u32, height: u32, fonts: Arc<FontBook>) -> Self {
        Self::from_image(RgbaImage::new(width, height), fonts)
    }

    /// Draw on top of an existing image.
    pub fn from_image(canvas: RgbaImage, fonts: Arc<FontBook>) -> Self {
        Self {
            canvas,
            state: StateStack::new(),
            fonts,
        }
    }

    /// A canvas that cannot draw text; text measures as zero width.
    pub fn without_fonts(width: u32, height: u32) -> Self {
        Self::new(width, height, Arc::new(FontBook::empty()))
    }

    pub fn image(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn into_image(self) -> RgbaImage {
        self.canvas
    }

    fn current_face(&self) -> Option<FontArc> {
        self.fonts.resolve(&self.state.paint().font)
    }

    /// Canvas bounds grown by however far the current shadow can reach.
    fn clip_rect(&self, shadow: &Shadow) -> Rect {
        let canvas = Rect::new(
            0.0,
            0.0,
            f64::from(self.canvas.width()),
            f64::from(self.canvas.height()),
        );
        if !shadow.is_active() {
            return canvas;
        }
        let reach = shadow.offset_x.abs().max(shadow.offset_y.abs()) + 1.5 * shadow.blur + 1.0;
        canvas.inflate(reach, reach)
    }

    /// Blend a device-space layer at `origin`, casting the current shadow first.
    fn composite_layer(&mut self, layer: &RgbaImage, origin: (i64, i64), shadow: Shadow) {
        if shadow.is_active() {
            let (cast, pad) = cast_shadow(layer, &shadow);
            let x = origin.0 - pad + shadow.offset_x.round() as i64;
            let y = origin.1 - pad + shadow.offset_y.round() as i64;
            draw_over(&mut self.canvas, &cast, x, y);
        }
        draw_over(&mut self.canvas, layer, origin.0, origin.1);
    }
}

impl DrawingSurface for RasterSurface {
    fn state(&self) -> &StateStack {
        &self.state
    }

    fn state_mut(&mut self) -> &mut StateStack {
        &mut self.state
    }

    fn measure_text(&mut self, text: &str) -> f64 {
        let size = self.state.paint().font.size;
        match self.current_face() {
            Some(font) => f64::from(run_advance(&font, em_scale(&font, size), text)),
            None => 0.0,
        }
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        let paint = self.state.paint().clone();
        let size = paint.font.size;
        if text.is_empty() || paint.fill.is_transparent() || !(size.is_finite() && size > 0.0) {
            return;
        }
        let Some(font) = self.current_face() else {
            return;
        };
        let transform = self.state.transform();
        if !is_invertible(transform) {
            return;
        }

        let user_scale = em_scale(&font, size);
        let start_x = match paint.align {
            TextAlign::Start => x,
            TextAlign::Center => x - f64::from(run_advance(&font, user_scale, text)) / 2.0,
        };
        let baseline = match paint.baseline {
            TextBaseline::Alphabetic => y,
            TextBaseline::Middle => {
                let scaled = font.as_scaled(user_scale);
                y + f64::from(scaled.ascent() + scaled.descent()) / 2.0
            }
        };

        let factor = raster_factor(size, transform);
        let to_device = transform * Affine::scale(1.0 / factor);
        let shadow = bounded_shadow(paint.shadow);
        let clip = self.clip_rect(&shadow);
        let Some(coverage) = Coverage::rasterize(
            &font,
            em_scale(&font, size * factor),
            text,
            (start_x * factor, baseline * factor),
            to_device.inverse().transform_rect_bbox(clip),
        ) else {
            return;
        };

        if let Some((layer, origin)) = coverage.resample(to_device, paint.fill, clip) {
            trace!(text = text, x = origin.0, y = origin.1; "Fill text");
            self.composite_layer(&layer, origin, shadow);
        }
    }

    fn draw_image(&mut self, image: &RgbaImage, x: f64, y: f64) {
        if image.width() == 0 || image.height() == 0 {
            return;
        }
        let shadow = bounded_shadow(self.state.paint().shadow);
        let placement = self.state.transform() * Affine::translate((x, y));

        if let Some(origin) = integer_offset(placement) {
            self.composite_layer(image, origin, shadow);
            return;
        }
        if !is_invertible(placement) {
            return;
        }
        let clip = self.clip_rect(&shadow);
        if let Some((layer, origin)) = resample_image(image, placement, clip) {
            self.composite_layer(&layer, origin, shadow);
        }
    }
}

/// Pixel scale whose em square is `size` pixels, as CSS font sizes are.
fn em_scale(font: &FontArc, size: f64) -> PxScale {
    let em = size as f32;
    match font.units_per_em() {
        Some(units) if units > 0.0 => PxScale::from(em * font.height_unscaled() / units),
        _ => PxScale::from(em),
    }
}

fn run_advance(font: &FontArc, scale: PxScale, text: &str) -> f32 {
    let scaled = font.as_scaled(scale);
    let mut width = 0.0;
    let mut previous: Option<GlyphId> = None;
    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(previous) = previous {
            width += scaled.kern(previous, id);
        }
        width += scaled.h_advance(id);
        previous = Some(id);
    }
    width
}

fn max_scale(affine: Affine) -> f64 {
    let [a, b, c, d, _, _] = affine.as_coeffs();
    a.hypot(b).max(c.hypot(d))
}

/// Ratio of raster pixels to user units for text of `size` under `transform`.
///
/// Magnified text is oversampled; the rasterized em never exceeds
/// [`MAX_RASTER_EM`].
fn raster_factor(size: f64, transform: Affine) -> f64 {
    let oversample = max_scale(transform).clamp(1.0, MAX_OVERSAMPLE);
    oversample.min(MAX_RASTER_EM / size)
}

/// `shadow` with non-finite geometry dropped and the rest clamped to what the
/// rasterizer draws.
fn bounded_shadow(shadow: Shadow) -> Shadow {
    let bound = |value: f64, max: f64| {
        if value.is_nan() {
            0.0
        } else {
            value.clamp(-max, max)
        }
    };
    Shadow {
        blur: bound(shadow.blur, MAX_SHADOW_BLUR).max(0.0),
        offset_x: bound(shadow.offset_x, MAX_SHADOW_OFFSET),
        offset_y: bound(shadow.offset_y, MAX_SHADOW_OFFSET),
        ..shadow
    }
}

fn is_invertible(affine: Affine) -> bool {
    let det = affine.determinant();
    det.is_finite() && det.abs() > 1e-12
}

/// Whole-pixel offset when `affine` is an unscaled, unrotated translation.
fn integer_offset(affine: Affine) -> Option<(i64, i64)> {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    let near = |v: f64, target: f64| (v - target).abs() < 1e-9;
    let linear_is_identity = near(a, 1.0) && near(b, 0.0) && near(c, 0.0) && near(d, 1.0);
    if linear_is_identity && near(e, e.round()) && near(f, f.round()) {
        Some((e.round() as i64, f.round() as i64))
    } else {
        None
    }
}

/// Integer device box covering `rect`, or `None` when it is empty.
fn device_box(rect: Rect) -> Option<(i64, i64, u32, u32)> {
    let x0 = rect.x0.floor();
    let y0 = rect.y0.floor();
    let x1 = rect.x1.ceil();
    let y1 = rect.y1.ceil();
    if !(x1 > x0 && y1 > y0) {
        return None;
    }
    Some((x0 as i64, y0 as i64, (x1 - x0) as u32, (y1 - y0) as u32))
}

/// Center of device pixel `(px, py)` of a layer whose top-left is `(x0, y0)`.
fn pixel_center(x0: i64, y0: i64, px: u32, py: u32) -> Point {
    Point::new(
        x0 as f64 + f64::from(px) + 0.5,
        y0 as f64 + f64::from(py) + 0.5,
    )
}

/// Nearest-neighbour resampling of `image` placed by `placement`.
fn resample_image(
    image: &RgbaImage,
    placement: Affine,
    clip: Rect,
) -> Option<(RgbaImage, (i64, i64))> {
    let (width, height) = (f64::from(image.width()), f64::from(image.height()));
    let bounds = Rect::new(0.0, 0.0, width, height);
    let (x0, y0, w, h) = device_box(placement.transform_rect_bbox(bounds).intersect(clip))?;
    let inverse = placement.inverse();

    let layer = RgbaImage::from_fn(w, h, |px, py| {
        let src = inverse * pixel_center(x0, y0, px, py);
        let (sx, sy) = (src.x.floor(), src.y.floor());
        if sx < 0.0 || sy < 0.0 || sx >= width || sy >= height {
            return Rgba([0, 0, 0, 0]);
        }
        *image.get_pixel(sx as u32, sy as u32)
    });
    Some((layer, (x0, y0)))
}

/// Blurred, tinted silhouette of `layer` and the padding added on each side.
fn cast_shadow(layer: &RgbaImage, shadow: &Shadow) -> (RgbaImage, i64) {
    let sigma = (shadow.blur / 2.0) as f32;
    let pad = if sigma > 0.0 {
        (3.0 * sigma).ceil() as u32
    } else {
        0
    };

    let mut silhouette = GrayImage::new(
        layer.width().saturating_add(pad.saturating_mul(2)),
        layer.height().saturating_add(pad.saturating_mul(2)),
    );
    for (x, y, px) in layer.enumerate_pixels() {
        silhouette.put_pixel(x + pad, y + pad, Luma([px[3]]));
    }
    if sigma > 0.0 {
        silhouette = gaussian_blur_f32(&silhouette, sigma);
    }

    let ink = shadow.paint.to_rgba();
    let tint = u16::from(ink[3]);
    let cast = RgbaImage::from_fn(silhouette.width(), silhouette.height(), |x, y| {
        let a = u16::from(silhouette.get_pixel(x, y)[0]);
        let mut px = ink;
        px.0[3] = ((a * tint + 127) / 255) as u8;
        px
    });
    (cast, i64::from(pad))
}

fn glyph_rect(outlined: &OutlinedGlyph) -> Rect {
    let bounds = outlined.px_bounds();
    Rect::new(
        f64::from(bounds.min.x),
        f64::from(bounds.min.y),
        f64::from(bounds.max.x),
        f64::from(bounds.max.y),
    )
}

/// Glyph coverage of one text run, rasterized in (possibly oversampled) user space.
///
/// Cell `(i, j)` covers the unit square whose top-left corner is `(x0 + i, y0 + j)`.
#[derive(Debug)]
struct Coverage {
    x0: i64,
    y0: i64,
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Coverage {
    /// Rasterize `text` starting at `origin` (x, baseline). Only the part of
    /// the run inside `clip` is kept; glyphs entirely outside it are skipped.
    fn rasterize(
        font: &FontArc,
        scale: PxScale,
        text: &str,
        origin: (f64, f64),
        clip: Rect,
    ) -> Option<Self> {
        let scaled = font.as_scaled(scale);
        let mut caret = origin.0 as f32;
        let mut previous: Option<GlyphId> = None;
        let mut outlines = Vec::new();
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(previous) = previous {
                caret += scaled.kern(previous, id);
            }
            let glyph = id.with_scale_and_position(scale, point(caret, origin.1 as f32));
            caret += scaled.h_advance(id);
            previous = Some(id);
            if let Some(outlined) = font.outline_glyph(glyph)
                && glyph_rect(&outlined).intersect(clip).area() > 0.0
            {
                outlines.push(outlined);
            }
        }

        // one cell of margin keeps bilinear sampling exact at the clip edge
        let region = outlines
            .iter()
            .map(glyph_rect)
            .reduce(|a, b| a.union(b))?
            .intersect(clip.inflate(1.0, 1.0));
        let x0 = region.x0.floor() as i64;
        let y0 = region.y0.floor() as i64;
        let width = (region.x1.ceil() as i64 - x0).max(0) as usize;
        let height = (region.y1.ceil() as i64 - y0).max(0) as usize;
        if width == 0 || height == 0 {
            return None;
        }

        let mut data = vec![0.0f32; width * height];
        for outlined in &outlines {
            let bounds = outlined.px_bounds();
            let ox = bounds.min.x.floor() as i64 - x0;
            let oy = bounds.min.y.floor() as i64 - y0;
            outlined.draw(|gx, gy, c| {
                let cx = ox + i64::from(gx);
                let cy = oy + i64::from(gy);
                if cx < 0 || cy < 0 || cx as usize >= width || cy as usize >= height {
                    return;
                }
                let cell = &mut data[cy as usize * width + cx as usize];
                *cell = (*cell + c).min(1.0);
            });
        }

        Some(Self {
            x0,
            y0,
            width,
            height,
            data,
        })
    }

    fn bounds(&self) -> Rect {
        Rect::new(
            self.x0 as f64,
            self.y0 as f64,
            (self.x0 + self.width as i64) as f64,
            (self.y0 + self.height as i64) as f64,
        )
    }

    fn cell(&self, i: i64, j: i64) -> f32 {
        if i < 0 || j < 0 || i as usize >= self.width || j as usize >= self.height {
            return 0.0;
        }
        self.data[j as usize * self.width + i as usize]
    }

    /// Bilinear coverage at a continuous point; zero outside the run.
    fn sample(&self, x: f64, y: f64) -> f32 {
        let fx = x - self.x0 as f64 - 0.5;
        let fy = y - self.y0 as f64 - 0.5;
        let (ix, iy) = (fx.floor(), fy.floor());
        let (tx, ty) = ((fx - ix) as f32, (fy - iy) as f32);
        let (i, j) = (ix as i64, iy as i64);

        let top = self.cell(i, j) * (1.0 - tx) + self.cell(i + 1, j) * tx;
        let bottom = self.cell(i, j + 1) * (1.0 - tx) + self.cell(i + 1, j + 1) * tx;
        top * (1.0 - ty) + bottom * ty
    }

    /// Device-space layer filled with `fill`, clipped to `clip`.
    fn resample(
        &self,
        to_device: Affine,
        fill: Paint,
        clip: Rect,
    ) -> Option<(RgbaImage, (i64, i64))> {
        let (x0, y0, w, h) =
            device_box(to_device.transform_rect_bbox(self.bounds()).intersect(clip))?;
        let inverse = to_device.inverse();
        let ink = fill.to_rgba();
        let alpha = f32::from(ink[3]);

        let layer = RgbaImage::from_fn(w, h, |px, py| {
            let src = inverse * pixel_center(x0, y0, px, py);
            let coverage = self.sample(src.x, src.y);
            if coverage <= 0.0 {
                return Rgba([0, 0, 0, 0]);
            }
            let mut out = ink;
            out.0[3] = (alpha * coverage).round().clamp(0.0, 255.0) as u8;
            out
        });
        Some((layer, (x0, y0)))
    }
}

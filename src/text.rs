//! Styled text rendering against a [`DrawingSurface`].
//!
//! [`render_text`] issues its surface calls in a fixed order: font, fill,
//! alignment, shadow, anchor-pivoted transform, glyph placement, restore,
//! shadow reset. The individual steps are public so hosts can drive a surface
//! the same way piecemeal.

use kurbo::Point;
use log::debug;

use crate::style::{Paint, Rgb, TextStyle};
use crate::surface::{
    DrawingSurface, FontDescriptor, SavedFrame, Shadow, TextAlign, TextBaseline,
};

/// Canvas width at which `text_size` is used unscaled.
pub const REFERENCE_CANVAS_WIDTH: f64 = 512.0;

/// Line advance as a multiple of the effective text size.
pub const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// How each line of a multi-line block is centered on the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum LineCentering {
    /// Every line is centered on the anchor by its own glyph extent.
    #[default]
    Independent,
    /// Each line is drawn from the anchor, then the frame shifts left by half
    /// the line's advance; the shifts accumulate over the block.
    Cumulative,
}

/// Extra advance added while walking a line.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Spacing {
    /// Added after every glyph.
    pub letter: f64,
    /// Added after every word separator.
    pub word: f64,
}

impl Spacing {
    pub fn new(letter: f64, word: f64) -> Self {
        Self { letter, word }
    }
}

/// Text size scaled to the canvas width.
pub fn effective_text_size(text_size: f64, canvas_width: f64) -> f64 {
    text_size * canvas_width / REFERENCE_CANVAS_WIDTH
}

pub fn set_font<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    family: &str,
    text_size: f64,
    canvas_width: f64,
) {
    surface.set_font(FontDescriptor::bold(
        family,
        effective_text_size(text_size, canvas_width),
    ));
}

pub fn set_text_color<S: DrawingSurface + ?Sized>(surface: &mut S, color: Rgb, opacity: f64) {
    surface.set_fill(Paint::with_opacity(color, opacity));
}

/// Glyphs are centered horizontally and vertically on their draw point.
pub fn set_text_alignment<S: DrawingSurface + ?Sized>(surface: &mut S) {
    surface.set_text_align(TextAlign::Center, TextBaseline::Middle);
}

pub fn set_shadow<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    color: Rgb,
    opacity: f64,
    blur: f64,
    offset_x: f64,
    offset_y: f64,
) {
    surface.set_shadow(Shadow {
        paint: Paint::with_opacity(color, opacity),
        blur,
        offset_x,
        offset_y,
    });
}

/// Clear shadow blur and color so later draws cast no shadow.
pub fn reset_shadow<S: DrawingSurface + ?Sized>(surface: &mut S) {
    let current = surface.paint_state().shadow;
    surface.set_shadow(Shadow {
        paint: Paint::TRANSPARENT,
        blur: 0.0,
        ..current
    });
}

/// Anchor point from percentages of the canvas size.
pub fn calculate_position(
    canvas_width: f64,
    canvas_height: f64,
    position_x: f64,
    position_y: f64,
) -> Point {
    Point::new(
        canvas_width * position_x / 100.0,
        canvas_height * position_y / 100.0,
    )
}

/// Save the frame, then rotate (degrees) and scale (percent) about `anchor`.
///
/// The returned guard restores the frame when dropped.
pub fn apply_transformations<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    anchor: Point,
    rotation: f64,
    scale_x: f64,
    scale_y: f64,
) -> SavedFrame<'_, S> {
    let mut frame = SavedFrame::new(surface);
    frame.translate(anchor.x, anchor.y);
    frame.rotate(rotation.to_radians());
    frame.scale(scale_x / 100.0, scale_y / 100.0);
    frame.translate(-anchor.x, -anchor.y);
    frame
}

pub fn restore_context<S: DrawingSurface + ?Sized>(frame: SavedFrame<'_, S>) {
    frame.restore();
}

/// One glyph placed on a line, with its measured advance.
#[derive(Debug, Clone, PartialEq)]
struct PlacedGlyph {
    ch: char,
    x: f64,
    width: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct LineLayout {
    glyphs: Vec<PlacedGlyph>,
    /// Distance from the start x to the caret after the last word.
    advance: f64,
}

impl LineLayout {
    /// Midpoint of the inked extent of center-aligned glyphs.
    fn visual_center(&self) -> Option<f64> {
        let mut glyphs = self.glyphs.iter();
        let first = glyphs.next()?;
        let mut left = first.x - first.width / 2.0;
        let mut right = first.x + first.width / 2.0;
        for glyph in glyphs {
            left = left.min(glyph.x - glyph.width / 2.0);
            right = right.max(glyph.x + glyph.width / 2.0);
        }
        Some((left + right) / 2.0)
    }
}

fn char_str(ch: char, buf: &mut [u8; 4]) -> &str {
    ch.encode_utf8(buf)
}

/// Walk `line` from `x`: glyph by glyph within words, separator between words.
fn layout_line<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    line: &str,
    x: f64,
    spacing: Spacing,
) -> LineLayout {
    let space_width = surface.measure_text(" ") + spacing.word;
    let mut buf = [0u8; 4];
    let mut layout = LineLayout::default();
    let mut caret = x;

    let mut words = line.split(' ').peekable();
    while let Some(word) = words.next() {
        let mut word_width = 0.0;
        for ch in word.chars() {
            let width = surface.measure_text(char_str(ch, &mut buf));
            layout.glyphs.push(PlacedGlyph {
                ch,
                x: caret + word_width,
                width,
            });
            word_width += width + spacing.letter;
        }
        caret += word_width;
        if words.peek().is_some() {
            caret += space_width;
        }
    }
    layout.advance = caret - x;
    layout
}

fn fill_glyphs<S: DrawingSurface + ?Sized>(surface: &mut S, glyphs: &[PlacedGlyph], y: f64) {
    let mut buf = [0u8; 4];
    for glyph in glyphs {
        surface.fill_text(char_str(glyph.ch, &mut buf), glyph.x, y);
    }
}

/// Split `text` into lines, a trailing carriage return dropped from each.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
}

/// Draw `text` one glyph at a time around `(x, y)`.
///
/// Lines are stacked `LINE_HEIGHT_FACTOR * text_size` apart and the block is
/// vertically centered on `y`. Horizontal centering follows `centering`.
pub fn draw_text_with_spacing<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    text: &str,
    x: f64,
    y: f64,
    spacing: Spacing,
    text_size: f64,
    centering: LineCentering,
) {
    let line_height = text_size * LINE_HEIGHT_FACTOR;
    let line_count = split_lines(text).count();
    let middle = (line_count as f64 - 1.0) / 2.0;

    for (index, line) in split_lines(text).enumerate() {
        let line_y = y + (index as f64 - middle) * line_height;
        let layout = layout_line(surface, line, x, spacing);

        match centering {
            LineCentering::Independent => {
                let Some(center) = layout.visual_center() else {
                    continue;
                };
                let mut frame = SavedFrame::new(&mut *surface);
                frame.translate(x - center, 0.0);
                fill_glyphs(&mut *frame, &layout.glyphs, line_y);
            }
            LineCentering::Cumulative => {
                fill_glyphs(surface, &layout.glyphs, line_y);
                surface.translate(-layout.advance / 2.0, 0.0);
            }
        }
    }
}

/// Render `style` onto `surface` sized `canvas_width` x `canvas_height`.
///
/// Style values are clamped into range first (see [`TextStyle::validated`]).
/// The surface's save depth and transform are unchanged on return and its
/// shadow is cleared.
pub fn render_text<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    style: &TextStyle,
    canvas_width: u32,
    canvas_height: u32,
    centering: LineCentering,
) {
    let style = &style.validated();
    let (width, height) = (f64::from(canvas_width), f64::from(canvas_height));
    let text_size = effective_text_size(style.text_size, width);
    debug!(
        family = style.font_family.as_str(),
        size = text_size,
        lines = split_lines(&style.text).count();
        "Rendering text"
    );

    set_font(surface, &style.font_family, style.text_size, width);
    set_text_color(surface, style.text_color, style.text_opacity);
    set_text_alignment(surface);
    set_shadow(
        surface,
        style.shadow_color,
        style.shadow_opacity,
        style.shadow_blur,
        style.shadow_offset_x,
        style.shadow_offset_y,
    );

    let anchor = calculate_position(width, height, style.position_x, style.position_y);
    let mut frame =
        apply_transformations(surface, anchor, style.rotation, style.scale_x, style.scale_y);
    draw_text_with_spacing(
        &mut *frame,
        &style.text,
        anchor.x,
        anchor.y,
        Spacing::new(style.letter_spacing, style.word_spacing),
        text_size,
        centering,
    );
    restore_context(frame);

    reset_shadow(surface);
}

//! 2D drawing surfaces.
//!
//! A [`DrawingSurface`] carries an explicit paint state (font, fill, alignment,
//! shadow) and a current transform. Both are changed only through the setter
//! and transform methods, and `save`/`restore` push and pop them together.
//! Drawing operations read the state at the moment they are issued.

use std::fmt;
use std::ops::{Deref, DerefMut};

use image::RgbaImage;
use kurbo::{Affine, Point};

use crate::style::Paint;

pub mod raster;
pub mod recording;

/// Horizontal placement of a text run relative to its x coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Start,
    Center,
}

/// Vertical placement of a text run relative to its y coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextBaseline {
    #[default]
    Alphabetic,
    Middle,
}

/// Font request: family name, pixel size, weight.
#[derive(Debug, Clone, PartialEq)]
pub struct FontDescriptor {
    pub family: String,
    pub size: f64,
    pub bold: bool,
}

impl FontDescriptor {
    pub fn bold(family: impl Into<String>, size: f64) -> Self {
        Self {
            family: family.into(),
            size,
            bold: true,
        }
    }
}

impl Default for FontDescriptor {
    fn default() -> Self {
        Self {
            family: "sans-serif".to_string(),
            size: 10.0,
            bold: false,
        }
    }
}

impl fmt::Display for FontDescriptor {
    /// CSS shorthand form, e.g. `bold 128px Arial`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bold {
            write!(f, "bold ")?;
        }
        write!(f, "{}px {}", self.size, self.family)
    }
}

/// Drop shadow cast by every subsequent fill or image draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub paint: Paint,
    pub blur: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Shadow {
    pub const NONE: Self = Self {
        paint: Paint::TRANSPARENT,
        blur: 0.0,
        offset_x: 0.0,
        offset_y: 0.0,
    };

    /// A shadow is only drawn when it is visible and displaced or blurred.
    pub fn is_active(&self) -> bool {
        !self.paint.is_transparent()
            && (self.blur > 0.0 || self.offset_x != 0.0 || self.offset_y != 0.0)
    }
}

impl Default for Shadow {
    fn default() -> Self {
        Self::NONE
    }
}

/// Everything a draw call reads besides its own arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct PaintState {
    pub font: FontDescriptor,
    pub fill: Paint,
    pub align: TextAlign,
    pub baseline: TextBaseline,
    pub shadow: Shadow,
}

impl Default for PaintState {
    fn default() -> Self {
        Self {
            font: FontDescriptor::default(),
            fill: Paint::new(crate::style::Rgb::BLACK, 255),
            align: TextAlign::default(),
            baseline: TextBaseline::default(),
            shadow: Shadow::NONE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Frame {
    transform: Affine,
    paint: PaintState,
}

/// Current paint state and transform plus the saved frames beneath them.
#[derive(Debug, Clone)]
pub struct StateStack {
    current: Frame,
    saved: Vec<Frame>,
}

impl StateStack {
    pub fn new() -> Self {
        Self {
            current: Frame {
                transform: Affine::IDENTITY,
                paint: PaintState::default(),
            },
            saved: Vec::new(),
        }
    }

    pub fn paint(&self) -> &PaintState {
        &self.current.paint
    }

    pub fn paint_mut(&mut self) -> &mut PaintState {
        &mut self.current.paint
    }

    pub fn transform(&self) -> Affine {
        self.current.transform
    }

    /// Post-multiply the current transform, as canvas transforms compose.
    pub fn concat(&mut self, affine: Affine) {
        self.current.transform *= affine;
    }

    pub fn push(&mut self) {
        self.saved.push(self.current.clone());
    }

    /// Pop the last saved frame. Popping an empty stack is a no-op.
    pub fn pop(&mut self) {
        if let Some(frame) = self.saved.pop() {
            self.current = frame;
        }
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }
}

impl Default for StateStack {
    fn default() -> Self {
        Self::new()
    }
}

/// A raster-backed (or recording) 2D drawing target.
///
/// Implementors provide the state stack and the three primitive operations;
/// state setters and transforms have default implementations on top of it.
pub trait DrawingSurface {
    fn state(&self) -> &StateStack;
    fn state_mut(&mut self) -> &mut StateStack;

    /// Advance width of `text` in user-space units with the current font.
    fn measure_text(&mut self, text: &str) -> f64;

    /// Fill `text` at `(x, y)` in user space with the current paint state.
    fn fill_text(&mut self, text: &str, x: f64, y: f64);

    /// Draw `image` with its top-left corner at `(x, y)` in user space.
    fn draw_image(&mut self, image: &RgbaImage, x: f64, y: f64);

    fn paint_state(&self) -> &PaintState {
        self.state().paint()
    }

    fn transform(&self) -> Affine {
        self.state().transform()
    }

    fn save_depth(&self) -> usize {
        self.state().depth()
    }

    fn set_font(&mut self, font: FontDescriptor) {
        self.state_mut().paint_mut().font = font;
    }

    fn set_fill(&mut self, paint: Paint) {
        self.state_mut().paint_mut().fill = paint;
    }

    fn set_text_align(&mut self, align: TextAlign, baseline: TextBaseline) {
        let paint = self.state_mut().paint_mut();
        paint.align = align;
        paint.baseline = baseline;
    }

    fn set_shadow(&mut self, shadow: Shadow) {
        self.state_mut().paint_mut().shadow = shadow;
    }

    fn save(&mut self) {
        self.state_mut().push();
    }

    fn restore(&mut self) {
        self.state_mut().pop();
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.state_mut().concat(Affine::translate((dx, dy)));
    }

    /// Rotate by `radians`, clockwise on a y-down surface.
    fn rotate(&mut self, radians: f64) {
        self.state_mut().concat(Affine::rotate(radians));
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.state_mut().concat(Affine::scale_non_uniform(sx, sy));
    }

    /// Map a user-space point to device pixels.
    fn to_device(&self, x: f64, y: f64) -> Point {
        self.transform() * Point::new(x, y)
    }
}

/// A saved frame that is restored when dropped.
///
/// Dereferences to the surface, so drawing continues through the guard.
pub struct SavedFrame<'a, S: DrawingSurface + ?Sized> {
    surface: &'a mut S,
}

impl<'a, S: DrawingSurface + ?Sized> SavedFrame<'a, S> {
    pub fn new(surface: &'a mut S) -> Self {
        surface.save();
        Self { surface }
    }

    /// Restore now instead of at end of scope.
    pub fn restore(self) {}
}

impl<S: DrawingSurface + ?Sized> Deref for SavedFrame<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.surface
    }
}

impl<S: DrawingSurface + ?Sized> DerefMut for SavedFrame<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.surface
    }
}

impl<S: DrawingSurface + ?Sized> Drop for SavedFrame<'_, S> {
    fn drop(&mut self) {
        self.surface.restore();
    }
}

impl<S: DrawingSurface + ?Sized> fmt::Debug for SavedFrame<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SavedFrame")
            .field("depth", &self.surface.save_depth())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Rgb;
    use crate::surface::recording::RecordingSurface;

    #[test]
    fn font_descriptor_css_form() {
        assert_eq!(FontDescriptor::bold("Arial", 128.0).to_string(), "bold 128px Arial");
        assert_eq!(FontDescriptor::bold("Arial", 125.0).to_string(), "bold 125px Arial");
        assert_eq!(FontDescriptor::bold("Impact", 12.5).to_string(), "bold 12.5px Impact");
    }

    #[test]
    fn shadow_activity() {
        assert!(!Shadow::NONE.is_active());
        let visible = Paint::new(Rgb::BLACK, 128);
        let still = Shadow {
            paint: visible,
            ..Shadow::NONE
        };
        assert!(!still.is_active());
        let blurred = Shadow {
            paint: visible,
            blur: 2.0,
            ..Shadow::NONE
        };
        assert!(blurred.is_active());
    }

    #[test]
    fn save_restore_round_trips_transform_and_paint() {
        let mut surface = RecordingSurface::new();
        surface.set_fill(Paint::new(Rgb::WHITE, 255));
        surface.save();
        surface.translate(10.0, 5.0);
        surface.set_fill(Paint::new(Rgb::BLACK, 1));
        surface.restore();

        assert_eq!(surface.transform(), Affine::IDENTITY);
        assert_eq!(surface.paint_state().fill, Paint::new(Rgb::WHITE, 255));
        assert_eq!(surface.save_depth(), 0);
    }

    #[test]
    fn restore_on_empty_stack_is_noop() {
        let mut surface = RecordingSurface::new();
        surface.translate(3.0, 4.0);
        surface.restore();
        assert_eq!(surface.to_device(0.0, 0.0), Point::new(3.0, 4.0));
    }

    #[test]
    fn transforms_compose_like_canvas() {
        let mut surface = RecordingSurface::new();
        surface.translate(50.0, 50.0);
        surface.scale(2.0, 3.0);
        let p = surface.to_device(1.0, 1.0);
        assert!((p.x - 52.0).abs() < 1e-9);
        assert!((p.y - 53.0).abs() < 1e-9);
    }

    #[test]
    fn rotation_is_clockwise_on_y_down() {
        let mut surface = RecordingSurface::new();
        surface.rotate(std::f64::consts::FRAC_PI_2);
        let p = surface.to_device(1.0, 0.0);
        assert!(p.x.abs() < 1e-9);
        assert!((p.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn saved_frame_restores_on_drop() {
        let mut surface = RecordingSurface::new();
        {
            let mut frame = SavedFrame::new(&mut surface);
            frame.translate(5.0, 5.0);
            assert_eq!(frame.save_depth(), 1);
        }
        assert_eq!(surface.save_depth(), 0);
        assert_eq!(surface.transform(), Affine::IDENTITY);
    }
}

//! A surface that records draw calls instead of rasterizing them.
//!
//! Hosts that rasterize with their own 2D backend can replay the command list;
//! the text layout code is tested against it.

use image::RgbaImage;
use kurbo::{Affine, Point};

use crate::style::Paint;

use super::{DrawingSurface, FontDescriptor, Shadow, StateStack, TextAlign, TextBaseline};

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    SetFont(FontDescriptor),
    SetFill(Paint),
    SetTextAlign(TextAlign, TextBaseline),
    SetShadow(Shadow),
    Save,
    Restore,
    Translate { dx: f64, dy: f64 },
    Rotate { radians: f64 },
    Scale { sx: f64, sy: f64 },
    FillText(TextDraw),
    DrawImage {
        width: u32,
        height: u32,
        x: f64,
        y: f64,
        transform: Affine,
        shadow: Shadow,
    },
}

/// A recorded `fill_text` call with the state it was issued under.
#[derive(Debug, Clone, PartialEq)]
pub struct TextDraw {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub transform: Affine,
    pub font: FontDescriptor,
    pub fill: Paint,
    pub shadow: Shadow,
    pub align: TextAlign,
    pub baseline: TextBaseline,
}

impl TextDraw {
    /// Where the text's anchor point lands on the device.
    pub fn device_position(&self) -> Point {
        self.transform * Point::new(self.x, self.y)
    }
}

/// Records every call; measures each character as a fixed advance.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    advance: f64,
    state: StateStack,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self {
            advance: 10.0,
            state: StateStack::new(),
            commands: Vec::new(),
        }
    }

    /// Set the width reported for every character.
    pub fn with_advance(mut self, advance: f64) -> Self {
        self.advance = advance;
        self
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<DrawCommand> {
        self.commands
    }

    /// Only the text draws, in issue order.
    pub fn text_draws(&self) -> impl Iterator<Item = &TextDraw> {
        self.commands.iter().filter_map(|cmd| match cmd {
            DrawCommand::FillText(draw) => Some(draw),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawingSurface for RecordingSurface {
    fn state(&self) -> &StateStack {
        &self.state
    }

    fn state_mut(&mut self) -> &mut StateStack {
        &mut self.state
    }

    fn measure_text(&mut self, text: &str) -> f64 {
        self.advance * text.chars().count() as f64
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        let paint = self.state.paint();
        let draw = TextDraw {
            text: text.to_string(),
            x,
            y,
            transform: self.state.transform(),
            font: paint.font.clone(),
            fill: paint.fill,
            shadow: paint.shadow,
            align: paint.align,
            baseline: paint.baseline,
        };
        self.commands.push(DrawCommand::FillText(draw));
    }

    fn draw_image(&mut self, image: &RgbaImage, x: f64, y: f64) {
        self.commands.push(DrawCommand::DrawImage {
            width: image.width(),
            height: image.height(),
            x,
            y,
            transform: self.state.transform(),
            shadow: self.state.paint().shadow,
        });
    }

    fn set_font(&mut self, font: FontDescriptor) {
        self.commands.push(DrawCommand::SetFont(font.clone()));
        self.state.paint_mut().font = font;
    }

    fn set_fill(&mut self, paint: Paint) {
        self.commands.push(DrawCommand::SetFill(paint));
        self.state.paint_mut().fill = paint;
    }

    fn set_text_align(&mut self, align: TextAlign, baseline: TextBaseline) {
        self.commands.push(DrawCommand::SetTextAlign(align, baseline));
        let paint = self.state.paint_mut();
        paint.align = align;
        paint.baseline = baseline;
    }

    fn set_shadow(&mut self, shadow: Shadow) {
        self.commands.push(DrawCommand::SetShadow(shadow));
        self.state.paint_mut().shadow = shadow;
    }

    fn save(&mut self) {
        self.commands.push(DrawCommand::Save);
        self.state.push();
    }

    fn restore(&mut self) {
        self.commands.push(DrawCommand::Restore);
        self.state.pop();
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.commands.push(DrawCommand::Translate { dx, dy });
        self.state.concat(Affine::translate((dx, dy)));
    }

    fn rotate(&mut self, radians: f64) {
        self.commands.push(DrawCommand::Rotate { radians });
        self.state.concat(Affine::rotate(radians));
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.commands.push(DrawCommand::Scale { sx, sy });
        self.state.concat(Affine::scale_non_uniform(sx, sy));
    }
}

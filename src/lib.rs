pub mod background;
pub mod blend;
pub mod config;
pub mod cutout;
pub mod error;
pub mod export;
pub mod font;
pub mod foreground;
pub mod mask;
pub mod pipeline;
pub mod style;
pub mod surface;
pub mod text;

pub use background::extract_background;
pub use config::{CompositionSettings, FontSettings, MaskOptions};
pub use cutout::{MatteCutout, PrecomputedCutout, RgbaCutout, SubjectCutout};
pub use error::{BacktextError, BacktextResult};
pub use font::FontBook;
pub use mask::{MaskSet, PixelIndex, compute_mask};
pub use pipeline::{compose, compose_onto};
pub use style::{Paint, Rgb, TextStyle};
pub use surface::DrawingSurface;
pub use surface::raster::RasterSurface;
pub use surface::recording::RecordingSurface;
pub use text::{LineCentering, render_text};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{GrayImage, RgbaImage};
use log::debug;

/// Environment variable naming an extra font directory for the CLI.
pub const ENV_FONT_DIR: &str = "BACKTEXT_FONT_DIR";

/// Entry point for configuring and running compositions.
#[derive(Debug, Clone)]
pub struct Backtext {
    settings: CompositionSettings,
    /// Shared by every composition built from this instance.
    fonts: Arc<FontBook>,
}

impl Backtext {
    pub fn new(fonts: FontBook) -> Self {
        Self {
            settings: CompositionSettings::default(),
            fonts: Arc::new(fonts),
        }
    }

    /// Build with a font book loaded from `settings`.
    pub fn with_font_settings(settings: &FontSettings) -> Self {
        Self::new(FontBook::load(settings))
    }

    /// Replace all composition settings.
    pub fn with_settings(mut self, settings: CompositionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Draw the background with the subject cut out instead of the original.
    pub fn with_subtract_background(mut self, enabled: bool) -> Self {
        self.settings.subtract_background = enabled;
        self
    }

    /// Set the dilation radius of the subject mask.
    pub fn with_mask_margin(mut self, margin: u32) -> Self {
        self.settings.mask = MaskOptions::new(margin);
        self
    }

    /// Set how multi-line text is centered.
    pub fn with_line_centering(mut self, line_centering: LineCentering) -> Self {
        self.settings.line_centering = line_centering;
        self
    }

    pub fn settings(&self) -> &CompositionSettings {
        &self.settings
    }

    pub fn fonts(&self) -> &FontBook {
        self.fonts.as_ref()
    }

    /// Load an image and isolate its subject, returning both layers.
    ///
    /// Any load or cutout failure aborts before a composition can start.
    pub fn for_image<C: SubjectCutout + ?Sized>(
        &self,
        image_path: impl AsRef<Path>,
        cutout: &C,
    ) -> BacktextResult<LayeredImage> {
        let image_path = image_path.as_ref();
        debug!(path:? = image_path; "Loading original");
        let original = image::open(image_path)?.into_rgba8();
        let foreground = cutout.cutout(&original)?;
        self.for_layers(original, foreground)
    }

    /// Use already decoded layers. They must have the same dimensions.
    pub fn for_layers(
        &self,
        original: RgbaImage,
        foreground: RgbaImage,
    ) -> BacktextResult<LayeredImage> {
        let expected = original.dimensions();
        let found = foreground.dimensions();
        if expected != found {
            return Err(BacktextError::DimensionMismatch { expected, found });
        }
        Ok(LayeredImage {
            original: Arc::new(original),
            foreground: Arc::new(foreground),
            settings: self.settings.clone(),
            fonts: Arc::clone(&self.fonts),
        })
    }
}

/// An original image and its subject cutout, from which every output is derived.
#[derive(Debug, Clone)]
pub struct LayeredImage {
    original: Arc<RgbaImage>,
    foreground: Arc<RgbaImage>,
    settings: CompositionSettings,
    fonts: Arc<FontBook>,
}

impl LayeredImage {
    pub fn original(&self) -> &RgbaImage {
        self.original.as_ref()
    }

    pub fn foreground(&self) -> &RgbaImage {
        self.foreground.as_ref()
    }

    pub fn settings(&self) -> &CompositionSettings {
        &self.settings
    }

    /// Subject mask dilated by the configured margin.
    pub fn mask(&self) -> MaskHandle {
        self.mask_with_margin(self.settings.mask.margin)
    }

    /// Subject mask dilated by `margin`.
    pub fn mask_with_margin(&self, margin: u32) -> MaskHandle {
        MaskHandle {
            mask: compute_mask(self.foreground.as_ref(), margin),
        }
    }

    /// The original with the (dilated) subject made transparent.
    pub fn background(&self) -> BacktextResult<RasterHandle> {
        let mask = self.mask();
        let image = extract_background(self.original.as_ref(), mask.mask())?;
        Ok(RasterHandle { image })
    }

    /// Render `style` behind the subject.
    pub fn compose(&self, style: &TextStyle) -> BacktextResult<RasterHandle> {
        let image = compose(
            self.original.as_ref(),
            self.foreground.as_ref(),
            style,
            &self.settings,
            Arc::clone(&self.fonts),
        )?;
        Ok(RasterHandle { image })
    }
}

/// A computed subject mask.
#[derive(Debug, Clone)]
pub struct MaskHandle {
    mask: MaskSet,
}

impl MaskHandle {
    pub fn mask(&self) -> &MaskSet {
        &self.mask
    }

    pub fn into_mask(self) -> MaskSet {
        self.mask
    }

    /// Grayscale rendering: 255 inside the mask, 0 outside.
    pub fn to_image(&self) -> GrayImage {
        self.mask.to_gray_image()
    }

    /// Save the grayscale rendering as a PNG.
    pub fn save(&self, path: impl AsRef<Path>) -> BacktextResult<()> {
        self.to_image().save(path)?;
        Ok(())
    }
}

/// An RGBA result ready for export.
#[derive(Debug, Clone)]
pub struct RasterHandle {
    image: RgbaImage,
}

impl RasterHandle {
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Save as a PNG at `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> BacktextResult<()> {
        export::save_png(&self.image, path)
    }

    /// Save as a PNG in `dir` under a content-derived name; returns the path.
    pub fn save_unique(&self, dir: impl AsRef<Path>, prefix: &str) -> BacktextResult<PathBuf> {
        export::save_png_unique(&self.image, dir, prefix)
    }

    pub fn encode_png(&self) -> BacktextResult<Vec<u8>> {
        export::encode_png(&self.image)
    }
}

use std::path::PathBuf;

use crate::text::LineCentering;

/// Options for deriving a subject mask from a foreground cutout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskOptions {
    /// Chebyshev dilation radius in pixels.
    pub margin: u32,
}

impl MaskOptions {
    pub fn new(margin: u32) -> Self {
        Self { margin }
    }

    /// Build options from a signed margin, using its magnitude as the radius.
    pub fn from_signed(margin: i64) -> Self {
        Self {
            margin: u32::try_from(margin.unsigned_abs()).unwrap_or(u32::MAX),
        }
    }
}

impl Default for MaskOptions {
    fn default() -> Self {
        Self { margin: 20 }
    }
}

/// Where the font book looks for faces.
#[derive(Debug, Clone)]
pub struct FontSettings {
    /// Load the fonts installed on the host system.
    pub load_system_fonts: bool,
    /// Extra directories scanned recursively for font files.
    pub font_dirs: Vec<PathBuf>,
    /// Extra individual font files.
    pub font_files: Vec<PathBuf>,
}

impl FontSettings {
    /// Add a directory to scan for fonts.
    pub fn with_font_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.font_dirs.push(dir.into());
        self
    }

    /// Add a single font file.
    pub fn with_font_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.font_files.push(file.into());
        self
    }

    /// Enable or disable loading system fonts.
    pub fn with_system_fonts(mut self, load: bool) -> Self {
        self.load_system_fonts = load;
        self
    }
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            load_system_fonts: true,
            font_dirs: Vec::new(),
            font_files: Vec::new(),
        }
    }
}

/// Settings for a composition run.
#[derive(Debug, Clone, Default)]
pub struct CompositionSettings {
    /// Draw the extracted background (subject removed) instead of the original.
    pub subtract_background: bool,
    /// Mask derivation used when `subtract_background` is set.
    pub mask: MaskOptions,
    /// How multi-line text is centered on the anchor.
    pub line_centering: LineCentering,
}

impl CompositionSettings {
    /// Enable or disable background subtraction.
    pub fn with_subtract_background(mut self, enabled: bool) -> Self {
        self.subtract_background = enabled;
        self
    }

    /// Set the mask options used for background subtraction.
    pub fn with_mask(mut self, mask: MaskOptions) -> Self {
        self.mask = mask;
        self
    }

    /// Set the line centering mode.
    pub fn with_line_centering(mut self, line_centering: LineCentering) -> Self {
        self.line_centering = line_centering;
        self
    }
}

use std::fmt;
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;
use std::str::FromStr;

use image::Rgba;
use log::warn;
use serde::Deserialize;

use crate::{BacktextError, BacktextResult};

/// Font families offered to users. Other names are accepted but may fall back
/// to the surface's default face.
pub const FONT_OPTIONS: [&str; 6] = [
    "Arial",
    "Times New Roman",
    "Helvetica",
    "Georgia",
    "Verdana",
    "Impact",
];

pub const TEXT_SIZE_RANGE: RangeInclusive<f64> = 32.0..=256.0;
pub const POSITION_RANGE: RangeInclusive<f64> = 0.0..=100.0;
pub const OPACITY_RANGE: RangeInclusive<f64> = 0.0..=100.0;
pub const ROTATION_RANGE: RangeInclusive<f64> = -180.0..=180.0;
pub const SCALE_RANGE: RangeInclusive<f64> = 1.0..=300.0;
pub const LETTER_SPACING_RANGE: RangeInclusive<f64> = -20.0..=100.0;
pub const WORD_SPACING_RANGE: RangeInclusive<f64> = 0.0..=100.0;
pub const SHADOW_BLUR_RANGE: RangeInclusive<f64> = 0.0..=50.0;
pub const SHADOW_OFFSET_RANGE: RangeInclusive<f64> = -50.0..=50.0;

/// Map a 0-100 opacity percentage to an 8-bit alpha: `round(opacity * 2.55)`.
///
/// The product is computed in `f64`, so 50% gives `127.49999999999999` and
/// rounds to 127 (`0x7F`).
pub fn opacity_to_alpha(opacity: f64) -> u8 {
    let scaled = (opacity * 2.55).round();
    if scaled.is_nan() {
        return 0;
    }
    scaled.clamp(0.0, 255.0) as u8
}

/// An opaque sRGB color parsed from `#RRGGBB` or `#RGB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const WHITE: Self = Self([255, 255, 255]);
    pub const BLACK: Self = Self([0, 0, 0]);
}

impl FromStr for Rgb {
    type Err = BacktextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BacktextError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
        match hex.len() {
            6 => Ok(Self([
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            ])),
            3 => {
                let short = |i: usize| channel(&hex[i..=i]).map(|v| v * 17);
                Ok(Self([short(0)?, short(1)?, short(2)?]))
            }
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Rgb {
    type Error = BacktextError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02X}{g:02X}{b:02X}")
    }
}

/// A color plus 8-bit alpha, as applied to fills and shadows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paint {
    pub rgb: Rgb,
    pub alpha: u8,
}

impl Paint {
    pub const TRANSPARENT: Self = Self {
        rgb: Rgb::BLACK,
        alpha: 0,
    };

    pub fn new(rgb: Rgb, alpha: u8) -> Self {
        Self { rgb, alpha }
    }

    /// Color with the alpha derived from a 0-100 opacity percentage.
    pub fn with_opacity(rgb: Rgb, opacity: f64) -> Self {
        Self::new(rgb, opacity_to_alpha(opacity))
    }

    pub fn is_transparent(&self) -> bool {
        self.alpha == 0
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        let [r, g, b] = self.rgb.0;
        Rgba([r, g, b, self.alpha])
    }
}

impl fmt::Display for Paint {
    /// Formats as `#RRGGBBAA`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:02X}", self.rgb, self.alpha)
    }
}

/// Every parameter of the text layer.
///
/// Keys may be written in `snake_case` or `camelCase` in style files; missing
/// keys take the defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextStyle {
    pub text: String,
    #[serde(alias = "textSize")]
    pub text_size: f64,
    #[serde(alias = "fontFamily")]
    pub font_family: String,
    #[serde(alias = "textColor")]
    pub text_color: Rgb,
    #[serde(alias = "textOpacity")]
    pub text_opacity: f64,
    #[serde(alias = "positionX")]
    pub position_x: f64,
    #[serde(alias = "positionY")]
    pub position_y: f64,
    pub rotation: f64,
    #[serde(alias = "scaleX")]
    pub scale_x: f64,
    #[serde(alias = "scaleY")]
    pub scale_y: f64,
    #[serde(alias = "letterSpacing")]
    pub letter_spacing: f64,
    #[serde(alias = "wordSpacing")]
    pub word_spacing: f64,
    #[serde(alias = "shadowColor")]
    pub shadow_color: Rgb,
    #[serde(alias = "shadowOpacity")]
    pub shadow_opacity: f64,
    #[serde(alias = "shadowBlur")]
    pub shadow_blur: f64,
    #[serde(alias = "shadowOffsetX")]
    pub shadow_offset_x: f64,
    #[serde(alias = "shadowOffsetY")]
    pub shadow_offset_y: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            text: "YOUR TEXT HERE".to_string(),
            text_size: 64.0,
            font_family: "Arial".to_string(),
            text_color: Rgb::WHITE,
            text_opacity: 100.0,
            position_x: 50.0,
            position_y: 50.0,
            rotation: 0.0,
            scale_x: 100.0,
            scale_y: 100.0,
            letter_spacing: 0.0,
            word_spacing: 0.0,
            shadow_color: Rgb::BLACK,
            shadow_opacity: 50.0,
            shadow_blur: 4.0,
            shadow_offset_x: 4.0,
            shadow_offset_y: 4.0,
        }
    }
}

impl TextStyle {
    /// Parse a style from TOML text.
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Load a style file.
    pub fn load(path: impl AsRef<Path>) -> BacktextResult<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source).map_err(|source| BacktextError::StyleFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Whether the font family is one of [`FONT_OPTIONS`].
    pub fn is_known_font(&self) -> bool {
        FONT_OPTIONS
            .iter()
            .any(|name| name.eq_ignore_ascii_case(self.font_family.trim()))
    }

    /// Return a copy with every numeric field clamped into its range.
    ///
    /// Non-finite values are replaced by the field default. Each adjustment is
    /// logged; nothing here fails.
    pub fn validated(&self) -> Self {
        let defaults = Self::default();
        if !self.is_known_font() {
            warn!(
                font_family = self.font_family.as_str();
                "Unknown font family, renderer may fall back to the default face"
            );
        }

        let mut out = self.clone();
        macro_rules! clamp {
            ($field:ident, $range:expr) => {
                out.$field = clamp_field(stringify!($field), out.$field, &$range, defaults.$field);
            };
        }

        clamp!(text_size, TEXT_SIZE_RANGE);
        clamp!(text_opacity, OPACITY_RANGE);
        clamp!(position_x, POSITION_RANGE);
        clamp!(position_y, POSITION_RANGE);
        clamp!(rotation, ROTATION_RANGE);
        clamp!(scale_x, SCALE_RANGE);
        clamp!(scale_y, SCALE_RANGE);
        clamp!(letter_spacing, LETTER_SPACING_RANGE);
        clamp!(word_spacing, WORD_SPACING_RANGE);
        clamp!(shadow_opacity, OPACITY_RANGE);
        clamp!(shadow_blur, SHADOW_BLUR_RANGE);
        clamp!(shadow_offset_x, SHADOW_OFFSET_RANGE);
        clamp!(shadow_offset_y, SHADOW_OFFSET_RANGE);
        out
    }
}

fn clamp_field(name: &str, value: f64, range: &RangeInclusive<f64>, default: f64) -> f64 {
    if !value.is_finite() {
        warn!(field = name, value = value; "Non-finite style value replaced by default");
        return default;
    }
    let clamped = value.clamp(*range.start(), *range.end());
    if clamped != value {
        warn!(field = name, value = value, clamped = clamped; "Style value out of range");
    }
    clamped
}

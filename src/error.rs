use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for operations that may fail with [`BacktextError`].
pub type BacktextResult<T> = std::result::Result<T, BacktextError>;

/// Error types that can occur while building a composition.
///
/// Cosmetic problems (unknown font family, out-of-range style values) are not
/// errors; they degrade to defaults and are logged instead.
#[derive(Debug, Error)]
pub enum BacktextError {
    /// Image loading, decoding, or encoding error.
    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),
    /// File system I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Two rasters that must share geometry do not.
    #[error("Raster size {found:?} does not match expected size {expected:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        found: (u32, u32),
    },
    /// A color string is not `#RGB` or `#RRGGBB`.
    #[error("Invalid color `{0}`; expected #RGB or #RRGGBB")]
    InvalidColor(String),
    /// A style file could not be parsed.
    #[error("Failed to parse style file {}: {source}", path.display())]
    StyleFile {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

//! Subject isolation.
//!
//! Segmenting the subject is left to an external model; the compositor only
//! needs a cutout of the same size as the original with the subject opaque.

use std::path::{Path, PathBuf};

use image::RgbaImage;
use log::debug;

use crate::foreground::compose_foreground;
use crate::{BacktextError, BacktextResult};

/// Something that can isolate the subject of an image.
///
/// The returned cutout must have the original's dimensions; pixels outside the
/// subject carry alpha 0.
pub trait SubjectCutout {
    fn cutout(&self, original: &RgbaImage) -> BacktextResult<RgbaImage>;
}

impl<F> SubjectCutout for F
where
    F: Fn(&RgbaImage) -> BacktextResult<RgbaImage>,
{
    fn cutout(&self, original: &RgbaImage) -> BacktextResult<RgbaImage> {
        self(original)
    }
}

fn ensure_same_size(original: &RgbaImage, found: (u32, u32)) -> BacktextResult<()> {
    let expected = original.dimensions();
    if expected != found {
        return Err(BacktextError::DimensionMismatch { expected, found });
    }
    Ok(())
}

/// A cutout produced ahead of time and stored as an RGBA image file.
#[derive(Debug, Clone)]
pub struct RgbaCutout {
    path: PathBuf,
}

impl RgbaCutout {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SubjectCutout for RgbaCutout {
    fn cutout(&self, original: &RgbaImage) -> BacktextResult<RgbaImage> {
        debug!(path:? = self.path; "Loading RGBA cutout");
        let cutout = image::open(&self.path)?.into_rgba8();
        ensure_same_size(original, cutout.dimensions())?;
        Ok(cutout)
    }
}

/// A grayscale matte file; the subject takes the original's colors and the
/// matte's luma as alpha.
#[derive(Debug, Clone)]
pub struct MatteCutout {
    path: PathBuf,
}

impl MatteCutout {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SubjectCutout for MatteCutout {
    fn cutout(&self, original: &RgbaImage) -> BacktextResult<RgbaImage> {
        debug!(path:? = self.path; "Loading matte");
        let matte = image::open(&self.path)?.into_luma8();
        compose_foreground(original, &matte)
    }
}

/// An in-memory cutout.
#[derive(Debug, Clone)]
pub struct PrecomputedCutout(pub RgbaImage);

impl SubjectCutout for PrecomputedCutout {
    fn cutout(&self, original: &RgbaImage) -> BacktextResult<RgbaImage> {
        ensure_same_size(original, self.0.dimensions())?;
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba};
    use tempfile::tempdir;

    #[test]
    fn closures_are_cutouts() {
        let keep_red = |original: &RgbaImage| -> BacktextResult<RgbaImage> {
            Ok(RgbaImage::from_fn(original.width(), original.height(), |x, y| {
                let px = original.get_pixel(x, y);
                Rgba([px[0], px[1], px[2], if px[0] > 128 { 255 } else { 0 }])
            }))
        };
        let mut original = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 255]));
        original.put_pixel(1, 0, Rgba([255, 0, 0, 255]));

        let cut = keep_red.cutout(&original).unwrap();
        assert_eq!(cut.get_pixel(0, 0)[3], 0);
        assert_eq!(cut.get_pixel(1, 0)[3], 255);
    }

    #[test]
    fn precomputed_checks_size() {
        let cutout = PrecomputedCutout(RgbaImage::new(3, 3));
        let err = cutout.cutout(&RgbaImage::new(4, 4)).unwrap_err();
        assert!(matches!(err, BacktextError::DimensionMismatch { .. }));
    }

    #[test]
    fn rgba_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cut.png");
        let stored = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 200]));
        stored.save(&path).unwrap();

        let cut = RgbaCutout::new(&path).cutout(&RgbaImage::new(3, 2)).unwrap();
        assert_eq!(cut, stored);

        let err = RgbaCutout::new(&path).cutout(&RgbaImage::new(5, 5)).unwrap_err();
        assert!(matches!(err, BacktextError::DimensionMismatch { .. }));
    }

    #[test]
    fn matte_file_supplies_alpha() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("matte.png");
        GrayImage::from_pixel(2, 2, Luma([90])).save(&path).unwrap();

        let original = RgbaImage::from_pixel(2, 2, Rgba([7, 8, 9, 255]));
        let cut = MatteCutout::new(&path).cutout(&original).unwrap();
        assert!(cut.pixels().all(|p| p.0 == [7, 8, 9, 90]));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = RgbaCutout::new("/nonexistent/cut.png")
            .cutout(&RgbaImage::new(1, 1))
            .unwrap_err();
        assert!(matches!(err, BacktextError::Image(_) | BacktextError::Io(_)));
    }
}

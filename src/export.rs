//! PNG export of composited rasters.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use log::debug;
use sha2::{Digest, Sha256};

use crate::BacktextResult;

/// Hex digits of the content hash kept in generated file names.
const NAME_HASH_LEN: usize = 16;

/// Encode `image` as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> BacktextResult<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// File name derived from the encoded content: `<prefix>-<hash>.png`.
///
/// Identical images get identical names; distinct images collide only if
/// their SHA-256 digests share the first 64 bits.
pub fn unique_export_name(prefix: &str, png: &[u8]) -> String {
    let digest = format!("{:x}", Sha256::digest(png));
    format!("{prefix}-{}.png", &digest[..NAME_HASH_LEN])
}

/// Write PNG bytes to `path`, replacing any existing file only once the write
/// has completed.
pub fn write_png_bytes(path: &Path, png: &[u8]) -> BacktextResult<()> {
    let temp_path = path.with_extension("png.part");
    fs::write(&temp_path, png)?;
    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(err.into());
    }
    debug!(path:? = path, bytes = png.len(); "PNG written");
    Ok(())
}

/// Encode and save `image` to `path`.
pub fn save_png(image: &RgbaImage, path: impl AsRef<Path>) -> BacktextResult<()> {
    write_png_bytes(path.as_ref(), &encode_png(image)?)
}

/// Save `image` into `dir` under a content-derived name and return the path.
pub fn save_png_unique(
    image: &RgbaImage,
    dir: impl AsRef<Path>,
    prefix: &str,
) -> BacktextResult<PathBuf> {
    let png = encode_png(image)?;
    let path = dir.as_ref().join(unique_export_name(prefix, &png));
    write_png_bytes(&path, &png)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::tempdir;

    mod unique_export_name {
        use super::*;

        mod unit {
            use super::*;

            #[test]
            fn has_prefix_hash_and_extension() {
                let name = unique_export_name("text-behind-image", b"abc");
                // sha256("abc") = ba7816bf8f01cfea...
                assert_eq!(name, "text-behind-image-ba7816bf8f01cfea.png");
            }
        }

        mod prop {
            use super::*;
            use proptest::prelude::*;

            proptest! {
                /// unique_export_name: stable for equal content, fixed shape
                #[test]
                fn deterministic_and_well_formed(
                    bytes in proptest::collection::vec(any::<u8>(), 0..256)
                ) {
                    let a = unique_export_name("out", &bytes);
                    let b = unique_export_name("out", &bytes);
                    prop_assert_eq!(&a, &b);
                    prop_assert_eq!(a.len(), "out-".len() + NAME_HASH_LEN + ".png".len());
                    prop_assert!(a[4..4 + NAME_HASH_LEN].chars().all(|c| c.is_ascii_hexdigit()));
                }
            }
        }
    }

    #[test]
    fn encoded_png_decodes_back() {
        let image = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 40]));
        let png = encode_png(&image).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().into_rgba8();
        assert_eq!(decoded, image);
    }

    #[test]
    fn save_png_unique_names_by_content() {
        let dir = tempdir().unwrap();
        let a = RgbaImage::from_pixel(2, 2, Rgba([1, 1, 1, 255]));
        let b = RgbaImage::from_pixel(2, 2, Rgba([2, 2, 2, 255]));

        let path_a = save_png_unique(&a, dir.path(), "img").unwrap();
        let again = save_png_unique(&a, dir.path(), "img").unwrap();
        let path_b = save_png_unique(&b, dir.path(), "img").unwrap();

        assert_eq!(path_a, again);
        assert_ne!(path_a, path_b);
        assert!(path_a.exists() && path_b.exists());
        assert!(!path_a.with_extension("png.part").exists());
    }

    #[test]
    fn save_png_into_missing_dir_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.png");
        let err = save_png(&RgbaImage::new(1, 1), &path).unwrap_err();
        assert!(matches!(err, crate::BacktextError::Io(_)));
    }
}

use std::fs;

use backtext::{
    Backtext, BacktextError, FontBook, FontSettings, LineCentering, MatteCutout, RgbaCutout,
    TextStyle,
};
use image::{GrayImage, Luma, Rgba, RgbaImage};
use tempfile::tempdir;

fn backtext() -> Backtext {
    Backtext::new(FontBook::empty())
}

/// 16x16 gradient with a 4x4 subject in the middle.
fn write_layers(dir: &std::path::Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let original = RgbaImage::from_fn(16, 16, |x, y| Rgba([x as u8 * 16, y as u8 * 16, 100, 255]));
    let foreground = RgbaImage::from_fn(16, 16, |x, y| {
        if (6..10).contains(&x) && (6..10).contains(&y) {
            Rgba([255, 255, 0, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    let original_path = dir.join("photo.png");
    let foreground_path = dir.join("photo-foreground.png");
    original.save(&original_path).unwrap();
    foreground.save(&foreground_path).unwrap();
    (original_path, foreground_path)
}

#[test]
fn compose_from_files_round_trips() {
    let dir = tempdir().unwrap();
    let (original_path, foreground_path) = write_layers(dir.path());

    let layers = backtext()
        .for_image(&original_path, &RgbaCutout::new(&foreground_path))
        .unwrap();
    let composite = layers.compose(&TextStyle::default()).unwrap();

    let out = dir.path().join("out.png");
    composite.save(&out).unwrap();
    let decoded = image::open(&out).unwrap().into_rgba8();
    assert_eq!(&decoded, composite.image());
    assert_eq!(decoded.get_pixel(7, 7).0, [255, 255, 0, 255]);
    assert_eq!(decoded.get_pixel(0, 0).0, [0, 0, 100, 255]);
}

const FIXTURE_FONT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/Tuffy.ttf");

#[test]
fn text_is_drawn_with_a_configured_font_file() {
    let settings = FontSettings::default()
        .with_system_fonts(false)
        .with_font_file(FIXTURE_FONT);
    let backtext = Backtext::with_font_settings(&settings);
    assert!(backtext.fonts().has_family("Tuffy"));

    let original = RgbaImage::from_pixel(128, 64, Rgba([0, 0, 0, 255]));
    let layers = backtext
        .for_layers(original.clone(), RgbaImage::new(128, 64))
        .unwrap();
    let style = TextStyle {
        text: "HI".to_string(),
        font_family: "Tuffy".to_string(),
        shadow_opacity: 0.0,
        ..TextStyle::default()
    };
    let composite = layers.compose(&style).unwrap().into_image();

    let lit: Vec<(u32, u32)> = composite
        .enumerate_pixels()
        .filter(|(_, _, p)| p[0] > 127)
        .map(|(x, y, _)| (x, y))
        .collect();
    assert!(!lit.is_empty());
    let cx = lit.iter().map(|&(x, _)| f64::from(x)).sum::<f64>() / lit.len() as f64;
    let cy = lit.iter().map(|&(_, y)| f64::from(y)).sum::<f64>() / lit.len() as f64;
    assert!((cx - 64.0).abs() < 4.0, "centroid x {cx}");
    assert!((cy - 32.0).abs() < 4.0, "centroid y {cy}");

    let wild = TextStyle {
        text_size: 1.0e7,
        shadow_blur: 1.0e9,
        rotation: 7200.0,
        ..style
    };
    let clamped = layers.compose(&wild).unwrap();
    assert_eq!(clamped.image().dimensions(), (128, 64));
}

#[test]
fn unique_names_are_content_addressed() {
    let dir = tempdir().unwrap();
    let (original_path, foreground_path) = write_layers(dir.path());
    let layers = backtext()
        .for_image(&original_path, &RgbaCutout::new(&foreground_path))
        .unwrap();
    let composite = layers.compose(&TextStyle::default()).unwrap();

    let first = composite.save_unique(dir.path(), "composite").unwrap();
    let second = composite.save_unique(dir.path(), "composite").unwrap();
    assert_eq!(first, second);

    let name = first.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("composite-") && name.ends_with(".png"));
    assert_eq!(fs::read(&first).unwrap(), composite.encode_png().unwrap());
}

#[test]
fn background_cuts_dilated_subject() {
    let dir = tempdir().unwrap();
    let (original_path, foreground_path) = write_layers(dir.path());
    let layers = backtext()
        .with_mask_margin(2)
        .for_image(&original_path, &RgbaCutout::new(&foreground_path))
        .unwrap();

    let background = layers.background().unwrap().into_image();
    assert_eq!(background.get_pixel(4, 4)[3], 0);
    assert_eq!(background.get_pixel(11, 11)[3], 0);
    assert_eq!(background.get_pixel(3, 3)[3], 255);
    assert_eq!(background.get_pixel(12, 8)[3], 255);
    assert_eq!(layers.mask().mask().len(), 8 * 8);

    let mask_path = dir.path().join("mask.png");
    layers.mask().save(&mask_path).unwrap();
    let mask = image::open(&mask_path).unwrap().into_luma8();
    assert_eq!(mask.get_pixel(4, 4)[0], 255);
    assert_eq!(mask.get_pixel(0, 0)[0], 0);
}

#[test]
fn matte_cutout_drives_composition() {
    let dir = tempdir().unwrap();
    let (original_path, _) = write_layers(dir.path());
    let matte_path = dir.path().join("matte.png");
    GrayImage::from_pixel(16, 16, Luma([255])).save(&matte_path).unwrap();

    let layers = backtext()
        .with_subtract_background(true)
        .with_line_centering(LineCentering::Cumulative)
        .for_image(&original_path, &MatteCutout::new(&matte_path))
        .unwrap();
    let composite = layers.compose(&TextStyle::default()).unwrap().into_image();
    assert_eq!(&composite, layers.original());
}

#[test]
fn mismatched_cutout_is_rejected_before_drawing() {
    let dir = tempdir().unwrap();
    let (original_path, _) = write_layers(dir.path());
    let small = dir.path().join("small.png");
    RgbaImage::new(8, 8).save(&small).unwrap();

    let err = backtext()
        .for_image(&original_path, &RgbaCutout::new(&small))
        .unwrap_err();
    assert!(matches!(
        err,
        BacktextError::DimensionMismatch {
            expected: (16, 16),
            found: (8, 8)
        }
    ));
}

#[test]
fn missing_input_fails_to_load() {
    let dir = tempdir().unwrap();
    let (_, foreground_path) = write_layers(dir.path());
    let err = backtext()
        .for_image(dir.path().join("nope.png"), &RgbaCutout::new(&foreground_path))
        .unwrap_err();
    assert!(matches!(err, BacktextError::Image(_)));
}

#[test]
fn style_file_loads_and_reports_errors() {
    let dir = tempdir().unwrap();
    let good = dir.path().join("style.toml");
    fs::write(
        &good,
        "text = \"HELLO\\nWORLD\"\ntextSize = 80\ntext_color = \"#ff8800\"\nrotation = -15\n",
    )
    .unwrap();
    let style = TextStyle::load(&good).unwrap();
    assert_eq!(style.text, "HELLO\nWORLD");
    assert_eq!(style.text_size, 80.0);
    assert_eq!(style.text_color.to_string(), "#FF8800");
    assert_eq!(style.rotation, -15.0);
    assert_eq!(style.shadow_blur, TextStyle::default().shadow_blur);

    let bad = dir.path().join("bad.toml");
    fs::write(&bad, "textColor = \"orange\"\n").unwrap();
    match TextStyle::load(&bad).unwrap_err() {
        BacktextError::StyleFile { path, .. } => assert_eq!(path, bad),
        other => panic!("unexpected error: {other:?}"),
    }
}

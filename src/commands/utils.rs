use std::path::{Path, PathBuf};

use backtext::{Backtext, FontBook, FontSettings, MatteCutout, RgbaCutout, SubjectCutout};

use crate::cli::{CutoutArgs, GlobalOptions};

/// Font sources selected by the global options.
pub fn font_settings(global: &GlobalOptions) -> FontSettings {
    global
        .font_dirs
        .iter()
        .fold(
            FontSettings::default().with_system_fonts(!global.no_system_fonts),
            |settings, dir| settings.with_font_dir(dir),
        )
}

pub fn load_font_book(global: &GlobalOptions) -> FontBook {
    FontBook::load(&font_settings(global))
}

/// The convenience function to build a Backtext instance from the global options.
pub fn build_backtext(global: &GlobalOptions) -> Backtext {
    Backtext::new(load_font_book(global))
}

/// The cutout named on the command line.
pub fn cutout_source(args: &CutoutArgs) -> Box<dyn SubjectCutout> {
    match (&args.foreground, &args.matte) {
        (_, Some(matte)) => Box::new(MatteCutout::new(matte)),
        (Some(foreground), None) => Box::new(RgbaCutout::new(foreground)),
        // clap's argument group makes one of the two required
        (None, None) => unreachable!("cutout source is required"),
    }
}

/// Derive a variant file path by appending a suffix before the extension.
pub fn derive_variant_path(input: &Path, suffix: &str, extension: &str) -> PathBuf {
    let mut derived = input.to_path_buf();
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| suffix.to_string());
    let filename = format!("{}-{}.{}", stem, suffix, extension);
    derived.set_file_name(filename);
    derived
}

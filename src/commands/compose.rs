use std::path::{Path, PathBuf};

use backtext::{BacktextResult, MaskOptions};
use log::warn;

use crate::cli::{ComposeCommand, GlobalOptions};

use super::utils::{build_backtext, cutout_source, derive_variant_path};

/// File name prefix for content-named exports.
const EXPORT_PREFIX: &str = "composite";

/// Run the compose command.
pub fn run(global: &GlobalOptions, cmd: ComposeCommand) -> BacktextResult<()> {
    let style = cmd.style.resolve()?;
    if !style.is_known_font() {
        warn!(family = style.font_family.as_str(); "Font family is not one of the offered options");
    }

    let backtext = build_backtext(global)
        .with_subtract_background(cmd.subtract_background)
        .with_mask_margin(MaskOptions::from_signed(cmd.margin).margin)
        .with_line_centering(cmd.line_centering);
    let cutout = cutout_source(&cmd.cutout);
    let layers = backtext.for_image(&cmd.input, cutout.as_ref())?;
    let composite = layers.compose(&style)?;

    if cmd.unique_name {
        let dir = cmd.output.clone().unwrap_or_else(|| parent_dir(&cmd.input));
        let path = composite.save_unique(&dir, EXPORT_PREFIX)?;
        println!("Composite PNG saved to {}", path.display());
    } else {
        let output_path = cmd
            .output
            .clone()
            .unwrap_or_else(|| derive_variant_path(&cmd.input, "composite", "png"));
        composite.save(&output_path)?;
        println!("Composite PNG saved to {}", output_path.display());
    }

    Ok(())
}

/// Directory containing `input`, or the working directory for bare file names.
fn parent_dir(input: &Path) -> PathBuf {
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

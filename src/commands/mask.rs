use backtext::{BacktextResult, MaskOptions, compute_mask};

use crate::cli::MaskCommand;

use super::utils::derive_variant_path;

/// The main function to run the mask command.
pub fn run(cmd: MaskCommand) -> BacktextResult<()> {
    let foreground = image::open(&cmd.foreground)?.into_rgba8();
    let options = MaskOptions::from_signed(cmd.margin);
    let output_path = cmd
        .output
        .clone()
        .unwrap_or_else(|| derive_variant_path(&cmd.foreground, "mask", "png"));

    let mask = compute_mask(&foreground, options.margin);
    mask.to_gray_image().save(&output_path)?;
    println!(
        "Mask PNG ({} px, margin {}) saved to {}",
        mask.len(),
        options.margin,
        output_path.display()
    );

    Ok(())
}

use backtext::{Backtext, BacktextResult, FontBook, MaskOptions};

use crate::cli::BackgroundCommand;

use super::utils::{cutout_source, derive_variant_path};

/// The main function to run the background command.
pub fn run(cmd: BackgroundCommand) -> BacktextResult<()> {
    let margin = MaskOptions::from_signed(cmd.margin).margin;
    let backtext = Backtext::new(FontBook::empty()).with_mask_margin(margin);
    let cutout = cutout_source(&cmd.cutout);
    let layers = backtext.for_image(&cmd.input, cutout.as_ref())?;

    let output_path = cmd
        .output
        .clone()
        .unwrap_or_else(|| derive_variant_path(&cmd.input, "background", "png"));
    layers.background()?.save(&output_path)?;
    println!("Background PNG saved to {}", output_path.display());

    Ok(())
}

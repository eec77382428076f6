use backtext::BacktextError;

pub fn report_error(err: &BacktextError) {
    match err {
        BacktextError::DimensionMismatch { expected, found } => {
            eprintln!(
                "The cutout is {}x{} but the input image is {}x{}.",
                found.0, found.1, expected.0, expected.1
            );
            eprintln!();
            eprintln!("The foreground or matte must be produced from the same image,");
            eprintln!("at the same resolution.");
        }
        BacktextError::InvalidColor(value) => {
            eprintln!("Invalid color `{value}`.");
            eprintln!("Colors are written as #RRGGBB or #RGB, e.g. #FFFFFF.");
        }
        _ => {
            eprintln!("{err}");
        }
    }
}

use backtext::BacktextResult;
use backtext::style::FONT_OPTIONS;

use crate::cli::GlobalOptions;

use super::utils::load_font_book;

/// The main function to run the fonts command.
pub fn run(global: &GlobalOptions) -> BacktextResult<()> {
    let fonts = load_font_book(global);

    println!("Offered families:");
    for family in FONT_OPTIONS {
        let status = if fonts.has_family(family) {
            "available"
        } else {
            "falls back to default"
        };
        println!("  {family} ({status})");
    }

    let families = fonts.families();
    println!();
    println!("Installed families ({}):", families.len());
    for family in families {
        println!("  {family}");
    }

    Ok(())
}

mod background;
mod compose;
mod fonts;
mod mask;
mod utils;

use crate::cli::{Cli, Commands, GlobalOptions};
use backtext::BacktextResult;

/// The main function to run the command based on CLI input.
pub fn run(cli: Cli) -> BacktextResult<()> {
    let Cli { global, command } = cli;
    dispatch(&global, command)
}

/// Dispatch the command to the appropriate handler.
fn dispatch(global: &GlobalOptions, command: Commands) -> BacktextResult<()> {
    match command {
        Commands::Compose(cmd) => compose::run(global, cmd),
        Commands::Mask(cmd) => mask::run(cmd),
        Commands::Background(cmd) => background::run(cmd),
        Commands::Fonts => fonts::run(global),
    }
}

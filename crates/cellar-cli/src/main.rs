//! Cellar Extract - extract mass estimation for brewery cellar vessels
//!
//! Converts vessel levels and Plato readings from the cellar telemetry
//! export into kilograms of extract, grouped by material, vessel and day.

mod cli;
mod commands;
mod logging;
mod output;

use clap::Parser;
use cli::Cli;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = commands::execute(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

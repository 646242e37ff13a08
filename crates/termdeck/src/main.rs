use clap::Parser;
use colored::Colorize;

use termdeck::cli::Cli;
use termdeck::logging;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.log.as_deref(), cli.verbose) {
        eprintln!("{} {e:#}", "Error:".red().bold());
        std::process::exit(1);
    }

    if let Err(e) = cli.run() {
        log::error!("{e:#}");
        eprintln!("{} {e:#}", "Error:".red().bold());
        std::process::exit(1);
    }
}

// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use clap::Parser;

use posefault::cli::args::{Cli, Commands};
use posefault::cli::{inspect, show};
use posefault::error;

fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Inspect(args) => inspect::run(args),
        Commands::Show(args) => show::run(args),
    };

    if let Err(err) = result {
        error!("{err}");
        std::process::exit(1);
    }
}

use std::process::ExitCode;

use clap::Parser;
use helpsum_cli::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match helpsum_cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

mod commands;

use crate::commands::Fanlog;
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let fanlog = Fanlog::parse();

    if let Err(err) = fanlog.run() {
        // The report's Debug form carries the whole cause chain.
        eprintln!("Error: {:?}", err);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

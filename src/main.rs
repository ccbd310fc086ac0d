mod cli;
mod clip;
mod commands;
mod common;
mod completions;
mod process;
mod subtitles;
mod tools;
mod ui;

use std::process::ExitCode;

use clap::Parser;

use crate::cli::Cli;
use crate::ui::prelude::*;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    ui::init(cli.format, !cli.no_color);
    ui::set_debug_mode(cli.debug);
    if cli.no_color {
        colored::control::set_override(false);
    }

    match commands::handle_command(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            emit(Level::Error, "error", &format!("Error: {:#}", err), None);
            ExitCode::FAILURE
        }
    }
}

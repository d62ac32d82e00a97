//! heicjpeg: batch HEIC/HEIF to JPEG converter.
//!
//! Thin binary entry point. All logic lives in the `heicjpeg-core`
//! and `heicjpeg-cli` crates.

use clap::Parser;
use heicjpeg_cli::Cli;
use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Initialise structured logging on stderr; stdout carries the events.
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("heicjpeg starting");
    heicjpeg_cli::app::run(cli)
}

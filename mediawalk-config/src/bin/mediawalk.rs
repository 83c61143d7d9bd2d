//! `mediawalk`: walk a directory tree and stream what a media scanner would
//! see, one entry per line.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use mediawalk_config::cli::{self, ScanArgs};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout carries only scan output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = ScanArgs::parse();
    let stdout = io::stdout().lock();

    match cli::run(&args, io::BufWriter::new(stdout)) {
        Ok(report) => cli::exit_code(report.result),
        Err(err) => {
            error!("mediawalk failed: {err:#}");
            ExitCode::from(1)
        }
    }
}

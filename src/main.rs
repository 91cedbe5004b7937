use clap::Parser;
use std::process::ExitCode;
use toxic_classifier::cli::{self, Cli};
use toxic_classifier::output;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // stdout carries the JSON result only
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_ansi(false)
        .with_target(false)
        .init();

    let mut stdout = std::io::stdout().lock();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if cli::is_informational(&err) => err.exit(),
        Err(err) => {
            let message = cli::argument_error_message(&err);
            error!(%message, "invalid arguments");
            if output::write_error(&mut stdout, &message).is_err() {
                error!("failed to write error response");
            }
            return ExitCode::FAILURE;
        }
    };

    match cli::run(&cli, std::io::stdin().lock(), &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "toxicity classification failed");
            cli::report_error(&mut stdout, &err);
            ExitCode::FAILURE
        }
    }
}

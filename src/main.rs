use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use polybench::harness::{
    config::{version_banner, Cli},
    driver,
    error::HarnessError,
};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            eprintln!("error: {}", HarnessError::Usage);
            return ExitCode::FAILURE;
        }
        Err(e) => {
            // help output
            return match e.print() {
                Ok(()) => ExitCode::SUCCESS,
                Err(_) => ExitCode::FAILURE,
            };
        }
    };

    if cli.version {
        println!("{}", version_banner());
        return ExitCode::SUCCESS;
    }

    match cli.into_config().and_then(|config| driver::run(&config)) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

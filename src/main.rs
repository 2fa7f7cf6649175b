use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;

use polybench::config::{init_logging, parse_variables};
use polybench::driver::Dispatcher;
use polybench::engine::IntegerPolynomialEngine;
use polybench::error::BenchError;

/// Time polynomial gcd and factorization requests.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The comma-separated list of variables, e.g. x,y,z
    variables: String,
    /// The file with one request per line
    input: PathBuf,
    /// The file for the result lines, created or overwritten
    output: PathBuf,
}

fn run(cli: &Cli) -> Result<usize, BenchError> {
    let variables = parse_variables(&cli.variables)?;
    info!(
        "variables {}, input {}, output {}",
        cli.variables,
        cli.input.display(),
        cli.output.display()
    );

    Dispatcher::new(IntegerPolynomialEngine::new(variables)).run(&cli.input, &cli.output)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match run(&cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

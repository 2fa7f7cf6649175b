use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::info;

use polybench::check::Checker;
use polybench::config::{init_logging, parse_variables};
use polybench::engine::IntegerPolynomialEngine;
use polybench::error::BenchError;
use polybench::problems::{
    self, ExponentDistribution, PolynomialOptions, ProblemGenerator, ProblemType,
};

/// Generate benchmark problems and verify results.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write random problems in the request format
    Generate {
        /// trivial-gcd [gcd(a*b,c*d)], nontrivial-gcd [gcd(a*g,b*g)],
        /// trivial-factor [factor(a*b+c)] or nontrivial-factor [factor(a*b)]
        problem_type: ProblemType,
        /// The number of variables
        #[arg(long, default_value_t = 5, value_name = "N")]
        nvars: usize,
        /// The number of measured problems
        #[arg(long, default_value_t = 50, value_name = "N")]
        nproblems: usize,
        /// The number of warm-up problems, written first
        #[arg(long, default_value_t = 10, value_name = "N")]
        nwarmups: usize,
        /// The minimum number of terms of a basic-block polynomial [default: max-nterms * 0.75]
        #[arg(long, value_name = "N")]
        min_nterms: Option<usize>,
        /// The maximum number of terms of a basic-block polynomial
        #[arg(long, default_value_t = 30, value_name = "N")]
        max_nterms: usize,
        /// The minimum degree of a basic-block polynomial
        /// [default: max-degree * 0.75 for uniform, 0 for sharp]
        #[arg(long, value_name = "N")]
        min_degree: Option<u32>,
        /// The maximum degree of a basic-block polynomial
        #[arg(long, default_value_t = 30, value_name = "N")]
        max_degree: u32,
        /// The minimum coefficient [default: -max-coeff]
        #[arg(long, value_name = "N", allow_negative_numbers = true)]
        min_coeff: Option<i64>,
        /// The maximum coefficient
        #[arg(long, default_value_t = 1 << 14, value_name = "N")]
        max_coeff: i64,
        /// The distribution of the exponents: uniform or sharp
        #[arg(long, default_value_t = ExponentDistribution::Uniform, value_name = "DIST")]
        exp_dist: ExponentDistribution,
        /// The random seed
        #[arg(long, default_value_t = 42, value_name = "N")]
        seed: u64,
        /// Print the list of variables instead of the problems
        #[arg(long)]
        print_variables: bool,
        /// The output file [default: standard output]
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Verify a result file against its problem file and summarize the timings
    Check {
        /// The comma-separated list of variables, e.g. x1,x2,x3
        variables: String,
        /// The problem file
        input: PathBuf,
        /// The result file
        output: PathBuf,
        /// The number of leading lines excluded from the timings
        #[arg(long, default_value_t = 0, value_name = "N")]
        nwarmups: usize,
    },
}

fn write_lines(lines: &[String], output: &Option<PathBuf>) -> Result<(), BenchError> {
    match output {
        Some(path) => {
            let file = File::create(path).map_err(BenchError::resource(path))?;
            let mut w = BufWriter::new(file);
            for l in lines {
                writeln!(w, "{}", l).map_err(BenchError::resource(path))?;
            }
            w.flush().map_err(BenchError::resource(path))
        }
        None => {
            let mut w = io::stdout().lock();
            for l in lines {
                writeln!(w, "{}", l).map_err(BenchError::resource("<stdout>"))?;
            }
            Ok(())
        }
    }
}

fn run(cli: Cli) -> Result<(), BenchError> {
    match cli.command {
        Commands::Generate {
            problem_type,
            nvars,
            nproblems,
            nwarmups,
            min_nterms,
            max_nterms,
            min_degree,
            max_degree,
            min_coeff,
            max_coeff,
            exp_dist,
            seed,
            print_variables,
            output,
        } => {
            let options = PolynomialOptions::new(
                nvars, min_nterms, max_nterms, min_degree, max_degree, min_coeff, max_coeff,
                exp_dist,
            );

            let lines = if print_variables {
                options.validate()?;
                let names: Vec<_> = problems::variables(nvars)
                    .iter()
                    .map(|v| v.to_string())
                    .collect();
                vec![names.join(",")]
            } else {
                info!("generating with {:?} and seed {}", options, seed);
                ProblemGenerator::new(options, seed)?.generate(problem_type, nwarmups, nproblems)?
            };

            write_lines(&lines, &output)
        }
        Commands::Check {
            variables,
            input,
            output,
            nwarmups,
        } => {
            let variables = parse_variables(&variables)?;
            let problems = fs::read_to_string(&input).map_err(BenchError::resource(&input))?;
            let results = fs::read_to_string(&output).map_err(BenchError::resource(&output))?;

            let summary = Checker::new(IntegerPolynomialEngine::new(variables)).check(
                &problems, &results, nwarmups,
            )?;
            println!("{}", summary);
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

//! gw-core - Galton-Watson outbreak statistics CLI
//!
//! Batch drivers over the branching process engine: skeleton statistics for
//! parameter tables, Negative Binomial fecundity grids and single-process
//! summaries.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use gw_core::config::{load_config, ConfigOptions, ResolvedConfig};
use gw_core::exit_codes::ExitCode;
use gw_core::fecundity::{self, FecundityOptions};
use gw_core::generations::{self, GenerationsOptions};
use gw_core::logging::{generate_run_id, init_logging, LogConfig, LogFormat, LogLevel};
use gw_core::summary;
use tracing::{error, info, info_span};

/// Galton-Watson outbreak statistics
#[derive(Parser)]
#[command(name = "gw-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct GlobalOpts {
    /// Solver configuration file (JSON); falls back to $GW_CONFIG
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr: human or jsonl
    #[arg(long, global = true, value_name = "FORMAT")]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Skeleton statistics for every row of a parameter table
    Generations(GenerationsArgs),

    /// Extinction statistics over a Negative Binomial (k, p) grid
    Fecundity(FecundityArgs),

    /// Print the statistics of one offspring law as JSON
    Summary(SummaryArgs),

    /// Print the resolved solver configuration as JSON
    Config,
}

#[derive(Args, Debug)]
struct GenerationsArgs {
    /// Input parameter table (CSV)
    #[arg(short = 'i', long = "ifn", value_name = "FILE")]
    input: PathBuf,

    /// Output table (CSV); parent directories are created
    #[arg(
        short = 'o',
        long = "ofn",
        value_name = "FILE",
        default_value = "output/generations.csv"
    )]
    output: PathBuf,

    /// Largest renewal count in the skeleton CDF columns
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u32).range(1..))]
    cdf_max: u32,

    /// Add the expected skeleton step duration column
    #[arg(long)]
    with_duration: bool,
}

#[derive(Args, Debug)]
struct FecundityArgs {
    /// Output directory
    #[arg(
        short = 'o',
        long = "odir",
        value_name = "DIR",
        default_value = "output/fecundity"
    )]
    output_dir: PathBuf,

    /// Shape axis: k = STEP, 2 STEP, ... up to END
    #[arg(short = 'k', long, num_args = 2, value_names = ["STEP", "END"], required = true)]
    k_iter: Vec<f64>,

    /// Probability axis: p = 1/FACTOR, 1/FACTOR^2, ... down to END
    #[arg(short = 'p', long, num_args = 2, value_names = ["FACTOR", "END"], required = true)]
    p_iter: Vec<f64>,
}

#[derive(Args, Debug)]
struct SummaryArgs {
    /// Basic reproduction number (offspring mean)
    #[arg(long, allow_negative_numbers = true)]
    r0: f64,

    /// Negative Binomial dispersion; Poisson offspring when omitted
    #[arg(long)]
    dispersion: Option<f64>,

    /// Generation for the immortal/doomed expectation matrix
    #[arg(long, default_value_t = 1)]
    generation: u32,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            // Help or usage that cannot reach the terminal is an I/O failure.
            let code = match err.print() {
                Ok(()) => code,
                Err(_) => ExitCode::IoError,
            };
            std::process::exit(code.as_i32());
        }
    };

    let log_level = if cli.global.quiet {
        Some(LogLevel::Error)
    } else {
        match cli.global.verbose {
            0 => None,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    };
    let log_config = LogConfig::from_env(log_level, cli.global.log_format);
    init_logging(&log_config);

    let exit_code = run(&cli);
    std::process::exit(exit_code.as_i32());
}

fn run(cli: &Cli) -> ExitCode {
    let command = match &cli.command {
        Commands::Generations(_) => "generations",
        Commands::Fecundity(_) => "fecundity",
        Commands::Summary(_) => "summary",
        Commands::Config => "config",
    };
    let span = info_span!("run", run_id = %generate_run_id(), command);
    let _guard = span.enter();

    let resolved = match load_config(&ConfigOptions {
        config_path: cli.global.config.clone(),
    }) {
        Ok(resolved) => resolved,
        Err(err) => {
            error!("{err}");
            return err.exit_code();
        }
    };
    info!(source = ?resolved.source, path = ?resolved.path, "solver configuration resolved");

    match &cli.command {
        Commands::Generations(args) => run_generations(args, &resolved),
        Commands::Fecundity(args) => run_fecundity(args, &resolved),
        Commands::Summary(args) => run_summary(args, &resolved),
        Commands::Config => print_json(&resolved.solver),
    }
}

fn run_generations(args: &GenerationsArgs, resolved: &ResolvedConfig) -> ExitCode {
    let options = GenerationsOptions {
        input: args.input.clone(),
        output: args.output.clone(),
        cdf_max: args.cdf_max as usize,
        with_duration: args.with_duration,
    };
    match generations::run(&options, &resolved.solver) {
        Ok(_) => ExitCode::Clean,
        Err(err) => {
            error!("{err}");
            err.exit_code()
        }
    }
}

fn run_fecundity(args: &FecundityArgs, resolved: &ResolvedConfig) -> ExitCode {
    let (&[k_step, k_end], &[p_factor, p_end]) = (args.k_iter.as_slice(), args.p_iter.as_slice())
    else {
        error!("--k-iter and --p-iter take exactly two values each");
        return ExitCode::ArgsError;
    };
    let options = FecundityOptions {
        output_dir: args.output_dir.clone(),
        k_step,
        k_end,
        p_factor,
        p_end,
    };
    match fecundity::run(&options, &resolved.solver) {
        Ok(_) => ExitCode::Clean,
        Err(err) => {
            error!("{err}");
            err.exit_code()
        }
    }
}

fn run_summary(args: &SummaryArgs, resolved: &ResolvedConfig) -> ExitCode {
    match summary::summarize(
        args.r0,
        args.dispersion,
        args.generation,
        resolved.solver.fixed_point,
    ) {
        Ok(report) => print_json(&report),
        Err(err) => {
            error!("{err}");
            ExitCode::from_math_error(&err)
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{text}");
            ExitCode::Clean
        }
        Err(err) => {
            error!("failed to serialize output: {err}");
            ExitCode::InternalError
        }
    }
}

//! # schema-bench
//!
//! Runs one JSON Schema validator against suite-format fixture directories,
//! either checking every verdict (`test`) or timing validation (`bench`).
//!
//! ## Usage
//!
//! ```bash
//! # Conformance over the default draft-7 and ajv corpora
//! VALIDATOR=boon schema-bench test
//!
//! # Conformance over one directory, checking decoded values too
//! schema-bench --validator jsonschema test --value-mode spec/JSON-Schema-Test-Suite/tests/draft7
//!
//! # Benchmarks, raw bytes and pre-decoded values
//! VALIDATOR=jsonschema schema-bench bench --modes json,value spec/ajv/spec/tests/schemas
//!
//! # List known validators
//! schema-bench list
//! ```
//!
//! The remote schema server is started on `--remote-addr` (default
//! `127.0.0.1:1234`) before any fixture runs.
//!
//! ## Exit Codes
//!
//! - `0`: every case passed
//! - `1`: one or more cases failed
//! - `2`: configuration error (unknown validator, missing directory, server
//!   could not bind)

use clap::{ArgAction, Args, Parser, Subcommand};
use log::error;
use schema_bench::alloc::CountingAllocator;
use schema_bench::config::{DEFAULT_REMOTE_ADDR, DEFAULT_REMOTE_ROOT};
use schema_bench::{
    AdapterRegistry, BenchSettings, BenchmarkRunner, ConformanceReport, ConformanceRunner,
    Draft, HarnessConfig, HarnessError, RemoteSchemaServer, ValidationMode,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

#[global_allocator]
static ALLOCATOR: CountingAllocator = CountingAllocator;

/// Conformance and benchmark harness for JSON Schema validators.
#[derive(Parser, Debug)]
#[command(name = "schema-bench")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Validator to exercise.
    #[arg(long, env = "VALIDATOR")]
    validator: Option<String>,

    /// Draft assumed for schemas without `$schema`.
    #[arg(long, default_value = "draft7")]
    draft: Draft,

    /// Assert `format` keywords; pass `false` to treat them as annotations.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    validate_formats: bool,

    /// Directory served to resolve remote references.
    #[arg(long, default_value = DEFAULT_REMOTE_ROOT)]
    remote_root: PathBuf,

    /// Address of the remote schema server.
    #[arg(long, default_value_t = DEFAULT_REMOTE_ADDR)]
    remote_addr: SocketAddr,

    /// Log every case, not just failures.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check every test case's verdict.
    Test(TestArgs),
    /// Time validation of every test case.
    Bench(BenchArgs),
    /// List known validators.
    List,
}

#[derive(Args, Debug)]
struct TestArgs {
    /// Fixture directories (defaults to the draft-7 suite and ajv corpus).
    dirs: Vec<PathBuf>,

    /// Also validate pre-decoded values and require both modes to agree.
    #[arg(long)]
    value_mode: bool,
}

#[derive(Args, Debug)]
struct BenchArgs {
    /// Fixture directories (defaults to the draft-7 suite and ajv corpus).
    dirs: Vec<PathBuf>,

    /// Loops to time for every case.
    #[arg(long, value_delimiter = ',', default_value = "json")]
    modes: Vec<ValidationMode>,

    /// Minimum duration of the final timed round, in milliseconds.
    #[arg(long, default_value_t = 100)]
    min_time_ms: u64,

    /// Upper bound on iterations in one round.
    #[arg(long, default_value_t = 1_000_000_000)]
    max_iterations: u64,
}

impl Cli {
    fn config(&self) -> HarnessConfig {
        let mut config = HarnessConfig {
            validator: self.validator.clone(),
            draft: self.draft,
            validate_formats: self.validate_formats,
            remote_root: self.remote_root.clone(),
            remote_addr: self.remote_addr,
            ..HarnessConfig::default()
        };

        match &self.command {
            Command::Test(args) if !args.dirs.is_empty() => config.suites = args.dirs.clone(),
            Command::Bench(args) => {
                if !args.dirs.is_empty() {
                    config.suites = args.dirs.clone();
                }
                config.bench = BenchSettings {
                    min_time: Duration::from_millis(args.min_time_ms),
                    max_iterations: args.max_iterations,
                    modes: args.modes.clone(),
                };
            }
            _ => {}
        }
        config
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            error!("{}", e);
            eprintln!("❌ {}", e);
            process::exit(2);
        }
    }
}

/// Returns whether every case passed. Errors are fatal configuration
/// problems.
fn run(cli: &Cli) -> Result<bool, HarnessError> {
    let registry = AdapterRegistry::with_defaults();
    if let Command::List = cli.command {
        for key in registry.keys() {
            println!("{}", key);
        }
        return Ok(true);
    }

    let config = cli.config();
    let mut adapter = registry.from_config(&config)?;
    config.validate()?;

    let _server = RemoteSchemaServer::start(&config.remote_root, config.remote_addr)?;

    match &cli.command {
        Command::Test(args) => {
            let modes: &[ValidationMode] = if args.value_mode {
                &[ValidationMode::Json, ValidationMode::Value]
            } else {
                &[ValidationMode::Json]
            };
            let report = ConformanceRunner::new(adapter.as_mut())
                .with_modes(modes)
                .run_dirs(&config.suites)?;
            print_conformance(&report);
            Ok(report.is_success())
        }
        Command::Bench(_) => {
            let mut runner = BenchmarkRunner::new(adapter.as_mut(), config.bench.clone());
            let mut success = true;
            for dir in &config.suites {
                let report = runner.run_dir(dir)?;
                for outcome in &report.outcomes {
                    println!("{}", outcome);
                }
                success &= report.is_success();
            }
            Ok(success)
        }
        Command::List => Ok(true),
    }
}

fn print_conformance(report: &ConformanceReport) {
    for failure in report.failures() {
        println!("❌ {}", failure);
    }
    println!();
    println!("Conformance Summary:");
    println!("  {}", report);
}

//! complexity-validator: check declared complexity claims against the
//! builtin reference operations.
//!
//! Exit codes: 0 all confirmed, 1 some suspect, 2 some unverifiable,
//! 3 the claims or configuration could not be loaded.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use complexity_validator::builtins;
use complexity_validator::claims::ClaimStore;
use complexity_validator::profiler::{ProfilerConfig, TrackingAllocator};
use complexity_validator::report::EXIT_LOAD_FAILURE;
use complexity_validator::{Report, Validator, ValidatorConfig};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static ALLOC: TrackingAllocator = TrackingAllocator;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Empirically validate declared Big-O claims",
    long_about = None
)]
struct Cli {
    #[arg(value_name = "CLAIMS", required_unless_present = "list", help = "JSON claim source")]
    claims: Option<PathBuf>,

    #[arg(
        long,
        value_name = "NAME",
        value_delimiter = ',',
        help = "Validate only these operations (repeatable or comma separated)"
    )]
    only: Vec<String>,

    #[arg(
        long,
        value_name = "N,N,...",
        value_delimiter = ',',
        help = "Input sizes, strictly increasing, at least four"
    )]
    sizes: Option<Vec<usize>>,

    #[arg(long, value_name = "N", help = "Trials per input size")]
    trials: Option<usize>,

    #[arg(long, value_name = "SECS", help = "Overall profiling timeout in seconds")]
    timeout: Option<f64>,

    #[arg(long, value_name = "F", help = "Minimum confidence for CONFIRMED (0.0..=1.0)")]
    min_confidence: Option<f64>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[arg(long, help = "Profile independent operations in parallel")]
    parallel: bool,

    #[arg(long, value_name = "FILE", help = "JSON validator configuration; flags override it")]
    config: Option<PathBuf>,

    #[arg(long, help = "List the builtin reference operations and exit")]
    list: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_config(cli: &Cli) -> Result<ValidatorConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading configuration {}", path.display()))?;
            serde_json::from_str::<ValidatorConfig>(&text)
                .with_context(|| format!("parsing configuration {}", path.display()))?
        }
        None => ValidatorConfig::default(),
    };

    if cli.sizes.is_some() || cli.trials.is_some() {
        let mut profiler: ProfilerConfig = config.profiler().clone();
        if let Some(sizes) = &cli.sizes {
            profiler = profiler.input_sizes(sizes.clone());
        }
        if let Some(trials) = cli.trials {
            profiler = profiler.trials(trials);
        }
        config = config.profiler_config(profiler);
    }
    if let Some(secs) = cli.timeout {
        let timeout = Duration::try_from_secs_f64(secs)
            .ok()
            .filter(|t| !t.is_zero())
            .with_context(|| format!("--timeout must be a positive number of seconds, got {secs}"))?;
        config = config.timeout(timeout);
    }
    if let Some(min_confidence) = cli.min_confidence {
        config = config.min_confidence(min_confidence);
    }
    if cli.parallel {
        config = config.parallel(true);
    }

    config.validate()?;
    debug!(?config, "resolved configuration");
    Ok(config)
}

fn load_claims(cli: &Cli) -> Result<ClaimStore> {
    let Some(path) = &cli.claims else {
        bail!("no claim source given");
    };
    let claims = ClaimStore::load_path(path)
        .with_context(|| format!("loading claims from {}", path.display()))?;
    Ok(claims.restrict(cli.only.as_slice())?)
}

fn list_builtins() -> Result<()> {
    let registry = builtins::registry();
    let mut out = std::io::stdout().lock();
    for (name, reference) in registry.iter() {
        writeln!(out, "{name:<18} {}", reference.description().unwrap_or(""))?;
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<u8> {
    let registry = builtins::registry();
    let (claims, config) = match load_claims(cli).and_then(|claims| Ok((claims, build_config(cli)?))) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("error: {err:#}");
            return Ok(EXIT_LOAD_FAILURE);
        }
    };

    let run = Validator::new(config).run(&claims, &registry)?;
    let report = Report::new(run.into_results());

    let rendered = match cli.format {
        OutputFormat::Text => report.to_text(),
        OutputFormat::Json => report.to_json()?,
    };
    let mut out = std::io::stdout().lock();
    out.write_all(rendered.as_bytes())?;
    if !rendered.ends_with('\n') {
        out.write_all(b"\n")?;
    }
    out.flush()?;

    Ok(report.exit_code())
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    if cli.list {
        return match list_builtins() {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("error: {err:#}");
                ExitCode::FAILURE
            }
        };
    }

    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(EXIT_LOAD_FAILURE)
        }
    }
}

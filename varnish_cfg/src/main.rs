//! # varnish_cfg
//!
//! Command-line front end for varnish configuration generation.
//!
//! Validates and normalizes storage specs (`malloc,10%`,
//! `file,/var/lib/varnish,20G,16k`) against host facts, and builds the
//! ordered, deduplicated runtime option string for `varnishd`.
//!
//! Host facts come from `--facts` (flat facter-style JSON for `.json`
//! files, structured TOML otherwise) or from the `[facts]` section of the
//! configuration file. Any validation error is fatal: it is logged and the
//! process exits with status 1.

mod commands;
mod error;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;
use varnish_common::config::{ConfigError, VarnishConfig, load_config};
use varnish_common::consts::DEFAULT_CONFIG_PATH;
use varnish_common::facts::HostFacts;

use crate::commands::OptionsReport;
use crate::error::{CliError, CliResult};

/// varnish_cfg: storage spec and runtime option normalizer
#[derive(Parser, Debug)]
#[command(name = "varnish_cfg")]
#[command(version)]
#[command(about = "Validate and normalize varnish storage specs and runtime options")]
struct Args {
    /// Path to the TOML configuration file.
    /// Defaults to /etc/varnish/varnish-cfg.toml when present.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Host facts file (.json = flat facter output, otherwise TOML).
    #[arg(long, value_name = "FILE")]
    facts: Option<PathBuf>,

    /// Result output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate storage specs; fails on the first invalid one.
    Validate {
        #[arg(required = true)]
        specs: Vec<String>,
    },
    /// Print the normalized form of each storage spec.
    Normalize {
        #[arg(required = true)]
        specs: Vec<String>,
    },
    /// Build the runtime option string from configured options plus these.
    Options {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        options: Vec<String>,
    },
    /// Normalize configured storage specs into `-s` options and print the
    /// full runtime option string.
    Render,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    let args = Args::parse();
    let config = read_config(args.config.as_deref());
    let level = match &config {
        Ok(config) if !args.verbose => config.shared.log_level.into(),
        _ if args.verbose => Level::DEBUG,
        _ => Level::INFO,
    };
    setup_tracing(level, args.json);

    let result = config.map_err(CliError::from).and_then(|config| {
        info!(
            "{} v{} starting",
            config.shared.service_name,
            env!("CARGO_PKG_VERSION")
        );
        run(&args, &config)
    });

    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }
}

fn read_config(path: Option<&Path>) -> Result<VarnishConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => load_config(Path::new(DEFAULT_CONFIG_PATH)),
        None => Ok(VarnishConfig::default()),
    }
}

fn resolve_facts(args: &Args, config: &VarnishConfig) -> CliResult<HostFacts> {
    if let Some(path) = &args.facts {
        info!("Loading host facts from {}", path.display());
        if config.facts.is_some() {
            warn!("--facts overrides the [facts] section of the configuration");
        }
        return Ok(HostFacts::load(path)?);
    }
    config.facts.clone().ok_or(CliError::NoFacts)
}

fn run(args: &Args, config: &VarnishConfig) -> CliResult<()> {
    match &args.command {
        Command::Validate { specs } => {
            let facts = resolve_facts(args, config)?;
            let reports = commands::validate(specs, &facts)?;
            emit(args.output, &reports, || {
                reports.iter().map(|r| format!("{}: ok", r.spec)).collect()
            })
        }
        Command::Normalize { specs } => {
            let facts = resolve_facts(args, config)?;
            let reports = commands::normalize(specs, &facts)?;
            emit(args.output, &reports, || {
                reports.iter().map(|r| r.normalized.clone()).collect()
            })
        }
        Command::Options { options } => {
            let set = commands::options(&config.runtime.options, options);
            let report = OptionsReport::from(&set);
            emit(args.output, &report, || vec![report.args.clone()])
        }
        Command::Render => {
            let facts = resolve_facts(args, config)?;
            let set = commands::render(config, &facts)?;
            let report = OptionsReport::from(&set);
            emit(args.output, &report, || vec![report.args.clone()])
        }
    }
}

fn emit<T: Serialize>(
    format: OutputFormat,
    value: &T,
    lines: impl FnOnce() -> Vec<String>,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => {
            for line in lines() {
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn setup_tracing(level: Level, json: bool) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // Results go to stdout; logs stay on stderr.
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}

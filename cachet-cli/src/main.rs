//! Cachet CLI
//!
//! Inspect cache option files and sample the TTLs they produce.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cachet_config::{build_configuration, ConfigOptions, Configuration, Defaults, TracingLogger};

/// Cachet - per-type cache configuration
#[derive(Parser)]
#[command(name = "cachet")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the configuration an option file produces
    Show {
        /// Option file (JSON)
        file: PathBuf,
        /// Name of the cached type
        #[arg(short = 't', long = "type", default_value = "Object", env = "CACHET_TYPE")]
        type_name: String,
    },

    /// Resolve many TTLs and summarize them
    Sample {
        /// Option file (JSON)
        file: PathBuf,
        /// Number of TTLs to resolve
        #[arg(short, long, default_value = "1000")]
        count: usize,
        /// Name of the cached type
        #[arg(short = 't', long = "type", default_value = "Object", env = "CACHET_TYPE")]
        type_name: String,
    },

    /// Check the TTL and randomization scale in an option file
    Validate {
        /// Option file (JSON)
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "cachet=debug,info"
    } else {
        "cachet=info,warn"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    match cli.command {
        Commands::Show { file, type_name } => cmd_show(&file, &type_name),
        Commands::Sample { file, count, type_name } => cmd_sample(&file, count, &type_name),
        Commands::Validate { file } => cmd_validate(&file),
    }
}

/// Loads an option file and builds a configuration from it.
fn load(file: &Path, type_name: &str) -> Result<Configuration<()>> {
    let options = ConfigOptions::from_file(file)
        .with_context(|| format!("Failed to load options from {}", file.display()))?;
    let defaults = Defaults::new().with_logger(std::sync::Arc::new(TracingLogger));
    let config = build_configuration(type_name, &defaults, options);
    debug!(?config, "Built configuration");
    Ok(config)
}

/// Print the merged configuration
fn cmd_show(file: &Path, type_name: &str) -> Result<()> {
    let config = load(file, type_name)?;

    println!("{} {}", "⚙️  Configuration for".cyan().bold(), type_name);
    println!("{}", config.to_options().to_json_pretty()?);

    if config.validate().is_err() {
        println!(
            "\n{}",
            "⚠️  TTL or randomization scale is invalid; run `cachet validate` for details.".yellow()
        );
    }

    Ok(())
}

/// Sample resolved TTLs
fn cmd_sample(file: &Path, count: usize, type_name: &str) -> Result<()> {
    let config = load(file, type_name)?;

    println!("{} {} TTLs for {}", "🎲 Sampling".cyan().bold(), count, type_name);

    let samples = (0..count)
        .map(|_| config.resolve_ttl_secs(None))
        .collect::<cachet_config::Result<Vec<f64>>>()
        .context("Failed to resolve TTL")?;

    let Some(summary) = Summary::of(&samples) else {
        println!("\n{}", "No samples requested.".yellow());
        return Ok(());
    };

    info!(count, min = summary.min, max = summary.max, "Sampled TTLs");

    println!("   {} {:.3}s", "Min:".dimmed(), summary.min);
    println!("   {} {:.3}s", "Mean:".dimmed(), summary.mean);
    println!("   {} {:.3}s", "Max:".dimmed(), summary.max);

    if config.ttl_randomization() {
        let base = config.ttl().as_fixed().unwrap_or_default();
        let scale = config.ttl_randomization_scale();
        println!(
            "   {} [{:.3}s, {:.3}s) (scale {})",
            "Expected:".dimmed(),
            base * scale.low,
            base * scale.high,
            scale
        );
    }

    Ok(())
}

/// Validate an option file
fn cmd_validate(file: &Path) -> Result<()> {
    let options = ConfigOptions::from_file(file)
        .with_context(|| format!("Failed to load options from {}", file.display()))?;

    match options.validate() {
        Ok(()) => {
            println!("{} {}", "✅ Valid:".green().bold(), file.display());
            if !options.extra.is_empty() {
                let keys: Vec<&str> = options.extra.keys().map(String::as_str).collect();
                println!("   {} {}", "Pass-through keys:".dimmed(), keys.join(", "));
            }
            Ok(())
        }
        Err(e) => {
            println!("{} {}", "❌ Invalid:".red().bold(), e);
            Err(e).context("Option file failed validation")
        }
    }
}

/// Min / mean / max of a set of samples.
#[derive(Debug, PartialEq)]
struct Summary {
    min: f64,
    mean: f64,
    max: f64,
}

impl Summary {
    fn of(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        Some(Self { min, mean, max })
    }
}

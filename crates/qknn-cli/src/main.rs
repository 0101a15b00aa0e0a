//! qknn command-line interface
//!
//! Loads a labelled dataset, standardizes and amplitude-encodes it, and
//! classifies with a quantum-kernel k-nearest-neighbour rule.
//!
//! ```text
//! qknn evaluate --dataset breast_cancer.json --qubits 5 --k 3 --seed 42
//! qknn classify --dataset breast_cancer.json --query 14.2,20.1,...
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

use qknn_core::KernelMode;

mod commands;

use commands::common::Overrides;
use commands::{classify, evaluate, version};

/// qknn - quantum-kernel k-nearest-neighbour classification
#[derive(Parser)]
#[command(name = "qknn")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// YAML configuration file (QKNN_* environment variables override it)
    #[arg(short, long, global = true, env = "QKNN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every classification command.
#[derive(Args, Debug, Default)]
struct ModelArgs {
    /// Number of neighbours that vote
    #[arg(short, long)]
    k: Option<usize>,

    /// Number of qubits; sets the encoded dimension to 2^qubits
    #[arg(short, long, conflicts_with = "target_dim")]
    qubits: Option<u32>,

    /// Encoded dimension (must be at least the number of features)
    #[arg(long)]
    target_dim: Option<usize>,

    /// Kernel implementation (closed_form, circuit)
    #[arg(long)]
    kernel: Option<KernelMode>,

    /// Skip feature standardization
    #[arg(long)]
    no_standardize: bool,
}

impl ModelArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            k: self.k,
            target_dim: self.target_dim.or(self.qubits.map(|q| 1usize << q)),
            kernel: self.kernel,
            standardize: self.no_standardize.then_some(false),
            ..Overrides::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Split a dataset, classify the test partition and report accuracy
    Evaluate {
        /// Dataset file (JSON)
        #[arg(short, long)]
        dataset: PathBuf,

        #[command(flatten)]
        model: ModelArgs,

        /// Fraction of samples held out for testing
        #[arg(long)]
        test_size: Option<f64>,

        /// Shuffle seed for a reproducible split
        #[arg(long)]
        seed: Option<u64>,

        /// Classify test samples in parallel
        #[arg(long)]
        parallel: bool,

        /// Write a JSON report to this file
        #[arg(short, long)]
        export: Option<PathBuf>,
    },

    /// Classify a single feature vector against a whole dataset
    Classify {
        /// Dataset file (JSON), used entirely as the training set
        #[arg(short, long)]
        dataset: PathBuf,

        /// Comma-separated feature values
        #[arg(long, allow_hyphen_values = true)]
        query: String,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // RUST_LOG, when set, takes precedence over -v
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    // Execute command
    let result = match cli.command {
        Commands::Evaluate {
            dataset,
            model,
            test_size,
            seed,
            parallel,
            export,
        } => {
            let overrides = Overrides {
                test_size,
                seed,
                parallel: parallel.then_some(true),
                ..model.overrides()
            };
            evaluate::execute(&dataset, cli.config.as_deref(), &overrides, export.as_deref())
        }

        Commands::Classify {
            dataset,
            query,
            model,
        } => classify::execute(&dataset, cli.config.as_deref(), &model.overrides(), &query),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_qubits_sets_target_dim() {
        let cli = Cli::parse_from(["qknn", "evaluate", "-d", "data.json", "--qubits", "5"]);
        let Commands::Evaluate { model, .. } = cli.command else {
            panic!("expected evaluate");
        };
        assert_eq!(model.overrides().target_dim, Some(32));
    }

    #[test]
    fn test_qubits_conflicts_with_target_dim() {
        let parsed = Cli::try_parse_from([
            "qknn",
            "evaluate",
            "-d",
            "data.json",
            "--qubits",
            "5",
            "--target-dim",
            "32",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_kernel_flag_parses() {
        let cli = Cli::parse_from([
            "qknn", "classify", "-d", "data.json", "--query", "-1.0,2.5", "--kernel", "circuit",
        ]);
        let Commands::Classify { model, query, .. } = cli.command else {
            panic!("expected classify");
        };
        assert_eq!(model.kernel, Some(KernelMode::Circuit));
        assert_eq!(query, "-1.0,2.5");
    }
}

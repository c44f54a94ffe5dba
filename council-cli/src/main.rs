//! Council CLI - Command line interface for the council engine
//!
//! Verifies reviewer findings against a working tree and reconciles the
//! findings of several reviewers into one council report.

mod commands;

use clap::{Parser, Subcommand};
use council_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{ConsensusArgs, VerifyArgs};

/// Council: verification and consensus for multi-reviewer code findings
#[derive(Parser, Debug)]
#[command(name = "council")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Minimum consensus score (overrides config and env)
    #[arg(long, global = true, env = "COUNCIL_MIN_CONSENSUS")]
    min_consensus: Option<f64>,

    /// Clustering similarity threshold (overrides config and env)
    #[arg(long, global = true, env = "COUNCIL_SIMILARITY_THRESHOLD")]
    similarity_threshold: Option<f64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Verify one reviewer's findings against the working tree
    #[command(visible_alias = "v")]
    Verify(VerifyArgs),

    /// Synthesize a council report from several reviewer outputs
    #[command(visible_alias = "c")]
    Consensus(ConsensusArgs),

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    // Load configuration with overrides
    let config = Config::load_with_overrides(cli.min_consensus, cli.similarity_threshold)?;

    if cli.verbose {
        tracing::info!(
            min_consensus = config.consensus.min_consensus_threshold,
            similarity_threshold = config.consensus.similarity_threshold,
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("council {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Verify(args)) => {
            args.execute(cli.verbose).await?;
        }
        Some(Commands::Consensus(args)) => {
            args.execute(cli.verbose, &config).await?;
        }
        Some(Commands::Config) => {
            let consensus = &config.consensus;
            println!("Council Configuration");
            println!("=====================");
            println!();
            println!("Consensus Settings:");
            println!("  min_consensus_threshold: {}", consensus.min_consensus_threshold);
            println!("  agreement_boost: {}", consensus.agreement_boost);
            println!("  dispute_penalty: {}", consensus.dispute_penalty);
            println!(
                "  include_single_source_findings: {}",
                consensus.include_single_source_findings
            );
            println!(
                "  single_source_min_confidence: {}",
                consensus.single_source_min_confidence
            );
            println!("  similarity_threshold: {}", consensus.similarity_threshold);
            println!();
            if let Some(path) = Config::default_config_path() {
                println!("Config file: {}", path.display());
                if path.exists() {
                    println!("  (exists)");
                } else {
                    println!("  (not found - using defaults)");
                }
            }
        }
        None => {
            println!("Council - Verification and consensus for multi-reviewer code findings");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

//! Roster - MCP Server Registration & Health
//!
//! Usage:
//!   roster reconcile [ENV]    # converge the host CLI registry on the document
//!   roster healthcheck [ENV]  # probe descriptor endpoints for reachability

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roster_core::config::load_descriptor_document;
use roster_core::probe::{HealthReport, ProbeOutcome, Prober};
use roster_core::reconcile::{ReconcileOutcome, Reconciler, RunReport};
use roster_core::registrar::{DEFAULT_REGISTRAR_PROGRAM, HostCliRegistrar};
use roster_core::resolve::ResolveContext;

#[derive(Parser)]
#[command(name = "roster")]
#[command(about = "MCP server registration reconciler and health checker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile descriptors against the host CLI registrar
    ///
    /// Each descriptor is removed from the registry (when present) and
    /// re-added from the document, so the registry converges on the document
    /// regardless of its prior contents.
    Reconcile {
        /// Target environment bucket (merged after 'common')
        #[arg(default_value = "dev")]
        env: String,

        /// Descriptor document path
        #[arg(long, default_value = "mcp-servers.json")]
        config: PathBuf,

        /// Host CLI binary acting as the registrar
        #[arg(long, default_value = DEFAULT_REGISTRAR_PROGRAM)]
        registrar: String,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Probe descriptor endpoints for reachability
    Healthcheck {
        /// Target environment bucket (merged after 'common')
        #[arg(default_value = "dev")]
        env: String,

        /// Descriptor document path
        #[arg(long, default_value = "mcp-servers.json")]
        config: PathBuf,

        /// Probe timeout in seconds
        #[arg(long, default_value_t = 5)]
        timeout: u64,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable lines
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roster=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let failed = match cli.command {
        Commands::Reconcile {
            env,
            config,
            registrar,
            format,
        } => run_reconcile(&env, &config, &registrar, format)?,
        Commands::Healthcheck {
            env,
            config,
            timeout,
            format,
        } => run_healthcheck(&env, &config, timeout, format).await?,
    };

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

fn run_reconcile(
    env: &str,
    config: &PathBuf,
    registrar_program: &str,
    format: OutputFormat,
) -> Result<bool> {
    let document = load_descriptor_document(config)?;
    let descriptors = document.effective_descriptors(env);

    let ctx = ResolveContext::from_current_dir()?;
    let registrar = HostCliRegistrar::new(registrar_program);
    let report = Reconciler::new(&registrar, ctx).reconcile(&descriptors);

    print_reconcile_report(env, &report, format)?;
    Ok(report.has_failures())
}

async fn run_healthcheck(
    env: &str,
    config: &PathBuf,
    timeout_secs: u64,
    format: OutputFormat,
) -> Result<bool> {
    let document = load_descriptor_document(config)?;
    let descriptors = document.effective_descriptors(env);

    let ctx = ResolveContext::from_current_dir()?;
    let prober = Prober::new(ctx, Duration::from_secs(timeout_secs))?;
    let report = prober.probe_all(&descriptors).await;

    print_health_report(env, &report, format)?;
    Ok(report.has_failures())
}

fn print_reconcile_report(env: &str, report: &RunReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            for entry in &report.reports {
                match &entry.outcome {
                    ReconcileOutcome::Succeeded => {
                        println!("{} {}", style("✓").green(), entry.name);
                    }
                    ReconcileOutcome::Skipped { reason } => {
                        println!("{} {} skipped: {}", style("•").dim(), entry.name, reason);
                    }
                    ReconcileOutcome::Failed { reason } => {
                        println!("{} {} failed: {}", style("✗").red(), entry.name, reason);
                    }
                }
                for warning in &entry.warnings {
                    println!("  {} {}", style("⚠").yellow(), warning);
                }
            }
            let (succeeded, skipped, failed) = report.counts();
            println!(
                "\nReconciled '{}': {} succeeded, {} skipped, {} failed",
                env, succeeded, skipped, failed
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
    }
    Ok(())
}

fn print_health_report(env: &str, report: &HealthReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            for entry in &report.reports {
                match &entry.outcome {
                    ProbeOutcome::Reachable { endpoint } => {
                        println!("{} {} ({})", style("✓").green(), entry.name, endpoint);
                    }
                    ProbeOutcome::Skipped { reason } => {
                        println!("{} {} skipped: {}", style("•").dim(), entry.name, reason);
                    }
                    ProbeOutcome::Unreachable { endpoint, reason } => {
                        println!(
                            "{} {} unreachable ({}): {}",
                            style("✗").red(),
                            entry.name,
                            endpoint,
                            reason
                        );
                    }
                }
                for warning in &entry.warnings {
                    println!("  {} {}", style("⚠").yellow(), warning);
                }
            }
            let (reachable, skipped, unreachable) = report.counts();
            println!(
                "\nHealth '{}': {} reachable, {} skipped, {} unreachable",
                env, reachable, skipped, unreachable
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
    }
    Ok(())
}

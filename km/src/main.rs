//! km - distributed k-means
//!
//! CLI entry point: loads a dataset, seeds centroids and runs the protocol on a
//! local group of ranks.

use std::path::PathBuf;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use tracing::{debug, info};

use collective::DEFAULT_CHANNEL_BUFFER;
use kmeans_spmd::cli::{Cli, Command, OutputFormat};
use kmeans_spmd::config::Config;
use kmeans_spmd::{
    ClusterResult, KMeansRun, LoadOptions, Partition, RunOptions, UpdateRule, initial_centroids, load_dataset,
    seeded_rng, write_dump,
};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre!("Failed to initialize tracing: {}", e))?;

    debug!(?level, "Logging initialized");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Run {
            input,
            clusters,
            workers,
            max_iterations,
            seed,
            update_rule,
            output,
            skip_malformed,
            format,
        } => {
            let config = Config {
                input: input.or(config.input),
                clusters: clusters.unwrap_or(config.clusters),
                workers: workers.unwrap_or(config.workers),
                max_iterations: max_iterations.unwrap_or(config.max_iterations),
                seed: seed.or(config.seed),
                update_rule: update_rule.unwrap_or(config.update_rule),
                output: output.or(config.output),
                skip_malformed: skip_malformed || config.skip_malformed,
                log_level: config.log_level,
            };
            cmd_run(&config, format).await
        }
        Command::Inspect {
            input,
            workers,
            skip_malformed,
        } => {
            let input = input.or(config.input.clone());
            let workers = workers.unwrap_or(config.workers);
            cmd_inspect(input, workers, skip_malformed || config.skip_malformed)
        }
        Command::Config => cmd_config(&config),
    }
}

fn require_input(input: Option<PathBuf>) -> Result<PathBuf> {
    input.ok_or_else(|| eyre!("No dataset given. Pass --input or set `input` in the config file"))
}

/// Cluster the configured dataset and report the result
async fn cmd_run(config: &Config, format: OutputFormat) -> Result<()> {
    debug!(?config, %format, "cmd_run: called");
    let input = require_input(config.input.clone())?;

    let dataset = load_dataset(
        &input,
        LoadOptions {
            skip_malformed: config.skip_malformed,
        },
    )
    .context("Failed to load dataset")?;

    let mut rng = seeded_rng(config.seed);
    let centroids =
        initial_centroids(&dataset, config.clusters, &mut rng).context("Failed to choose initial centroids")?;

    let run = KMeansRun::new(RunOptions {
        workers: config.workers,
        max_iterations: config.max_iterations,
        update_rule: config.update_rule,
        channel_buffer: DEFAULT_CHANNEL_BUFFER,
    });
    let result = run.execute(dataset, centroids).await.context("Distributed run failed")?;

    if let Some(output) = &config.output {
        write_dump(output, &result.centroids, &result.dataset).context("Failed to write result dump")?;
    }

    match format {
        OutputFormat::Text => print_text(&result, config.update_rule, config.output.as_ref()),
        OutputFormat::Json => print_json(&result)?,
    }

    info!(rounds = result.rounds, converged = result.converged, "Run complete");
    Ok(())
}

fn print_text(result: &ClusterResult, rule: UpdateRule, output: Option<&PathBuf>) {
    if result.converged {
        println!("{} Converged after {} rounds", "✓".green(), result.rounds);
    } else {
        println!(
            "{} Stopped at the iteration cap after {} rounds",
            "!".yellow(),
            result.rounds
        );
    }
    println!("  Clusters: {} ({} rule)", result.centroids.len(), rule);
    println!(
        "  Points: {} distributed, {} dropped",
        result.distributed_points, result.dropped_points
    );
    if result.degenerate_clusters.is_empty() {
        println!("  Degenerate clusters: none");
    } else {
        let ids: Vec<String> = result.degenerate_clusters.iter().map(|c| c.to_string()).collect();
        println!("  Degenerate clusters: {}", ids.join(", ").yellow());
    }
    if let Some(path) = output {
        println!("  Dump: {}", path.display().to_string().cyan());
    }
    println!("elapsed: {} ms", result.elapsed_ms());
}

fn print_json(result: &ClusterResult) -> Result<()> {
    let report = serde_json::json!({
        "rounds": result.rounds,
        "converged": result.converged,
        "elapsed_ms": result.elapsed_ms() as u64,
        "distributed_points": result.distributed_points,
        "dropped_points": result.dropped_points,
        "degenerate_clusters": result.degenerate_clusters,
        "centroids": result.centroids,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Show how the dataset splits across `workers` ranks
fn cmd_inspect(input: Option<PathBuf>, workers: usize, skip_malformed: bool) -> Result<()> {
    debug!(?input, workers, skip_malformed, "cmd_inspect: called");
    let input = require_input(input)?;
    if workers == 0 {
        return Err(eyre!("Worker count must be at least 1"));
    }

    let dataset = load_dataset(&input, LoadOptions { skip_malformed }).context("Failed to load dataset")?;
    let partition = Partition::new(dataset.len(), workers);

    println!("Dataset: {}", input.display().to_string().cyan());
    println!("  Points: {}", partition.total());
    println!("  Workers: {}", partition.workers());
    println!("  Chunk size: {}", partition.chunk_len());
    println!("  Distributed: {}", partition.distributed_len());
    if partition.dropped() > 0 {
        println!("  Dropped: {}", partition.dropped().to_string().yellow());
    } else {
        println!("  Dropped: 0");
    }
    Ok(())
}

/// Print the effective configuration as YAML
fn cmd_config(config: &Config) -> Result<()> {
    debug!("cmd_config: called");
    print!("{}", config.to_yaml()?);
    Ok(())
}

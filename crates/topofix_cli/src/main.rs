mod config;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use crate::config::Config;
use topofix_core::{load_for_verification, patch_file, ModelSummary, PatchOptions};

#[derive(Parser)]
#[command(name = "topofix")]
#[command(about = "Normalize TF.js layers-model topology files for the legacy loader")]
struct Cli {
    /// Emit logs as JSON instead of human-readable lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Patch model files in place, keeping a one-time backup of each
    Patch {
        /// Model JSON file(s) to patch
        #[arg(required = true)]
        models: Vec<PathBuf>,
        /// Skip the backup copy
        #[arg(long)]
        no_backup: bool,
        /// Pretty-print the rewritten JSON (default is compact)
        #[arg(long)]
        pretty: bool,
        /// Report what would change without writing anything
        #[arg(long)]
        dry_run: bool,
        /// Optional TOML config file (flags override it)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Load a model plus its weight shards and verify it is structurally sound
    Verify {
        /// Model JSON file
        model: PathBuf,
    },
}

fn patch_command(
    models: &[PathBuf],
    no_backup: bool,
    pretty: bool,
    dry_run: bool,
    config_path: Option<&PathBuf>,
) -> anyhow::Result<()> {
    let config = match config_path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    let options = PatchOptions {
        backup: config.backup.enabled && !no_backup,
        backup_marker: config.backup.marker.clone(),
        pretty: config.output.pretty || pretty,
        dry_run,
    };

    for model in models {
        let report = patch_file(model, &options)
            .with_context(|| format!("Failed to patch {}", model.display()))?;

        let action = if report.written { "patched" } else { "dry-run" };
        println!(
            "{}: {} (batch_shape: {}, inbound_nodes: {})",
            model.display(),
            action,
            report.counts.batch_shape,
            report.counts.inbound_nodes
        );
        if let Some(backup) = &report.backup_path {
            println!("  original kept at {}", backup.display());
        }
    }
    Ok(())
}

fn verify_command(model: &PathBuf) -> anyhow::Result<()> {
    let loaded = load_for_verification(model)
        .with_context(|| format!("Failed to load {}", model.display()))?;

    let summary = ModelSummary::build(
        loaded
            .model
            .topology()
            .context("model has no topology after load")?,
        &loaded.manifest,
        loaded.weights.len(),
    )
    .context("Model failed structural verification")?;

    println!("{summary}");
    info!(
        layers = summary.layers.len(),
        tensors = summary.tensor_count,
        params = summary.total_params,
        inbound_patched = loaded.inbound_patched,
        "Model verified"
    );
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    // Initialize structured logging
    if cli.json_logs {
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::INFO)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("setting default subscriber failed");
    } else {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("setting default subscriber failed");
    }

    let result = match &cli.command {
        Commands::Patch {
            models,
            no_backup,
            pretty,
            dry_run,
            config,
        } => patch_command(models, *no_backup, *pretty, *dry_run, config.as_ref()),
        Commands::Verify { model } => verify_command(model),
    };

    if let Err(e) = result {
        error!(error = %e, "Fatal Error");
        std::process::exit(1);
    }
}

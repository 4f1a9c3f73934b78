use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use partfinder_cli::{init_tracing, load_config, load_embedder};
use partfinder_core::config::resolve_with_base;
use partfinder_index::MapBuilder;

#[derive(Parser)]
#[command(name = "partfinder-indexer", version, about = "Build the structured maps and the vector store")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Derive the three lookup maps from scraped records.
    BuildMaps {
        /// JSON array of `{part_number, models}` records.
        #[arg(long)]
        compatibility: Option<PathBuf>,
        /// JSON array of `{part_number, title, text, url}` records.
        #[arg(long)]
        installation: Option<PathBuf>,
        /// Output directory; defaults to the directory of `data.parts_to_models`.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Embed the corpus files in a directory and append them to the vector table.
    Ingest {
        #[arg(long)]
        data_dir: PathBuf,
        /// Remove the existing store first.
        #[arg(long)]
        fresh: bool,
        #[arg(long)]
        no_progress: bool,
    },
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config()?;
    let settings = config.settings();
    let base = std::env::current_dir()?;

    match cli.command {
        Command::BuildMaps { compatibility, installation, out } => {
            if compatibility.is_none() && installation.is_none() {
                bail!("nothing to build: pass --compatibility and/or --installation");
            }
            let mut builder = MapBuilder::new();
            if let Some(path) = &compatibility {
                builder.extend_compatibility(&MapBuilder::read_compatibility(path)?);
            }
            if let Some(path) = &installation {
                builder.extend_installation(&MapBuilder::read_installation(path)?);
            }
            let out = match out {
                Some(dir) => dir,
                None => resolve_with_base(&base, &settings.data.parts_to_models)
                    .parent()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| base.clone()),
            };
            let paths = builder.write_to(&out)?;
            let stats = builder.build().stats();
            info!(
                dir = %out.display(),
                parts = stats.parts,
                models = stats.models,
                manuals = stats.manuals,
                skipped = builder.skipped_installation(),
                "maps written"
            );
            println!("{}", paths.parts_to_models.display());
            println!("{}", paths.model_to_parts.display());
            println!("{}", paths.installation_manual.display());
        }
        Command::Ingest { data_dir, fresh, no_progress } => {
            let lancedb_dir = resolve_with_base(&base, &settings.data.lancedb_dir);
            if fresh && lancedb_dir.exists() {
                fs::remove_dir_all(&lancedb_dir)?;
            }
            fs::create_dir_all(&lancedb_dir)?;
            let embedder = load_embedder(settings)?;
            let written = partfinder_vector::ingest_dir(
                &data_dir,
                &lancedb_dir,
                &settings.data.table,
                embedder,
                !no_progress,
            )
            .await?;
            info!(written, table = %settings.data.table, dir = %lancedb_dir.display(), "ingest complete");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %format!("{err:#}"), "indexer failed");
            ExitCode::FAILURE
        }
    }
}

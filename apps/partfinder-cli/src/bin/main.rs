use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;

use partfinder_cli::{build_service, init_tracing, is_fatal, load_config, load_index};
use partfinder_core::{Appliance, Error, Intent};
use partfinder_hybrid::{IntentRouter, RetrieveOptions};

#[derive(Parser)]
#[command(name = "partfinder", version, about = "Hybrid retrieval over appliance parts data")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one retrieval pipeline and print the routed result as JSON.
    Retrieve {
        /// Classifier label: compatibility, installation, troubleshoot, qna.
        /// Anything else is out of scope.
        #[arg(long, default_value = "qna")]
        intent: String,
        #[arg(long)]
        appliance: Option<Appliance>,
        /// Override the configured result count.
        #[arg(long)]
        k: Option<usize>,
        /// Skip the vector store entirely.
        #[arg(long)]
        no_semantic: bool,
        query: String,
    },
    /// Query the structured index directly.
    Lookup {
        #[command(subcommand)]
        target: Lookup,
    },
}

#[derive(Subcommand)]
enum Lookup {
    /// Models compatible with a part.
    Part { id: String },
    /// Parts compatible with a model.
    Model { id: String },
    /// Installation manual for a part.
    Manual { id: String },
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config()?;
    let settings = config.settings();
    let base = std::env::current_dir()?;

    match cli.command {
        Command::Retrieve { intent, appliance, k, no_semantic, query } => {
            let service = build_service(&base, settings, !no_semantic).await?;
            let router = IntentRouter::new(Arc::new(service));
            let opts = RetrieveOptions { appliance, k };
            let outcome = router.route_with(Intent::from_label(&intent), &query, opts).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Lookup { target } => {
            let index = load_index(&base, settings)?;
            let out = match target {
                Lookup::Part { id } => json!({ "part": id, "models": index.lookup_part(&id) }),
                Lookup::Model { id } => json!({ "model": id, "parts": index.lookup_model(&id) }),
                Lookup::Manual { id } => {
                    let entry = index
                        .lookup_manual(&id)
                        .ok_or_else(|| Error::NotFound(format!("no installation manual for {id}")))?;
                    json!({ "part": id, "manual": entry })
                }
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
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
            if is_fatal(&err) {
                error!(error = %format!("{err:#}"), "fatal startup error");
            } else {
                error!(error = %format!("{err:#}"), "command failed");
            }
            ExitCode::FAILURE
        }
    }
}

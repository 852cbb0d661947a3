//! # README Harness CLI (`readme`)
//!
//! ## Usage
//!
//! ```bash
//! readme --config ./config/readme.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `readme get <ref>` | Print the README of one entity |
//! | `readme candidates` | Print the file names probed, in order |
//! | `readme serve` | Start the HTTP server |
//! | `readme index` | Publish README search documents on a schedule |
//!
//! ## Examples
//!
//! ```bash
//! readme get component:default/payments-api
//! readme get payments-api --strip-markdown
//! readme get payments-api --json
//! readme index --once
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use readme_harness::config::{self, Config};
use readme_harness::search::{self, IndexSchedule, JsonLinesSink, ReadmeCollator};
use readme_harness::server;
use readme_harness::service::ReadmeService;

const DEFAULT_LOG_FILTER: &str = "readme_harness=info,readme_harness_core=info";

/// Resolve, cache, and serve the README of every catalog entity.
#[derive(Parser)]
#[command(name = "readme", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/readme.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the README of an entity.
    ///
    /// Accepts `kind:namespace/name`, `kind:name`, `namespace/name` or `name`.
    Get {
        entity_ref: String,

        /// Reduce markdown to plain text.
        #[arg(long)]
        strip_markdown: bool,

        /// Print the action output as JSON instead of the raw document.
        #[arg(long)]
        json: bool,
    },

    /// List README file names in the order they are probed.
    Candidates,

    /// Start the HTTP server on `[server].bind`.
    Serve,

    /// Collate README search documents into `[readme.search].output`.
    Index {
        /// Run a single pass and exit instead of following the schedule.
        #[arg(long)]
        once: bool,
    },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    // Listing candidates works without a config file, but not with a broken one.
    if let Commands::Candidates = cli.command {
        let cfg = if cli.config.exists() {
            config::load_config(&cli.config)?
        } else {
            Config::default()
        };
        let service = ReadmeService::from_config(&cfg)?;
        for candidate in service.resolver().candidates() {
            println!("{}\t{}", candidate.name, candidate.content_type);
        }
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Get {
            entity_ref,
            strip_markdown,
            json,
        } => {
            let service = ReadmeService::from_config(&cfg)?;
            let output = service.get_readme_output(&entity_ref, strip_markdown).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{}", output.content);
            }
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Index { once } => run_index(&cfg, once).await?,
        Commands::Candidates => {}
    }

    Ok(())
}

async fn run_index(cfg: &Config, once: bool) -> anyhow::Result<()> {
    let service = Arc::new(ReadmeService::from_config(cfg)?);
    let collator = ReadmeCollator::new(service, cfg.readme.strip_markdown_in_index);
    let sink = JsonLinesSink::new(cfg.readme.search.output.clone());

    if once {
        let count = search::run_once(&collator, &sink).await?;
        println!(
            "Indexed {} READMEs into {}",
            count,
            sink.path().display()
        );
        return Ok(());
    }

    let schedule = IndexSchedule::from_config(&cfg.readme.search.schedule)?;
    println!(
        "Indexing READMEs every {:?} into {} (Ctrl-C to stop)",
        schedule.frequency,
        sink.path().display()
    );
    search::run_scheduled(&collator, &sink, schedule, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await;
    Ok(())
}

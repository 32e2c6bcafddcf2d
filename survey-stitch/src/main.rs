//! survey-stitch - consolidate per-client survey results into one report
//!
//! Subcommands:
//! - `process`: stitch an explicit manifest/export/result folder into
//!   `<out>.json`, `<out>.csv`, `<out>.html` and `<out>.tar.gz`
//! - `status`: list the current manifest entries of a tag
//! - `bundle`: snapshot a tag's manifest and build a report in the temp folder

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use survey_common::config::{Overrides, Settings, TomlConfig};
use survey_common::Reindexer;
use survey_stitch::{BundleRequest, Inputs, LabelStyle};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "survey-stitch", version, about = "Survey result stitching")]
struct Cli {
    /// TOML bootstrap config (defaults to the platform config location)
    #[arg(long, global = true, env = "SURVEY_CONFIG")]
    config_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Stitch results into a multi-format report
    Process {
        /// Manifest file
        #[arg(long)]
        manifest: PathBuf,
        /// Field schema export
        #[arg(long)]
        config: PathBuf,
        /// Folder containing the result files
        #[arg(long)]
        dir: PathBuf,
        /// Output file naming (prefix)
        #[arg(long)]
        out: PathBuf,
        /// Leave question types out of the labels
        #[arg(long)]
        plain_labels: bool,
    },
    /// List the manifest entries of a tag
    Status {
        #[command(flatten)]
        location: Location,
    },
    /// Build a report for a tag in the temp folder
    Bundle {
        #[command(flatten)]
        location: Location,
        /// Field schema export of the running question set
        #[arg(long)]
        config: PathBuf,
        /// Scratch folder for the report
        #[arg(long)]
        temp: Option<PathBuf>,
        /// Leave question types out of the labels
        #[arg(long)]
        plain_labels: bool,
    },
}

#[derive(Debug, Args)]
struct Location {
    /// Storage root holding one folder per tag
    #[arg(long)]
    storage: Option<PathBuf>,
    /// Run tag
    #[arg(long)]
    tag: Option<String>,
}

fn label_style(plain: bool) -> LabelStyle {
    if plain {
        LabelStyle::Plain
    } else {
        LabelStyle::Typed
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (toml_config, config_error) = match TomlConfig::load(cli.config_file.as_deref()) {
        Ok(config) => (config, None),
        Err(e) => (TomlConfig::default(), Some(e)),
    };
    init_tracing(&toml_config.logging.level);
    if let Some(e) = config_error {
        warn!("Ignoring config file, using defaults: {}", e);
    }

    info!(
        "Starting survey-stitch v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match cli.command {
        Command::Process {
            manifest,
            config,
            dir,
            out,
            plain_labels,
        } => {
            let inputs = Inputs {
                manifest,
                config,
                directory: dir,
                out_name: out,
                labels: label_style(plain_labels),
            };
            let outputs = inputs.process().context("processing failure")?;
            println!("{}", outputs.bundle.display());
        }
        Command::Status { location } => {
            let settings = resolve(&location, None, &toml_config);
            let reindexer = Reindexer::new(&settings.storage);
            let manifest = reindexer
                .snapshot(&settings.tag)
                .await
                .with_context(|| format!("unable to read index for tag {}", settings.tag))?;
            println!("tag: {}", settings.tag);
            println!("manifest: {}", reindexer.manifest_path(&settings.tag).display());
            for entry in manifest.entries() {
                println!(
                    "{:>4}  {:<24}  {:<10}  {}",
                    entry.index, entry.client, entry.mode, entry.file
                );
            }
        }
        Command::Bundle {
            location,
            config,
            temp,
            plain_labels,
        } => {
            let settings = resolve(&location, temp, &toml_config);
            settings
                .ensure_directories()
                .context("unable to prepare storage folders")?;
            let reindexer = Reindexer::new(&settings.storage);
            let request = BundleRequest {
                tag: settings.tag.clone(),
                temp: settings.temp.clone(),
                export: config,
                labels: label_style(plain_labels),
                read: None,
            };
            match survey_stitch::bundle(&reindexer, &request).await {
                Some(output) => println!("{}", output.prefix.display()),
                None => {
                    error!(tag = %settings.tag, "bundling failed");
                    bail!("unable to process results");
                }
            }
        }
    }
    Ok(())
}

fn resolve(location: &Location, temp: Option<PathBuf>, config: &TomlConfig) -> Settings {
    let overrides = Overrides {
        storage: location.storage.clone(),
        temp,
        tag: location.tag.clone(),
    };
    Settings::resolve(&overrides, config)
}

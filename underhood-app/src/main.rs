use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use underhood_common::observability::init_logging;
use underhood_config::{UnderhoodConfig, UnderhoodConfigLoader};

mod pipeline;

/// Turn an author's week of tweets into an archive page.
#[derive(Parser)]
#[command(name = "underhood")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the document and print it as JSON
    Render(BuildArgs),
    /// Build the document, publish it and register the redirect
    Publish(BuildArgs),
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Twitter username whose archive is processed
    #[arg(long, env = "AUTHOR")]
    pub author: String,

    /// Archive dump; defaults to dump/<author>-tweets.json
    #[arg(long)]
    pub archive: Option<PathBuf>,

    /// Avatar image URL for the page
    #[arg(long, env = "AUTHOR_IMAGE")]
    pub avatar: Option<String>,

    /// Topic tag, repeatable
    #[arg(long = "topic")]
    pub topics: Vec<String>,

    /// Configuration file, used when present
    #[arg(long, default_value = "underhood.yaml")]
    pub config: PathBuf,
}

impl Command {
    fn args(&self) -> &BuildArgs {
        match self {
            Command::Render(args) | Command::Publish(args) => args,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let args = cli.command.args();

    // Env wins over the file.
    let cfg: UnderhoodConfig = UnderhoodConfigLoader::new()
        .with_optional_file(&args.config)
        .load()
        .with_context(|| format!("loading {}", args.config.display()))?;

    let log_file = init_logging(cfg.logging.to_log_config())?;
    tracing::debug!(file = %log_file.display(), "logging.ready");

    match &cli.command {
        Command::Render(args) => pipeline::render(&cfg, args),
        Command::Publish(args) => pipeline::publish(&cfg, args).await,
    }
}

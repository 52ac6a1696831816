//! `chunkup` command-line entry point.

mod app;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "chunkup", version, about = "Upload files in chunks to a multipart upload server")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload files one after another. Ctrl-C aborts the batch.
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, env = "CHUNKUP_SERVER_URL")]
        server: Option<String>,
        #[arg(long, env = "CHUNKUP_TOKEN", hide_env_values = true)]
        token: Option<String>,
        #[arg(long)]
        chunk_size_mb: Option<u64>,
        #[arg(long)]
        folder: Option<String>,
    },
    /// Validate files against the configured rules without uploading.
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = config::load(cli.config.as_deref())?;

    let all_ok = match cli.command {
        Command::Upload {
            files,
            server,
            token,
            chunk_size_mb,
            folder,
        } => {
            config::Overrides {
                server_url: server,
                auth_token: token,
                chunk_size_mb,
                folder,
            }
            .apply(&mut config);
            tracing::info!(server = %config.server_url, files = files.len(), "starting upload");

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(app::upload(config, &files))?
        }
        Command::Check { files } => app::check(&config, &files)?,
    };

    if !all_ok {
        std::process::exit(1);
    }
    Ok(())
}

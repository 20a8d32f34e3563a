//! CLI for the vdm video fetch service.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use vdm_core::config;

use commands::{run_evict, run_fetch, run_serve};

/// Top-level CLI for the vdm video fetch service.
#[derive(Debug, Parser)]
#[command(name = "vdm")]
#[command(about = "vdm: paste a video URL, get the file", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run the HTTP server.
    Serve {
        /// Listen address (overrides the configured one).
        #[arg(long)]
        addr: Option<String>,
    },

    /// Fetch a single video and exit.
    Fetch {
        /// Video URL.
        url: String,

        /// Submit to a remote vdm server instead of extracting in-process.
        #[arg(long, value_name = "BASE_URL")]
        remote: Option<String>,

        /// Directory the file is saved into in remote mode (default: current directory).
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
    },

    /// Remove artifacts older than the configured retention TTL.
    Evict,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Serve { addr } => run_serve(&cfg, addr).await?,
            CliCommand::Fetch { url, remote, out } => run_fetch(&cfg, &url, remote, out).await?,
            CliCommand::Evict => run_evict(&cfg)?,
        }

        Ok(())
    }
}

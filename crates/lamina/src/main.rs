//! Lamina CLI - static site builder with template composition.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "lamina")]
#[command(about = "Static site builder: templates, data, assets, live reload")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a site in the current directory
    Init {
        /// Skip interactive prompts, overwrite existing files
        #[arg(short, long)]
        yes: bool,
    },

    /// Build the site once
    Build {
        /// Output directory (defaults to config or "dist")
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip minification
        #[arg(long)]
        no_minify: bool,
    },

    /// Build, watch and serve with live reload
    Dev {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Do not open browser
        #[arg(long)]
        no_open: bool,
    },

    /// Preview a built site
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// Directory to serve (defaults to the configured output)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Init { yes } => {
            commands::init::run(yes).await?;
        }
        Commands::Build { output, no_minify } => {
            let minify = if no_minify { Some(false) } else { None };
            commands::build::run(output, minify).await?;
        }
        Commands::Dev { port, no_open } => {
            commands::dev::run(port, !no_open).await?;
        }
        Commands::Serve { port, dir } => {
            commands::serve::run(port, dir).await?;
        }
    }

    Ok(())
}

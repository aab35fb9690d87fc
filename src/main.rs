// SPDX-License-Identifier: GPL-3.0-only

use barscan::decoder::Symbology;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "barscan")]
#[command(about = "Scan barcodes from camera snapshots and image files")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    #[command(flatten)]
    options: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalOptions {
    /// Config file (default: ~/.config/barscan/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Comma separated symbologies to look for (e.g. qr,ean13,code128)
    #[arg(short, long, global = true, value_delimiter = ',')]
    formats: Vec<Symbology>,

    /// Do not retry mirrored copies of the frame
    #[arg(long, global = true)]
    no_flip: bool,

    /// Downscale frames so the longest side is at most this many pixels
    #[arg(long, global = true, value_name = "MAX")]
    downscale: Option<u32>,

    /// Directory for debug images
    #[arg(long, global = true)]
    debug_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan an image once
    Scan {
        /// Image to scan (png, jpg)
        image: PathBuf,
    },

    /// Rescan an image file at an interval until Ctrl-C
    Watch {
        /// Image to watch
        image: PathBuf,

        /// Stop after this many decoded barcodes
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Seconds between scans
        #[arg(short, long)]
        interval: Option<f32>,
    },

    /// Save the frame as the scanner sees it
    Save {
        /// Image to convert
        image: PathBuf,
    },

    /// Print the effective configuration
    Config {
        /// Write it to the config file
        #[arg(short, long)]
        write: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=barscan=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let mut overrides = cli::Overrides {
        config: cli.options.config,
        formats: cli.options.formats,
        no_flip: cli.options.no_flip,
        downscale: cli.options.downscale,
        debug_dir: cli.options.debug_dir,
        interval: None,
    };

    match cli.command {
        Commands::Scan { image } => cli::scan(&image, &overrides),
        Commands::Watch {
            image,
            count,
            interval,
        } => {
            overrides.interval = interval;
            cli::watch(&image, count, &overrides)
        }
        Commands::Save { image } => cli::save(&image, &overrides),
        Commands::Config { write } => cli::config(write, &overrides),
    }
}

// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "qrscan")]
#[command(about = "Scan QR codes with a camera and submit them to a decode service")]
#[command(version = qrscan::constants::app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive scanner (default)
    Interactive {
        /// Print payloads instead of submitting them
        #[arg(long)]
        dry_run: bool,
    },

    /// List available cameras
    Devices {
        /// Replay image files from this directory instead of using cameras
        #[arg(short, long)]
        images: Option<PathBuf>,
    },

    /// Scan one QR code and submit it
    Scan {
        /// Device id or label fragment (from 'qrscan devices')
        #[arg(short, long)]
        device: Option<String>,

        /// Replay image files from this directory instead of using cameras
        #[arg(short, long)]
        images: Option<PathBuf>,

        /// Decode service URL
        #[arg(short, long)]
        endpoint: Option<String>,

        /// Give up after this many seconds without a code
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Print the payload instead of submitting it
        #[arg(long)]
        dry_run: bool,
    },

    /// Decode a QR code from an image file without submitting it
    DecodeImage {
        /// Image file to decode
        path: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=qrscan=trace, RUST_LOG=info
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();

    match cli.command {
        Some(Commands::Devices { images }) => cli::list_devices(images),
        Some(Commands::Scan {
            device,
            images,
            endpoint,
            timeout,
            dry_run,
        }) => cli::scan(cli::ScanArgs {
            device,
            images,
            endpoint,
            timeout,
            dry_run,
        }),
        Some(Commands::DecodeImage { path }) => cli::decode_image(&path),
        Some(Commands::Interactive { dry_run }) => cli::interactive(dry_run),
        None => cli::interactive(false),
    }
}

//! crcsweep - Check media files against the CRC-32 in their names
//!
//! # Usage
//!
//! ```bash
//! # List the files a scan would pick up
//! crcsweep scan ~/Videos/Anime
//!
//! # Verify every tagged .mkv under a directory
//! crcsweep verify ~/Videos/Anime --ext .mkv --require-checksum
//!
//! # Print one file's CRC-32
//! crcsweep checksum "Show - 01 [A016D394].mkv"
//! ```

use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use console::style;
use crcsweep_core::Settings;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod progress;

/// crcsweep - Check media files against the CRC-32 in their names
#[derive(Parser)]
#[command(name = "crcsweep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Suppress ALL output (implies --quiet)
    #[arg(long, global = true)]
    silent: bool,

    /// Use this configuration file instead of the default one
    #[arg(long, global = true, value_name = "FILE", env = "CRCSWEEP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Filters shared by `scan` and `verify`
#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Directories to scan (results are merged, first occurrence wins)
    #[arg(required = true, value_name = "ROOT")]
    roots: Vec<PathBuf>,

    /// File name suffix to include, case-sensitive (repeatable)
    #[arg(short, long = "ext", value_name = "SUFFIX")]
    extensions: Vec<String>,

    /// Skip files whose names carry no CRC-32
    #[arg(short, long)]
    require_checksum: bool,

    /// Sort names naturally (ep2 before ep10)
    #[arg(long)]
    natural: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List files and the checksum declared in their names
    Scan {
        #[command(flatten)]
        scan: ScanArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Verify files against the checksum declared in their names
    Verify {
        #[command(flatten)]
        scan: ScanArgs,

        /// Block size for reading (e.g., 4K, 64K, 1M)
        #[arg(short, long)]
        block_size: Option<String>,

        /// Output the final report in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Calculate the CRC-32 of a single file
    Checksum {
        /// File to checksum
        file: PathBuf,

        /// Block size for reading (e.g., 4K, 64K, 1M)
        #[arg(short, long)]
        block_size: Option<String>,
    },

    /// Show or initialize the configuration file
    Config {
        /// Write a configuration file with default values
        #[arg(long)]
        init: bool,

        /// Print the configuration file path
        #[arg(long)]
        path: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("{} {}", style("Error:").red().bold(), panic_info);
    }));

    if let Err(e) = run() {
        eprintln!("{} {}", style("Error:").red().bold(), e);

        // Show cause chain in verbose mode
        if std::env::var("RUST_BACKTRACE").is_ok() {
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("  {} {}", style("Caused by:").yellow(), cause);
                source = cause.source();
            }
        }

        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(Settings::config_path);
    let settings = Settings::load_from_path(config_path.clone());

    // --silent implies --quiet; a quiet config file applies unless --verbose
    let quiet = cli.quiet || cli.silent || (settings.behavior.quiet && !cli.verbose);
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else if quiet {
        EnvFilter::new("off")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let silent = cli.silent;

    // First Ctrl+C cancels cooperatively, second one exits
    let running = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        if !r.load(std::sync::atomic::Ordering::SeqCst) {
            if !silent {
                eprintln!("\n{}", style("Forced exit").red().bold());
            }
            std::process::exit(130);
        }
        r.store(false, std::sync::atomic::Ordering::SeqCst);
        if !silent {
            eprintln!(
                "\n{}",
                style("Cancelling... Press Ctrl+C again to force exit").yellow()
            );
        }
    })?;

    match cli.command {
        Commands::Scan { scan, json } => commands::scan::execute(commands::scan::ScanCommand {
            config: commands::scan_config(&settings, &scan),
            roots: scan.roots,
            json,
            silent,
        }),
        Commands::Verify {
            scan,
            block_size,
            json,
        } => commands::verify::execute(commands::verify::VerifyArgs {
            scan_config: commands::scan_config(&settings, &scan),
            job_config: commands::job_config(&settings, block_size.as_deref())?,
            roots: scan.roots,
            json,
            silent,
            running,
        }),
        Commands::Checksum { file, block_size } => {
            let job_config = commands::job_config(&settings, block_size.as_deref())?;
            commands::checksum::execute(&file, job_config.block_size, running, silent)
        }
        Commands::Config { init, path, json } => {
            commands::config::execute(commands::config::ConfigArgs {
                init,
                path,
                json,
                silent,
                config_file: config_path,
            })
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    }
}

//! Configuration file management command

use anyhow::{Context, Result};
use console::style;
use crcsweep_core::Settings;
use std::path::PathBuf;

/// Arguments for the config command
pub struct ConfigArgs {
    /// Write a configuration file with defaults
    pub init: bool,
    /// Print the configuration file path
    pub path: bool,
    /// Print configuration as JSON
    pub json: bool,
    /// Suppress output
    pub silent: bool,
    /// Configuration file path chosen on the command line
    pub config_file: Option<PathBuf>,
}

/// Execute the config command
pub fn execute(args: ConfigArgs) -> Result<()> {
    let config_path = args.config_file.clone().or_else(Settings::config_path);

    if args.path {
        if let Some(path) = &config_path {
            if !args.silent {
                println!("{}", path.display());
            }
        } else if !args.silent {
            eprintln!("{}", style("Could not determine config path").yellow());
        }
        return Ok(());
    }

    if args.init {
        return init_config(config_path, args.silent);
    }

    show_config(config_path, args.json, args.silent)
}

/// Write a configuration file holding the defaults, never overwriting one
fn init_config(config_path: Option<PathBuf>, silent: bool) -> Result<()> {
    let path = config_path.context("Could not determine configuration directory")?;

    if path.exists() {
        if !silent {
            eprintln!(
                "{} Configuration file already exists at: {}",
                style("Warning:").yellow(),
                path.display()
            );
            eprintln!("Edit it directly, or delete it to start over.");
        }
        return Ok(());
    }

    let saved_path = Settings::default()
        .save_to_path(Some(path))
        .context("Failed to save configuration file")?;

    if !silent {
        println!(
            "{} Created configuration file at: {}",
            style("Success:").green(),
            saved_path.display()
        );
        println!();
        println!("Example settings:");
        println!();
        println!("  [scan]");
        println!("  suffixes = [\".mkv\", \".mp4\"]");
        println!("  require_checksum = true   # Skip untagged files");
        println!("  sort = \"natural\"          # ep2 before ep10");
        println!();
        println!("  [verify]");
        println!("  block_size = \"64K\"");
    }

    Ok(())
}

/// Print the effective configuration
fn show_config(config_path: Option<PathBuf>, json: bool, silent: bool) -> Result<()> {
    if silent {
        return Ok(());
    }

    let config_exists = config_path.as_ref().is_some_and(|p| p.exists());
    let settings = Settings::load_from_path(config_path.clone());

    if json {
        let json_output = serde_json::to_string_pretty(&settings)
            .context("Failed to serialize settings to JSON")?;
        println!("{}", json_output);
        return Ok(());
    }

    println!("{}", style("crcsweep Configuration").bold());
    println!();

    if let Some(path) = &config_path {
        if config_exists {
            println!("  {} {}", style("Config file:").dim(), path.display());
        } else {
            println!(
                "  {} {} {}",
                style("Config file:").dim(),
                path.display(),
                style("(not found, using defaults)").yellow()
            );
        }
    }
    println!();

    let suffixes: Vec<String> = settings
        .scan
        .suffixes
        .iter()
        .map(|s| format!("\"{}\"", s))
        .collect();

    println!("{}", style("[scan]").cyan());
    println!("  suffixes = [{}]", suffixes.join(", "));
    println!("  require_checksum = {}", settings.scan.require_checksum);
    println!("  sort = \"{}\"", settings.scan.sort);
    println!();

    println!("{}", style("[verify]").cyan());
    println!("  block_size = \"{}\"", settings.verify.block_size);
    println!();

    println!("{}", style("[behavior]").cyan());
    println!("  quiet = {}", settings.behavior.quiet);

    if !config_exists {
        println!();
        println!(
            "{}",
            style("Run 'crcsweep config --init' to create a configuration file.").dim()
        );
    }

    Ok(())
}

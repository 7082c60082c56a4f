//! CLI command implementations

/// Conditionally println based on silent mode
macro_rules! println_if {
    ($silent:expr) => {
        if !$silent {
            println!();
        }
    };
    ($silent:expr, $($arg:tt)*) => {
        if !$silent {
            println!($($arg)*);
        }
    };
}

pub mod checksum;
pub mod config;
pub mod scan;
pub mod verify;

use anyhow::{Context, Result};
use crcsweep_core::{parse_size, JobConfig, ScanConfig, Settings, SortOrder};

/// Merge the command-line filters over the configured ones
pub fn scan_config(settings: &Settings, args: &crate::ScanArgs) -> ScanConfig {
    let mut config = settings.scan_config();
    if !args.extensions.is_empty() {
        config = config.suffixes(args.extensions.iter().cloned());
    }
    if args.require_checksum {
        config = config.require_declared_checksum(true);
    }
    if args.natural {
        config = config.sort_order(SortOrder::Natural);
    }
    config
}

/// Job configuration, with `--block-size` taking precedence over the file
pub fn job_config(settings: &Settings, block_size: Option<&str>) -> Result<JobConfig> {
    match block_size {
        Some(size) => {
            let bytes =
                parse_size(size).with_context(|| format!("Invalid block size: {}", size))?;
            Ok(JobConfig::new().block_size(bytes))
        }
        None => Ok(settings.job_config()),
    }
}

// src/cli/mod.rs
//! CLI definitions for efiswap
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.
//!
//! - `convert` - Move the UEFI boot entry from the source to the target distro
//! - `entries` - List firmware boot entries
//! - `resolve` - Show where a distro's boot binaries are expected
//! - `completions` - Generate shell completions

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "efiswap")]
#[command(author = "efiswap Contributors")]
#[command(version)]
#[command(about = "UEFI boot entry reconciliation for in-place distribution conversion", long_about = None)]
pub struct Cli {
    /// Configuration file (default: /etc/efiswap/efiswap.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the target distro's boot entry and retire the source one
    Convert {
        /// Distribution being converted to (os-release ID)
        #[arg(short, long)]
        target: String,

        /// Distribution being converted from (default: ID of /etc/os-release)
        #[arg(short, long)]
        source: Option<String>,

        /// Mount point of the EFI system partition
        #[arg(long)]
        esp_mount: Option<PathBuf>,

        /// Where to append diagnostic reports
        #[arg(long)]
        report: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List firmware boot entries
    Entries {
        /// Print the entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the EFI directory and boot binary of a distribution
    Resolve {
        /// Distribution (os-release ID)
        distro: String,

        /// Mount point of the EFI system partition
        #[arg(long)]
        esp_mount: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use commands::ConvertOptions;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Convert {
            target,
            source,
            esp_mount,
            report,
            json,
        } => commands::cmd_convert(ConvertOptions {
            config: cli.config,
            source,
            target,
            esp_mount,
            report,
            json,
        }),
        Commands::Entries { json } => commands::cmd_entries(cli.config.as_deref(), json),
        Commands::Resolve { distro, esp_mount } => {
            commands::cmd_resolve(cli.config.as_deref(), &distro, esp_mount.as_deref())
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "efiswap", &mut std::io::stdout());
            Ok(())
        }
    }
}

// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: configuration file
fn config_arg() -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .value_name("PATH")
        .help("Configuration file (default: /etc/efiswap/efiswap.toml if present)")
}

/// Common argument: ESP mount point
fn esp_mount_arg() -> Arg {
    Arg::new("esp_mount")
        .long("esp-mount")
        .value_name("PATH")
        .help("Mount point of the EFI system partition")
}

fn build_cli() -> Command {
    Command::new("efiswap")
        .version(env!("CARGO_PKG_VERSION"))
        .author("efiswap Contributors")
        .about("UEFI boot entry reconciliation for in-place distribution conversion")
        .arg(config_arg())
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
        .subcommand(
            Command::new("convert")
                .about("Create the target distro's boot entry and retire the source one")
                .arg(
                    Arg::new("target")
                        .short('t')
                        .long("target")
                        .required(true)
                        .help("Distribution being converted to (os-release ID)"),
                )
                .arg(
                    Arg::new("source")
                        .short('s')
                        .long("source")
                        .help("Distribution being converted from (default: ID of /etc/os-release)"),
                )
                .arg(esp_mount_arg())
                .arg(
                    Arg::new("report")
                        .long("report")
                        .value_name("PATH")
                        .help("Where to append diagnostic reports"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the result as JSON"),
                ),
        )
        .subcommand(
            Command::new("entries").about("List firmware boot entries").arg(
                Arg::new("json")
                    .long("json")
                    .action(ArgAction::SetTrue)
                    .help("Print the entries as JSON"),
            ),
        )
        .subcommand(
            Command::new("resolve")
                .about("Show the EFI directory and boot binary of a distribution")
                .arg(Arg::new("distro").required(true).help("Distribution (os-release ID)"))
                .arg(esp_mount_arg()),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completions")
                .arg(Arg::new("shell").required(true).help("Shell to generate completions for")),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory - use CARGO_MANIFEST_DIR which is always set by cargo
    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("efiswap.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}

//! hle-inspect - developer tool for the HLE kernel object layer
//!
//! Commands:
//! - `hle-inspect demo` - Boot a demo kernel, list its objects and write a snapshot
//! - `hle-inspect inspect <file>` - Show a snapshot's sections and restore it
//! - `hle-inspect error <code>` - Name a guest status code

mod config;
mod demo;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use hle_kernel::{Kernel, KernelConfig};
use hle_kobj::error_codes::{self, StatusCode};
use hle_kobj::ObjectListing;
use hle_savestate::scan_sections;

#[derive(Parser)]
#[command(name = "hle-inspect")]
#[command(version)]
#[command(about = "Inspect HLE kernel objects and kernel save-states", long_about = None)]
struct Cli {
    /// Kernel configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Boot a demo kernel, populate it and write its snapshot
    Demo {
        /// Snapshot output path
        #[arg(short, long, default_value = "kernel.state")]
        output: PathBuf,

        /// Number of extra semaphores to create
        #[arg(long, default_value_t = 4)]
        semaphores: u32,
    },

    /// Show the sections of a snapshot and restore it into a fresh kernel
    Inspect {
        /// Snapshot file
        file: PathBuf,

        /// Only print the section headers
        #[arg(long)]
        headers_only: bool,
    },

    /// Name a guest status code (hex with 0x prefix, or decimal)
    Error {
        /// Status code, e.g. 0x800200cb or -2147352373
        #[arg(allow_hyphen_values = true)]
        code: String,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Demo { output, semaphores } => run_demo(config, &output, semaphores),
        Commands::Inspect { file, headers_only } => run_inspect(config, &file, headers_only),
        Commands::Error { code } => run_error(&code),
    }
}

fn run_demo(config: KernelConfig, output: &Path, semaphores: u32) -> Result<()> {
    println!("{} Booting demo kernel...", "🚀".green());
    println!("   Firmware: {}", config.firmware_version);

    let mut kernel = demo::kernel(config);
    kernel.init();
    if !kernel.is_running() {
        bail!("Kernel failed to start");
    }
    demo::populate(&mut kernel, semaphores)?;

    print_kernel(&kernel);
    println!("   Devkit version: {:#010x}", kernel.devkit_version());

    let bytes = kernel.save_state().context("Failed to save kernel state")?;
    fs::write(output, &bytes)
        .with_context(|| format!("Failed to write snapshot to {}", output.display()))?;
    println!(
        "{} Wrote {} bytes to {}",
        "✅".green(),
        bytes.len(),
        output.display().to_string().bold()
    );

    kernel.shutdown();
    Ok(())
}

fn run_inspect(config: KernelConfig, file: &Path, headers_only: bool) -> Result<()> {
    let bytes =
        fs::read(file).with_context(|| format!("Failed to read snapshot {}", file.display()))?;

    let headers = scan_sections(&bytes).context("Not a kernel snapshot")?;
    println!("{} {}", "📦 Sections of".bold(), file.display());
    for header in &headers {
        println!(
            "   {} v{:<3} {:>8} bytes",
            format!("{:<16}", header.title).cyan(),
            header.version,
            header.length
        );
    }
    if headers_only {
        return Ok(());
    }

    let mut kernel = demo::kernel(config);
    match kernel.load_state(&bytes) {
        Ok(()) => {}
        Err(err) if err.is_structural() => {
            bail!("Snapshot is incompatible with this build: {}", err)
        }
        Err(err) => return Err(err).context("Snapshot is damaged"),
    }

    println!();
    print_kernel(&kernel);
    if let Some(exit) = kernel.state().exit_callback() {
        println!("   Exit callback: {}", exit);
    }
    Ok(())
}

fn run_error(code: &str) -> Result<()> {
    let code = parse_code(code)?;
    match error_codes::error_name(code) {
        Some(_) => println!("{}", StatusCode(code).to_string().green()),
        None => println!("{} {}", format!("{:#010x}", code).bold(), "(unknown)".yellow()),
    }
    Ok(())
}

fn print_kernel(kernel: &Kernel) {
    println!("{} {}", "🧩".green(), kernel.summarize().bold());
    print_objects(&kernel.pool().list());
}

fn print_objects(rows: &[ObjectListing]) {
    println!(
        "   {} {} {} {}",
        format!("{:<8}", "HANDLE").bold(),
        format!("{:<20}", "TYPE").bold(),
        format!("{:<32}", "NAME").bold(),
        "INFO".bold()
    );
    for row in rows {
        println!(
            "   {} {:<20} {:<32} {}",
            format!("{:<8}", format!("{:#x}", row.handle.raw())).cyan(),
            row.type_name,
            row.name,
            row.info.dimmed()
        );
    }
    println!("   {} kernel objects", rows.len());
}

/// Parse a status code given as `0x` hex, unsigned decimal or signed decimal
fn parse_code(s: &str) -> Result<u32> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u32::from_str_radix(hex, 16).with_context(|| format!("Invalid hex code: {}", s));
    }
    let value: i64 = s
        .parse()
        .with_context(|| format!("Invalid status code: {}", s))?;
    if let Ok(code) = u32::try_from(value) {
        return Ok(code);
    }
    match i32::try_from(value) {
        Ok(signed) => Ok(signed as u32),
        Err(_) => bail!("Status code out of range: {}", s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_code() {
        assert_eq!(parse_code("0x800200CB").unwrap(), 0x8002_00CB);
        assert_eq!(parse_code("2147614923").unwrap(), 0x8002_00CB);
        assert_eq!(parse_code("-2147352373").unwrap(), 0x8002_00CB);
        assert!(parse_code("0xZZ").is_err());
        assert!(parse_code("99999999999").is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["hle-inspect", "--config", "hle.toml", "error", "0x1"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("hle.toml")));
        assert!(matches!(cli.command, Commands::Error { .. }));

        let cli = Cli::try_parse_from(["hle-inspect", "demo"]).unwrap();
        match cli.command {
            Commands::Demo { output, semaphores } => {
                assert_eq!(output, PathBuf::from("kernel.state"));
                assert_eq!(semaphores, 4);
            }
            _ => panic!("expected demo"),
        }
    }

    #[test]
    fn test_demo_then_inspect() {
        let path = std::env::temp_dir().join(format!("hle-inspect-{}.state", std::process::id()));
        run_demo(KernelConfig::default(), &path, 2).unwrap();
        run_inspect(KernelConfig::default(), &path, false).unwrap();
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_inspect_rejects_garbage() {
        let path = std::env::temp_dir().join(format!("hle-inspect-bad-{}.state", std::process::id()));
        fs::write(&path, b"not a snapshot").unwrap();
        assert!(run_inspect(KernelConfig::default(), &path, true).is_err());
        fs::remove_file(&path).unwrap();
    }
}

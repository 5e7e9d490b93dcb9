// SPDX-License-Identifier: GPL-3.0-only

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use devstate_sys::{detect_filesystem, is_mounted, same_device, syscall};

#[derive(Debug, Parser)]
#[command(name = "devstate")]
#[command(about = "Inspect block device state: identity, mounts, filesystem signatures")]
struct Args {
    /// Emit machine-readable JSON instead of plain text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Check whether two device paths refer to the same device node
    SameDevice { dev1: String, dev2: String },
    /// Check whether a device is what is mounted on a target path
    IsMounted { device: String, target: PathBuf },
    /// Report the filesystem type formatted on a device, if any
    DetectFs { device: String },
    /// Report filesystem block statistics for a path
    FsStats { path: PathBuf },
}

#[derive(Serialize)]
struct IdentityReport<'a> {
    dev1: &'a str,
    dev2: &'a str,
    same: bool,
}

#[derive(Serialize)]
struct MountReport<'a> {
    device: &'a str,
    target: &'a Path,
    mounted: bool,
}

#[derive(Serialize)]
struct FilesystemReport<'a> {
    device: &'a str,
    #[serde(rename = "type")]
    fs_type: Option<String>,
}

#[derive(Serialize)]
struct StatsReport<'a> {
    path: &'a Path,
    block_size: u64,
    total_bytes: u64,
    free_bytes: u64,
    available_bytes: u64,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("devstate_sys=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match args.command {
        Cmd::SameDevice { dev1, dev2 } => {
            let same = same_device(&dev1, &dev2)?;
            if args.json {
                print_json(&IdentityReport {
                    dev1: &dev1,
                    dev2: &dev2,
                    same,
                })?;
            } else {
                println!("{}", if same { "same" } else { "different" });
            }
            Ok(hit_exit(same))
        }
        Cmd::IsMounted { device, target } => {
            let mounted = is_mounted(&device, &target)?;
            if args.json {
                print_json(&MountReport {
                    device: &device,
                    target: &target,
                    mounted,
                })?;
            } else {
                println!("{}", if mounted { "mounted" } else { "not mounted" });
            }
            Ok(hit_exit(mounted))
        }
        Cmd::DetectFs { device } => {
            let fs_type = detect_filesystem(&device)?;
            if args.json {
                print_json(&FilesystemReport {
                    device: &device,
                    fs_type: fs_type.clone(),
                })?;
            } else {
                println!("{}", fs_type.as_deref().unwrap_or("none"));
            }
            Ok(ExitCode::SUCCESS)
        }
        Cmd::FsStats { path } => {
            let stats = syscall::statfs(&path)
                .with_context(|| format!("statfs failed for {}", path.display()))?;
            let block_size = stats.block_size() as u64;
            let report = StatsReport {
                path: &path,
                block_size,
                total_bytes: stats.blocks() as u64 * block_size,
                free_bytes: stats.blocks_free() as u64 * block_size,
                available_bytes: stats.blocks_available() as u64 * block_size,
            };
            if args.json {
                print_json(&report)?;
            } else {
                println!("block size:      {}", report.block_size);
                println!("total bytes:     {}", report.total_bytes);
                println!("free bytes:      {}", report.free_bytes);
                println!("available bytes: {}", report.available_bytes);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn hit_exit(hit: bool) -> ExitCode {
    if hit {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn print_json<T: Serialize>(report: &T) -> Result<()> {
    println!("{}", serde_json::to_string(report)?);
    Ok(())
}

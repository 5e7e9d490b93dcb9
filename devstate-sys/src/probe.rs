// SPDX-License-Identifier: GPL-3.0-only

//! Filesystem signature detection via blkid.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use tracing::{debug, warn};
use which::which;

use crate::error::{InspectError, Result};

const BLKID_FALLBACK: &str = "/sbin/blkid";

/// blkid exits with this status when no filesystem signature is found.
const NO_SIGNATURE_EXIT: i32 = 2;

/// Runs a signature probe against a device and reports the raw outcome.
///
/// Narrow seam over the external tool: exit-status and output
/// interpretation live in this crate and can be exercised against canned
/// results instead of a real process.
pub trait FilesystemProber {
    fn probe(&self, device: &str) -> std::io::Result<Output>;
}

/// The real prober: `blkid -c /dev/null -o export <device>`.
///
/// `-c /dev/null` disables blkid's on-disk cache so every probe reflects
/// current on-disk content rather than a previous run's verdict.
#[derive(Debug, Clone)]
pub struct Blkid {
    binary: PathBuf,
}

impl Blkid {
    pub fn new() -> Self {
        let binary = which("blkid").unwrap_or_else(|_| PathBuf::from(BLKID_FALLBACK));
        Self { binary }
    }
}

impl Default for Blkid {
    fn default() -> Self {
        Self::new()
    }
}

impl FilesystemProber for Blkid {
    fn probe(&self, device: &str) -> std::io::Result<Output> {
        debug!(device, binary = %self.binary.display(), "exec blkid");
        Command::new(&self.binary)
            .args(["-c", "/dev/null", "-o", "export", device])
            .stdin(Stdio::null())
            .output()
    }
}

/// Filesystem type formatted on `device`, if any.
///
/// `Ok(None)` means no recognized signature is present, the normal
/// answer for a blank device; only a probe that genuinely misbehaves is
/// an error.
pub fn detect_filesystem(device: &str) -> Result<Option<String>> {
    detect_filesystem_with(&Blkid::new(), device)
}

/// As [`detect_filesystem`], with an explicit prober.
pub fn detect_filesystem_with<P: FilesystemProber>(
    prober: &P,
    device: &str,
) -> Result<Option<String>> {
    debug!(device, "detect_filesystem");

    let file = OpenOptions::new()
        .read(true)
        .open(device)
        .map_err(|source| InspectError::DeviceOpenFailed {
            device: device.to_string(),
            source,
        })?;
    // Flush dirty buffers so the probe sees on-disk state. Detection
    // tolerates a failed flush; the probe then reads slightly stale data.
    if let Err(err) = file.sync_all() {
        warn!(device, error = %err, "sync before probe failed");
    }
    drop(file);

    let output = prober
        .probe(device)
        .map_err(|source| InspectError::ProbeExecution {
            device: device.to_string(),
            source,
        })?;

    interpret_probe_output(device, &output)
}

fn interpret_probe_output(device: &str, output: &Output) -> Result<Option<String>> {
    if !output.status.success() {
        if output.status.code() == Some(NO_SIGNATURE_EXIT) {
            return Ok(None);
        }
        return Err(InspectError::ProbeFailed {
            device: device.to_string(),
            code: output.status.code(),
            output: combined_output(output),
        });
    }

    for line in String::from_utf8_lossy(&output.stdout).lines() {
        if let Some(fs_type) = line.strip_prefix("TYPE=") {
            return Ok(Some(fs_type.to_string()));
        }
    }

    Ok(None)
}

fn combined_output(output: &Output) -> String {
    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined.trim().to_string()
}

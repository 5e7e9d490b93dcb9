// SPDX-License-Identifier: GPL-3.0-only

use std::io;
use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

/// Error types for device state inspection
///
/// Each variant names the path or device the failed step was working on.
/// Transient `EINTR` failures never show up here; they are retried away
/// inside [`crate::syscall`].
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("stat failed for {path}: {source}")]
    StatFailed {
        path: String,
        #[source]
        source: Errno,
    },

    #[error("could not resolve {} to an absolute path: {source}", path.display())]
    PathResolutionFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not resolve symlinks for {}: {source}", path.display())]
    SymlinkResolutionFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not read /proc/mounts: {source}")]
    MountTableUnreadable {
        #[source]
        source: io::Error,
    },

    #[error("could not open {device}: {source}")]
    DeviceOpenFailed {
        device: String,
        #[source]
        source: io::Error,
    },

    /// The probe utility could not be executed at all.
    #[error("could not run filesystem probe on {device}: {source}")]
    ProbeExecution {
        device: String,
        #[source]
        source: io::Error,
    },

    /// The probe utility ran and exited with a genuine failure status.
    #[error("filesystem probe of {device} failed (exit {code:?}): {output}")]
    ProbeFailed {
        device: String,
        code: Option<i32>,
        output: String,
    },
}

/// Result type alias for inspection operations
pub type Result<T> = std::result::Result<T, InspectError>;

// SPDX-License-Identifier: GPL-3.0-only

//! Node-local block device state inspection
//!
//! This crate answers three questions about a block device on the host,
//! always from live kernel state:
//! - does a device path refer to the same device node as another path?
//! - is a device what is currently mounted on a given target path?
//! - what filesystem, if any, is formatted on a device?
//!
//! Nothing is cached between calls; every query re-reads device metadata,
//! `/proc/mounts`, or runs a fresh probe, so answers never go stale while
//! other processes mount, unmount, or reformat devices. The raw syscalls
//! involved are retried transparently on `EINTR`.
//!
//! These answers feed format/delete decisions in a storage controller,
//! where a wrong one destroys data. This crate only inspects: it never
//! mounts, formats, or otherwise mutates the devices it looks at.

pub mod error;
pub mod identity;
pub mod mounts;
pub mod probe;
pub mod syscall;

pub use error::{InspectError, Result};
pub use identity::{device_number, same_device};
pub use mounts::is_mounted;
pub use probe::{detect_filesystem, detect_filesystem_with, Blkid, FilesystemProber};

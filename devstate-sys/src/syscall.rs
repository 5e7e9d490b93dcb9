// SPDX-License-Identifier: GPL-3.0-only

//! Interruption-safe wrappers around raw system calls.
//!
//! A signal landing while one of these calls blocks makes the kernel
//! abort it with `EINTR` even though nothing went wrong. Callers should
//! never see that, so every wrapper reissues the call until it either
//! succeeds or fails with a real error.

use std::path::Path;

use nix::errno::Errno;
use nix::sys::stat::{self, FileStat, Mode, SFlag};
use nix::sys::statfs::{self, Statfs};

/// Retry `op` for as long as it fails with `EINTR`.
///
/// There is no retry cap: an interrupted call is expected to make
/// progress once reattempted, so a bound would only turn a transient
/// condition into a spurious error.
pub fn retry_eintr<T, F>(mut op: F) -> nix::Result<T>
where
    F: FnMut() -> nix::Result<T>,
{
    loop {
        match op() {
            Err(Errno::EINTR) => continue,
            other => return other,
        }
    }
}

/// stat(2), retried on `EINTR`.
pub fn stat(path: &Path) -> nix::Result<FileStat> {
    retry_eintr(|| stat::stat(path))
}

/// mknod(2), retried on `EINTR`.
pub fn mknod(path: &Path, kind: SFlag, perm: Mode, dev: libc::dev_t) -> nix::Result<()> {
    retry_eintr(|| stat::mknod(path, kind, perm, dev))
}

/// statfs(2), retried on `EINTR`.
pub fn statfs(path: &Path) -> nix::Result<Statfs> {
    retry_eintr(|| statfs::statfs(path))
}

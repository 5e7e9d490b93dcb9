// SPDX-License-Identifier: GPL-3.0-only

//! Mount-state queries against the live kernel mount table.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{InspectError, Result};
use crate::identity;

const MOUNT_TABLE: &str = "/proc/mounts";

/// Whether `device` is what is currently mounted on `target`.
///
/// `/proc/mounts` is re-read on every call, so mounts made or removed by
/// other processes are visible immediately. The table is used rather
/// than statfs because some filesystems mount through a virtual device;
/// the recorded source field is compared to `device` by raw device
/// number, not by spelling.
///
/// A target that matches no record yields `Ok(false)`; not being mounted
/// is a normal answer, not a failure.
pub fn is_mounted(device: &str, target: impl AsRef<Path>) -> Result<bool> {
    let target = target.as_ref();
    debug!(device, target = %target.display(), "is_mounted");

    let abs = std::path::absolute(target).map_err(|source| InspectError::PathResolutionFailed {
        path: target.to_path_buf(),
        source,
    })?;
    // The table records canonical paths; the caller may hold a symlinked
    // alias of the same mount point.
    let resolved =
        fs::canonicalize(&abs).map_err(|source| InspectError::SymlinkResolutionFailed {
            path: abs.clone(),
            source,
        })?;

    let table = fs::read_to_string(MOUNT_TABLE)
        .map_err(|source| InspectError::MountTableUnreadable { source })?;

    match backing_device(&table, &resolved)? {
        Some(recorded) => identity::same_device(device, &recorded),
        None => Ok(false),
    }
}

/// Scan mount-table text for the first record mounted on `target` and
/// return its source-device field.
///
/// `target` must already be canonical. Lines with fewer than two fields
/// are skipped. A well-formed line whose mount point cannot be resolved
/// aborts the scan: a mount table pointing at unresolvable paths is an
/// inconsistency to surface, not to skip over.
fn backing_device(table: &str, target: &Path) -> Result<Option<String>> {
    for line in table.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 2 {
            continue;
        }

        let mount_point = PathBuf::from(unescape_mount_field(fields[1]));
        let resolved =
            fs::canonicalize(&mount_point).map_err(|source| {
                InspectError::SymlinkResolutionFailed {
                    path: mount_point,
                    source,
                }
            })?;
        if resolved == target {
            return Ok(Some(fields[0].to_string()));
        }
    }

    Ok(None)
}

/// Decode the octal escapes the kernel emits in mount-table fields,
/// `\040` for a space and so on.
fn unescape_mount_field(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\'
            && i + 3 < bytes.len()
            && bytes[i + 1..i + 4].iter().all(|b| (b'0'..=b'7').contains(b))
        {
            // Three octal digits still overflow a byte above \377; such
            // sequences pass through untouched.
            if let Ok(value) = u8::from_str_radix(&field[i + 1..i + 4], 8) {
                out.push(value);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical_tempdir() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let canon = dir.path().canonicalize().unwrap();
        (dir, canon)
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let (_dir, canon) = canonical_tempdir();
        let table = format!("garbage\n\n/dev/sdq1 {}\n", canon.display());
        let found = backing_device(&table, &canon).unwrap();
        assert_eq!(found.as_deref(), Some("/dev/sdq1"));
    }

    #[test]
    fn no_matching_record_finds_nothing() {
        let (_dir, canon) = canonical_tempdir();
        let table = "/dev/sdq1 /somewhere-else ext4 rw 0 0\n";
        assert_eq!(backing_device(table, &canon).unwrap(), None);
    }

    #[test]
    fn first_matching_record_wins() {
        let (_dir, canon) = canonical_tempdir();
        let table = format!(
            "/dev/sdq1 {0} ext4 rw 0 0\n/dev/sdq2 {0} ext4 rw 0 0\n",
            canon.display()
        );
        let found = backing_device(&table, &canon).unwrap();
        assert_eq!(found.as_deref(), Some("/dev/sdq1"));
    }

    #[test]
    fn escaped_mount_points_are_decoded() {
        let dir = tempfile::tempdir().unwrap();
        let spaced = dir.path().join("data disk");
        fs::create_dir(&spaced).unwrap();
        let canon = spaced.canonicalize().unwrap();

        let escaped = canon.to_str().unwrap().replace(' ', "\\040");
        let table = format!("/dev/sdq1 {escaped} ext4 rw 0 0\n");
        let found = backing_device(&table, &canon).unwrap();
        assert_eq!(found.as_deref(), Some("/dev/sdq1"));
    }

    #[test]
    fn unresolvable_mount_point_aborts_the_scan() {
        let (_dir, canon) = canonical_tempdir();
        let table = format!("/dev/sdq1 /definitely/not/here\n/dev/sdq2 {}\n", canon.display());
        let err = backing_device(&table, &canon).unwrap_err();
        assert!(matches!(err, InspectError::SymlinkResolutionFailed { .. }));
    }

    #[test]
    fn matched_record_with_same_device_compares_true() {
        let (_dir, canon) = canonical_tempdir();
        let table = format!("/dev/null {}\n", canon.display());
        let recorded = backing_device(&table, &canon).unwrap().unwrap();
        assert!(crate::identity::same_device("/dev/null", &recorded).unwrap());
    }

    #[test]
    fn matched_record_with_different_device_compares_false() {
        let (_dir, canon) = canonical_tempdir();
        let table = format!("/dev/zero {}\n", canon.display());
        let recorded = backing_device(&table, &canon).unwrap().unwrap();
        assert!(!crate::identity::same_device("/dev/null", &recorded).unwrap());
    }

    #[test]
    fn unmounted_directory_is_ok_false() {
        let (_dir, canon) = canonical_tempdir();
        assert!(!is_mounted("/dev/null", &canon).unwrap());
    }

    #[test]
    fn empty_target_fails_path_resolution() {
        let err = is_mounted("/dev/null", "").unwrap_err();
        assert!(matches!(err, InspectError::PathResolutionFailed { .. }));
    }

    #[test]
    fn missing_target_fails_symlink_resolution() {
        let err = is_mounted("/dev/null", "/definitely/not/here").unwrap_err();
        assert!(matches!(err, InspectError::SymlinkResolutionFailed { .. }));
    }

    #[test]
    fn root_is_mounted_on_its_recorded_device() {
        let table = fs::read_to_string(MOUNT_TABLE).unwrap();
        // A live table can carry exotic records this scan refuses; when
        // it does resolve, the root record must round-trip.
        match backing_device(&table, Path::new("/")) {
            Ok(Some(recorded)) => assert!(is_mounted(&recorded, "/").unwrap()),
            _ => {}
        }
    }

    #[test]
    fn unescapes_octal_sequences() {
        assert_eq!(unescape_mount_field("/mnt/data\\040disk"), "/mnt/data disk");
        assert_eq!(unescape_mount_field("/mnt/tab\\011sep"), "/mnt/tab\tsep");
        assert_eq!(unescape_mount_field("/plain"), "/plain");
        // Trailing or non-octal backslashes pass through untouched.
        assert_eq!(unescape_mount_field("/odd\\04"), "/odd\\04");
        assert_eq!(unescape_mount_field("/odd\\0forty"), "/odd\\0forty");
    }
}

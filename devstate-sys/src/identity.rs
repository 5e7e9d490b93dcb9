use std::path::Path;

use tracing::debug;

use crate::error::{InspectError, Result};
use crate::syscall;

/// Raw device number (`st_rdev`) of the node at `path`.
pub fn device_number(path: &str) -> Result<libc::dev_t> {
    let st = syscall::stat(Path::new(path)).map_err(|source| InspectError::StatFailed {
        path: path.to_string(),
        source,
    })?;
    Ok(st.st_rdev)
}

/// Whether `dev1` and `dev2` refer to the same device node.
///
/// Byte-identical strings short-circuit to `true` without touching the
/// filesystem. Otherwise both paths are stat'ed and their raw device
/// numbers compared, so a device node and a symlink to it compare equal
/// while two spellings of distinct nodes never do. A failed stat is an
/// error, never a silent `false`.
pub fn same_device(dev1: &str, dev2: &str) -> Result<bool> {
    if dev1 == dev2 {
        return Ok(true);
    }

    debug!(device = dev1, "stat");
    let rdev1 = device_number(dev1)?;
    debug!(device = dev2, "stat");
    let rdev2 = device_number(dev2)?;

    Ok(rdev1 == rdev2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_short_circuit() {
        // The path does not exist, so a stat would fail; equality has to
        // be decided before any syscall.
        assert!(same_device("/dev/not-a-real-node", "/dev/not-a-real-node").unwrap());
    }

    #[test]
    fn symlink_and_target_are_the_same_device() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("null");
        std::os::unix::fs::symlink("/dev/null", &link).unwrap();
        assert!(same_device(link.to_str().unwrap(), "/dev/null").unwrap());
    }

    #[test]
    fn distinct_nodes_differ() {
        assert!(!same_device("/dev/null", "/dev/zero").unwrap());
    }

    #[test]
    fn failed_stat_names_the_offending_path() {
        let err = same_device("/dev/null", "/no/such/device").unwrap_err();
        match err {
            InspectError::StatFailed { path, .. } => assert_eq!(path, "/no/such/device"),
            other => panic!("unexpected error: {other}"),
        }
    }
}

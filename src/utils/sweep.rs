//! Retention sweeping
//!
//! Scans the backup directory (non-recursive) and deletes archives whose
//! modification time is strictly older than the retention window. Sweeping
//! is best-effort cleanup: a file that cannot be deleted is logged and
//! skipped, never fatal. The dump step is the opposite: there, failure
//! aborts.

use crate::utils::archive::is_archive_name;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Delete expired archives under `directory`, returning the removed paths.
///
/// `now` is passed in rather than read from the clock so the boundary
/// behavior is testable; callers pass `SystemTime::now()`.
pub fn sweep_expired(
    directory: &Path,
    retention_days: u32,
    now: SystemTime,
) -> std::io::Result<Vec<PathBuf>> {
    let cutoff = now - Duration::from_secs(u64::from(retention_days) * SECONDS_PER_DAY);
    let mut removed = Vec::new();

    for entry in fs::read_dir(directory)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable directory entry: {}", e);
                continue;
            }
        };

        let name = entry.file_name();
        if !is_archive_name(&name.to_string_lossy()) {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                warn!("Cannot stat {:?}, skipping: {}", entry.path(), e);
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }

        let modified = match metadata.modified() {
            Ok(t) => t,
            Err(e) => {
                warn!("No modification time for {:?}, skipping: {}", entry.path(), e);
                continue;
            }
        };

        // Strictly older than the cutoff; an archive exactly at the
        // boundary is retained.
        if modified < cutoff {
            let path = entry.path();
            match fs::remove_file(&path) {
                Ok(()) => {
                    info!("Deleted expired archive: {}", path.display());
                    removed.push(path);
                }
                Err(e) => warn!("Failed to delete expired archive {:?}: {}", path, e),
            }
        }
    }

    if removed.is_empty() {
        info!("No expired archives found");
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DAY: Duration = Duration::from_secs(SECONDS_PER_DAY);

    fn touch(dir: &Path, name: &str) -> (PathBuf, SystemTime) {
        let path = dir.join(name);
        fs::write(&path, b"dump").unwrap();
        let mtime = fs::metadata(&path).unwrap().modified().unwrap();
        (path, mtime)
    }

    #[test]
    fn nothing_expired_leaves_files_alone() {
        let dir = TempDir::new().unwrap();
        let (path, mtime) = touch(dir.path(), "db1.2024-03-01.sql.bz2");

        let removed = sweep_expired(dir.path(), 14, mtime).unwrap();
        assert!(removed.is_empty());
        assert!(path.exists());
    }

    #[test]
    fn boundary_is_strictly_older_than() {
        let dir = TempDir::new().unwrap();
        let (path, mtime) = touch(dir.path(), "db1.2024-03-01.sql.bz2");

        // Exactly 13 and 14 days old: retained
        for age in [13u32, 14] {
            let removed = sweep_expired(dir.path(), 14, mtime + DAY * age).unwrap();
            assert!(removed.is_empty(), "file aged {age}d should be retained");
            assert!(path.exists());
        }

        // 15 days old: deleted
        let removed = sweep_expired(dir.path(), 14, mtime + DAY * 15).unwrap();
        assert_eq!(removed, vec![path.clone()]);
        assert!(!path.exists());
    }

    #[test]
    fn non_archive_files_are_ignored() {
        let dir = TempDir::new().unwrap();
        let (log, mtime) = touch(dir.path(), "archiver.log");
        let (plain_sql, _) = touch(dir.path(), "db1.2024-03-01.sql");

        let removed = sweep_expired(dir.path(), 1, mtime + DAY * 30).unwrap();
        assert!(removed.is_empty());
        assert!(log.exists());
        assert!(plain_sql.exists());
    }

    #[test]
    fn subdirectories_are_not_entered() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("old");
        fs::create_dir(&nested).unwrap();
        let (inner, mtime) = touch(&nested, "db1.2020-01-01.sql.bz2");

        let removed = sweep_expired(dir.path(), 1, mtime + DAY * 30).unwrap();
        assert!(removed.is_empty());
        assert!(inner.exists());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let gone = dir.path().join("nope");
        assert!(sweep_expired(&gone, 14, SystemTime::now()).is_err());
    }
}

//! Archive naming
//!
//! Archive paths are a pure function of (database, run stamp). That is what
//! makes a same-day rerun idempotent: the path already exists, so the
//! executor skips instead of duplicating work.

use std::path::{Path, PathBuf};

/// Suffix shared by the namer and the retention sweeper
pub const ARCHIVE_SUFFIX: &str = ".sql.bz2";

/// Canonical archive path: `{dir}/{database}.{stamp}.sql.bz2`
///
/// No I/O. Injective for distinct (database, stamp) pairs as long as
/// database identifiers stay within their usual restricted character set.
pub fn archive_path(directory: &Path, database: &str, stamp: &str) -> PathBuf {
    directory.join(format!("{database}.{stamp}{ARCHIVE_SUFFIX}"))
}

/// Whether a file name looks like one of our archives
pub fn is_archive_name(name: &str) -> bool {
    name.ends_with(ARCHIVE_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_pattern() {
        let path = archive_path(Path::new("/srv/backups"), "shop", "2024-03-01");
        assert_eq!(path, Path::new("/srv/backups/shop.2024-03-01.sql.bz2"));
    }

    #[test]
    fn deterministic() {
        let a = archive_path(Path::new("out"), "db1", "2024-03-01");
        let b = archive_path(Path::new("out"), "db1", "2024-03-01");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_inputs_give_distinct_paths() {
        let dir = Path::new("out");
        let paths = [
            archive_path(dir, "db1", "2024-03-01"),
            archive_path(dir, "db2", "2024-03-01"),
            archive_path(dir, "db1", "2024-03-02"),
            archive_path(dir, "db2", "2024-03-02"),
        ];
        for (i, a) in paths.iter().enumerate() {
            for b in &paths[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn suffix_matching() {
        assert!(is_archive_name("shop.2024-03-01.sql.bz2"));
        assert!(!is_archive_name("shop.2024-03-01.sql"));
        assert!(!is_archive_name("archiver.log"));
    }
}

//! External tool presence checks
//!
//! A missing core tool makes every later step meaningless, so the run is
//! gated on these checks before any server contact happens.

use crate::error::{Result, RunError};
use std::path::Path;
use tracing::debug;

/// Verify every required tool can be found.
///
/// Bare names are resolved through PATH; anything containing a path
/// separator is checked for existence directly. The first missing tool
/// fails the whole set.
pub fn check_tools(tools: &[&str]) -> Result<()> {
    for tool in tools {
        let found = if tool.contains(std::path::MAIN_SEPARATOR) {
            Path::new(tool).exists()
        } else {
            which::which(tool).is_ok()
        };

        if !found {
            return Err(RunError::DependencyMissing(tool.to_string()));
        }
        debug!("Found required tool: {}", tool);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_tools_on_path() {
        // sh is present on any unix test host
        check_tools(&["sh"]).unwrap();
    }

    #[test]
    fn finds_absolute_paths() {
        check_tools(&["/bin/sh"]).unwrap();
    }

    #[test]
    fn reports_the_missing_tool() {
        let err = check_tools(&["sh", "no-such-tool-anywhere"]).unwrap_err();
        match err {
            RunError::DependencyMissing(name) => assert_eq!(name, "no-such-tool-anywhere"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn reports_missing_absolute_path() {
        let err = check_tools(&["/nonexistent/bin/mysqldump"]).unwrap_err();
        assert!(matches!(err, RunError::DependencyMissing(_)));
    }
}

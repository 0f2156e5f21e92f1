//! Configuration module for db-archiver
//!
//! Loads and validates TOML configuration. Every setting has a documented
//! default, so running without a config file is a fully supported mode:
//! the tool is meant to be triggered from a scheduler with no arguments.
//!
//! ## Example Usage
//!
//! ```no_run
//! use db_archiver::config;
//!
//! let config = config::load_config("archiver.toml")?;
//! println!("Backing up into {:?}", config.backup.directory);
//! # Ok::<(), config::ConfigError>(())
//! ```

mod loader;
mod types;

pub use loader::{load_config, validate_config, ConfigError, Result};
pub use types::*;

/// Expand tilde (~) in path
pub fn expand_tilde(path: &std::path::Path) -> std::path::PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_expand_tilde() {
        let path = PathBuf::from("~/backups");
        let expanded = expand_tilde(&path);
        assert!(!expanded.starts_with("~"));

        // Non-tilde path should be unchanged
        let path = PathBuf::from("/absolute/path");
        let expanded = expand_tilde(&path);
        assert_eq!(expanded, path);
    }
}

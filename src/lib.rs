//! db-archiver library
//!
//! Unattended database backup orchestration: enumerate databases, dump each
//! to a compressed archive through external tools, expire old archives.

pub mod config;
pub mod error;
pub mod managers;
pub mod utils;

// Re-export commonly used types
pub use config::{load_config, Config};
pub use error::RunError;
pub use managers::logging::{init_console_logging, init_logging, LogGuard, LoggingConfig};
pub use managers::run::{BackupOutcome, BackupRun, RunReport};
pub use utils::{DatabaseServer, MysqlTools};

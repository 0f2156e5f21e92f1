use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Backup policy settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackupConfig {
    /// Directory archives are written to
    #[serde(default = "default_backup_directory")]
    pub directory: PathBuf,

    /// Days an archive is kept before it is eligible for deletion
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Abort the whole run on the first failed dump (historical behavior).
    /// When false, failures are recorded and remaining databases still run.
    #[serde(default = "default_abort_on_failure")]
    pub abort_on_failure: bool,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            directory: default_backup_directory(),
            retention_days: default_retention_days(),
            abort_on_failure: default_abort_on_failure(),
        }
    }
}

/// Database server connection and tool settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// mysql client binary (bare name resolved via PATH, or absolute path)
    #[serde(default = "default_mysql_bin")]
    pub mysql_bin: String,

    /// mysqldump binary
    #[serde(default = "default_mysqldump_bin")]
    pub mysqldump_bin: String,

    /// bzip2 binary used as the compression filter
    #[serde(default = "default_bzip2_bin")]
    pub bzip2_bin: String,

    /// Server host (omitted: client default, typically localhost)
    #[serde(default)]
    pub host: Option<String>,

    /// Server port
    #[serde(default)]
    pub port: Option<u16>,

    /// User name (omitted: client default)
    #[serde(default)]
    pub user: Option<String>,

    /// Extra defaults file passed to both mysql and mysqldump,
    /// the usual place to keep credentials out of the process list
    #[serde(default)]
    pub defaults_file: Option<PathBuf>,

    /// Timeout for status and enumeration queries.
    /// Dumps deliberately run without one.
    #[serde(default = "default_query_timeout")]
    pub query_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            mysql_bin: default_mysql_bin(),
            mysqldump_bin: default_mysqldump_bin(),
            bzip2_bin: default_bzip2_bin(),
            host: None,
            port: None,
            user: None,
            defaults_file: None,
            query_timeout_seconds: default_query_timeout(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// Persistent log file (console output is always duplicated here)
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// Log level for the file sink (console always logs at info)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            log_level: default_log_level(),
        }
    }
}

impl ServerConfig {
    /// Tools the run cannot start without
    pub fn required_tools(&self) -> Vec<&str> {
        vec![&self.mysql_bin, &self.mysqldump_bin, &self.bzip2_bin]
    }
}

// Default value functions

fn default_backup_directory() -> PathBuf { PathBuf::from("./backups") }
fn default_retention_days() -> u32 { 14 }
fn default_abort_on_failure() -> bool { true }
fn default_mysql_bin() -> String { "mysql".to_string() }
fn default_mysqldump_bin() -> String { "mysqldump".to_string() }
fn default_bzip2_bin() -> String { "bzip2".to_string() }
fn default_query_timeout() -> u64 { 60 }
fn default_log_file() -> PathBuf { PathBuf::from("/var/log/db-archiver.log") }
fn default_log_level() -> String { "info".to_string() }

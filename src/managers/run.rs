//! Backup run orchestration
//!
//! One run, start to finish: tool checks, connectivity probe, enumeration,
//! per-database dump in server order, retention sweep. Databases are
//! processed strictly sequentially; the dump step blocks until the external
//! pipeline completes.

use crate::config::Config;
use crate::error::{Result, RunError};
use crate::utils::archive::archive_path;
use crate::utils::mysql::filter_system_schemas;
use crate::utils::{deps, sweep, DatabaseServer};
use chrono::Local;
use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;
use tracing::{error, info, warn};

/// Outcome recorded per database
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    /// An archive for this run date already exists
    Skipped,
    Succeeded(PathBuf),
    Failed(String),
}

/// Summary of one complete run
#[derive(Debug, Default)]
pub struct RunReport {
    /// Outcome per database, in enumeration order
    pub outcomes: Vec<(String, BackupOutcome)>,
    /// Expired archives removed by the sweep
    pub swept: Vec<PathBuf>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, BackupOutcome::Succeeded(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, BackupOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, BackupOutcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&BackupOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// A single orchestrated backup run
pub struct BackupRun<'a> {
    config: Config,
    server: &'a dyn DatabaseServer,
    /// Run timestamp at date granularity, fixed at construction
    stamp: String,
}

impl<'a> BackupRun<'a> {
    pub fn new(config: Config, server: &'a dyn DatabaseServer) -> Self {
        let stamp = Local::now().format("%Y-%m-%d").to_string();
        Self::with_stamp(config, server, stamp)
    }

    /// Construct with an explicit run stamp (injectable for tests)
    pub fn with_stamp(config: Config, server: &'a dyn DatabaseServer, stamp: String) -> Self {
        Self {
            config,
            server,
            stamp,
        }
    }

    /// Execute the whole run
    ///
    /// Fatal conditions (missing tool, unreachable server, failed
    /// enumeration, failed dump under the abort policy) return an error;
    /// the retention sweep is best-effort and never fails the run.
    pub fn execute(&self) -> Result<RunReport> {
        info!("Starting backup run ({})", self.stamp);

        deps::check_tools(&self.config.server.required_tools())?;

        self.server
            .ping()
            .map_err(|e| RunError::ConnectivityFailed(format!("{e:#}")))?;
        info!("Database server is reachable");

        let raw = self
            .server
            .list_databases()
            .map_err(|e| RunError::EnumerationFailed(format!("{e:#}")))?;
        let databases = filter_system_schemas(raw);
        info!("Found {} backup-eligible database(s)", databases.len());

        fs::create_dir_all(&self.config.backup.directory)?;

        let mut report = RunReport::default();
        for database in &databases {
            let outcome = self.backup_database(database)?;
            report.outcomes.push((database.clone(), outcome));
        }

        match sweep::sweep_expired(
            &self.config.backup.directory,
            self.config.backup.retention_days,
            SystemTime::now(),
        ) {
            Ok(swept) => report.swept = swept,
            Err(e) => warn!("{}", RunError::SweepFailed(e.to_string())),
        }

        info!(
            "Run complete: {} backed up, {} skipped, {} failed, {} expired archive(s) removed",
            report.succeeded(),
            report.skipped(),
            report.failed(),
            report.swept.len()
        );

        Ok(report)
    }

    /// Back up a single database: skip-if-exists, then dump
    fn backup_database(&self, database: &str) -> Result<BackupOutcome> {
        let path = archive_path(&self.config.backup.directory, database, &self.stamp);

        if path.exists() {
            info!("Archive already exists, skipping: {}", path.display());
            return Ok(BackupOutcome::Skipped);
        }

        match self.server.dump_to(database, &path) {
            Ok(()) => {
                info!("Backed up '{}' to {}", database, path.display());
                Ok(BackupOutcome::Succeeded(path))
            }
            Err(e) => {
                let reason = format!("{e:#}");
                error!(
                    "Dump failed for '{}' (target {}): {}",
                    database,
                    path.display(),
                    reason
                );
                // A truncated archive may remain at the target path; it is
                // left in place and a later rerun will skip over it, so
                // operators must remove it before retrying the same day.
                if self.config.backup.abort_on_failure {
                    Err(RunError::DumpFailed {
                        database: database.to_string(),
                        path,
                        reason,
                    })
                } else {
                    Ok(BackupOutcome::Failed(reason))
                }
            }
        }
    }
}

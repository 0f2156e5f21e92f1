//! Database server access through the mysql client tools
//!
//! The orchestrator never speaks the wire protocol itself; everything goes
//! through the configured `mysql`/`mysqldump`/`bzip2` binaries. The
//! [`DatabaseServer`] trait is the seam that lets the run logic be tested
//! against a fake server.

use crate::config::ServerConfig;
use crate::utils::command::{run_command, run_command_stdout};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::{debug, info};

/// Schemas that are never backup-eligible: the server's own catalogs.
pub const SYSTEM_SCHEMAS: &[&str] = &["information_schema", "performance_schema", "mysql", "sys"];

/// Operations the run needs from a database server
pub trait DatabaseServer {
    /// Lightweight, side-effect-free reachability probe
    fn ping(&self) -> Result<()>;

    /// Raw database list, in server order
    fn list_databases(&self) -> Result<Vec<String>>;

    /// Dump one database, compressed, to `dest` as a single atomic step
    fn dump_to(&self, database: &str, dest: &Path) -> Result<()>;
}

/// Drop system schemas and empty lines, preserving server order
pub fn filter_system_schemas(databases: Vec<String>) -> Vec<String> {
    databases
        .into_iter()
        .filter(|db| !db.is_empty() && !SYSTEM_SCHEMAS.contains(&db.as_str()))
        .collect()
}

/// Production implementation shelling out to the mysql client tools
pub struct MysqlTools {
    config: ServerConfig,
}

impl MysqlTools {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Connection arguments shared by mysql and mysqldump.
    /// The defaults file has to come before any other option.
    fn connection_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(ref file) = self.config.defaults_file {
            args.push(format!("--defaults-extra-file={}", file.display()));
        }
        if let Some(ref host) = self.config.host {
            args.push(format!("--host={host}"));
        }
        if let Some(port) = self.config.port {
            args.push(format!("--port={port}"));
        }
        if let Some(ref user) = self.config.user {
            args.push(format!("--user={user}"));
        }
        args
    }

    fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.config.query_timeout_seconds)
    }
}

impl DatabaseServer for MysqlTools {
    fn ping(&self) -> Result<()> {
        let mut args = self.connection_args();
        args.push("-e".to_string());
        args.push("status".to_string());

        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        run_command(&self.config.mysql_bin, &arg_refs, Some(self.query_timeout()))
            .context("Status query failed")?;

        debug!("Server status query succeeded");
        Ok(())
    }

    fn list_databases(&self) -> Result<Vec<String>> {
        let mut args = self.connection_args();
        args.push("--batch".to_string());
        args.push("--skip-column-names".to_string());
        args.push("-e".to_string());
        args.push("SHOW DATABASES".to_string());

        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let stdout = run_command_stdout(
            &self.config.mysql_bin,
            &arg_refs,
            Some(self.query_timeout()),
        )
        .context("SHOW DATABASES failed")?;

        Ok(parse_database_lines(&stdout))
    }

    fn dump_to(&self, database: &str, dest: &Path) -> Result<()> {
        info!("Dumping '{}' to {}", database, dest.display());

        let mut dump = Command::new(&self.config.mysqldump_bin)
            .args(self.connection_args())
            .arg("--opt")
            .arg("--single-transaction")
            .arg(database)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to start {}", self.config.mysqldump_bin))?;

        let dump_stdout = dump
            .stdout
            .take()
            .context("mysqldump stdout unavailable")?;

        let archive = File::create(dest)
            .with_context(|| format!("Failed to create archive file {}", dest.display()))?;

        let mut compress = Command::new(&self.config.bzip2_bin)
            .stdin(Stdio::from(dump_stdout))
            .stdout(Stdio::from(archive))
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to start {}", self.config.bzip2_bin))?;

        // Drain both stderr pipes while the children run. A chatty
        // mysqldump can fill the OS pipe buffer, and a full pipe blocks
        // the child, which would leave wait() stuck forever.
        let dump_stderr = drain_stderr(dump.stderr.take());
        let compress_stderr = drain_stderr(compress.stderr.take());

        // The compressor exits once the dump closes its end of the pipe,
        // so wait for it first.
        let compress_status = compress.wait().context("Waiting on compressor failed")?;
        let dump_status = dump.wait().context("Waiting on mysqldump failed")?;

        if !dump_status.success() {
            anyhow::bail!(
                "mysqldump exited with {:?}: {}",
                dump_status.code(),
                dump_stderr.join().unwrap_or_default().trim()
            );
        }

        if !compress_status.success() {
            anyhow::bail!(
                "Compression exited with {:?}: {}",
                compress_status.code(),
                compress_stderr.join().unwrap_or_default().trim()
            );
        }

        Ok(())
    }
}

/// Consume a child's stderr on its own thread, handing the captured
/// text back through the join handle.
fn drain_stderr(pipe: Option<std::process::ChildStderr>) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let mut captured = String::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_string(&mut captured).ok();
        }
        captured
    })
}

/// Split batch-mode output into database names
fn parse_database_lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn names(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn system_schemas_are_filtered_in_order() {
        let raw = names(&[
            "db1",
            "information_schema",
            "db2",
            "performance_schema",
            "sys",
        ]);
        assert_eq!(filter_system_schemas(raw), names(&["db1", "db2"]));
    }

    #[test]
    fn mysql_schema_is_filtered_too() {
        let raw = names(&["mysql", "app"]);
        assert_eq!(filter_system_schemas(raw), names(&["app"]));
    }

    #[test]
    fn empty_names_are_dropped() {
        let raw = names(&["", "app"]);
        assert_eq!(filter_system_schemas(raw), names(&["app"]));
    }

    #[test]
    fn batch_output_parsing() {
        let stdout = "db1\ninformation_schema\ndb2\n\n";
        assert_eq!(
            parse_database_lines(stdout),
            names(&["db1", "information_schema", "db2"])
        );
    }

    #[test]
    fn defaults_file_comes_first() {
        let tools = MysqlTools::new(ServerConfig {
            defaults_file: Some(PathBuf::from("/etc/backup.cnf")),
            host: Some("db.internal".to_string()),
            user: Some("backup".to_string()),
            port: Some(3307),
            ..ServerConfig::default()
        });

        let args = tools.connection_args();
        assert_eq!(
            args,
            vec![
                "--defaults-extra-file=/etc/backup.cnf",
                "--host=db.internal",
                "--port=3307",
                "--user=backup",
            ]
        );
    }

    #[test]
    fn no_connection_args_by_default() {
        let tools = MysqlTools::new(ServerConfig::default());
        assert!(tools.connection_args().is_empty());
    }

    #[cfg(unix)]
    fn write_script(dir: &std::path::Path, name: &str, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.display().to_string()
    }

    #[cfg(unix)]
    #[test]
    fn dump_completes_with_flooded_stderr() {
        let dir = tempfile::TempDir::new().unwrap();
        // Emits well past the OS pipe buffer size on stderr before
        // producing any dump output.
        let fake_dump = write_script(
            dir.path(),
            "fake-mysqldump",
            "head -c 200000 /dev/zero | tr '\\0' 'w' >&2\necho '-- dump complete'",
        );
        let tools = MysqlTools::new(ServerConfig {
            mysqldump_bin: fake_dump,
            bzip2_bin: "cat".to_string(),
            ..ServerConfig::default()
        });

        let dest = dir.path().join("app.2024-03-01.sql.bz2");
        tools.dump_to("app", &dest).unwrap();

        let written = std::fs::read_to_string(&dest).unwrap();
        assert!(written.contains("-- dump complete"));
    }

    #[cfg(unix)]
    #[test]
    fn dump_failure_reports_captured_stderr() {
        let dir = tempfile::TempDir::new().unwrap();
        let fake_dump = write_script(
            dir.path(),
            "fake-mysqldump",
            "echo 'Access denied for user' >&2\nexit 2",
        );
        let tools = MysqlTools::new(ServerConfig {
            mysqldump_bin: fake_dump,
            bzip2_bin: "cat".to_string(),
            ..ServerConfig::default()
        });

        let dest = dir.path().join("app.2024-03-01.sql.bz2");
        let err = tools.dump_to("app", &dest).unwrap_err();
        assert!(err.to_string().contains("Access denied for user"));
    }
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use db_archiver::config::{self, Config};
use db_archiver::managers::logging::{self, LoggingConfig};
use db_archiver::utils::mysql::filter_system_schemas;
use db_archiver::utils::{deps, sweep, DatabaseServer, MysqlTools};
use db_archiver::{BackupRun, RunError};
use std::path::PathBuf;
use std::time::SystemTime;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "db-archiver")]
#[command(about = "Periodic database backup orchestrator", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to configuration file (documented defaults apply when omitted,
    /// so a scheduler can invoke the binary with no arguments)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full backup cycle: probe, dump every database, sweep (default)
    Run,

    /// Delete expired archives without taking new backups
    Sweep,

    /// Print the backup-eligible databases and exit
    List,

    /// Validate configuration file
    Validate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::load_config(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };

    // Triggered by a scheduler with no arguments means a full run
    let command = cli.command.unwrap_or(Commands::Run);

    match command {
        Commands::Run => {
            let log_guard =
                logging::init_logging(&LoggingConfig::from_settings(&config.logging))?;
            let _log_guard = logging::flush_on_signal(log_guard);

            let server = MysqlTools::new(config.server.clone());
            let run = BackupRun::new(config, &server);
            if let Err(e) = run.execute() {
                error!("Run aborted: {}", e);
                return Err(e.into());
            }
            Ok(())
        }

        Commands::Sweep => {
            let log_guard =
                logging::init_logging(&LoggingConfig::from_settings(&config.logging))?;
            let _log_guard = logging::flush_on_signal(log_guard);

            let removed = sweep::sweep_expired(
                &config.backup.directory,
                config.backup.retention_days,
                SystemTime::now(),
            )
            .map_err(|e| RunError::SweepFailed(e.to_string()))
            .inspect_err(|e| error!("{}", e))?;

            info!(
                "Sweep complete: {} expired archive(s) removed",
                removed.len()
            );
            Ok(())
        }

        Commands::List => {
            logging::init_console_logging();

            deps::check_tools(&config.server.required_tools())?;
            let server = MysqlTools::new(config.server.clone());
            let databases = filter_system_schemas(server.list_databases()?);

            for database in &databases {
                println!("{database}");
            }
            Ok(())
        }

        Commands::Validate => {
            // load_config already validated; a default config validates too
            config::validate_config(&config)?;

            println!("Configuration is valid!");
            println!("Backup directory: {}", config.backup.directory.display());
            println!("Retention: {} days", config.backup.retention_days);
            println!("Log file: {}", config.logging.log_file.display());
            Ok(())
        }
    }
}

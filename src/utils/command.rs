//! Utilities for running commands with proper error handling and timeouts

use anyhow::{Context, Result};
use std::process::{Command, Output, Stdio};
use std::time::Duration;
use tracing::{debug, error};

/// Run a command with optional timeout
///
/// Stdout and stderr are captured; a non-zero exit status is an error
/// carrying the command's stderr.
pub fn run_command(program: &str, args: &[&str], timeout: Option<Duration>) -> Result<Output> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    debug!("Running command: {} {}", program, args.join(" "));

    let output = if let Some(timeout_duration) = timeout {
        // Use tokio for timeout support
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to build runtime for command timeout")?;

        runtime.block_on(async {
            let result =
                tokio::time::timeout(timeout_duration, tokio::process::Command::from(cmd).output())
                    .await;

            match result {
                Ok(output) => output.context(format!("Failed to execute {}", program)),
                Err(_) => Err(anyhow::anyhow!(
                    "Command timed out after {:?}",
                    timeout_duration
                )),
            }
        })?
    } else {
        cmd.output()
            .context(format!("Failed to execute {}", program))?
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!("Command failed: {} {}", program, args.join(" "));
        error!("Stderr: {}", stderr);
        anyhow::bail!(
            "Command failed with exit code {:?}: {}",
            output.status.code(),
            stderr
        );
    }

    Ok(output)
}

/// Run a command and return stdout as string
pub fn run_command_stdout(
    program: &str,
    args: &[&str],
    timeout: Option<Duration>,
) -> Result<String> {
    let output = run_command(program, args, timeout)?;
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout() {
        let out = run_command_stdout("echo", &["hello"], None).unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[test]
    fn nonzero_exit_is_an_error() {
        let result = run_command("false", &[], None);
        assert!(result.is_err());
    }

    #[test]
    fn missing_program_is_an_error() {
        let result = run_command("definitely-not-a-real-binary", &[], None);
        assert!(result.is_err());
    }

    #[test]
    fn timeout_kills_long_commands() {
        let result = run_command("sleep", &["5"], Some(Duration::from_millis(100)));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}

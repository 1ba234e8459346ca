//! Execution handoff for approved commands
//!
//! Nothing in the pipeline calls these; the session controller and the
//! binary hand validated candidates over once the user has agreed.

use std::io;
use std::process::Command;

/// Captured result of one command
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs command text on behalf of the caller
pub trait ProcessExecutor {
    fn execute(&mut self, command: &str) -> io::Result<ExecutionOutput>;
}

/// Runs commands through `sh -c`
#[derive(Debug, Default)]
pub struct ShellExecutor;

impl ProcessExecutor for ShellExecutor {
    fn execute(&mut self, command: &str) -> io::Result<ExecutionOutput> {
        tracing::info!(command, "Executing");
        let output = Command::new("sh").arg("-c").arg(command).output()?;
        Ok(ExecutionOutput {
            // Killed by a signal: no exit code
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Records commands and reports what would have run
#[derive(Debug, Default)]
pub struct DryRunExecutor {
    pub executed: Vec<String>,
}

impl ProcessExecutor for DryRunExecutor {
    fn execute(&mut self, command: &str) -> io::Result<ExecutionOutput> {
        self.executed.push(command.to_string());
        Ok(ExecutionOutput {
            exit_code: 0,
            stdout: format!("would execute: {}\n", command),
            stderr: String::new(),
        })
    }
}

/// Outcome of handing a sequence of commands to an executor
#[derive(Debug, Default)]
pub struct HandoffReport {
    pub outputs: Vec<(String, ExecutionOutput)>,
    /// Command that exited non-zero and stopped the sequence
    pub failed: Option<String>,
}

/// Execute `commands` in order, stopping at the first non-zero exit
pub fn run_in_order<'a, E, I>(executor: &mut E, commands: I) -> io::Result<HandoffReport>
where
    E: ProcessExecutor + ?Sized,
    I: IntoIterator<Item = &'a str>,
{
    let mut report = HandoffReport::default();
    for command in commands {
        let output = executor.execute(command)?;
        let ok = output.success();
        report.outputs.push((command.to_string(), output));
        if !ok {
            tracing::warn!(command, "Command failed, skipping the rest of the sequence");
            report.failed = Some(command.to_string());
            break;
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_run_records() {
        let mut executor = DryRunExecutor::default();
        let out = executor.execute("robo sim launch gazebo").unwrap();
        assert!(out.success());
        assert_eq!(out.stdout, "would execute: robo sim launch gazebo\n");
        assert_eq!(executor.executed, vec!["robo sim launch gazebo"]);
    }

    #[test]
    fn test_shell_executor_captures_output() {
        let mut executor = ShellExecutor;
        let out = executor.execute("echo hello; echo oops >&2; exit 3").unwrap();
        assert_eq!(out.exit_code, 3);
        assert_eq!(out.stdout, "hello\n");
        assert_eq!(out.stderr, "oops\n");
    }

    #[test]
    fn test_run_in_order_stops_at_first_failure() {
        let mut executor = ShellExecutor;
        let report = run_in_order(&mut executor, ["true", "false", "echo never"]).unwrap();
        assert_eq!(report.outputs.len(), 2);
        assert_eq!(report.failed.as_deref(), Some("false"));
    }
}

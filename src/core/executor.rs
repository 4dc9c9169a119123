//! Local command execution.
//!
//! Runs a command through the user's shell and captures its output.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::process::Command as ProcessCommand;

use super::config::LocalConfig;

/// Default timeout for local commands.
pub const DEFAULT_LOCAL_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of executing a command.
#[derive(Debug)]
pub struct ExecutionResult {
    /// Exit status of the command (`None` when it timed out)
    pub status: Option<ExitStatus>,

    /// Standard output
    pub stdout: String,

    /// Standard error
    pub stderr: String,

    /// Time taken to execute
    pub duration: Duration,

    /// Whether the command was killed for exceeding the timeout
    pub timed_out: bool,
}

impl ExecutionResult {
    /// Check if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.status.map(|s| s.success()).unwrap_or(false)
    }

    /// Get the exit code.
    pub fn code(&self) -> Option<i32> {
        self.status.and_then(|s| s.code())
    }

    /// Combined output, stdout first.
    pub fn output(&self) -> String {
        let stdout = self.stdout.trim_end();
        let stderr = self.stderr.trim_end();
        match (stdout.is_empty(), stderr.is_empty()) {
            (true, true) => String::new(),
            (false, true) => stdout.to_string(),
            (true, false) => stderr.to_string(),
            (false, false) => format!("{stdout}\n{stderr}"),
        }
    }
}

/// Runs commands in the caller's own shell.
#[derive(Debug, Clone)]
pub struct LocalExecutor {
    /// Shell override
    pub shell: Option<String>,

    /// Timeout for command execution
    pub timeout: Duration,

    /// Working directory override
    pub working_dir: Option<PathBuf>,
}

impl Default for LocalExecutor {
    fn default() -> Self {
        Self { shell: None, timeout: DEFAULT_LOCAL_TIMEOUT, working_dir: None }
    }
}

impl LocalExecutor {
    /// Create a new executor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an executor from the `[local]` config section.
    pub fn from_config(config: &LocalConfig) -> Self {
        Self { shell: config.shell.clone(), timeout: config.timeout(), working_dir: None }
    }

    /// Set the shell.
    #[must_use]
    pub fn shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = Some(shell.into());
        self
    }

    /// Set execution timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the working directory.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Execute a command string, capturing output.
    ///
    /// A command that outlives the timeout is killed and reported with
    /// `timed_out` set rather than as an error.
    pub async fn execute(&self, command: &str) -> anyhow::Result<ExecutionResult> {
        let start = Instant::now();
        let (shell, shell_arg) = self.resolve_shell();

        let mut cmd = ProcessCommand::new(&shell);
        cmd.arg(shell_arg)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }

        let child = cmd
            .spawn()
            .map_err(|e| anyhow::anyhow!("failed to spawn {shell}: {e}"))?;

        tracing::debug!(command, shell = %shell, "Executing locally");

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => {
                let output = output?;
                Ok(ExecutionResult {
                    status: Some(output.status),
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                    duration: start.elapsed(),
                    timed_out: false,
                })
            }
            Err(_) => {
                tracing::warn!(command, timeout = ?self.timeout, "Local command timed out");
                Ok(ExecutionResult {
                    status: None,
                    stdout: String::new(),
                    stderr: format!("command timed out after {}s", self.timeout.as_secs()),
                    duration: start.elapsed(),
                    timed_out: true,
                })
            }
        }
    }

    fn resolve_shell(&self) -> (String, &'static str) {
        if cfg!(target_os = "windows") {
            return (self.shell.clone().unwrap_or_else(|| "cmd".to_string()), "/C");
        }
        let shell = self
            .shell
            .clone()
            .or_else(|| std::env::var("SHELL").ok().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| "sh".to_string());
        (shell, "-c")
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_executor_builder() {
        let executor = LocalExecutor::new().shell("sh").timeout(Duration::from_secs(5));
        assert_eq!(executor.shell.as_deref(), Some("sh"));
        assert_eq!(executor.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_from_config() {
        let config = LocalConfig { shell: Some("bash".to_string()), timeout_secs: 3 };
        let executor = LocalExecutor::from_config(&config);
        assert_eq!(executor.shell.as_deref(), Some("bash"));
        assert_eq!(executor.timeout, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_execute_simple_command() {
        let executor = LocalExecutor::new().shell("sh");
        let result = executor.execute("echo hello").await.unwrap();
        assert!(result.success());
        assert_eq!(result.code(), Some(0));
        assert_eq!(result.output(), "hello");
    }

    #[tokio::test]
    async fn test_execute_failure_and_stderr() {
        let executor = LocalExecutor::new().shell("sh");
        let result = executor.execute("echo oops 1>&2; exit 3").await.unwrap();
        assert!(!result.success());
        assert_eq!(result.code(), Some(3));
        assert_eq!(result.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn test_execute_with_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let executor = LocalExecutor::new().shell("sh").working_dir(dir.path());
        let result = executor.execute("pwd").await.unwrap();
        let name = dir.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(result.stdout.contains(&name));
    }

    #[tokio::test]
    async fn test_execute_timeout() {
        let executor = LocalExecutor::new().shell("sh").timeout(Duration::from_millis(100));
        let result = executor.execute("sleep 5").await.unwrap();
        assert!(result.timed_out);
        assert!(!result.success());
        assert!(result.code().is_none());
    }
}

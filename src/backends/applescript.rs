//! `osascript` plumbing shared by the macOS adapters.

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

/// Default bound for a single script run.
pub const DEFAULT_SCRIPT_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of running a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptOutput {
    /// Script ran; trimmed stdout
    Ok(String),
    /// `osascript` is not installed (not macOS)
    Unavailable,
}

/// Run an AppleScript snippet through `osascript -e`.
///
/// A non-zero exit becomes an error carrying the script's stderr.
pub async fn run_applescript(script: &str, timeout: Duration) -> anyhow::Result<ScriptOutput> {
    let child = match Command::new("osascript")
        .arg("-e")
        .arg(script)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ScriptOutput::Unavailable),
        Err(e) => anyhow::bail!("failed to execute osascript: {e}"),
    };

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| anyhow::anyhow!("osascript timed out after {}s", timeout.as_secs()))??;

    if output.status.success() {
        Ok(ScriptOutput::Ok(String::from_utf8_lossy(&output.stdout).trim().to_string()))
    } else {
        anyhow::bail!("{}", String::from_utf8_lossy(&output.stderr).trim())
    }
}

/// Run a script whose stdout is irrelevant. A missing `osascript` is an error.
pub async fn run_action(script: &str, timeout: Duration) -> anyhow::Result<()> {
    match run_applescript(script, timeout).await? {
        ScriptOutput::Ok(_) => Ok(()),
        ScriptOutput::Unavailable => anyhow::bail!("osascript is not available on this system"),
    }
}

/// Escape a value for embedding in a double-quoted AppleScript string.
pub fn applescript_escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

/// Check whether a process with the given name is running.
pub async fn is_process_running(process: &str, timeout: Duration) -> bool {
    let script = format!(
        "tell application \"System Events\" to return exists (processes where name is \"{}\")",
        applescript_escape(process)
    );
    match run_applescript(&script, timeout).await {
        Ok(ScriptOutput::Ok(out)) => out == "true",
        Ok(ScriptOutput::Unavailable) => false,
        Err(e) => {
            tracing::debug!(process, error = %e, "Process check failed");
            false
        }
    }
}

/// Split `a|b` records emitted one per line.
pub(crate) fn parse_records(output: &str) -> Vec<(String, String)> {
    output
        .lines()
        .filter_map(|line| {
            let (key, rest) = line.split_once('|')?;
            let key = key.trim();
            (!key.is_empty()).then(|| (key.to_string(), rest.trim().to_string()))
        })
        .collect()
}

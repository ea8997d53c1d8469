mod validate;

pub use validate::validate_command;

use std::path::Path;
use std::time::Duration;
use std::time::Instant;

use tokio::process::Command;

use crate::error::GatewayError;
use crate::error::Result;

pub struct ExecutionRequest<'a> {
    pub command: &'a str,
    pub cwd: &'a Path,
    pub timeout: Duration,
    pub max_output_chars: usize,
}

pub struct ExecutionOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
    pub truncated: bool,
}

/// Runs `request.command` through a shell, capturing output and enforcing
/// the timeout, matching spec.md §4.5's executor contract.
pub async fn run(request: ExecutionRequest<'_>) -> Result<ExecutionOutcome> {
    validate_command(request.command)?;

    let started = Instant::now();
    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(request.command)
        .current_dir(request.cwd)
        .env("HOME", request.cwd)
        .env("PWD", request.cwd)
        .kill_on_drop(true);

    let spawned = cmd
        .output();

    let output = match tokio::time::timeout(request.timeout, spawned).await {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => return Err(GatewayError::Spawn { source }),
        Err(_) => {
            return Ok(ExecutionOutcome {
                exit_code: -1,
                stdout: String::new(),
                stderr: format!("Command timed out after {} seconds", request.timeout.as_secs()),
                duration_ms: started.elapsed().as_millis() as u64,
                truncated: false,
            });
        }
    };

    let duration_ms = started.elapsed().as_millis() as u64;
    let (stdout, stdout_truncated) = cap_output(
        String::from_utf8_lossy(&output.stdout).into_owned(),
        request.max_output_chars,
    );
    let (stderr, stderr_truncated) = cap_output(
        String::from_utf8_lossy(&output.stderr).into_owned(),
        request.max_output_chars,
    );

    Ok(ExecutionOutcome {
        exit_code: output.status.code().unwrap_or(-1),
        stdout,
        stderr,
        duration_ms,
        truncated: stdout_truncated || stderr_truncated,
    })
}

fn cap_output(mut text: String, max_chars: usize) -> (String, bool) {
    if text.len() <= max_chars {
        return (text, false);
    }
    let boundary = floor_char_boundary(&text, max_chars);
    text.truncate(boundary);
    text.push_str("\n... (output truncated)");
    (text, true)
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut idx = index.min(text.len());
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

//! Code execution sandbox: runs a snippet in an external interpreter process
//! and captures its standard output.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("failed to start interpreter '{interpreter}': {source}")]
    Spawn {
        interpreter: String,
        #[source]
        source: std::io::Error,
    },
    #[error("code exited with status {status}: {stderr}")]
    Runtime { status: i32, stderr: String },
    #[error("code execution exceeded {0:?}")]
    Timeout(Duration),
}

/// External interpreter boundary.
#[async_trait]
pub trait CodeSandbox: Send + Sync {
    /// Run `code` and return captured stdout verbatim.
    async fn run(&self, code: &str) -> Result<String, SandboxError>;
}

/// Runs code through `<interpreter> -c <code>` in a child process.
#[derive(Debug, Clone)]
pub struct PythonSandbox {
    interpreter: String,
    timeout: Duration,
}

impl PythonSandbox {
    pub fn new(interpreter: impl Into<String>, timeout: Duration) -> Self {
        Self {
            interpreter: interpreter.into(),
            timeout,
        }
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }
}

impl Default for PythonSandbox {
    fn default() -> Self {
        Self::new("python3", Duration::from_secs(30))
    }
}

#[async_trait]
impl CodeSandbox for PythonSandbox {
    async fn run(&self, code: &str) -> Result<String, SandboxError> {
        debug!(
            interpreter = self.interpreter.as_str(),
            code_chars = code.len(),
            "Executing code in sandbox"
        );
        let child = Command::new(&self.interpreter)
            .arg("-c")
            .arg(code)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SandboxError::Spawn {
                interpreter: self.interpreter.clone(),
                source,
            })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| SandboxError::Spawn {
                interpreter: self.interpreter.clone(),
                source,
            })?,
            Err(_) => {
                warn!(timeout = ?self.timeout, "Sandbox execution timed out");
                return Err(SandboxError::Timeout(self.timeout));
            }
        };

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(SandboxError::Runtime {
                status: output.status.code().unwrap_or(-1),
                stderr,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_verbatim() {
        let sandbox = PythonSandbox::new("sh", Duration::from_secs(5));
        let output = sandbox.run("echo hello; echo world").await.expect("runs");
        assert_eq!(output, "hello\nworld\n");
    }

    #[tokio::test]
    async fn non_zero_exit_reports_stderr() {
        let sandbox = PythonSandbox::new("sh", Duration::from_secs(5));
        let err = sandbox.run("echo boom >&2; exit 3").await.unwrap_err();
        match err {
            SandboxError::Runtime { status, stderr } => {
                assert_eq!(status, 3);
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn slow_code_times_out() {
        let sandbox = PythonSandbox::new("sh", Duration::from_millis(100));
        let err = sandbox.run("sleep 5").await.unwrap_err();
        assert!(matches!(err, SandboxError::Timeout(_)));
    }

    #[tokio::test]
    async fn missing_interpreter_is_a_spawn_error() {
        let sandbox = PythonSandbox::new("definitely-not-an-interpreter", Duration::from_secs(1));
        let err = sandbox.run("print(1)").await.unwrap_err();
        assert!(matches!(err, SandboxError::Spawn { .. }));
    }
}

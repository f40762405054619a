//! Wall-clock bounded execution of an external program.

use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stderr: String,
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn {program}: {source}")]
    Spawn { program: String, source: io::Error },
    #[error("I/O error waiting for {program}: {source}")]
    Wait { program: String, source: io::Error },
    #[error("{program} timed out after {timeout:?}")]
    TimedOut { program: String, timeout: Duration },
}

#[derive(Debug, Clone)]
pub struct BoundedCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl BoundedCommand {
    pub fn new(program: PathBuf, timeout: Duration) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout,
        }
    }

    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Run to completion, capturing stderr. A non-zero exit is returned as a
    /// normal `ProcessOutput`; only spawn failures, wait failures and the
    /// timeout are errors. On timeout the child is killed and reaped.
    pub async fn run(&self) -> Result<ProcessOutput, ProcessError> {
        let program = self.program_name();
        debug!(program = %program, args = ?self.args, "spawning external process");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: program.clone(),
                source,
            })?;

        let mut stderr_pipe = child.stderr.take();

        let result = tokio::time::timeout(self.timeout, async {
            let mut stderr = Vec::new();
            if let Some(pipe) = stderr_pipe.as_mut() {
                pipe.read_to_end(&mut stderr).await?;
            }
            let status = child.wait().await?;
            Ok::<_, io::Error>((status, stderr))
        })
        .await;

        match result {
            Ok(Ok((status, stderr))) => Ok(ProcessOutput {
                status,
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            }),
            Ok(Err(source)) => Err(ProcessError::Wait { program, source }),
            Err(_elapsed) => {
                warn!(program = %program, timeout = ?self.timeout, "external process timed out, killing");
                if let Err(e) = child.kill().await {
                    warn!(program = %program, error = %e, "failed to kill timed out process");
                }
                Err(ProcessError::TimedOut {
                    program,
                    timeout: self.timeout,
                })
            }
        }
    }
}

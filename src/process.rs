//! Running a language server as a child process.
//!
//! The server speaks the protocol on its stdin and stdout. Its stderr is
//! forwarded line by line to the `log` facade under
//! [`STDERR_LOG_TARGET`].

use crate::error::{LspError, Result};
use crate::options::SessionOptions;
use crate::session::Session;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;

/// Log target of the server's stderr output.
pub const STDERR_LOG_TARGET: &str = "lsp_session::server::stderr";

/// A spawned language server.
///
/// The child is killed when this value is dropped.
pub struct ServerProcess {
    child: Child,
    stderr_task: Option<JoinHandle<()>>,
}

impl ServerProcess {
    /// Spawn `command` with piped stdio.
    pub fn spawn(mut command: Command) -> Result<Self> {
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let program = command.as_std().get_program().to_string_lossy().into_owned();
        let mut child = command
            .spawn()
            .map_err(|e| LspError::Process(format!("Failed to start {}: {}", program, e)))?;
        log::info!("Started language server {} (pid {:?})", program, child.id());

        let stderr_task = child.stderr.take().map(|stderr| {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                loop {
                    match lines.next_line().await {
                        Ok(Some(line)) if line.trim().is_empty() => {}
                        Ok(Some(line)) => log::debug!(target: STDERR_LOG_TARGET, "{}", line.trim_end()),
                        Ok(None) => break,
                        Err(e) => {
                            log::warn!("Failed to read server stderr: {}", e);
                            break;
                        }
                    }
                }
            })
        });

        Ok(Self { child, stderr_task })
    }

    /// The OS process id, while the child is running.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Take the protocol pipes. Succeeds once.
    pub fn take_stdio(&mut self) -> Result<(ChildStdout, ChildStdin)> {
        let stdout = self.child.stdout.take();
        let stdin = self.child.stdin.take();
        match (stdout, stdin) {
            (Some(stdout), Some(stdin)) => Ok((stdout, stdin)),
            _ => Err(LspError::Process(
                "Server stdio is no longer available".to_string(),
            )),
        }
    }

    /// Start a session over the server's stdio. The session is not
    /// initialized yet.
    pub fn start_session(&mut self, options: SessionOptions) -> Result<Session<ChildStdin>> {
        let (stdout, stdin) = self.take_stdio()?;
        Ok(Session::new(stdout, stdin, options))
    }

    /// Wait for the server to exit, killing it if it is still running after
    /// `grace`.
    pub async fn wait_with_grace(&mut self, grace: Duration) -> Result<ExitStatus> {
        let status = match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                log::warn!("Language server did not exit within {:?}, killing it", grace);
                self.kill().await?;
                self.child.wait().await?
            }
        };

        if let Some(task) = self.stderr_task.take() {
            // Stderr closes with the process; don't hang on a grandchild holding it.
            let _ = tokio::time::timeout(Duration::from_millis(100), task).await;
        }
        log::info!("Language server exited with {}", status);
        Ok(status)
    }

    pub async fn kill(&mut self) -> Result<()> {
        self.child
            .kill()
            .await
            .map_err(|e| LspError::Process(format!("Failed to kill server: {}", e)))
    }
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }
    }
}

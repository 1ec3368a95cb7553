use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use agentbridge_types::SessionError;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::process::Child;
use tokio::process::ChildStdin;
use tokio::process::ChildStdout;
use tokio::process::Command;
use tracing::debug;
use tracing::warn;

const STDERR_TAIL_LINES: usize = 40;

/// Owns one child process end to end: spawn, stdio handles, stderr
/// buffering for error messages, and unconditional termination.
///
/// Mirrors the spawn/stdio handling in `process_exec_tool_call`, generalized
/// from a one-shot tool invocation to a supervised, possibly long-lived
/// adapter child.
pub struct ChildSupervisor {
    adapter: &'static str,
    child: Child,
    stderr_tail: Arc<Mutex<Vec<String>>>,
}

impl ChildSupervisor {
    pub async fn spawn(
        adapter: &'static str,
        executable: &str,
        args: &[String],
        cwd: &Path,
        env: &HashMap<String, String>,
        want_stdin: bool,
    ) -> Result<Self, SessionError> {
        let mut command = Command::new(executable);
        command
            .args(args)
            .current_dir(cwd)
            .envs(env)
            .stdin(if want_stdin {
                std::process::Stdio::piped()
            } else {
                std::process::Stdio::null()
            })
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());

        debug!(adapter, executable, ?args, "spawning adapter child");
        let mut child = command.spawn().map_err(|source| SessionError::Spawn { adapter, source })?;

        let stderr_tail = Arc::new(Mutex::new(Vec::new()));
        if let Some(stderr) = child.stderr.take() {
            let tail = Arc::clone(&stderr_tail);
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    let mut buf = tail.lock().expect("stderr tail mutex poisoned");
                    buf.push(line);
                    if buf.len() > STDERR_TAIL_LINES {
                        buf.remove(0);
                    }
                }
            });
        }

        Ok(Self {
            adapter,
            child,
            stderr_tail,
        })
    }

    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Takes the child's stdin handle. AdapterA/B own it for the lifetime
    /// of the child via a dedicated writer task so concurrent writers
    /// (turn submission, approval responses) never interleave a line.
    pub fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.child.stdin.take()
    }

    /// Drops the child's stdin handle, signalling EOF. AdapterC has no
    /// further input to send once the turn is submitted via argv.
    pub fn close_stdin(&mut self) {
        self.child.stdin.take();
    }

    pub async fn wait(&mut self) -> Result<std::process::ExitStatus, SessionError> {
        self.child.wait().await.map_err(SessionError::Io)
    }

    /// Exit-code failure message, joining the last lines of stderr seen so
    /// far. Callers invoke this right after a nonzero exit; a short grace
    /// period lets the stderr-draining task catch up first.
    pub async fn stderr_tail_message(&self) -> String {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        self.stderr_tail
            .lock()
            .expect("stderr tail mutex poisoned")
            .join("\n")
    }

    pub fn adapter(&self) -> &'static str {
        self.adapter
    }

    /// Best-effort SIGTERM; does not wait for exit. Safe to call more than
    /// once and safe to call after the child has already exited.
    ///
    /// `Child::start_kill` sends SIGKILL on Unix, which is the wrong signal
    /// here — callers expect the child to get a chance to clean up on
    /// cancel/close. Signal the process group leader directly instead.
    pub fn terminate(&mut self) {
        let Some(pid) = self.child.id() else {
            return;
        };
        // SAFETY: `pid` is a still-live (or just-exited) child of this
        // process obtained from `Child::id`; sending it a signal it may
        // already be unable to receive is not unsafe, only a no-op.
        let result = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
        if result != 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(adapter = self.adapter, %err, "failed to terminate child");
            }
        }
    }
}

/// Writes one line (plus a trailing newline) to a child's stdin and
/// flushes. Free function so it can run inside a dedicated writer task that
/// owns the `ChildStdin` outright.
pub async fn write_line(stdin: &mut ChildStdin, line: &str) -> Result<(), SessionError> {
    stdin.write_all(line.as_bytes()).await.map_err(SessionError::Io)?;
    stdin.write_all(b"\n").await.map_err(SessionError::Io)?;
    stdin.flush().await.map_err(SessionError::Io)
}

impl Drop for ChildSupervisor {
    fn drop(&mut self) {
        self.terminate();
    }
}

use std::path::Path;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use folio_core::SandboxConfig;
use tempfile::TempDir;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::process::Child;
use tokio::process::ChildStdin;
use tokio::process::ChildStdout;
use tokio::process::Command;
use tracing::debug;
use tracing::warn;
use uuid::Uuid;

use super::error::SandboxError;

const SANDBOX_PATH: &str = "/usr/local/bin:/usr/bin:/bin";
const HOME_DIR: &str = "home";
const COMMAND_STDERR: &str = "command.err";
const SHELL_STDERR: &str = "shell.err";

/// Creates isolated execution environments, one per session.
#[async_trait]
pub trait SandboxProvider: Send + Sync {
    async fn provision(&self) -> Result<Box<dyn SandboxHandle>, SandboxError>;
}

/// A live execution environment bound to one session.
#[async_trait]
pub trait SandboxHandle: Send + Sync {
    /// Evaluates `command` and returns its stringified result.
    async fn run(&mut self, command: &str) -> Result<String, SandboxError>;

    /// Releases the environment. Calling it twice is harmless.
    async fn close(&mut self) -> Result<(), SandboxError>;
}

/// One long-lived shell per session, reading commands from stdin inside a
/// private temporary home. Working directory, variables and functions carry
/// over between commands.
#[derive(Debug, Clone)]
pub struct ProcessSandboxProvider {
    shell: String,
    shell_args: Vec<String>,
    command_timeout: Duration,
}

impl ProcessSandboxProvider {
    pub fn new(config: &SandboxConfig) -> Self {
        Self {
            shell: config.shell.clone(),
            shell_args: config.shell_args.clone(),
            command_timeout: config.command_timeout(),
        }
    }
}

#[async_trait]
impl SandboxProvider for ProcessSandboxProvider {
    async fn provision(&self) -> Result<Box<dyn SandboxHandle>, SandboxError> {
        let root = tempfile::Builder::new()
            .prefix("folio-sandbox-")
            .tempdir()
            .map_err(|err| SandboxError::Provision(err.to_string()))?;
        std::fs::create_dir(root.path().join(HOME_DIR))
            .map_err(|err| SandboxError::Provision(err.to_string()))?;
        debug!(path = %root.path().display(), "provisioned sandbox workdir");

        let mut sandbox = ProcessSandbox {
            root: Some(root),
            shell: None,
            program: self.shell.clone(),
            shell_args: self.shell_args.clone(),
            command_timeout: self.command_timeout,
            marker: format!("__folio_done_{}", Uuid::new_v4().simple()),
        };
        sandbox.ensure_shell()?;
        Ok(Box::new(sandbox))
    }
}

struct ShellProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl ShellProcess {
    /// Kills the shell together with anything it started in the background,
    /// then reaps it.
    async fn terminate(mut self) -> Option<ExitStatus> {
        #[cfg(unix)]
        {
            if let Some(pid) = self.child.id().and_then(|pid| i32::try_from(pid).ok()) {
                // SAFETY: plain signal delivery; a negative pid addresses the
                // process group the shell leads.
                unsafe {
                    libc::kill(-pid, libc::SIGKILL);
                }
            }
        }
        let _ = self.child.start_kill();
        self.child.wait().await.ok()
    }
}

struct ProcessSandbox {
    root: Option<TempDir>,
    shell: Option<ShellProcess>,
    program: String,
    shell_args: Vec<String>,
    command_timeout: Duration,
    /// Printed after every command, followed by its exit status.
    marker: String,
}

enum Exchange {
    Finished { output: String, status: i32 },
    ShellExited,
}

impl ProcessSandbox {
    fn root(&self) -> Result<PathBuf, SandboxError> {
        self.root
            .as_ref()
            .map(|root| root.path().to_path_buf())
            .ok_or_else(|| SandboxError::Evaluation("sandbox is closed".to_string()))
    }

    /// Starts the shell if none is running. A shell that exited or timed out
    /// is replaced by a fresh one in the same home.
    fn ensure_shell(&mut self) -> Result<(), SandboxError> {
        if self.shell.is_some() {
            return Ok(());
        }
        let root = self.root()?;
        let home = root.join(HOME_DIR);
        let shell_log = std::fs::File::create(root.join(SHELL_STDERR))?;

        let mut command = Command::new(&self.program);
        command
            .args(&self.shell_args)
            .current_dir(&home)
            .env_clear()
            .env("HOME", &home)
            .env("PATH", SANDBOX_PATH)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::from(shell_log))
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command
            .spawn()
            .map_err(|err| SandboxError::Provision(format!("{}: {err}", self.program)))?;
        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(SandboxError::Provision("shell pipes unavailable".to_string()));
        };
        debug!(pid = child.id(), "started sandbox shell");
        self.shell = Some(ShellProcess {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        });
        Ok(())
    }

    /// The command runs in the current shell (so `cd` and assignments
    /// stick) with stdin detached and stderr captured to a file.
    fn script(&self, line: &str, stderr_path: &Path) -> String {
        format!(
            "{{\n{line}\n}} </dev/null 2>'{stderr}'\nprintf '\\n%s %s\\n' '{marker}' \"$?\"\n",
            stderr = stderr_path.display(),
            marker = self.marker,
        )
    }

    async fn kill_shell(&mut self) -> Option<ExitStatus> {
        match self.shell.take() {
            Some(shell) => shell.terminate().await,
            None => None,
        }
    }
}

async fn exchange(
    shell: &mut ShellProcess,
    script: &str,
    marker: &str,
) -> Result<Exchange, SandboxError> {
    // A dead shell shows up as a broken pipe here or as EOF below.
    if shell.stdin.write_all(script.as_bytes()).await.is_err()
        || shell.stdin.flush().await.is_err()
    {
        return Ok(Exchange::ShellExited);
    }

    let mut output = Vec::new();
    let mut line = Vec::new();
    loop {
        line.clear();
        if shell.stdout.read_until(b'\n', &mut line).await? == 0 {
            return Ok(Exchange::ShellExited);
        }
        if let Some(rest) = line.strip_prefix(marker.as_bytes()) {
            let status = String::from_utf8_lossy(rest).trim().parse().unwrap_or(-1);
            let output = String::from_utf8_lossy(&output)
                .trim_end_matches(['\n', '\r'])
                .to_string();
            return Ok(Exchange::Finished { output, status });
        }
        output.extend_from_slice(&line);
    }
}

async fn read_trimmed(path: &Path) -> String {
    tokio::fs::read_to_string(path)
        .await
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

fn failure(stderr: String, status: Option<i32>) -> SandboxError {
    if !stderr.is_empty() {
        return SandboxError::Evaluation(stderr);
    }
    SandboxError::Evaluation(match status {
        Some(code) => format!("command exited with status {code}"),
        None => "command terminated by signal".to_string(),
    })
}

#[async_trait]
impl SandboxHandle for ProcessSandbox {
    async fn run(&mut self, line: &str) -> Result<String, SandboxError> {
        let root = self.root()?;
        self.ensure_shell()?;
        let stderr_path = root.join(COMMAND_STDERR);
        tokio::fs::write(&stderr_path, b"").await?;

        let script = self.script(line, &stderr_path);
        let timeout = self.command_timeout;
        let Some(shell) = self.shell.as_mut() else {
            return Err(SandboxError::Evaluation("sandbox shell unavailable".to_string()));
        };
        let outcome = tokio::time::timeout(timeout, exchange(shell, &script, &self.marker)).await;

        match outcome {
            Err(_) => {
                warn!(?timeout, "sandbox command timed out; restarting shell");
                self.kill_shell().await;
                Err(SandboxError::Timeout(timeout))
            }
            Ok(Err(err)) => {
                self.kill_shell().await;
                Err(err)
            }
            Ok(Ok(Exchange::Finished { output, status: 0 })) => Ok(output),
            Ok(Ok(Exchange::Finished { status, .. })) => {
                Err(failure(read_trimmed(&stderr_path).await, Some(status)))
            }
            Ok(Ok(Exchange::ShellExited)) => {
                let status = self.kill_shell().await.and_then(|status| status.code());
                debug!(?status, "sandbox shell exited");
                let mut stderr = read_trimmed(&stderr_path).await;
                if stderr.is_empty() {
                    stderr = read_trimmed(&root.join(SHELL_STDERR)).await;
                }
                Err(failure(stderr, status))
            }
        }
    }

    async fn close(&mut self) -> Result<(), SandboxError> {
        self.kill_shell().await;
        match self.root.take() {
            Some(root) => root
                .close()
                .map_err(|err| SandboxError::Close(err.to_string())),
            None => Ok(()),
        }
    }
}

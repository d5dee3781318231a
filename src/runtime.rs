//! Function runtimes.
//!
//! A function runtime takes the serialized input envelope, runs the
//! function with the envelope piped to stdin, and hands back the
//! captured stdout, stderr, and exit status. Two backends exist:
//!
//! - [`DockerRuntime`] runs the function image under a docker-compatible
//!   CLI with a tightly constrained sandbox.
//! - [`ExecRuntime`] runs a host command directly; it exercises the
//!   filter plumbing without a container runtime and serves
//!   directly-executable functions.
//!
//! Both pipe stdio the same way: the stdin write and the stdout/stderr
//! reads run concurrently, so envelopes larger than the pipe buffer do
//! not deadlock.

use crate::constants::{CONTAINER_USER, DEFAULT_NETWORK};
use crate::error::{Error, Result};
use crate::spec::StorageMount;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Captured output of one function invocation.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Captured stdout: the function's output envelope.
    pub stdout: Vec<u8>,
    /// Captured stderr, surfaced for diagnostics.
    pub stderr: Vec<u8>,
    /// Exit code of the function process. `-1` when the process was
    /// terminated without an exit code.
    pub exit_code: i32,
}

impl RunOutput {
    /// True when the function exited zero.
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// A backend that can execute one function invocation.
#[async_trait]
pub trait FunctionRuntime: Send + Sync {
    /// Returns the runtime name.
    fn name(&self) -> &str;

    /// Runs the function with `input` piped to stdin, blocking until
    /// its exit status is known.
    async fn run(&self, input: Vec<u8>) -> Result<RunOutput>;
}

// =============================================================================
// Docker Runtime
// =============================================================================

/// Runs a function image under a docker-compatible CLI.
///
/// The container is removed on exit, runs as an unprivileged user with
/// no privilege escalation, sees no network unless one is supplied, and
/// gets every mount read-only. Environment variable names are forwarded
/// on the command line; the runtime resolves their values at exec time,
/// keeping secrets out of argv.
#[derive(Debug, Clone, Default)]
pub struct DockerRuntime {
    /// Image to run.
    pub image: String,
    /// Network to attach. `None` leaves the container isolated.
    pub network: Option<String>,
    /// Read-only storage mounts, applied in order.
    pub mounts: Vec<StorageMount>,
}

impl DockerRuntime {
    /// Assembles the full container-runtime argv for this invocation.
    ///
    /// Byte-identical inputs produce byte-identical argv, environment
    /// enumeration order excepted.
    pub fn command_args(&self) -> Vec<String> {
        let network = self.network.as_deref().unwrap_or(DEFAULT_NETWORK);
        let mut args: Vec<String> = [
            "docker",
            "run",
            "--rm",
            "-i",
            "-a",
            "STDIN",
            "-a",
            "STDOUT",
            "-a",
            "STDERR",
            "--network",
            network,
            "--user",
            CONTAINER_USER,
            "--security-opt=no-new-privileges",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        for mount in &self.mounts {
            args.push("--mount".to_string());
            args.push(mount.to_flag());
        }

        // Forward names only; the runtime resolves values from the
        // child's inherited environment at exec time.
        for (name, _) in std::env::vars_os() {
            let Ok(name) = name.into_string() else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            args.push("-e".to_string());
            args.push(name);
        }

        args.push(self.image.clone());
        args
    }
}

#[async_trait]
impl FunctionRuntime for DockerRuntime {
    fn name(&self) -> &str {
        "docker"
    }

    async fn run(&self, input: Vec<u8>) -> Result<RunOutput> {
        if self.image.is_empty() {
            return Err(Error::Spec {
                reason: "container image not specified".to_string(),
            });
        }
        run_piped(&self.command_args(), input).await
    }
}

// =============================================================================
// Exec Runtime
// =============================================================================

/// Runs a host command directly with the envelope piped to stdin.
#[derive(Debug, Clone, Default)]
pub struct ExecRuntime {
    /// Command and arguments to run.
    pub argv: Vec<String>,
}

#[async_trait]
impl FunctionRuntime for ExecRuntime {
    fn name(&self) -> &str {
        "exec"
    }

    async fn run(&self, input: Vec<u8>) -> Result<RunOutput> {
        run_piped(&self.argv, input).await
    }
}

// =============================================================================
// Piped Execution
// =============================================================================

/// Spawns `argv` with piped stdio, writes `input` to stdin while
/// draining stdout and stderr, and waits for the exit status.
async fn run_piped(argv: &[String], input: Vec<u8>) -> Result<RunOutput> {
    let (program, args) = argv.split_first().ok_or_else(|| Error::Spec {
        reason: "empty function command".to_string(),
    })?;
    debug!(program = %program, args = args.len(), "running function");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdin = child.stdin.take();
    let write = async move {
        if let Some(mut stdin) = stdin {
            stdin.write_all(&input).await?;
            stdin.shutdown().await?;
        }
        Ok::<(), std::io::Error>(())
    };

    // The write and the output reads must be concurrent: neither side
    // can buffer an arbitrarily large envelope.
    let (write_result, output) = tokio::join!(write, child.wait_with_output());
    let output = output?;
    if let Err(e) = write_result {
        // A function that exits without consuming its input closes the
        // pipe early; its exit status is the interesting part.
        if e.kind() != std::io::ErrorKind::BrokenPipe {
            return Err(e.into());
        }
    }

    let exit_code = output.status.code().unwrap_or(-1);
    debug!(exit_code, "function exited");
    Ok(RunOutput {
        stdout: output.stdout,
        stderr: output.stderr,
        exit_code,
    })
}

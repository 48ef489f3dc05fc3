//! Synchronous external tool execution.
//!
//! The [`ProcessRunner`] trait is the seam between the build pipeline and the
//! operating system. Tests substitute scripted runners that return chosen exit
//! statuses and fake tool output without spawning processes.

use std::process::{Command, ExitStatus, Stdio};

use anyhow::{Context, Result};
use tracing::{debug, error, instrument, warn};

use crate::core::commands::ToolInvocation;
use crate::core::types::INTERRUPTED_EXIT;

/// Runs one external tool to completion and reports its exit status.
pub trait ProcessRunner {
    /// Run `invocation` and block until it exits.
    ///
    /// Returns `Err` only when the tool cannot be started. A failed wait is
    /// reported as [`INTERRUPTED_EXIT`].
    fn run(&self, invocation: &ToolInvocation) -> Result<i32>;
}

/// Runner that spawns real OS processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessRunner {
    verbose: bool,
}

impl SystemProcessRunner {
    /// When `verbose` is set, each command line is echoed to stdout and the
    /// child inherits stdin, stdout, and stderr. Otherwise the child's
    /// streams are discarded.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProcessRunner for SystemProcessRunner {
    #[instrument(skip_all, fields(program = %invocation.program, workdir = %invocation.workdir.display()))]
    fn run(&self, invocation: &ToolInvocation) -> Result<i32> {
        if self.verbose {
            println!("{invocation}");
        }

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args).current_dir(&invocation.workdir);
        if self.verbose {
            cmd.stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit());
        } else {
            cmd.stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null());
        }

        debug!(args = ?invocation.args, "spawning tool");
        let mut child = match cmd.spawn() {
            Ok(c) => c,
            Err(e) => {
                error!(err = %e, "failed to spawn tool");
                return Err(e).with_context(|| format!("spawn {}", invocation.program));
            }
        };

        let code = match child.wait() {
            Ok(status) => exit_code(status),
            Err(e) => {
                warn!(err = %e, "wait for tool interrupted");
                INTERRUPTED_EXIT
            }
        };
        debug!(exit_code = code, "tool finished");
        Ok(code)
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    match status.code() {
        Some(code) => code,
        None => {
            warn!(%status, "tool terminated without an exit code");
            INTERRUPTED_EXIT
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(workdir: &std::path::Path, script: &str) -> ToolInvocation {
        ToolInvocation {
            workdir: workdir.to_path_buf(),
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
        }
    }

    #[test]
    fn reports_tool_exit_status() {
        let temp = tempfile::tempdir().expect("tempdir");
        let runner = SystemProcessRunner::new(false);
        assert_eq!(runner.run(&sh(temp.path(), "exit 0")).expect("run"), 0);
        assert_eq!(runner.run(&sh(temp.path(), "exit 3")).expect("run"), 3);
    }

    #[test]
    fn runs_in_requested_workdir() {
        let temp = tempfile::tempdir().expect("tempdir");
        let runner = SystemProcessRunner::new(false);
        let code = runner
            .run(&sh(temp.path(), "echo hi > marker.txt"))
            .expect("run");
        assert_eq!(code, 0);
        assert!(temp.path().join("marker.txt").exists());
    }

    #[test]
    fn signal_termination_maps_to_sentinel() {
        let temp = tempfile::tempdir().expect("tempdir");
        let runner = SystemProcessRunner::new(false);
        let code = runner.run(&sh(temp.path(), "kill -9 $$")).expect("run");
        assert_eq!(code, INTERRUPTED_EXIT);
    }

    #[test]
    fn missing_program_is_a_launch_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let runner = SystemProcessRunner::new(false);
        let invocation = ToolInvocation {
            workdir: temp.path().to_path_buf(),
            program: "agentgen-no-such-tool".to_string(),
            args: Vec::new(),
        };
        let err = runner.run(&invocation).unwrap_err();
        assert!(err.to_string().contains("spawn agentgen-no-such-tool"));
    }
}

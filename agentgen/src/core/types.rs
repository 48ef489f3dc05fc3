//! Shared types for the agent build pipeline.
//!
//! These types define the contract between the orchestrator and its callers:
//! what a build is asked to do, which stage it reached, and how it ended.

use std::fmt;
use std::path::PathBuf;

/// Exit status reported when waiting on a tool failed or the tool produced no
/// exit code (for example, it was killed by a signal). Never returned by a
/// tool that exits normally.
pub const INTERRUPTED_EXIT: i32 = -1;

/// What to build and where. Immutable for the duration of one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Directory holding the generated sources; also receives intermediate output.
    pub output_dir: PathBuf,
    /// Stem of every generated file name and of the final archive.
    pub agent_name: String,
}

impl BuildRequest {
    pub fn new(output_dir: impl Into<PathBuf>, agent_name: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            agent_name: agent_name.into(),
        }
    }
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    Prepare,
    Compile,
    Weave,
    VerifyWeave,
    StageWorkspace,
    AssembleMetadata,
    RelocateClasses,
    AttachManifest,
    Archive,
    Cleanup,
}

impl BuildStep {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildStep::Prepare => "prepare",
            BuildStep::Compile => "compile",
            BuildStep::Weave => "weave",
            BuildStep::VerifyWeave => "verify_weave",
            BuildStep::StageWorkspace => "stage_workspace",
            BuildStep::AssembleMetadata => "assemble_metadata",
            BuildStep::RelocateClasses => "relocate_classes",
            BuildStep::AttachManifest => "attach_manifest",
            BuildStep::Archive => "archive",
            BuildStep::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successfully produced agent archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentArchive {
    /// Archive file name, `<agent_name>.jar`.
    pub name: String,
    /// Where the archiver was asked to write it.
    pub path: PathBuf,
}

/// Why a build stopped.
///
/// The `Display` text is the diagnostic printed for the user.
#[derive(Debug, thiserror::Error)]
pub enum BuildFailure {
    /// The request itself is unusable (bad agent name, missing output directory).
    #[error("invalid build request: {0}")]
    InvalidRequest(String),

    /// Another build holds the output directory.
    #[error(
        "output directory is locked by another build: {} (remove it if no build is running)",
        .path.display()
    )]
    Locked { path: PathBuf },

    /// A tool whose exit status is its success signal exited non-zero.
    #[error("{} (exit status {code})", tool_failure_text(.step))]
    ToolInvocation { step: BuildStep, code: i32 },

    /// The wait for a tool did not yield an exit status.
    #[error("{} (wait for tool was interrupted)", tool_failure_text(.step))]
    InterruptedWait { step: BuildStep },

    /// A tool could not be started at all.
    #[error("{}: {detail}", tool_failure_text(.step))]
    Launch { step: BuildStep, detail: String },

    /// A step's expected output is absent.
    #[error("{}: {} not found", tool_failure_text(.step), .path.display())]
    ArtifactMissing { step: BuildStep, path: PathBuf },

    /// Directory creation, copy, move, or delete failed.
    #[error("{message}: {detail}")]
    Filesystem {
        step: BuildStep,
        message: &'static str,
        detail: String,
    },
}

impl BuildFailure {
    /// Wrap a filesystem error with the stage diagnostic.
    pub fn filesystem(step: BuildStep, message: &'static str, err: &anyhow::Error) -> Self {
        BuildFailure::Filesystem {
            step,
            message,
            detail: format!("{err:#}"),
        }
    }

    /// Stage at which the build stopped.
    pub fn step(&self) -> BuildStep {
        match self {
            BuildFailure::InvalidRequest(_) | BuildFailure::Locked { .. } => BuildStep::Prepare,
            BuildFailure::ToolInvocation { step, .. }
            | BuildFailure::InterruptedWait { step }
            | BuildFailure::Launch { step, .. }
            | BuildFailure::ArtifactMissing { step, .. }
            | BuildFailure::Filesystem { step, .. } => *step,
        }
    }
}

/// Outcome of one build: the archive, or the reason the pipeline stopped.
pub type BuildResult = std::result::Result<AgentArchive, BuildFailure>;

fn tool_failure_text(step: &BuildStep) -> &'static str {
    match step {
        BuildStep::Compile => "(javac) Failed to compile agent.",
        BuildStep::Weave | BuildStep::VerifyWeave => "(ajc) Failed to produce aop-ajc.xml",
        BuildStep::Archive => "(jar) Failed to produce final jar",
        _ => "tool failed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_failure_keeps_javac_diagnostic() {
        let failure = BuildFailure::ToolInvocation {
            step: BuildStep::Compile,
            code: 1,
        };
        assert_eq!(
            failure.to_string(),
            "(javac) Failed to compile agent. (exit status 1)"
        );
        assert_eq!(failure.step(), BuildStep::Compile);
    }

    #[test]
    fn missing_descriptor_names_the_path() {
        let failure = BuildFailure::ArtifactMissing {
            step: BuildStep::VerifyWeave,
            path: PathBuf::from("out/META-INF/aop-ajc.xml"),
        };
        let text = failure.to_string();
        assert!(text.starts_with("(ajc) Failed to produce aop-ajc.xml"));
        assert!(text.contains("out/META-INF/aop-ajc.xml"));
    }

    #[test]
    fn filesystem_failure_carries_error_chain() {
        let err = anyhow::anyhow!("permission denied").context("create META-INF");
        let failure = BuildFailure::filesystem(
            BuildStep::AssembleMetadata,
            "(mkdir) Failed to create META-INF",
            &err,
        );
        assert_eq!(
            failure.to_string(),
            "(mkdir) Failed to create META-INF: create META-INF: permission denied"
        );
    }

    #[test]
    fn request_failures_happen_before_any_stage() {
        let failure = BuildFailure::Locked {
            path: PathBuf::from("out/.agentgen.lock"),
        };
        assert_eq!(failure.step(), BuildStep::Prepare);
    }
}

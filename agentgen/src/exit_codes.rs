//! Stable exit codes for the `agentgen` CLI.

use crate::core::types::BuildFailure;

/// The agent jar was produced.
pub const OK: i32 = 0;
/// Invalid arguments, config, or build request.
pub const INVALID: i32 = 1;
/// An external tool failed, could not start, or was interrupted.
pub const TOOL_FAILED: i32 = 2;
/// The weaver did not produce its descriptor.
pub const ARTIFACT_MISSING: i32 = 3;
/// A staging filesystem operation failed.
pub const FILESYSTEM: i32 = 4;
/// Another build holds the output directory lock.
pub const LOCKED: i32 = 5;

/// Exit code reported for a failed build.
pub fn for_failure(failure: &BuildFailure) -> i32 {
    match failure {
        BuildFailure::InvalidRequest(_) => INVALID,
        BuildFailure::Locked { .. } => LOCKED,
        BuildFailure::ToolInvocation { .. }
        | BuildFailure::InterruptedWait { .. }
        | BuildFailure::Launch { .. } => TOOL_FAILED,
        BuildFailure::ArtifactMissing { .. } => ARTIFACT_MISSING,
        BuildFailure::Filesystem { .. } => FILESYSTEM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::BuildStep;

    #[test]
    fn every_failure_kind_is_distinguishable_from_success() {
        let failures = [
            BuildFailure::InvalidRequest("bad".to_string()),
            BuildFailure::Locked {
                path: "out/.agentgen.lock".into(),
            },
            BuildFailure::ToolInvocation {
                step: BuildStep::Compile,
                code: 1,
            },
            BuildFailure::ArtifactMissing {
                step: BuildStep::VerifyWeave,
                path: "out/META-INF/aop-ajc.xml".into(),
            },
            BuildFailure::Filesystem {
                step: BuildStep::RelocateClasses,
                message: "(mv) Failed to relocate compiled classes",
                detail: "gone".to_string(),
            },
        ];
        let codes: Vec<i32> = failures.iter().map(for_failure).collect();
        assert_eq!(codes, vec![INVALID, LOCKED, TOOL_FAILED, ARTIFACT_MISSING, FILESYSTEM]);
    }
}

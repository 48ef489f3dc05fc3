//! Orchestration for a single agent build.
//!
//! Stages run strictly in order and stop at the first failure:
//! compile, weave, verify the weave descriptor, stage a workspace, copy in
//! metadata, relocate classes, attach the manifest, archive. Once the staging
//! workspace exists it is deleted on every exit path.

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, instrument, warn};

use crate::core::commands::{
    Toolchain, ToolInvocation, archive_invocation, compile_invocation, weave_invocation,
};
use crate::core::naming::{
    ArtifactNames, CLASSES_DIR, DESCRIPTOR_FILE, MANIFEST_FILE, META_INF_DIR, descriptor_path,
};
use crate::core::types::{
    AgentArchive, BuildFailure, BuildRequest, BuildResult, BuildStep, INTERRUPTED_EXIT,
};
use crate::io::fs_ops::{copy_file, ensure_dir, move_dir, remove_file_if_exists};
use crate::io::lock::{BuildLock, lock_path};
use crate::io::process::ProcessRunner;
use crate::io::staging::StagingWorkspace;

/// Settings shared by every build in one invocation.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub toolchain: Toolchain,
    /// Directory the archiver runs in, and where `<name>.jar` lands.
    pub archive_dir: PathBuf,
}

/// Build `<agent_name>.jar` from the generated sources in `request.output_dir`.
///
/// Every failure is logged with its diagnostic and returned; no stage after
/// the failing one runs.
#[instrument(skip_all, fields(agent = %request.agent_name, output_dir = %request.output_dir.display()))]
pub fn build_agent<R: ProcessRunner>(
    request: &BuildRequest,
    config: &BuildConfig,
    runner: &R,
) -> BuildResult {
    info!("agent build started");
    let result = run_pipeline(request, config, runner);
    match &result {
        Ok(archive) => info!(archive = %archive.path.display(), "{} is generated.", archive.name),
        Err(failure) => error!(step = %failure.step(), "{failure}"),
    }
    result
}

fn run_pipeline<R: ProcessRunner>(
    request: &BuildRequest,
    config: &BuildConfig,
    runner: &R,
) -> BuildResult {
    let names = ArtifactNames::new(&request.agent_name)
        .map_err(|e| BuildFailure::InvalidRequest(format!("{e:#}")))?;
    if !request.output_dir.is_dir() {
        return Err(BuildFailure::InvalidRequest(format!(
            "output directory {} does not exist",
            request.output_dir.display()
        )));
    }
    let output_dir = std::path::absolute(&request.output_dir).map_err(|e| {
        BuildFailure::InvalidRequest(format!(
            "resolve output directory {}: {e}",
            request.output_dir.display()
        ))
    })?;

    let _lock = BuildLock::acquire(&output_dir)
        .map_err(|e| {
            BuildFailure::filesystem(
                BuildStep::Prepare,
                "(lock) Failed to lock output directory",
                &e,
            )
        })?
        .ok_or_else(|| BuildFailure::Locked {
            path: lock_path(&output_dir),
        })?;

    let compile = compile_invocation(&config.toolchain, &names, &output_dir);
    let code = run_tool(runner, BuildStep::Compile, &compile)?;
    require_success(BuildStep::Compile, code)?;

    // The weaver exits non-zero in some non-fatal cases, so its exit status is
    // not trusted. The descriptor's existence decides whether weaving worked,
    // which only holds if no earlier build's descriptor is left behind.
    let descriptor = descriptor_path(&output_dir);
    remove_file_if_exists(&descriptor).map_err(|e| {
        BuildFailure::filesystem(
            BuildStep::Weave,
            "(rm) Failed to remove stale aop-ajc.xml",
            &e,
        )
    })?;
    let weave = weave_invocation(&config.toolchain, &names, &output_dir);
    let code = run_tool(runner, BuildStep::Weave, &weave)?;
    if code != 0 {
        warn!(exit_code = code, "weaver exited non-zero, checking for descriptor");
    }
    if !descriptor.is_file() {
        return Err(BuildFailure::ArtifactMissing {
            step: BuildStep::VerifyWeave,
            path: descriptor,
        });
    }
    debug!(descriptor = %descriptor.display(), "weave descriptor present");

    let workspace = StagingWorkspace::create(&output_dir).map_err(|e| {
        BuildFailure::filesystem(
            BuildStep::StageWorkspace,
            "(mktemp) Failed to create staging workspace",
            &e,
        )
    })?;
    info!(workspace = %workspace.path().display(), "staging workspace created");

    let staged = stage_and_archive(
        workspace.path(),
        &output_dir,
        &descriptor,
        &names,
        config,
        runner,
    );
    let cleanup = workspace.close();
    match (staged, cleanup) {
        (Ok(archive), Ok(())) => Ok(archive),
        (Ok(_), Err(e)) => Err(BuildFailure::filesystem(
            BuildStep::Cleanup,
            "(rm) Failed to delete staging workspace",
            &e,
        )),
        (Err(failure), Ok(())) => Err(failure),
        (Err(failure), Err(e)) => {
            warn!(err = %format!("{e:#}"), "staging workspace cleanup also failed");
            Err(failure)
        }
    }
}

/// Populate the workspace and run the archiver over it.
fn stage_and_archive<R: ProcessRunner>(
    workspace: &Path,
    output_dir: &Path,
    descriptor: &Path,
    names: &ArtifactNames,
    config: &BuildConfig,
    runner: &R,
) -> BuildResult {
    let meta_inf = workspace.join(META_INF_DIR);
    ensure_dir(&meta_inf).map_err(|e| {
        BuildFailure::filesystem(
            BuildStep::AssembleMetadata,
            "(mkdir) Failed to create META-INF",
            &e,
        )
    })?;
    copy_file(descriptor, &meta_inf.join(DESCRIPTOR_FILE)).map_err(|e| {
        BuildFailure::filesystem(
            BuildStep::AssembleMetadata,
            "(cp) Failed to copy aop-ajc.xml",
            &e,
        )
    })?;

    // Ownership of the compiled classes moves to the workspace; they are
    // deleted with it if a later stage fails.
    move_dir(&output_dir.join(CLASSES_DIR), &workspace.join(CLASSES_DIR)).map_err(|e| {
        BuildFailure::filesystem(
            BuildStep::RelocateClasses,
            "(mv) Failed to relocate compiled classes",
            &e,
        )
    })?;

    let manifest = meta_inf.join(MANIFEST_FILE);
    copy_file(&config.toolchain.manifest, &manifest).map_err(|e| {
        BuildFailure::filesystem(
            BuildStep::AttachManifest,
            "(cp) Failed to copy MANIFEST.MF",
            &e,
        )
    })?;

    let archive = archive_invocation(
        &config.toolchain,
        names,
        &config.archive_dir,
        &manifest,
        workspace,
    );
    let code = run_tool(runner, BuildStep::Archive, &archive)?;
    require_success(BuildStep::Archive, code)?;

    Ok(AgentArchive {
        name: names.archive(),
        path: config.archive_dir.join(names.archive()),
    })
}

fn run_tool<R: ProcessRunner>(
    runner: &R,
    step: BuildStep,
    invocation: &ToolInvocation,
) -> Result<i32, BuildFailure> {
    info!(%step, program = %invocation.program, "running tool");
    runner
        .run(invocation)
        .map_err(|e| BuildFailure::Launch {
            step,
            detail: format!("{e:#}"),
        })
}

fn require_success(step: BuildStep, code: i32) -> Result<(), BuildFailure> {
    match code {
        0 => Ok(()),
        INTERRUPTED_EXIT => Err(BuildFailure::InterruptedWait { step }),
        code => Err(BuildFailure::ToolInvocation { step, code }),
    }
}

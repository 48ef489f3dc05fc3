//! Command lines for the external tools.
//!
//! Pure functions: each builds a [`ToolInvocation`] from the resolved
//! [`Toolchain`] and the agent's [`ArtifactNames`]. Nothing here spawns a
//! process.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::naming::ArtifactNames;

/// Separator between classpath entries on the host platform.
pub const CLASSPATH_SEPARATOR: &str = if cfg!(windows) { ";" } else { ":" };

/// Entry point of the aspect weaver inside `aspectjtools.jar`.
pub const WEAVER_MAIN_CLASS: &str = "org.aspectj.tools.ajc.Main";

/// Fully resolved tool programs and library files.
///
/// Library paths are absolute so that invocations behave the same regardless
/// of the working directory each tool runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub javac: String,
    pub java: String,
    pub jar: String,
    /// Source compatibility passed to the weaver as `-<level>`.
    pub source_level: String,
    pub aspectj_tools_jar: PathBuf,
    pub aspectj_rt_jar: PathBuf,
    pub rt_jar: PathBuf,
    pub base_aspect: PathBuf,
    pub manifest: PathBuf,
}

/// A single external tool call: program, arguments, and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub workdir: PathBuf,
    pub program: String,
    pub args: Vec<String>,
}

impl ToolInvocation {
    /// Program followed by its arguments.
    pub fn command_line(&self) -> Vec<String> {
        let mut line = Vec::with_capacity(self.args.len() + 1);
        line.push(self.program.clone());
        line.extend(self.args.iter().cloned());
        line
    }
}

impl fmt::Display for ToolInvocation {
    /// `<workdir>: [program, arg, ...]`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: [{}]",
            self.workdir.display(),
            self.command_line().join(", ")
        )
    }
}

/// `javac -d . -cp <aspectjrt>:<rt> <name>RuntimeMonitor.java`, run in `output_dir`.
pub fn compile_invocation(
    toolchain: &Toolchain,
    names: &ArtifactNames,
    output_dir: &Path,
) -> ToolInvocation {
    ToolInvocation {
        workdir: output_dir.to_path_buf(),
        program: toolchain.javac.clone(),
        args: vec![
            "-d".to_string(),
            ".".to_string(),
            "-cp".to_string(),
            classpath(&[
                path_arg(&toolchain.aspectj_rt_jar),
                path_arg(&toolchain.rt_jar),
            ]),
            names.monitor_source(),
        ],
    }
}

/// Weaver run through `java`, writing woven classes and the `-outxml`
/// descriptor into `output_dir`.
pub fn weave_invocation(
    toolchain: &Toolchain,
    names: &ArtifactNames,
    output_dir: &Path,
) -> ToolInvocation {
    ToolInvocation {
        workdir: output_dir.to_path_buf(),
        program: toolchain.java.clone(),
        args: vec![
            "-cp".to_string(),
            classpath(&[
                path_arg(&toolchain.aspectj_tools_jar),
                path_arg(&toolchain.rt_jar),
                path_arg(&toolchain.aspectj_rt_jar),
                ".".to_string(),
            ]),
            WEAVER_MAIN_CLASS.to_string(),
            format!("-{}", toolchain.source_level),
            "-d".to_string(),
            path_arg(output_dir),
            "-outxml".to_string(),
            path_arg(&toolchain.base_aspect),
            names.aspect_source(),
        ],
    }
}

/// `jar cmf <manifest> <name>.jar -C <content_root> .`, run in `archive_dir`.
pub fn archive_invocation(
    toolchain: &Toolchain,
    names: &ArtifactNames,
    archive_dir: &Path,
    manifest: &Path,
    content_root: &Path,
) -> ToolInvocation {
    ToolInvocation {
        workdir: archive_dir.to_path_buf(),
        program: toolchain.jar.clone(),
        args: vec![
            "cmf".to_string(),
            path_arg(manifest),
            names.archive(),
            "-C".to_string(),
            path_arg(content_root),
            ".".to_string(),
        ],
    }
}

fn classpath(entries: &[String]) -> String {
    entries.join(CLASSPATH_SEPARATOR)
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

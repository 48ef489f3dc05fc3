//! Test-only helpers: a scripted process runner and a build fixture.
//!
//! [`ScriptedProcessRunner`] replays one [`ScriptedTool`] per invocation, in
//! order, and can fake each tool's filesystem output. [`BuildFixture`] lays
//! out an output directory, a lib directory, and an archive directory in a
//! temp dir.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::build::BuildConfig;
use crate::core::commands::{ToolInvocation, Toolchain};
use crate::core::naming::{CLASSES_DIR, DESCRIPTOR_FILE, META_INF_DIR, WORKSPACE_PREFIX};
use crate::core::types::{BuildRequest, INTERRUPTED_EXIT};
use crate::io::process::ProcessRunner;

/// What a scripted tool does to the filesystem before "exiting".
#[derive(Debug, Clone)]
pub enum ScriptedEffect {
    /// Touch nothing.
    None,
    /// Write files relative to the invocation's working directory.
    WriteFiles(Vec<(String, Vec<u8>)>),
    /// Snapshot the `-C <root>` content root and, on exit 0, create the archive file.
    Archive,
}

/// One scripted tool run.
#[derive(Debug, Clone)]
pub struct ScriptedTool {
    pub exit_code: i32,
    pub effect: ScriptedEffect,
    /// Fail to launch instead of running.
    pub launch_error: bool,
}

impl ScriptedTool {
    pub fn exit(exit_code: i32) -> Self {
        Self {
            exit_code,
            effect: ScriptedEffect::None,
            launch_error: false,
        }
    }

    pub fn interrupted() -> Self {
        Self::exit(INTERRUPTED_EXIT)
    }

    pub fn launch_failure() -> Self {
        Self {
            launch_error: true,
            ..Self::exit(0)
        }
    }

    /// Compiler that writes `mop/<name>` class files.
    pub fn compiler(exit_code: i32, classes: &[(&str, &[u8])]) -> Self {
        let files = classes
            .iter()
            .map(|(name, bytes)| (format!("{CLASSES_DIR}/{name}"), bytes.to_vec()))
            .collect();
        Self {
            effect: ScriptedEffect::WriteFiles(files),
            ..Self::exit(exit_code)
        }
    }

    /// Weaver that writes `META-INF/aop-ajc.xml` when `descriptor` is given.
    pub fn weaver(exit_code: i32, descriptor: Option<&[u8]>) -> Self {
        let effect = match descriptor {
            Some(bytes) => ScriptedEffect::WriteFiles(vec![(
                format!("{META_INF_DIR}/{DESCRIPTOR_FILE}"),
                bytes.to_vec(),
            )]),
            None => ScriptedEffect::None,
        };
        Self {
            effect,
            ..Self::exit(exit_code)
        }
    }

    pub fn archiver(exit_code: i32) -> Self {
        Self {
            effect: ScriptedEffect::Archive,
            ..Self::exit(exit_code)
        }
    }
}

/// Content root captured by a scripted archiver: relative path to file bytes.
pub type ArchiveSnapshot = BTreeMap<String, Vec<u8>>;

/// Process runner that replays scripted tools and records every invocation.
#[derive(Debug, Default)]
pub struct ScriptedProcessRunner {
    script: RefCell<VecDeque<ScriptedTool>>,
    calls: RefCell<Vec<ToolInvocation>>,
    archives: RefCell<Vec<ArchiveSnapshot>>,
}

impl ScriptedProcessRunner {
    pub fn new(script: Vec<ScriptedTool>) -> Self {
        Self {
            script: RefCell::new(script.into()),
            ..Self::default()
        }
    }

    /// Invocations received so far, in order.
    pub fn calls(&self) -> Vec<ToolInvocation> {
        self.calls.borrow().clone()
    }

    /// Content roots seen by scripted archivers.
    pub fn archives(&self) -> Vec<ArchiveSnapshot> {
        self.archives.borrow().clone()
    }

    pub fn remaining(&self) -> usize {
        self.script.borrow().len()
    }
}

impl ProcessRunner for ScriptedProcessRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<i32> {
        self.calls.borrow_mut().push(invocation.clone());
        let tool = self
            .script
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted tool left for {}", invocation.program))?;
        if tool.launch_error {
            return Err(anyhow!("spawn {}: scripted launch failure", invocation.program));
        }

        match &tool.effect {
            ScriptedEffect::None => {}
            ScriptedEffect::WriteFiles(files) => {
                for (rel, bytes) in files {
                    let path = invocation.workdir.join(rel);
                    if let Some(parent) = path.parent() {
                        fs::create_dir_all(parent)
                            .with_context(|| format!("create {}", parent.display()))?;
                    }
                    fs::write(&path, bytes).with_context(|| format!("write {}", path.display()))?;
                }
            }
            ScriptedEffect::Archive => {
                let root = content_root(&invocation.args)?;
                self.archives.borrow_mut().push(snapshot_tree(&root)?);
                if tool.exit_code == 0 {
                    let name = invocation
                        .args
                        .get(2)
                        .ok_or_else(|| anyhow!("archive name missing"))?;
                    let path = invocation.workdir.join(name);
                    fs::write(&path, b"").with_context(|| format!("write {}", path.display()))?;
                }
            }
        }
        Ok(tool.exit_code)
    }
}

fn content_root(args: &[String]) -> Result<PathBuf> {
    let idx = args
        .iter()
        .position(|arg| arg == "-C")
        .ok_or_else(|| anyhow!("archive args missing -C: {args:?}"))?;
    args.get(idx + 1)
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("archive args missing content root: {args:?}"))
}

/// Read every file under `root`, keyed by `/`-separated relative path.
pub fn snapshot_tree(root: &Path) -> Result<ArchiveSnapshot> {
    let mut files = BTreeMap::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .with_context(|| format!("relativize {}", entry.path().display()))?;
        let key = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let bytes =
            fs::read(entry.path()).with_context(|| format!("read {}", entry.path().display()))?;
        files.insert(key, bytes);
    }
    Ok(files)
}

pub const MANIFEST_TEMPLATE: &[u8] = b"Manifest-Version: 1.0\nPremain-Class: org.aspectj.weaver.loadtime.Agent\n";

/// Temp-dir layout for a build: `out/` with generated sources, `lib/` with
/// the manifest template and base aspect, `dist/` for the archive.
pub struct BuildFixture {
    temp: TempDir,
    pub agent_name: String,
}

impl BuildFixture {
    pub fn new(agent_name: &str) -> Result<Self> {
        let temp = tempfile::tempdir().context("tempdir")?;
        let fixture = Self {
            temp,
            agent_name: agent_name.to_string(),
        };
        for dir in [fixture.output_dir(), fixture.lib_dir(), fixture.archive_dir()] {
            fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        }
        fs::write(
            fixture
                .output_dir()
                .join(format!("{agent_name}RuntimeMonitor.java")),
            b"public class RuntimeMonitor {}\n",
        )
        .context("write monitor source")?;
        fs::write(
            fixture
                .output_dir()
                .join(format!("{agent_name}MonitorAspect.aj")),
            b"public aspect MonitorAspect {}\n",
        )
        .context("write aspect source")?;
        fs::write(fixture.lib_dir().join("MANIFEST.MF"), MANIFEST_TEMPLATE)
            .context("write manifest")?;
        fs::write(
            fixture.lib_dir().join("BaseAspect.aj"),
            b"public abstract aspect BaseAspect {}\n",
        )
        .context("write base aspect")?;
        Ok(fixture)
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn output_dir(&self) -> PathBuf {
        self.temp.path().join("out")
    }

    pub fn lib_dir(&self) -> PathBuf {
        self.temp.path().join("lib")
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.temp.path().join("dist")
    }

    pub fn archive_path(&self) -> PathBuf {
        self.archive_dir().join(format!("{}.jar", self.agent_name))
    }

    pub fn request(&self) -> BuildRequest {
        BuildRequest::new(self.output_dir(), self.agent_name.clone())
    }

    /// Toolchain with plain program names and library files under `lib/`.
    pub fn toolchain(&self) -> Toolchain {
        let lib = self.lib_dir();
        Toolchain {
            javac: "javac".to_string(),
            java: "java".to_string(),
            jar: "jar".to_string(),
            source_level: "1.6".to_string(),
            aspectj_tools_jar: lib.join("aspectjtools.jar"),
            aspectj_rt_jar: lib.join("aspectjrt.jar"),
            rt_jar: lib.join("rt.jar"),
            base_aspect: lib.join("BaseAspect.aj"),
            manifest: lib.join("MANIFEST.MF"),
        }
    }

    pub fn config(&self) -> BuildConfig {
        BuildConfig {
            toolchain: self.toolchain(),
            archive_dir: self.archive_dir(),
        }
    }

    /// Staging workspaces currently present in the output directory.
    pub fn workspaces(&self) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        for entry in fs::read_dir(self.output_dir()).context("read output dir")? {
            let entry = entry.context("read entry")?;
            if entry
                .file_name()
                .to_string_lossy()
                .starts_with(WORKSPACE_PREFIX)
            {
                found.push(entry.path());
            }
        }
        Ok(found)
    }
}

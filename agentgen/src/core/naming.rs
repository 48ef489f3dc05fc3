//! File and directory names shared by every pipeline stage.
//!
//! All agent-specific names derive from [`ArtifactNames`] so the compile,
//! weave, and archive steps can never disagree about their inputs.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

/// Directory holding compiled monitor classes, produced by the compile step.
pub const CLASSES_DIR: &str = "mop";
/// Metadata directory, both in the weaver output and in the archive root.
pub const META_INF_DIR: &str = "META-INF";
/// Weave descriptor written by the weaver's `-outxml` flag.
pub const DESCRIPTOR_FILE: &str = "aop-ajc.xml";
/// Archive manifest name inside `META-INF/`.
pub const MANIFEST_FILE: &str = "MANIFEST.MF";
/// Prefix of the temporary staging workspace created under the output directory.
pub const WORKSPACE_PREFIX: &str = "agent-jar";

/// Names of the generated files for one agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNames {
    agent_name: String,
}

impl ArtifactNames {
    /// Validate `agent_name` and derive the artifact names from it.
    ///
    /// The name is used verbatim as a file stem, so it must be non-empty and
    /// must not contain path separators.
    pub fn new(agent_name: &str) -> Result<Self> {
        if agent_name.trim().is_empty() {
            bail!("agent name must not be empty");
        }
        if agent_name == "." || agent_name == ".." {
            bail!("agent name must not be `{agent_name}`");
        }
        if agent_name.contains(['/', '\\']) {
            bail!("agent name must not contain path separators: {agent_name}");
        }
        Ok(Self {
            agent_name: agent_name.to_string(),
        })
    }

    /// `<name>RuntimeMonitor.java`, the input of the compile step.
    pub fn monitor_source(&self) -> String {
        format!("{}RuntimeMonitor.java", self.agent_name)
    }

    /// `<name>MonitorAspect.aj`, the input of the weave step.
    pub fn aspect_source(&self) -> String {
        format!("{}MonitorAspect.aj", self.agent_name)
    }

    /// `<name>.jar`, the archive produced by the final step.
    pub fn archive(&self) -> String {
        format!("{}.jar", self.agent_name)
    }
}

/// Location of the weave descriptor the weaver writes under `output_dir`.
pub fn descriptor_path(output_dir: &Path) -> PathBuf {
    output_dir.join(META_INF_DIR).join(DESCRIPTOR_FILE)
}

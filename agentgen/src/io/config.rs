//! Toolchain configuration stored in `agentgen.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::commands::Toolchain;

/// Config file looked up in the current directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "agentgen.toml";

/// Toolchain configuration (TOML).
///
/// Library file names are resolved against `lib_dir`. Missing fields default
/// to the standard AspectJ layout under `./lib`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Directory holding the support jars, base aspect, and manifest template.
    pub lib_dir: PathBuf,

    /// Java compiler program.
    pub javac: String,
    /// JVM launcher used to run the weaver.
    pub java: String,
    /// Archiver program.
    pub jar: String,

    /// Weaver source compatibility, passed as `-<source_level>`.
    pub source_level: String,

    pub aspectj_tools_jar: String,
    pub aspectj_rt_jar: String,
    pub rt_jar: String,
    pub base_aspect: String,
    pub manifest: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            lib_dir: PathBuf::from("lib"),
            javac: "javac".to_string(),
            java: "java".to_string(),
            jar: "jar".to_string(),
            source_level: "1.6".to_string(),
            aspectj_tools_jar: "aspectjtools.jar".to_string(),
            aspectj_rt_jar: "aspectjrt.jar".to_string(),
            rt_jar: "rt.jar".to_string(),
            base_aspect: "BaseAspect.aj".to_string(),
            manifest: "MANIFEST.MF".to_string(),
        }
    }
}

impl ToolchainConfig {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("javac", &self.javac),
            ("java", &self.java),
            ("jar", &self.jar),
        ] {
            if value.trim().is_empty() {
                return Err(anyhow!("{field} must be a non-empty program"));
            }
        }
        if self.source_level.trim().is_empty() || self.source_level.starts_with('-') {
            return Err(anyhow!(
                "source_level must be a bare version such as \"1.6\", got {:?}",
                self.source_level
            ));
        }
        for (field, value) in [
            ("aspectj_tools_jar", &self.aspectj_tools_jar),
            ("aspectj_rt_jar", &self.aspectj_rt_jar),
            ("rt_jar", &self.rt_jar),
            ("base_aspect", &self.base_aspect),
            ("manifest", &self.manifest),
        ] {
            if value.trim().is_empty() {
                return Err(anyhow!("{field} must be a non-empty file name"));
            }
        }
        Ok(())
    }

    /// Resolve library files to absolute paths.
    pub fn resolve(&self) -> Result<Toolchain> {
        self.validate()?;
        let lib_dir = std::path::absolute(&self.lib_dir)
            .with_context(|| format!("resolve lib_dir {}", self.lib_dir.display()))?;
        Ok(Toolchain {
            javac: self.javac.clone(),
            java: self.java.clone(),
            jar: self.jar.clone(),
            source_level: self.source_level.clone(),
            aspectj_tools_jar: lib_dir.join(&self.aspectj_tools_jar),
            aspectj_rt_jar: lib_dir.join(&self.aspectj_rt_jar),
            rt_jar: lib_dir.join(&self.rt_jar),
            base_aspect: lib_dir.join(&self.base_aspect),
            manifest: lib_dir.join(&self.manifest),
        })
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ToolchainConfig::default()`.
pub fn load_config(path: &Path) -> Result<ToolchainConfig> {
    if !path.exists() {
        let cfg = ToolchainConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ToolchainConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Render config as TOML with a trailing newline.
pub fn render_config(cfg: &ToolchainConfig) -> Result<String> {
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    if !buf.ends_with('\n') {
        buf.push('\n');
    }
    Ok(buf)
}

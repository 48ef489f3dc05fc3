//! Monitor agent assembler.
//!
//! Compiles, weaves, and archives the sources produced by the monitor
//! generator into a single `<name>.jar` agent.

use std::path::{Path, PathBuf};

use agentgen::build::{BuildConfig, build_agent};
use agentgen::core::types::BuildRequest;
use agentgen::exit_codes;
use agentgen::io::config::{DEFAULT_CONFIG_FILE, ToolchainConfig, load_config, render_config};
use agentgen::io::process::SystemProcessRunner;
use agentgen::logging;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "agentgen",
    version,
    about = "Package generated monitor sources into a runtime agent jar"
)]
struct Cli {
    /// Echo each tool command line and show tool output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile, weave, and archive `<AGENT_NAME>.jar`.
    Build {
        /// Directory holding `<AGENT_NAME>RuntimeMonitor.java` and `<AGENT_NAME>MonitorAspect.aj`.
        output_dir: PathBuf,
        /// Stem of the generated file names and of the produced jar.
        agent_name: String,
        #[command(flatten)]
        toolchain: ToolchainArgs,
        /// Directory to write the jar into.
        #[arg(long, default_value = ".")]
        archive_dir: PathBuf,
    },
    /// Print the effective toolchain configuration as TOML.
    Config {
        #[command(flatten)]
        toolchain: ToolchainArgs,
    },
}

#[derive(clap::Args)]
struct ToolchainArgs {
    /// Toolchain config file (defaults to `agentgen.toml` when present).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory with the support jars, `BaseAspect.aj`, and `MANIFEST.MF`.
    #[arg(long)]
    lib_dir: Option<PathBuf>,
}

impl ToolchainArgs {
    fn load(&self) -> Result<ToolchainConfig> {
        let path = self
            .config
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        if let Some(explicit) = &self.config
            && !explicit.exists()
        {
            anyhow::bail!("config file {} not found", explicit.display());
        }
        let mut cfg = load_config(path)?;
        if let Some(lib_dir) = &self.lib_dir {
            cfg.lib_dir = lib_dir.clone();
        }
        Ok(cfg)
    }
}

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    match cli.command {
        Command::Build {
            output_dir,
            agent_name,
            toolchain,
            archive_dir,
        } => cmd_build(output_dir, agent_name, &toolchain, archive_dir, cli.verbose),
        Command::Config { toolchain } => cmd_config(&toolchain),
    }
}

fn cmd_build(
    output_dir: PathBuf,
    agent_name: String,
    toolchain: &ToolchainArgs,
    archive_dir: PathBuf,
    verbose: bool,
) -> Result<i32> {
    let cfg = toolchain.load()?;
    let config = BuildConfig {
        toolchain: cfg.resolve().context("resolve toolchain")?,
        archive_dir,
    };
    let request = BuildRequest::new(output_dir, agent_name);
    let runner = SystemProcessRunner::new(verbose);

    match build_agent(&request, &config, &runner) {
        Ok(archive) => {
            println!("{} is generated.", archive.name);
            Ok(exit_codes::OK)
        }
        Err(failure) => {
            eprintln!("{failure}");
            Ok(exit_codes::for_failure(&failure))
        }
    }
}

fn cmd_config(toolchain: &ToolchainArgs) -> Result<i32> {
    let cfg = toolchain.load()?;
    print!("{}", render_config(&cfg)?);
    Ok(exit_codes::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_build() {
        let cli = Cli::parse_from(["agentgen", "build", "out", "all"]);
        assert!(!cli.verbose);
        match cli.command {
            Command::Build {
                output_dir,
                agent_name,
                toolchain,
                archive_dir,
            } => {
                assert_eq!(output_dir, PathBuf::from("out"));
                assert_eq!(agent_name, "all");
                assert!(toolchain.config.is_none());
                assert!(toolchain.lib_dir.is_none());
                assert_eq!(archive_dir, PathBuf::from("."));
            }
            Command::Config { .. } => panic!("expected build"),
        }
    }

    #[test]
    fn parse_verbose_after_subcommand() {
        let cli = Cli::parse_from([
            "agentgen", "build", "out", "all", "-v", "--lib-dir", "/opt/lib",
        ]);
        assert!(cli.verbose);
        let Command::Build { toolchain, .. } = cli.command else {
            panic!("expected build");
        };
        assert_eq!(toolchain.lib_dir, Some(PathBuf::from("/opt/lib")));
    }

    #[test]
    fn lib_dir_flag_overrides_config() {
        let args = ToolchainArgs {
            config: None,
            lib_dir: Some(PathBuf::from("/opt/aspectj/lib")),
        };
        let cfg = args.load().expect("load");
        assert_eq!(cfg.lib_dir, PathBuf::from("/opt/aspectj/lib"));
    }
}

//! # Tool Path Resolver
//!
//! Finds the external encoder tools (ffmpeg, ffprobe):
//! - explicit override (CLI flag / config)
//! - a bundled tools directory pointed to by `TOOLS_DIR`
//! - the system `PATH`

use crate::platform::PlatformCommands;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Tools every operation depends on
pub const REQUIRED_TOOLS: [&str; 2] = ["ffmpeg", "ffprobe"];

/// Tool path resolver for bundled and system installs
#[derive(Debug, Clone, Default)]
pub struct ToolPathResolver {
    /// Directory holding bundled binaries, if any
    tools_dir: Option<PathBuf>,
    /// PATH entries searched after the bundled directory
    search_path: Vec<PathBuf>,
}

impl ToolPathResolver {
    /// Resolver configured from the process environment
    pub fn new() -> Self {
        let tools_dir = env::var_os("TOOLS_DIR")
            .map(PathBuf::from)
            .filter(|dir| {
                debug!("Checking TOOLS_DIR environment variable: {:?}", dir);
                dir.is_dir()
            });

        let search_path = env::var_os("PATH")
            .map(|paths| env::split_paths(&paths).collect())
            .unwrap_or_default();

        Self {
            tools_dir,
            search_path,
        }
    }

    /// Resolver with an explicit bundled directory and search path
    pub fn with_dirs(tools_dir: Option<PathBuf>, search_path: Vec<PathBuf>) -> Self {
        Self {
            tools_dir,
            search_path,
        }
    }

    /// Resolve the path to a specific tool
    pub fn resolve_tool(&self, tool_name: &str) -> Option<PathBuf> {
        let file_name = PlatformCommands::instance().get_command(tool_name);

        if let Some(ref tools_dir) = self.tools_dir {
            // tools/{name} or tools/{name}/{name}
            for candidate in [
                tools_dir.join(&file_name),
                tools_dir.join(tool_name).join(&file_name),
            ] {
                if candidate.is_file() {
                    debug!("Using bundled tool: {} -> {:?}", tool_name, candidate);
                    return Some(candidate);
                }
            }
        }

        if let Some(system_path) = self.find_in_search_path(&file_name) {
            debug!("Using system tool: {} -> {:?}", tool_name, system_path);
            return Some(system_path);
        }

        warn!("Tool not found: {}", tool_name);
        None
    }

    fn find_in_search_path(&self, file_name: &str) -> Option<PathBuf> {
        self.search_path
            .iter()
            .map(|dir| dir.join(file_name))
            .find(|path| path.is_file())
    }

    /// Path to use for `tool_name`, honouring an explicit override
    pub fn tool_path(&self, tool_name: &str, override_path: Option<&Path>) -> Option<PathBuf> {
        match override_path {
            Some(path) if path.is_file() => Some(path.to_path_buf()),
            Some(path) => {
                warn!("Configured {} path does not exist: {}", tool_name, path.display());
                None
            }
            None => self.resolve_tool(tool_name),
        }
    }

    /// Installation hint shown when a tool is missing
    fn install_instructions(&self, tool_name: &str) -> String {
        if cfg!(target_os = "linux") {
            format!("sudo apt-get install ffmpeg  # provides {}", tool_name)
        } else if cfg!(target_os = "macos") {
            format!("brew install ffmpeg  # provides {}", tool_name)
        } else {
            format!("download ffmpeg from https://ffmpeg.org/download.html and add {} to PATH", tool_name)
        }
    }

    /// Check if a tool is available and provide installation instructions if not
    pub fn check_tool_with_instructions(
        &self,
        tool_name: &str,
        override_path: Option<&Path>,
    ) -> Result<PathBuf, String> {
        self.tool_path(tool_name, override_path).ok_or_else(|| {
            format!(
                "Tool '{}' not found. To install, run:\n  {}",
                tool_name,
                self.install_instructions(tool_name)
            )
        })
    }

    /// Human readable availability report for the `check` command
    pub fn get_tools_report(&self, overrides: &[(&str, Option<&Path>)]) -> String {
        let mut report = String::from("Tool availability:\n");
        if let Some(ref dir) = self.tools_dir {
            report.push_str(&format!("Bundled tools dir: {}\n", dir.display()));
        }
        for (tool, override_path) in overrides {
            match self.check_tool_with_instructions(tool, *override_path) {
                Ok(path) => report.push_str(&format!("  ✅ {} -> {}\n", tool, path.display())),
                Err(_) => report.push_str(&format!(
                    "  ❌ {} (install with: {})\n",
                    tool,
                    self.install_instructions(tool)
                )),
            }
        }
        report
    }
}

//! # Platform-specific utilities
//!
//! Questo modulo centralizza le differenze tra sistemi operativi che il
//! motore deve conoscere: nome dell'eseguibile dei tool e sink nullo usato
//! dal primo passaggio della compressione two-pass.

use std::sync::OnceLock;

/// Platform-specific command conventions
pub struct PlatformCommands {
    exe_suffix: &'static str,
    null_sink: &'static str,
}

impl PlatformCommands {
    /// Get the singleton instance
    pub fn instance() -> &'static Self {
        static INSTANCE: OnceLock<PlatformCommands> = OnceLock::new();
        INSTANCE.get_or_init(Self::new)
    }

    fn new() -> Self {
        if cfg!(windows) {
            Self {
                exe_suffix: ".exe",
                null_sink: "NUL",
            }
        } else {
            Self {
                exe_suffix: "",
                null_sink: "/dev/null",
            }
        }
    }

    /// Get the platform-specific executable name
    pub fn get_command(&self, base_name: &str) -> String {
        format!("{}{}", base_name, self.exe_suffix)
    }

    /// Output target that discards everything the encoder writes
    pub fn null_sink(&self) -> &'static str {
        self.null_sink
    }

    /// Get system information for debugging
    pub fn system_info() -> SystemInfo {
        SystemInfo {
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            family: std::env::consts::FAMILY,
        }
    }
}

/// System information structure
#[derive(Debug, Clone)]
pub struct SystemInfo {
    pub os: &'static str,
    pub arch: &'static str,
    pub family: &'static str,
}

impl std::fmt::Display for SystemInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.os, self.arch, self.family)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_commands() {
        let platform = PlatformCommands::instance();
        let ffmpeg = platform.get_command("ffmpeg");
        assert!(ffmpeg.starts_with("ffmpeg"));
        if cfg!(windows) {
            assert_eq!(platform.null_sink(), "NUL");
        } else {
            assert_eq!(platform.null_sink(), "/dev/null");
        }
    }

    #[test]
    fn test_system_info() {
        let info = PlatformCommands::system_info();
        assert!(!info.os.is_empty());
        assert!(!info.arch.is_empty());
        assert!(!info.family.is_empty());
    }
}

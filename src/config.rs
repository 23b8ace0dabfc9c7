//! # Configuration Management Module
//!
//! Questo modulo gestisce la configurazione del motore di editing.
//!
//! ## Parametri di configurazione:
//! - `ffmpeg` / `ffprobe`: path espliciti dei tool (default: risolti da PATH)
//! - `ffmpeg_log_level`: livello `-loglevel` passato a ffmpeg (default: error)
//! - `overwrite`: permette di sovrascrivere file di output esistenti
//! - `work_dir`: directory per i file di statistiche two-pass
//!   (default: directory corrente)
//! - `dry_run`: mostra il piano senza eseguirlo
//! - `json_output`: eventi JSON su stdout invece del log leggibile
//!
//! La configurazione arriva solo dalla riga di comando e non viene salvata.
//! I parametri fissi delle operazioni (9 MiB, 128 kbps, 1920x1080, 24 fps)
//! vivono in `bitrate` e `editor::planner`.

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

/// Levels accepted by ffmpeg's `-loglevel`
const FFMPEG_LOG_LEVELS: &[&str] = &[
    "quiet", "panic", "fatal", "error", "warning", "info", "verbose", "debug", "trace",
];

/// Configuration for the edit engine
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Explicit ffmpeg binary (None = resolve from TOOLS_DIR / PATH)
    pub ffmpeg: Option<PathBuf>,
    /// Explicit ffprobe binary (None = resolve from TOOLS_DIR / PATH)
    pub ffprobe: Option<PathBuf>,
    /// Value passed to ffmpeg's -loglevel
    pub ffmpeg_log_level: String,
    /// Allow replacing an existing output file
    pub overwrite: bool,
    /// Where two-pass statistics files are written (None = current directory)
    pub work_dir: Option<PathBuf>,
    /// Print the plan without running anything
    pub dry_run: bool,
    /// Output progress and status as JSON for programmatic use
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ffmpeg: None,
            ffprobe: None,
            ffmpeg_log_level: "error".to_string(),
            overwrite: false,
            work_dir: None,
            dry_run: false,
            json_output: false,
        }
    }
}

impl Config {
    /// Validate configuration parameters, tool overrides included
    pub fn validate(&self) -> Result<()> {
        self.validate_settings()?;

        for (name, path) in [("ffmpeg", &self.ffmpeg), ("ffprobe", &self.ffprobe)] {
            if let Some(path) = path {
                if !path.is_file() {
                    return Err(anyhow::anyhow!(
                        "{} path does not exist: {}",
                        name,
                        path.display()
                    ));
                }
            }
        }

        Ok(())
    }

    /// Everything but the tool overrides, whose absence `check` reports itself
    pub fn validate_settings(&self) -> Result<()> {
        if !FFMPEG_LOG_LEVELS.contains(&self.ffmpeg_log_level.as_str()) {
            return Err(anyhow::anyhow!(
                "ffmpeg log level must be one of: {}",
                FFMPEG_LOG_LEVELS.join(", ")
            ));
        }

        if let Some(ref work_dir) = self.work_dir {
            if !work_dir.is_dir() {
                return Err(anyhow::anyhow!(
                    "Work directory does not exist: {}",
                    work_dir.display()
                ));
            }
        }

        Ok(())
    }

    /// Directory for transient two-pass statistics
    pub fn work_dir(&self) -> PathBuf {
        self.work_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

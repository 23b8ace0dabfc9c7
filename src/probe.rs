//! # Media Probe Module
//!
//! Questo modulo interroga ffprobe per i metadati di un file video.
//!
//! ## Responsabilità:
//! - Frame rate: `r_frame_rate` come razionale `num/den`, arrotondato per
//!   eccesso e mai sotto 1
//! - Durata: `format=duration` in secondi, troncata all'intero
//! - Presenza di una traccia audio (`-select_streams a`)
//!
//! ## Fallimenti:
//! Un probe fallito non è fatale: viene loggato e `HeldMetadata` conserva i
//! metadati validi già presenti. Chi ha bisogno di metadati freschi deve
//! verificarne l'assenza esplicitamente.

use crate::args;
use crate::command::{CommandRunner, Invocation};
use crate::error::ProbeError;
use crate::utils::path_arg;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Frame rate and duration of one input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MediaMetadata {
    /// Frames per second, rounded up, at least 1
    pub frame_rate: u32,
    /// Whole seconds
    pub duration_seconds: u64,
}

/// Queries the metadata tool through the injected runner
#[derive(Clone)]
pub struct MediaProbe {
    runner: Arc<dyn CommandRunner>,
    ffprobe: String,
}

impl MediaProbe {
    pub fn new(runner: Arc<dyn CommandRunner>, ffprobe: impl Into<String>) -> Self {
        Self {
            runner,
            ffprobe: ffprobe.into(),
        }
    }

    /// Frame rate and duration of `path`
    pub async fn probe(&self, path: &Path) -> Result<MediaMetadata, ProbeError> {
        let fps_output = self
            .query(args![
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
                "-show_entries",
                "stream=r_frame_rate",
                path_arg(path),
            ], "frame-rate query")
            .await?;
        let frame_rate = parse_frame_rate(&fps_output)?;

        let duration_output = self
            .query(args![
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
                path_arg(path),
            ], "duration query")
            .await?;
        let duration_seconds = parse_duration(&duration_output)?;

        debug!(
            "Probed {}: {} fps, {}s",
            path.display(),
            frame_rate,
            duration_seconds
        );

        Ok(MediaMetadata {
            frame_rate,
            duration_seconds,
        })
    }

    /// Whether `path` has at least one audio stream. Unanswerable means no.
    pub async fn has_audio_stream(&self, path: &Path) -> bool {
        let result = self
            .query(args![
                "-i",
                path_arg(path),
                "-show_streams",
                "-select_streams",
                "a",
                "-loglevel",
                "error",
            ], "audio stream query")
            .await;

        match result {
            Ok(stdout) => !stdout.trim().is_empty(),
            Err(e) => {
                warn!("Could not check audio streams of {}: {}", path.display(), e);
                false
            }
        }
    }

    async fn query(&self, args: Vec<String>, label: &str) -> Result<String, ProbeError> {
        let invocation = Invocation::new(self.ffprobe.clone(), args, label);
        let output = self
            .runner
            .run(&invocation)
            .await
            .map_err(|source| ProbeError::Unreachable {
                tool: self.ffprobe.clone(),
                source,
            })?;

        if !output.success {
            return Err(ProbeError::Failed {
                tool: self.ffprobe.clone(),
                stderr: output.diagnostics(),
            });
        }

        Ok(output.stdout)
    }
}

/// `"num/den"` (or a bare number) -> `ceil(num/den)`, clamped to at least 1
pub fn parse_frame_rate(output: &str) -> Result<u32, ProbeError> {
    let unparsable = || ProbeError::Unparsable {
        what: "frame rate",
        output: output.trim().to_string(),
    };

    let line = output.lines().map(str::trim).find(|l| !l.is_empty()).ok_or_else(unparsable)?;
    let (num, den) = match line.split_once('/') {
        Some((num, den)) => (num.trim(), den.trim()),
        None => (line, "1"),
    };
    let num: f64 = num.parse().map_err(|_| unparsable())?;
    let den: f64 = den.parse().map_err(|_| unparsable())?;

    let rate = num / den;
    if !rate.is_finite() {
        return Err(unparsable());
    }

    let rate = rate.ceil();
    if rate <= 0.0 {
        return Ok(1);
    }
    Ok(rate.min(f64::from(u32::MAX)) as u32)
}

/// Decimal seconds -> whole seconds
pub fn parse_duration(output: &str) -> Result<u64, ProbeError> {
    let text = output.trim();
    let seconds: f64 = text.parse().map_err(|_| ProbeError::Unparsable {
        what: "duration",
        output: text.to_string(),
    })?;

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(ProbeError::Unparsable {
            what: "duration",
            output: text.to_string(),
        });
    }
    Ok(seconds.trunc() as u64)
}

/// Metadata held for the currently selected input.
///
/// A refresh that fails keeps whatever was held before.
#[derive(Debug, Clone, Default)]
pub struct HeldMetadata {
    path: Option<PathBuf>,
    metadata: Option<MediaMetadata>,
}

impl HeldMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-probe `path`. Returns whether fresh metadata was obtained.
    pub async fn refresh(&mut self, probe: &MediaProbe, path: &Path) -> bool {
        match probe.probe(path).await {
            Ok(metadata) => {
                self.path = Some(path.to_path_buf());
                self.metadata = Some(metadata);
                true
            }
            Err(e) => {
                warn!("Error getting video info for {}: {}", path.display(), e);
                false
            }
        }
    }

    pub fn get(&self) -> Option<&MediaMetadata> {
        self.metadata.as_ref()
    }

    /// Held metadata, only if it was probed from `path`
    pub fn for_path(&self, path: &Path) -> Option<MediaMetadata> {
        match self.path.as_deref() {
            Some(held) if held == path => self.metadata,
            _ => None,
        }
    }
}

//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom del motore di editing.
//!
//! ## Categorie di errori:
//! - `ValidationError`: input rifiutato prima di qualsiasi invocazione esterna
//!   (tipo di file errato, trim invertito, durata/bitrate non positivi,
//!   codec audio non supportato, immagini di formati diversi, ...)
//! - `ProbeError`: ffprobe non raggiungibile o output non interpretabile.
//!   Non fatale: chi chiama decide se i metadati servono davvero.
//! - `EditError`: errore complessivo di un'operazione, incluso il fallimento
//!   di uno step ffmpeg con il testo diagnostico catturato.
//!
//! ## Esempio:
//! ```ignore
//! if !tool_exists {
//!     return Err(EditError::MissingDependency("ffmpeg".to_string()));
//! }
//! ```

use crate::media::MediaKind;
use std::fmt;
use std::path::PathBuf;

/// Which caller-supplied field a validation failure refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Input,
    SecondInput,
    Output,
    ImagesDirectory,
    TrimStart,
    TrimEnd,
    Speed,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Input => "input",
            Field::SecondInput => "second input",
            Field::Output => "output",
            Field::ImagesDirectory => "images directory",
            Field::TrimStart => "trim start",
            Field::TrimEnd => "trim end",
            Field::Speed => "speed",
        };
        f.write_str(name)
    }
}

/// Input rejected before any external invocation
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be a {expected} file, not {found}: {}", path.display())]
    WrongKind {
        field: Field,
        expected: MediaKind,
        found: MediaKind,
        path: PathBuf,
    },

    #[error("{field} already exists, choose a new file name: {}", path.display())]
    OutputExists { field: Field, path: PathBuf },

    #[error("metadata unavailable for {}", path.display())]
    MetadataUnavailable { path: PathBuf },

    #[error("{field} timecode {value} is out of range ({allowed})")]
    InvalidTimecode {
        field: Field,
        value: String,
        allowed: String,
    },

    #[error("start time must be less than end time (start {start}s, end {end}s)")]
    InvalidTrim { start: f64, end: f64 },

    #[error("video duration must be greater than zero (got {0}s)")]
    NonPositiveDuration(u64),

    #[error("target size too small for a {duration}s video: computed video bitrate {bitrate} bps")]
    NonPositiveBitrate { bitrate: i64, duration: u64 },

    #[error("{field} multiplier must be a positive number (got {value})")]
    InvalidSpeed { field: Field, value: f64 },

    #[error("no audio encoder known for extension '{extension}'")]
    UnsupportedAudioCodec { extension: String },

    #[error("the selected video has no audio stream: {}", path.display())]
    NoAudioStream { path: PathBuf },

    #[error("no image files found in {}", path.display())]
    NoImages { path: PathBuf },

    #[error("images in {} must share one format, found: {extensions}", path.display())]
    MixedImageFormats { path: PathBuf, extensions: String },

    #[error("staging target already exists and would be overwritten: {}", path.display())]
    StagingConflict { path: PathBuf },

    #[error("{field} is not readable: {}: {reason}", path.display())]
    ImagesDirectory {
        field: Field,
        path: PathBuf,
        reason: String,
    },
}

/// Metadata tool failure; non-fatal for callers holding earlier metadata
#[derive(thiserror::Error, Debug)]
pub enum ProbeError {
    #[error("failed to run {tool}: {source}")]
    Unreachable {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with an error: {stderr}")]
    Failed { tool: String, stderr: String },

    #[error("unparsable {what} from ffprobe: '{output}'")]
    Unparsable { what: &'static str, output: String },
}

/// Custom error types for video edit operations
#[derive(thiserror::Error, Debug)]
pub enum EditError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),

    #[error("{operation} failed at step {step} ({label}):\n{diagnostics}")]
    Tool {
        operation: String,
        step: usize,
        label: String,
        diagnostics: String,
    },

    #[error("{operation} could not start step {step} ({label}): {source}")]
    Spawn {
        operation: String,
        step: usize,
        label: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Dependency missing: {0}")]
    MissingDependency(String),
}

pub type EditResult<T> = Result<T, EditError>;

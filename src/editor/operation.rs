//! Operation requests, probe facts and the resulting plan.

use crate::command::Invocation;
use crate::probe::MediaMetadata;
use crate::timecode::Timecode;
use std::path::{Path, PathBuf};

/// Fit a video under the size limit with a two-pass encode
#[derive(Debug, Clone, PartialEq)]
pub struct CompressParams {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Cut the input between two timecodes
#[derive(Debug, Clone, PartialEq)]
pub struct TrimParams {
    pub input: PathBuf,
    pub output: PathBuf,
    pub start: Timecode,
    pub end: Timecode,
}

/// Change playback speed; `multiplier > 1` is faster
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedParams {
    pub input: PathBuf,
    pub output: PathBuf,
    pub multiplier: f64,
}

/// Join two videos back to back
#[derive(Debug, Clone, PartialEq)]
pub struct ConcatParams {
    pub first: PathBuf,
    pub second: PathBuf,
    pub output: PathBuf,
}

/// Build a slideshow from the images of a directory
#[derive(Debug, Clone, PartialEq)]
pub struct ImagesToVideoParams {
    pub images_dir: PathBuf,
    pub output: PathBuf,
}

/// Write the audio track of a video to an audio file
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractAudioParams {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// One edit the caller wants performed
#[derive(Debug, Clone, PartialEq)]
pub enum EditRequest {
    Compress(CompressParams),
    Trim(TrimParams),
    Speed(SpeedParams),
    Concat(ConcatParams),
    ImagesToVideo(ImagesToVideoParams),
    ExtractAudio(ExtractAudioParams),
}

impl EditRequest {
    pub fn operation_name(&self) -> &'static str {
        match self {
            Self::Compress(_) => "compress",
            Self::Trim(_) => "trim",
            Self::Speed(_) => "speed",
            Self::Concat(_) => "concat",
            Self::ImagesToVideo(_) => "images-to-video",
            Self::ExtractAudio(_) => "extract-audio",
        }
    }

    /// The video whose metadata or audio stream the plan depends on
    pub fn primary_input(&self) -> Option<&Path> {
        match self {
            Self::Compress(p) => Some(&p.input),
            Self::Trim(p) => Some(&p.input),
            Self::Speed(p) => Some(&p.input),
            Self::Concat(p) => Some(&p.first),
            Self::ImagesToVideo(_) => None,
            Self::ExtractAudio(p) => Some(&p.input),
        }
    }

    pub fn output(&self) -> &Path {
        match self {
            Self::Compress(p) => &p.output,
            Self::Trim(p) => &p.output,
            Self::Speed(p) => &p.output,
            Self::Concat(p) => &p.output,
            Self::ImagesToVideo(p) => &p.output,
            Self::ExtractAudio(p) => &p.output,
        }
    }

    pub fn needs_metadata(&self) -> bool {
        matches!(self, Self::Compress(_) | Self::Trim(_))
    }

    pub fn needs_audio_check(&self) -> bool {
        matches!(self, Self::Trim(_) | Self::ExtractAudio(_))
    }
}

/// What the probe learned about the primary input
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputFacts {
    /// None when the probe failed or was not needed
    pub metadata: Option<MediaMetadata>,
    pub has_audio: bool,
}

/// A copy made before the encoder runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedCopy {
    pub source: PathBuf,
    pub target: PathBuf,
}

/// Everything needed to carry out one request
#[derive(Debug, Clone, PartialEq)]
pub struct OperationPlan {
    operation: &'static str,
    output: PathBuf,
    staging: Vec<StagedCopy>,
    invocations: Vec<Invocation>,
    cleanup: Vec<PathBuf>,
    estimated_size: Option<u64>,
    size_limit: Option<u64>,
}

impl OperationPlan {
    pub fn new(operation: &'static str, output: PathBuf) -> Self {
        Self {
            operation,
            output,
            staging: Vec::new(),
            invocations: Vec::new(),
            cleanup: Vec::new(),
            estimated_size: None,
            size_limit: None,
        }
    }

    pub fn with_staging(mut self, staging: Vec<StagedCopy>) -> Self {
        self.staging = staging;
        self
    }

    pub fn with_invocation(mut self, invocation: Invocation) -> Self {
        self.invocations.push(invocation);
        self
    }

    pub fn with_cleanup(mut self, path: PathBuf) -> Self {
        self.cleanup.push(path);
        self
    }

    /// Expected output size and the ceiling it is meant to stay under
    pub fn with_size_budget(mut self, estimated: u64, limit: u64) -> Self {
        self.estimated_size = Some(estimated);
        self.size_limit = Some(limit);
        self
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn staging(&self) -> &[StagedCopy] {
        &self.staging
    }

    pub fn invocations(&self) -> &[Invocation] {
        &self.invocations
    }

    /// Deleted after the last attempted invocation, whatever its outcome
    pub fn cleanup(&self) -> &[PathBuf] {
        &self.cleanup
    }

    pub fn estimated_size(&self) -> Option<u64> {
        self.estimated_size
    }

    pub fn size_limit(&self) -> Option<u64> {
        self.size_limit
    }
}

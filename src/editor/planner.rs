//! # Operation Planner Module
//!
//! Trasforma una richiesta di editing in un `OperationPlan`: le invocazioni
//! ffmpeg in ordine, le copie da preparare prima e i file da rimuovere dopo.
//!
//! ## Responsabilità:
//! - Validazione dei tipi di file per ogni ruolo (input, output, directory)
//! - Protezione degli output esistenti (salvo `overwrite`)
//! - Calcolo dei parametri: bitrate two-pass, offset del trim, fattore
//!   `setpts`, codec audio dall'estensione di output
//! - Costruzione deterministica degli argomenti ffmpeg
//!
//! Ogni errore di validazione arriva prima di qualsiasi invocazione: un piano
//! restituito è sempre eseguibile così com'è.
//!
//! ## Pipeline per operazione:
//! - **compress**: analisi (pass 1, output nullo) + encode (pass 2), poi
//!   rimozione delle statistiche `ffmpeg2pass-0.log*`
//! - **trim** / **speed** / **concat** / **extract-audio**: una invocazione
//! - **images-to-video**: staging `img-NN.jpg`, una invocazione, rimozione
//!   delle copie

use crate::bitrate::{
    estimated_output_size, target_video_bitrate, AUDIO_BITRATE_BPS, SIZE_LIMIT_BYTES,
    TARGET_SIZE_BYTES,
};
use crate::command::Invocation;
use crate::config::Config;
use crate::editor::operation::{
    CompressParams, ConcatParams, EditRequest, ExtractAudioParams, ImagesToVideoParams,
    InputFacts, OperationPlan, SpeedParams, TrimParams,
};
use crate::editor::staging;
use crate::error::{Field, ValidationError};
use crate::media::{audio_codec_for, extension_of, MediaFile, MediaKind};
use crate::platform::PlatformCommands;
use crate::timecode::TrimSelection;
use crate::utils::path_arg;
use crate::args;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix of the two-pass statistics files inside the work directory
pub const PASSLOG_PREFIX: &str = "ffmpeg2pass";

/// Audio bitrate given to the encoder; keep in sync with `AUDIO_BITRATE_BPS`
const AUDIO_BITRATE_ARG: &str = "128k";

/// Slideshow geometry and timing
const SLIDESHOW_WIDTH: u32 = 1920;
const SLIDESHOW_HEIGHT: u32 = 1080;
const SLIDESHOW_INPUT_FPS: u32 = 1;
const SLIDESHOW_OUTPUT_FPS: u32 = 24;

/// Builds plans; holds only what every plan needs
#[derive(Debug, Clone)]
pub struct OperationPlanner {
    ffmpeg: String,
    log_level: String,
    overwrite: bool,
    work_dir: PathBuf,
}

impl OperationPlanner {
    pub fn new(ffmpeg: impl Into<String>, config: &Config) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            log_level: config.ffmpeg_log_level.clone(),
            overwrite: config.overwrite,
            work_dir: config.work_dir(),
        }
    }

    /// Validate `request` and build its plan
    pub fn plan(
        &self,
        request: &EditRequest,
        facts: &InputFacts,
    ) -> Result<OperationPlan, ValidationError> {
        let plan = match request {
            EditRequest::Compress(p) => self.plan_compress(p, facts),
            EditRequest::Trim(p) => self.plan_trim(p, facts),
            EditRequest::Speed(p) => self.plan_speed(p),
            EditRequest::Concat(p) => self.plan_concat(p),
            EditRequest::ImagesToVideo(p) => self.plan_images(p),
            EditRequest::ExtractAudio(p) => self.plan_extract_audio(p, facts),
        }?;

        for invocation in plan.invocations() {
            debug!("Planned {}", invocation);
        }
        Ok(plan)
    }

    /// Path prefix passed as `-passlogfile`
    pub fn passlog_prefix(&self) -> PathBuf {
        self.work_dir.join(PASSLOG_PREFIX)
    }

    fn plan_compress(
        &self,
        params: &CompressParams,
        facts: &InputFacts,
    ) -> Result<OperationPlan, ValidationError> {
        require_kind(Field::Input, MediaKind::Video, &params.input)?;
        require_kind(Field::Output, MediaKind::Video, &params.output)?;
        self.require_new_output(&params.output)?;

        let metadata = facts.metadata.ok_or_else(|| ValidationError::MetadataUnavailable {
            path: params.input.clone(),
        })?;
        let bitrate = target_video_bitrate(
            metadata.duration_seconds,
            TARGET_SIZE_BYTES,
            AUDIO_BITRATE_BPS,
        )?;
        debug!(
            "Target video bitrate for {}s: {} bps",
            metadata.duration_seconds, bitrate
        );

        let input = path_arg(&params.input);
        let passlog = self.passlog_prefix();
        let passlog_arg = path_arg(&passlog);

        // the analysis pass only writes statistics, so -y is always safe here
        let mut first = self.header(true);
        first.extend(args![
            "-i", input, "-c:v", "libx264", "-b:v", bitrate, "-pass", 1,
            "-passlogfile", passlog_arg, "-an", "-f", "null",
            PlatformCommands::instance().null_sink()
        ]);

        let mut second = self.header(self.overwrite);
        second.extend(args![
            "-i", input, "-c:v", "libx264", "-b:v", bitrate, "-pass", 2,
            "-passlogfile", passlog_arg, "-c:a", "aac", "-b:a", AUDIO_BITRATE_ARG,
            path_arg(&params.output)
        ]);

        let estimated = estimated_output_size(
            metadata.duration_seconds,
            bitrate,
            AUDIO_BITRATE_BPS,
        );
        let stats = format!("{}-0.log", passlog_arg);
        Ok(OperationPlan::new("compress", params.output.clone())
            .with_size_budget(estimated, SIZE_LIMIT_BYTES)
            .with_invocation(Invocation::new(&self.ffmpeg, first, "first-pass analysis"))
            .with_invocation(Invocation::new(&self.ffmpeg, second, "second-pass encode"))
            .with_cleanup(PathBuf::from(&stats))
            .with_cleanup(PathBuf::from(format!("{}.mbtree", stats))))
    }

    fn plan_trim(
        &self,
        params: &TrimParams,
        facts: &InputFacts,
    ) -> Result<OperationPlan, ValidationError> {
        require_kind(Field::Input, MediaKind::Video, &params.input)?;
        require_kind(Field::Output, MediaKind::Video, &params.output)?;
        self.require_new_output(&params.output)?;

        let metadata = facts.metadata.ok_or_else(|| ValidationError::MetadataUnavailable {
            path: params.input.clone(),
        })?;
        let selection = TrimSelection::new(params.start, params.end, &metadata)?;

        let mut cmd = self.header(self.overwrite);
        cmd.extend(args!["-i", path_arg(&params.input)]);
        // a zero bound means "from the beginning" / "to the end"
        if !selection.start().is_zero() {
            cmd.extend(args!["-ss", selection.start_offset()]);
        }
        if !selection.end().is_zero() {
            cmd.extend(args!["-to", selection.end_offset()]);
        }
        cmd.extend(args!["-c:v", "libx264"]);
        if facts.has_audio {
            cmd.extend(args!["-c:a", "aac"]);
        }
        cmd.push(path_arg(&params.output));

        Ok(OperationPlan::new("trim", params.output.clone())
            .with_invocation(Invocation::new(&self.ffmpeg, cmd, "trim")))
    }

    fn plan_speed(&self, params: &SpeedParams) -> Result<OperationPlan, ValidationError> {
        require_kind(Field::Input, MediaKind::Video, &params.input)?;
        require_kind(Field::Output, MediaKind::Video, &params.output)?;
        self.require_new_output(&params.output)?;

        let multiplier = params.multiplier;
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(ValidationError::InvalidSpeed {
                field: Field::Speed,
                value: multiplier,
            });
        }
        let factor = 1.0 / multiplier;

        let mut cmd = self.header(self.overwrite);
        cmd.extend(args![
            "-i", path_arg(&params.input),
            "-filter_complex", format!("[0:v]setpts={}*PTS[v]", factor),
            "-map", "[v]", "-c:v", "libx264",
            path_arg(&params.output)
        ]);

        Ok(OperationPlan::new("speed", params.output.clone())
            .with_invocation(Invocation::new(&self.ffmpeg, cmd, "speed change")))
    }

    fn plan_concat(&self, params: &ConcatParams) -> Result<OperationPlan, ValidationError> {
        require_kind(Field::Input, MediaKind::Video, &params.first)?;
        require_kind(Field::SecondInput, MediaKind::Video, &params.second)?;
        require_kind(Field::Output, MediaKind::Video, &params.output)?;
        self.require_new_output(&params.output)?;

        let mut cmd = self.header(self.overwrite);
        cmd.extend(args![
            "-i", path_arg(&params.first),
            "-i", path_arg(&params.second),
            "-filter_complex", "[0:v:0][0:a:0][1:v:0][1:a:0]concat=n=2:v=1:a=1[outv][outa]",
            "-map", "[outv]", "-map", "[outa]",
            path_arg(&params.output)
        ]);

        Ok(OperationPlan::new("concat", params.output.clone())
            .with_invocation(Invocation::new(&self.ffmpeg, cmd, "concatenate")))
    }

    fn plan_images(&self, params: &ImagesToVideoParams) -> Result<OperationPlan, ValidationError> {
        require_kind(Field::Output, MediaKind::Video, &params.output)?;
        self.require_new_output(&params.output)?;

        let sequence = staging::plan_staging(&params.images_dir)?;
        let pattern = sequence.pattern();
        let filter = format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease:eval=frame,pad={w}:{h}:-1:-1:eval=frame",
            w = SLIDESHOW_WIDTH,
            h = SLIDESHOW_HEIGHT
        );

        let mut cmd = self.header(self.overwrite);
        cmd.extend(args![
            "-framerate", SLIDESHOW_INPUT_FPS,
            "-start_number", 1,
            "-i", path_arg(&pattern),
            "-vf", filter,
            "-c:v", "libx264", "-pix_fmt", "yuv420p",
            "-r", SLIDESHOW_OUTPUT_FPS,
            path_arg(&params.output)
        ]);

        let mut plan = OperationPlan::new("images-to-video", params.output.clone())
            .with_invocation(Invocation::new(&self.ffmpeg, cmd, "assemble slideshow"));
        for target in sequence.targets() {
            plan = plan.with_cleanup(target);
        }
        Ok(plan.with_staging(sequence.into_copies()))
    }

    fn plan_extract_audio(
        &self,
        params: &ExtractAudioParams,
        facts: &InputFacts,
    ) -> Result<OperationPlan, ValidationError> {
        require_kind(Field::Input, MediaKind::Video, &params.input)?;
        require_kind(Field::Output, MediaKind::Audio, &params.output)?;
        self.require_new_output(&params.output)?;

        let extension = extension_of(&params.output).unwrap_or_default();
        let codec = audio_codec_for(&extension)
            .ok_or(ValidationError::UnsupportedAudioCodec { extension })?;
        if !facts.has_audio {
            return Err(ValidationError::NoAudioStream {
                path: params.input.clone(),
            });
        }

        let mut cmd = self.header(self.overwrite);
        cmd.extend(args![
            "-i", path_arg(&params.input),
            "-map", "0:a", "-q:a", 0, "-acodec", codec,
            path_arg(&params.output)
        ]);

        Ok(OperationPlan::new("extract-audio", params.output.clone())
            .with_invocation(Invocation::new(&self.ffmpeg, cmd, "extract audio")))
    }

    /// Arguments every ffmpeg invocation starts with
    fn header(&self, overwrite: bool) -> Vec<String> {
        let mut args = args!["-hide_banner", "-loglevel", self.log_level];
        if overwrite {
            args.push("-y".to_string());
        }
        args
    }

    fn require_new_output(&self, output: &Path) -> Result<(), ValidationError> {
        if !self.overwrite && output.exists() {
            return Err(ValidationError::OutputExists {
                field: Field::Output,
                path: output.to_path_buf(),
            });
        }
        Ok(())
    }
}

fn require_kind(field: Field, expected: MediaKind, path: &Path) -> Result<(), ValidationError> {
    let file = MediaFile::new(path);
    if file.fits(expected) {
        Ok(())
    } else {
        Err(ValidationError::WrongKind {
            field,
            expected,
            found: file.kind(),
            path: path.to_path_buf(),
        })
    }
}

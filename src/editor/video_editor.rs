//! # Video Editor
//!
//! Punto d'ingresso del motore: unisce probe, planner ed executor.
//!
//! ## Responsabilità:
//! - Risoluzione di ffmpeg/ffprobe (override → `TOOLS_DIR` → `PATH`)
//! - Raccolta dei fatti sull'input che una richiesta richiede (metadati,
//!   traccia audio), conservando i metadati dell'ultima selezione valida
//! - `plan()` / `execute()` separati, per dry run e per chi vuole
//!   ispezionare le invocazioni prima di lanciarle
//! - `run()` che fa tutto in sequenza
//!
//! ## Esempio:
//! ```ignore
//! let mut editor = VideoEditor::new(Config::default())?;
//! let report = editor.run(&request).await?;
//! ```

use crate::command::{CommandRunner, SystemRunner};
use crate::config::Config;
use crate::editor::executor::{ExecutionReport, OperationExecutor};
use crate::editor::operation::{EditRequest, InputFacts, OperationPlan};
use crate::editor::planner::OperationPlanner;
use crate::error::{EditError, EditResult, ValidationError};
use crate::media::MediaKind;
use crate::probe::{HeldMetadata, MediaMetadata, MediaProbe};
use crate::tool_resolver::ToolPathResolver;
use crate::utils::path_arg;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Probes, plans and executes edit requests
pub struct VideoEditor {
    config: Config,
    probe: MediaProbe,
    planner: OperationPlanner,
    executor: OperationExecutor,
    held: HeldMetadata,
}

impl VideoEditor {
    /// Editor running the real tools; fails if either cannot be found
    pub fn new(config: Config) -> EditResult<Self> {
        let resolver = ToolPathResolver::new();
        let ffmpeg = resolver
            .check_tool_with_instructions("ffmpeg", config.ffmpeg.as_deref())
            .map_err(EditError::MissingDependency)?;
        let ffprobe = resolver
            .check_tool_with_instructions("ffprobe", config.ffprobe.as_deref())
            .map_err(EditError::MissingDependency)?;
        info!("Using ffmpeg: {}", ffmpeg.display());
        debug!("Using ffprobe: {}", ffprobe.display());

        Ok(Self::with_runner(
            config,
            Arc::new(SystemRunner),
            path_arg(&ffmpeg),
            path_arg(&ffprobe),
        ))
    }

    /// Editor driving `runner` with the given tool names
    pub fn with_runner(
        config: Config,
        runner: Arc<dyn CommandRunner>,
        ffmpeg: impl Into<String>,
        ffprobe: impl Into<String>,
    ) -> Self {
        let planner = OperationPlanner::new(ffmpeg, &config);
        let executor = OperationExecutor::new(runner.clone())
            .with_json_output(config.json_output)
            .with_progress(!config.dry_run);
        Self {
            probe: MediaProbe::new(runner, ffprobe),
            planner,
            executor,
            held: HeldMetadata::new(),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn probe(&self, path: &Path) -> EditResult<MediaMetadata> {
        Ok(self.probe.probe(path).await?)
    }

    pub async fn has_audio(&self, path: &Path) -> bool {
        self.probe.has_audio_stream(path).await
    }

    /// Make `path` the current selection. On failure the previous
    /// metadata stays held and None is returned.
    pub async fn select(&mut self, path: &Path) -> Option<MediaMetadata> {
        if self.held.refresh(&self.probe, path).await {
            self.held.for_path(path)
        } else {
            None
        }
    }

    /// Metadata of the last successful selection
    pub fn held_metadata(&self) -> Option<&MediaMetadata> {
        self.held.get()
    }

    /// Probe what `request` depends on. Inputs of the wrong kind are not
    /// probed; the planner rejects them anyway.
    pub async fn gather_facts(&mut self, request: &EditRequest) -> InputFacts {
        let mut facts = InputFacts::default();
        let Some(input) = request.primary_input() else {
            return facts;
        };
        if !MediaKind::Video.accepts(input) {
            return facts;
        }

        if request.needs_metadata() {
            facts.metadata = self.select(input).await;
        }
        if request.needs_audio_check() {
            facts.has_audio = self.has_audio(input).await;
        }
        facts
    }

    pub fn plan(
        &self,
        request: &EditRequest,
        facts: &InputFacts,
    ) -> Result<OperationPlan, ValidationError> {
        self.planner.plan(request, facts)
    }

    /// Gather facts and plan, without running anything
    pub async fn prepare(&mut self, request: &EditRequest) -> EditResult<OperationPlan> {
        let facts = self.gather_facts(request).await;
        Ok(self.plan(request, &facts)?)
    }

    pub async fn execute(&self, plan: &OperationPlan) -> EditResult<ExecutionReport> {
        self.executor.execute(plan).await
    }

    /// Prepare and execute `request`
    pub async fn run(&mut self, request: &EditRequest) -> EditResult<ExecutionReport> {
        let plan = self.prepare(request).await?;
        self.execute(&plan).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::testing::ScriptedRunner;
    use crate::error::ProbeError;
    use crate::editor::operation::{CompressParams, ImagesToVideoParams, TrimParams};
    use crate::timecode::Timecode;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn editor(runner: Arc<ScriptedRunner>, work_dir: &Path) -> VideoEditor {
        let config = Config {
            work_dir: Some(work_dir.to_path_buf()),
            dry_run: true,
            ..Config::default()
        };
        VideoEditor::with_runner(config, runner, "ffmpeg", "ffprobe")
    }

    #[tokio::test]
    async fn test_images_to_video_end_to_end() {
        let images = TempDir::new().unwrap();
        let names = ["5.jpg", "1.jpg", "3.jpg", "2.jpeg", "4.jpg", "readme.txt", "data.csv"];
        for name in names {
            std::fs::write(images.path().join(name), name.as_bytes()).unwrap();
        }
        let work = TempDir::new().unwrap();
        let runner = Arc::new(ScriptedRunner::new());
        let mut editor = editor(runner.clone(), work.path());

        let report = editor
            .run(&EditRequest::ImagesToVideo(ImagesToVideoParams {
                images_dir: images.path().to_path_buf(),
                output: work.path().join("slides.mp4"),
            }))
            .await
            .unwrap();

        assert_eq!(report.steps_run, 1);
        assert_eq!(report.cleaned, 5);
        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program(), "ffmpeg");

        let mut remaining: Vec<String> = std::fs::read_dir(images.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        remaining.sort();
        let mut expected: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        expected.sort();
        assert_eq!(remaining, expected);
    }

    #[tokio::test]
    async fn test_compress_probes_then_runs_both_passes() {
        let work = TempDir::new().unwrap();
        let runner = Arc::new(
            ScriptedRunner::new()
                .then_stdout("30000/1001\n")
                .then_stdout("60.48\n"),
        );
        let mut editor = editor(runner.clone(), work.path());

        let report = editor
            .run(&EditRequest::Compress(CompressParams {
                input: PathBuf::from("clip.mp4"),
                output: work.path().join("small.mp4"),
            }))
            .await
            .unwrap();

        assert_eq!(report.steps_run, 2);
        assert_eq!(
            editor.held_metadata(),
            Some(&MediaMetadata {
                frame_rate: 30,
                duration_seconds: 60
            })
        );
        let calls = runner.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0].program(), "ffprobe");
        assert!(calls[2].args().contains(&"1130291".to_string()));
        assert_eq!(calls[3].label(), "second-pass encode");
    }

    #[tokio::test]
    async fn test_failed_probe_means_no_invocations() {
        let work = TempDir::new().unwrap();
        let runner = Arc::new(ScriptedRunner::new().then_failure("No such file"));
        let mut editor = editor(runner.clone(), work.path());

        let err = editor
            .run(&EditRequest::Trim(TrimParams {
                input: PathBuf::from("missing.mp4"),
                output: work.path().join("cut.mp4"),
                start: Timecode::new(0, 1, 0),
                end: Timecode::new(0, 2, 0),
            }))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EditError::Validation(ValidationError::MetadataUnavailable { .. })
        ));
        // the probe query plus the audio query, no ffmpeg
        assert!(runner.calls().iter().all(|c| c.program() == "ffprobe"));
    }

    #[tokio::test]
    async fn test_unreadable_metadata_surfaces_as_edit_error() {
        let work = TempDir::new().unwrap();
        let runner = Arc::new(ScriptedRunner::new().then_stdout("N/A"));
        let editor = editor(runner, work.path());

        let err = editor.probe(Path::new("broken.mp4")).await.unwrap_err();
        assert!(matches!(
            err,
            EditError::Probe(ProbeError::Unparsable {
                what: "frame rate",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_failed_reselection_keeps_previous_metadata() {
        let work = TempDir::new().unwrap();
        let runner = Arc::new(
            ScriptedRunner::new()
                .then_stdout("25/1")
                .then_stdout("12.0")
                .then_spawn_error(),
        );
        let mut editor = editor(runner, work.path());

        assert!(editor.select(Path::new("first.mp4")).await.is_some());
        assert!(editor.select(Path::new("second.mp4")).await.is_none());
        assert_eq!(
            editor.held_metadata(),
            Some(&MediaMetadata {
                frame_rate: 25,
                duration_seconds: 12
            })
        );
    }
}

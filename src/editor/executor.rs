//! # Operation Executor Module
//!
//! Esegue un `OperationPlan` già validato.
//!
//! ## Flusso:
//! 1. Copie di staging (se presenti); un errore interrompe prima di ffmpeg
//! 2. Invocazioni in ordine, una alla volta, fermandosi al primo exit
//!    non-zero o al primo processo che non parte
//! 3. Cleanup sempre, qualunque sia l'esito: i file già assenti non sono un
//!    errore, gli altri problemi vengono solo loggati
//!
//! Nessun retry e nessun timeout: il pass 2 deve vedere le statistiche
//! complete del pass 1.

use crate::command::{CommandRunner, Invocation};
use crate::editor::operation::OperationPlan;
use crate::editor::staging;
use crate::error::{EditError, EditResult};
use crate::file_manager::FileManager;
use crate::json_output::JsonMessage;
use crate::progress::ProgressManager;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    pub operation: &'static str,
    pub output: PathBuf,
    pub steps_run: usize,
    pub duration: Duration,
    /// Size of the output once written, if it could be read
    pub output_size: Option<u64>,
    /// Cleanup targets actually removed
    pub cleaned: usize,
    /// The output is larger than the size the plan had to stay under
    pub exceeds_limit: bool,
}

/// Runs plans through the injected runner
pub struct OperationExecutor {
    runner: Arc<dyn CommandRunner>,
    json_output: bool,
    show_progress: bool,
}

impl OperationExecutor {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            json_output: false,
            show_progress: false,
        }
    }

    /// Emit `step_start` / `step_complete` events on stdout
    pub fn with_json_output(mut self, enabled: bool) -> Self {
        self.json_output = enabled;
        self
    }

    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    pub async fn execute(&self, plan: &OperationPlan) -> EditResult<ExecutionReport> {
        let start = Instant::now();
        let total = plan.invocations().len();
        let progress = if self.show_progress && !self.json_output {
            ProgressManager::new(total as u64)
        } else {
            ProgressManager::hidden()
        };

        info!("Starting {} ({} step(s))", plan.operation(), total);

        let (staged, staging_result) = staging::apply(plan.staging()).await;
        let outcome = match staging_result {
            Ok(()) => self.run_invocations(plan, &progress).await,
            Err(e) => {
                error!("Staging failed for {}: {}", plan.operation(), e);
                Err(EditError::Io(e))
            }
        };

        // staged targets this run never created may belong to someone else
        let untouched: Vec<&Path> = plan.staging()[staged..]
            .iter()
            .map(|copy| copy.target.as_path())
            .collect();
        let cleaned = cleanup(
            plan.cleanup()
                .iter()
                .filter(|path| !untouched.contains(&path.as_path())),
        )
        .await;

        match outcome {
            Ok(steps_run) => {
                progress.finish(&format!("{} done", plan.operation()));
                let output_size = FileManager::file_size(plan.output()).await;
                let exceeds_limit = match (output_size, plan.size_limit()) {
                    (Some(size), Some(limit)) if size > limit => {
                        warn!(
                            "{} is {}, above the {} limit",
                            plan.output().display(),
                            FileManager::format_size(size),
                            FileManager::format_size(limit)
                        );
                        true
                    }
                    _ => false,
                };
                let duration = start.elapsed();
                info!(
                    "{} completed in {:.1}s: {}",
                    plan.operation(),
                    duration.as_secs_f64(),
                    plan.output().display()
                );
                Ok(ExecutionReport {
                    operation: plan.operation(),
                    output: plan.output().to_path_buf(),
                    steps_run,
                    duration,
                    output_size,
                    cleaned,
                    exceeds_limit,
                })
            }
            Err(e) => {
                progress.abandon(&format!("{} failed", plan.operation()));
                Err(e)
            }
        }
    }

    /// Returns the number of invocations run, all successful
    async fn run_invocations(
        &self,
        plan: &OperationPlan,
        progress: &ProgressManager,
    ) -> EditResult<usize> {
        let total = plan.invocations().len();

        for (i, invocation) in plan.invocations().iter().enumerate() {
            let step = i + 1;
            let step_start = Instant::now();
            info!("Step {}/{}: {}", step, total, invocation.label());
            progress.start_step(invocation.label());
            if self.json_output {
                JsonMessage::StepStart {
                    index: step,
                    total,
                    label: invocation.label().to_string(),
                }
                .emit();
            }

            self.run_step(plan.operation(), step, invocation).await?;

            progress.finish_step();
            if self.json_output {
                JsonMessage::StepComplete {
                    index: step,
                    total,
                    label: invocation.label().to_string(),
                    duration_seconds: step_start.elapsed().as_secs_f64(),
                }
                .emit();
            }
        }

        Ok(total)
    }

    async fn run_step(
        &self,
        operation: &str,
        step: usize,
        invocation: &Invocation,
    ) -> EditResult<()> {
        debug!("Command: {}", invocation.command_line());

        let output = self.runner.run(invocation).await.map_err(|source| {
            error!("Could not start {}: {}", invocation.program(), source);
            EditError::Spawn {
                operation: operation.to_string(),
                step,
                label: invocation.label().to_string(),
                source,
            }
        })?;

        if !output.success {
            let diagnostics = output.diagnostics();
            error!("{} failed: {}", invocation.label(), diagnostics);
            return Err(EditError::Tool {
                operation: operation.to_string(),
                step,
                label: invocation.label().to_string(),
                diagnostics,
            });
        }

        Ok(())
    }
}

/// Delete transient files; returns how many were removed
async fn cleanup<'a>(paths: impl Iterator<Item = &'a PathBuf>) -> usize {
    let mut removed = 0;
    for path in paths {
        match FileManager::remove_if_exists(path).await {
            Ok(true) => removed += 1,
            Ok(false) => {}
            Err(e) => warn!("Could not delete {}: {}", path.display(), e),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::testing::ScriptedRunner;
    use crate::editor::operation::StagedCopy;
    use crate::args;
    use tempfile::TempDir;

    fn two_pass_plan(dir: &Path) -> OperationPlan {
        OperationPlan::new("compress", dir.join("out.mp4"))
            .with_invocation(Invocation::new("ffmpeg", args!["-pass", 1], "first-pass analysis"))
            .with_invocation(Invocation::new("ffmpeg", args!["-pass", 2], "second-pass encode"))
            .with_cleanup(dir.join("ffmpeg2pass-0.log"))
            .with_cleanup(dir.join("ffmpeg2pass-0.log.mbtree"))
    }

    #[tokio::test]
    async fn test_runs_every_step_in_order_and_cleans_up() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("ffmpeg2pass-0.log"), b"stats").unwrap();
        std::fs::write(dir.path().join("out.mp4"), vec![0u8; 2048]).unwrap();
        let runner = Arc::new(ScriptedRunner::new());

        let report = OperationExecutor::new(runner.clone())
            .execute(&two_pass_plan(dir.path()))
            .await
            .unwrap();

        let labels: Vec<String> = runner.calls().iter().map(|c| c.label().to_string()).collect();
        assert_eq!(labels, vec!["first-pass analysis", "second-pass encode"]);
        assert_eq!(report.steps_run, 2);
        // the .mbtree file never existed
        assert_eq!(report.cleaned, 1);
        assert_eq!(report.output_size, Some(2048));
        assert!(!report.exceeds_limit);
        assert!(!dir.path().join("ffmpeg2pass-0.log").exists());
    }

    #[tokio::test]
    async fn test_first_pass_failure_stops_and_still_cleans_up() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("ffmpeg2pass-0.log"), b"stats").unwrap();
        std::fs::write(dir.path().join("ffmpeg2pass-0.log.mbtree"), b"tree").unwrap();
        let runner = Arc::new(ScriptedRunner::new().then_failure("Unknown encoder 'libx264'"));

        let err = OperationExecutor::new(runner.clone())
            .execute(&two_pass_plan(dir.path()))
            .await
            .unwrap_err();

        match err {
            EditError::Tool {
                operation,
                step,
                label,
                diagnostics,
            } => {
                assert_eq!(operation, "compress");
                assert_eq!(step, 1);
                assert_eq!(label, "first-pass analysis");
                assert_eq!(diagnostics, "Unknown encoder 'libx264'");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(runner.calls().len(), 1);
        assert!(!dir.path().join("ffmpeg2pass-0.log").exists());
        assert!(!dir.path().join("ffmpeg2pass-0.log.mbtree").exists());
    }

    #[tokio::test]
    async fn test_spawn_failure_is_reported_with_step() {
        let dir = TempDir::new().unwrap();
        // pass 1 succeeded and left its statistics behind
        std::fs::write(dir.path().join("ffmpeg2pass-0.log"), b"stats").unwrap();
        std::fs::write(dir.path().join("ffmpeg2pass-0.log.mbtree"), b"tree").unwrap();
        let runner = Arc::new(ScriptedRunner::new().then_success().then_spawn_error());

        let err = OperationExecutor::new(runner.clone())
            .execute(&two_pass_plan(dir.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, EditError::Spawn { step: 2, .. }));
        assert_eq!(runner.calls().len(), 2);
        assert!(!dir.path().join("ffmpeg2pass-0.log").exists());
        assert!(!dir.path().join("ffmpeg2pass-0.log.mbtree").exists());
    }

    #[tokio::test]
    async fn test_oversized_output_is_flagged() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("out.mp4"), vec![0u8; 4096]).unwrap();
        let plan = two_pass_plan(dir.path()).with_size_budget(1000, 2048);

        let report = OperationExecutor::new(Arc::new(ScriptedRunner::new()))
            .execute(&plan)
            .await
            .unwrap();
        assert!(report.exceeds_limit);
    }

    #[tokio::test]
    async fn test_staging_failure_skips_invocations_and_spares_foreign_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.png"), b"a").unwrap();
        std::fs::write(dir.path().join("img-02.jpg"), b"not ours").unwrap();
        let copies = vec![
            StagedCopy {
                source: dir.path().join("a.png"),
                target: dir.path().join("img-01.jpg"),
            },
            StagedCopy {
                source: dir.path().join("a.png"),
                target: dir.path().join("img-02.jpg"),
            },
        ];
        let plan = OperationPlan::new("images-to-video", dir.path().join("out.mp4"))
            .with_invocation(Invocation::new("ffmpeg", args!["-i", "img-%02d.jpg"], "assemble slideshow"))
            .with_cleanup(copies[0].target.clone())
            .with_cleanup(copies[1].target.clone())
            .with_staging(copies);
        let runner = Arc::new(ScriptedRunner::new());

        let err = OperationExecutor::new(runner.clone()).execute(&plan).await.unwrap_err();
        assert!(matches!(err, EditError::Io(_)));
        assert!(runner.calls().is_empty());
        assert!(!dir.path().join("img-01.jpg").exists());
        assert_eq!(std::fs::read(dir.path().join("img-02.jpg")).unwrap(), b"not ours");
    }
}

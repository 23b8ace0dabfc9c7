//! # FrameForge - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing` (su stderr)
//! - Costruzione della configurazione e della richiesta di editing
//! - Stampa del piano (dry run) o esecuzione, con esito leggibile o JSON
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (flag globali + sottocomando)
//! 2. Configura il logging (INFO o DEBUG a seconda del flag verbose,
//!    `RUST_LOG` se impostato)
//! 3. Valida la configurazione e risolve ffmpeg/ffprobe
//! 4. Raccoglie i metadati, costruisce il piano ed eventualmente lo esegue
//!
//! ## Esempio di utilizzo:
//! ```bash
//! frameforge compress clip.mp4 clip-small.mp4
//! frameforge trim clip.mp4 cut.mp4 --start 0:05:00 --end 1:10:12
//! frameforge --json --dry-run images ./photos slideshow.mp4
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use frameforge::editor::ExecutionReport;
use frameforge::file_manager::FileManager;
use frameforge::json_output::JsonMessage;
use frameforge::platform::PlatformCommands;
use frameforge::tool_resolver::{ToolPathResolver, REQUIRED_TOOLS};
use frameforge::{
    CompressParams, ConcatParams, Config, EditRequest, ExtractAudioParams, ImagesToVideoParams,
    OperationPlan, SpeedParams, Timecode, TrimParams, VideoEditor,
};

#[derive(Parser)]
#[command(name = "frameforge")]
#[command(about = "Common video edits driven through ffmpeg")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output progress and results as JSON lines on stdout
    #[arg(long, global = true)]
    json: bool,

    /// Print the ffmpeg invocations without running them
    #[arg(long, global = true)]
    dry_run: bool,

    /// Replace the output file if it already exists
    #[arg(long, global = true)]
    overwrite: bool,

    /// Path to the ffmpeg binary
    #[arg(long, global = true)]
    ffmpeg: Option<PathBuf>,

    /// Path to the ffprobe binary
    #[arg(long, global = true)]
    ffprobe: Option<PathBuf>,

    /// Directory for two-pass statistics files
    #[arg(long, global = true)]
    work_dir: Option<PathBuf>,

    /// ffmpeg -loglevel value
    #[arg(long, global = true, default_value = "error")]
    log_level: String,
}

#[derive(Subcommand)]
enum Command {
    /// Compress a video to fit under 10 MB (two-pass)
    Compress { input: PathBuf, output: PathBuf },

    /// Cut a video between two timecodes (M:S:F)
    Trim {
        input: PathBuf,
        output: PathBuf,
        /// Start timecode, e.g. 0:05:00
        #[arg(long, default_value = "0:0:0")]
        start: Timecode,
        /// End timecode, e.g. 1:10:12
        #[arg(long)]
        end: Timecode,
    },

    /// Change playback speed (2 = twice as fast); audio is dropped
    Speed {
        input: PathBuf,
        output: PathBuf,
        #[arg(short, long)]
        multiplier: f64,
    },

    /// Join two videos back to back
    Concat {
        first: PathBuf,
        second: PathBuf,
        output: PathBuf,
    },

    /// Build a 1920x1080 slideshow, one second per image
    Images { directory: PathBuf, output: PathBuf },

    /// Extract the audio track of a video
    ExtractAudio { input: PathBuf, output: PathBuf },

    /// Show frame rate, duration and audio presence of a video
    Probe { input: PathBuf },

    /// Check that ffmpeg and ffprobe are available
    Check,
}

impl Command {
    fn into_request(self) -> Option<EditRequest> {
        let request = match self {
            Command::Compress { input, output } => {
                EditRequest::Compress(CompressParams { input, output })
            }
            Command::Trim {
                input,
                output,
                start,
                end,
            } => EditRequest::Trim(TrimParams {
                input,
                output,
                start,
                end,
            }),
            Command::Speed {
                input,
                output,
                multiplier,
            } => EditRequest::Speed(SpeedParams {
                input,
                output,
                multiplier,
            }),
            Command::Concat {
                first,
                second,
                output,
            } => EditRequest::Concat(ConcatParams {
                first,
                second,
                output,
            }),
            Command::Images { directory, output } => {
                EditRequest::ImagesToVideo(ImagesToVideoParams {
                    images_dir: directory,
                    output,
                })
            }
            Command::ExtractAudio { input, output } => {
                EditRequest::ExtractAudio(ExtractAudioParams { input, output })
            }
            Command::Probe { .. } | Command::Check => return None,
        };
        Some(request)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stderr keeps stdout clean for --json
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let json = cli.json;
    let config = Config {
        ffmpeg: cli.ffmpeg,
        ffprobe: cli.ffprobe,
        ffmpeg_log_level: cli.log_level,
        overwrite: cli.overwrite,
        work_dir: cli.work_dir,
        dry_run: cli.dry_run,
        json_output: cli.json,
    };

    let result = run(cli.command, config).await;
    if let Err(ref e) = result {
        if json {
            let details = e.chain().skip(1).map(|c| c.to_string()).collect::<Vec<_>>();
            let details = (!details.is_empty()).then(|| details.join(": "));
            JsonMessage::error(e.to_string(), details).emit();
        }
    }
    result
}

async fn run(command: Command, config: Config) -> Result<()> {
    // check reports missing tool overrides itself
    if matches!(command, Command::Check) {
        config.validate_settings()?;
    } else {
        config.validate()?;
    }
    debug!("Configuration: {}", serde_json::to_string(&config)?);

    match command {
        Command::Check => check_tools(&config),
        Command::Probe { input } => probe(&input, config).await,
        command => {
            let Some(request) = command.into_request() else {
                return Ok(());
            };
            edit(&request, config).await
        }
    }
}

fn check_tools(config: &Config) -> Result<()> {
    info!("System: {}", PlatformCommands::system_info());
    let resolver = ToolPathResolver::new();
    let [ffmpeg, ffprobe] = REQUIRED_TOOLS;
    let overrides = [
        (ffmpeg, config.ffmpeg.as_deref()),
        (ffprobe, config.ffprobe.as_deref()),
    ];
    println!("{}", resolver.get_tools_report(&overrides));

    let missing: Vec<&str> = overrides
        .iter()
        .filter(|(tool, path)| resolver.tool_path(tool, *path).is_none())
        .map(|(tool, _)| *tool)
        .collect();
    if !missing.is_empty() {
        return Err(anyhow::anyhow!("Missing required tools: {}", missing.join(", ")));
    }
    Ok(())
}

async fn probe(input: &Path, config: Config) -> Result<()> {
    let json = config.json_output;
    let editor = VideoEditor::new(config)?;
    let metadata = editor.probe(input).await?;
    let has_audio = editor.has_audio(input).await;

    if json {
        JsonMessage::Probe {
            path: input.to_path_buf(),
            metadata: Some(metadata),
            has_audio,
        }
        .emit();
    } else {
        println!("{}", input.display());
        println!("  Frame rate: {} fps", metadata.frame_rate);
        println!("  Duration:   {} s", metadata.duration_seconds);
        println!("  Audio:      {}", if has_audio { "yes" } else { "no" });
    }
    Ok(())
}

async fn edit(request: &EditRequest, config: Config) -> Result<()> {
    let (json, dry_run) = (config.json_output, config.dry_run);
    let mut editor = VideoEditor::new(config)?;
    let plan = editor.prepare(request).await?;

    if json {
        JsonMessage::plan(&plan, dry_run).emit();
    }
    if dry_run {
        if !json {
            print_plan(&plan);
        }
        return Ok(());
    }

    let report = editor.execute(&plan).await?;
    if json {
        JsonMessage::Complete {
            operation: report.operation.to_string(),
            output: Some(report.output.clone()),
            output_size: report.output_size,
            duration_seconds: report.duration.as_secs_f64(),
        }
        .emit();
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_plan(plan: &OperationPlan) {
    println!("🔍 DRY RUN - {} would:", plan.operation());
    for copy in plan.staging() {
        println!(
            "  stage {} -> {}",
            copy.source.display(),
            copy.target.display()
        );
    }
    for (i, invocation) in plan.invocations().iter().enumerate() {
        println!("  {}. {}", i + 1, invocation);
    }
    for path in plan.cleanup() {
        println!("  remove {}", path.display());
    }
}

fn print_report(report: &ExecutionReport) {
    let size = report
        .output_size
        .map(FileManager::format_size)
        .unwrap_or_else(|| "unknown size".to_string());
    println!(
        "✅ {} completed successfully: {} ({}) in {:.1}s",
        report.operation,
        report.output.display(),
        size,
        report.duration.as_secs_f64()
    );
    if report.exceeds_limit {
        println!("⚠️  The output is larger than the 10 MB target");
    }
}

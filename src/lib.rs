//! # FrameForge Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare del motore di editing video
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom (validazione, probe, esecuzione)
//! - `media`: Classificazione dei file per estensione e codec audio
//! - `timecode`: Aritmetica minuti/secondi/frame e selezioni di trim
//! - `bitrate`: Bitrate target per la compressione a dimensione fissa
//! - `probe`: Metadati tramite ffprobe
//! - `command`: Invocazioni esterne e runner iniettabile
//! - `editor`: Planner, executor e facciata `VideoEditor`
//! - `file_manager`, `platform`, `tool_resolver`: supporto filesystem e tool
//! - `progress`, `json_output`: Avanzamento e output strutturato
//!
//! ## Utilizzo:
//! ```ignore
//! use frameforge::{Config, EditRequest, SpeedParams, VideoEditor};
//!
//! let mut editor = VideoEditor::new(Config::default())?;
//! editor.run(&EditRequest::Speed(SpeedParams {
//!     input: "clip.mp4".into(),
//!     output: "fast.mp4".into(),
//!     multiplier: 2.0,
//! })).await?;
//! ```

pub mod bitrate;
pub mod command;
pub mod config;
pub mod editor;
pub mod error;
pub mod file_manager;
pub mod json_output;
pub mod media;
pub mod platform;
pub mod probe;
pub mod progress;
pub mod timecode;
pub mod tool_resolver;
pub mod utils;

pub use command::{CommandOutput, CommandRunner, Invocation, SystemRunner};
pub use config::Config;
pub use editor::{
    CompressParams, ConcatParams, EditRequest, ExecutionReport, ExtractAudioParams,
    ImagesToVideoParams, OperationPlan, SpeedParams, TrimParams, VideoEditor,
};
pub use error::{EditError, EditResult, ProbeError, ValidationError};
pub use media::{MediaFile, MediaKind};
pub use probe::MediaMetadata;
pub use timecode::{Timecode, TrimSelection};

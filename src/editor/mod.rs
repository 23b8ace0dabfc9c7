//! # Editor Module
//!
//! Il motore delle operazioni video, diviso in sottomoduli:
//! - `operation`: richieste, parametri e `OperationPlan`
//! - `staging`: copie numerate `img-NN.jpg` per lo slideshow
//! - `planner`: validazione e costruzione delle invocazioni ffmpeg
//! - `executor`: esecuzione sequenziale e cleanup
//! - `video_editor`: facciata probe → plan → execute

pub mod operation;
pub mod staging;
pub mod planner;
pub mod executor;
pub mod video_editor;

pub use operation::{
    CompressParams, ConcatParams, EditRequest, ExtractAudioParams, ImagesToVideoParams,
    InputFacts, OperationPlan, SpeedParams, StagedCopy, TrimParams,
};
pub use planner::OperationPlanner;
pub use executor::{ExecutionReport, OperationExecutor};
pub use video_editor::VideoEditor;

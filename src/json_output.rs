//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per chi pilota il
//! binario da un altro processo (una riga JSON per evento su stdout).
//!
//! ## Tipi di messaggi:
//! - `probe`: metadati di un input
//! - `plan`: invocazioni, staging e cleanup previsti
//! - `step_start` / `step_complete`: avanzamento delle invocazioni
//! - `complete`: operazione terminata con successo
//! - `error`: errore di validazione o di esecuzione

use crate::editor::OperationPlan;
use crate::probe::MediaMetadata;
use serde::Serialize;
use std::path::PathBuf;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    /// Metadati di un file
    Probe {
        path: PathBuf,
        metadata: Option<MediaMetadata>,
        has_audio: bool,
    },

    /// Piano pronto per l'esecuzione
    Plan {
        operation: String,
        dry_run: bool,
        steps: Vec<JsonStep>,
        staged_files: usize,
        cleanup: Vec<PathBuf>,
        estimated_size: Option<u64>,
    },

    /// Inizio di una invocazione
    StepStart {
        index: usize,
        total: usize,
        label: String,
    },

    /// Fine di una invocazione
    StepComplete {
        index: usize,
        total: usize,
        label: String,
        duration_seconds: f64,
    },

    /// Operazione completata
    Complete {
        operation: String,
        output: Option<PathBuf>,
        output_size: Option<u64>,
        duration_seconds: f64,
    },

    /// Errore
    Error {
        message: String,
        details: Option<String>,
    },
}

/// Una invocazione nel piano
#[derive(Debug, Serialize)]
pub struct JsonStep {
    pub label: String,
    pub command: String,
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn plan(plan: &OperationPlan, dry_run: bool) -> Self {
        Self::Plan {
            operation: plan.operation().to_string(),
            dry_run,
            steps: plan
                .invocations()
                .iter()
                .map(|inv| JsonStep {
                    label: inv.label().to_string(),
                    command: inv.command_line(),
                })
                .collect(),
            staged_files: plan.staging().len(),
            cleanup: plan.cleanup().to_vec(),
            estimated_size: plan.estimated_size(),
        }
    }

    pub fn error(message: String, details: Option<String>) -> Self {
        Self::Error { message, details }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_tagged() {
        let msg = JsonMessage::StepStart {
            index: 1,
            total: 2,
            label: "first-pass analysis".to_string(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "step_start");
        assert_eq!(json["label"], "first-pass analysis");

        let json = serde_json::to_value(JsonMessage::error("bad".into(), None)).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "bad");
        assert!(json["details"].is_null());
    }
}

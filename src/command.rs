//! # External Command Module
//!
//! Questo modulo modella le invocazioni dei tool esterni (ffmpeg, ffprobe).
//!
//! ## Responsabilità:
//! - `Invocation`: vettore di argomenti immutabile con etichetta diagnostica
//! - `CommandRunner`: capability iniettabile che esegue un'invocazione
//! - `SystemRunner`: implementazione reale basata su `tokio::process`
//!
//! Il planner costruisce le invocazioni, l'executor si limita a eseguirle.
//! Nei test il runner viene sostituito da un fake che registra gli argomenti.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// One external tool call: program, arguments and a purpose label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    label: String,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: Vec<String>, label: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args,
            label: label.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Shell-like rendering for logs and dry runs
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.label, self.command_line())
    }
}

fn quote(arg: &str) -> String {
    if !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=%,[]*+".contains(c))
    {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Captured result of a finished invocation
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Text worth showing when the invocation failed
    pub fn diagnostics(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        match self.code {
            Some(code) => format!("exited with status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Runs invocations against the real tools, or a stand-in in tests
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion. `Err` only when the process could not be started.
    async fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput>;
}

/// Spawns the invocation as a child process and waits for it
#[derive(Debug, Default, Clone)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput> {
        debug!("Running {}", invocation);

        let output = Command::new(invocation.program())
            .args(invocation.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Records every invocation and replays scripted outputs in order.
    /// Once the script is exhausted every call succeeds with empty output.
    #[derive(Default)]
    pub struct ScriptedRunner {
        script: Mutex<VecDeque<std::io::Result<CommandOutput>>>,
        calls: Mutex<Vec<Invocation>>,
    }

    impl ScriptedRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn then_stdout(self, stdout: &str) -> Self {
            self.push(Ok(CommandOutput {
                success: true,
                code: Some(0),
                stdout: stdout.to_string(),
                stderr: String::new(),
            }))
        }

        pub fn then_success(self) -> Self {
            self.then_stdout("")
        }

        pub fn then_failure(self, stderr: &str) -> Self {
            self.push(Ok(CommandOutput {
                success: false,
                code: Some(1),
                stdout: String::new(),
                stderr: stderr.to_string(),
            }))
        }

        pub fn then_spawn_error(self) -> Self {
            self.push(Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no such program",
            )))
        }

        fn push(self, result: std::io::Result<CommandOutput>) -> Self {
            self.script.lock().unwrap().push_back(result);
            self
        }

        pub fn calls(&self) -> Vec<Invocation> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput> {
            self.calls.lock().unwrap().push(invocation.clone());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    Ok(CommandOutput {
                        success: true,
                        code: Some(0),
                        ..Default::default()
                    })
                })
        }
    }
}

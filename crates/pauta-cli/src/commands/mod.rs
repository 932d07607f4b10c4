pub mod extract;
pub mod render;

use pauta_core::config::{parse_display_date, RunConfig};
use pauta_core::error::{ErrorKind, PautaError};
use std::fmt;
use std::path::Path;

/// A failure reported by a command, either directly or from the worker.
#[derive(Debug)]
pub enum CommandError {
    Core(PautaError),
    Job { kind: ErrorKind, message: String },
}

impl CommandError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CommandError::Core(e) => e.kind(),
            CommandError::Job { kind, .. } => *kind,
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Core(e) => write!(f, "{e}"),
            CommandError::Job { message, .. } => f.write_str(message),
        }
    }
}

impl From<PautaError> for CommandError {
    fn from(e: PautaError) -> Self {
        CommandError::Core(e)
    }
}

impl From<std::io::Error> for CommandError {
    fn from(e: std::io::Error) -> Self {
        CommandError::Core(e.into())
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(e: serde_json::Error) -> Self {
        CommandError::Core(e.into())
    }
}

/// Build the run configuration: file first, then `--date` on top.
pub fn load_config(path: Option<&Path>, date: Option<&str>) -> Result<RunConfig, CommandError> {
    let mut config = match path {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if let Some(date) = date {
        config.date = parse_display_date(date)?;
    }
    tracing::debug!(date = %config.display_date(), "configuration loaded");
    Ok(config)
}

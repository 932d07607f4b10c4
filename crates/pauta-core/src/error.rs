use std::fmt;
use std::path::PathBuf;

/// Coarse classification of a failed request, as reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Not a PDF, or the file could not be opened.
    InvalidInput,
    /// Zero tables or zero numbered blocks were extracted.
    NoDataFound,
    /// An extraction backend failed or produced unusable output.
    ExtractionFailure,
    /// The spreadsheet or document could not be built.
    RenderFailure,
    /// The save step was declined. Not a real failure.
    UserCancelled,
    /// Another job already occupies the worker slot.
    Busy,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::NoDataFound => "no data found",
            ErrorKind::ExtractionFailure => "extraction failure",
            ErrorKind::RenderFailure => "render failure",
            ErrorKind::UserCancelled => "cancelled",
            ErrorKind::Busy => "busy",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PautaError {
    #[error("invalid file: {0}")]
    InvalidInput(String),

    #[error("no tables found in the PDF")]
    NoTablesFound,

    #[error("no numbered blocks found in the PDF")]
    NoBlocksFound,

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("{0} not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    ToolNotFound(&'static str),

    #[error("{tool} failed with exit code {code}: {stderr}")]
    ToolFailed {
        tool: &'static str,
        code: i32,
        stderr: String,
    },

    #[error("failed to generate {target}: {reason}")]
    Render {
        target: &'static str,
        reason: String,
    },

    #[error("could not save {}: {source}", .path.display())]
    Save {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("operation cancelled by the user")]
    Cancelled,

    #[error("a job is already running, wait for it to finish")]
    Busy,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PautaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PautaError::InvalidInput(_) | PautaError::Io(_) => ErrorKind::InvalidInput,
            PautaError::NoTablesFound | PautaError::NoBlocksFound => ErrorKind::NoDataFound,
            PautaError::Extraction(_)
            | PautaError::ToolNotFound(_)
            | PautaError::ToolFailed { .. } => ErrorKind::ExtractionFailure,
            PautaError::Render { .. } | PautaError::Save { .. } | PautaError::Json(_) => {
                ErrorKind::RenderFailure
            }
            PautaError::Cancelled => ErrorKind::UserCancelled,
            PautaError::Busy => ErrorKind::Busy,
            PautaError::Config(_) => ErrorKind::InvalidInput,
        }
    }

    pub(crate) fn render(target: &'static str, reason: impl fmt::Display) -> Self {
        PautaError::Render {
            target,
            reason: reason.to_string(),
        }
    }
}

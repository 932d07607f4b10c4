pub mod blocks;
pub mod config;
pub mod error;
pub mod extraction;
pub mod render;
pub mod source;
pub mod table;
pub mod worker;

use std::fmt;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use blocks::Block;
use config::RunConfig;
use error::PautaError;
use extraction::layout_table::LayoutTableDetector;
use extraction::pdftotext::PdftotextExtractor;
use extraction::{TableDetector, TextExtractor};
use source::{is_valid_pdf, read_validated, TempPdf};
use table::CanonicalTable;

/// Which artifact a job produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Tables merged into an `.xlsx` workbook.
    Spreadsheet,
    /// Numbered items laid out in a `.docx` document.
    Document,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputKind::Spreadsheet => write!(f, "spreadsheet"),
            OutputKind::Document => write!(f, "document"),
        }
    }
}

/// A finished output file, still in memory.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub suggested_name: String,
    pub kind: OutputKind,
}

/// The extraction backends a job runs against.
#[derive(Clone)]
pub struct Backends {
    pub tables: Arc<dyn TableDetector>,
    pub text: Arc<dyn TextExtractor>,
}

impl Backends {
    /// Backends built on poppler's command line tools.
    pub fn poppler() -> Self {
        Backends {
            tables: Arc::new(LayoutTableDetector::new()),
            text: Arc::new(PdftotextExtractor::new()),
        }
    }
}

/// One processing request.
#[derive(Debug, Clone)]
pub struct Job {
    pub pdf_path: PathBuf,
    pub kind: OutputKind,
    pub config: RunConfig,
}

/// Backend errors are extraction failures, whatever caused them.
fn extraction_failure(err: PautaError) -> PautaError {
    match err {
        PautaError::Io(e) => PautaError::Extraction(e.to_string()),
        other => other,
    }
}

/// Detect tables in a PDF and merge them into the canonical layout.
pub fn extract_table<R: Read + Seek>(
    source: &mut R,
    detector: &dyn TableDetector,
) -> Result<CanonicalTable, PautaError> {
    let bytes = read_validated(source)?;
    let pdf = TempPdf::from_bytes(&bytes)?;
    tracing::debug!(backend = detector.backend_name(), "detecting tables");
    let fragments = detector
        .detect_tables(pdf.path())
        .map_err(extraction_failure)?;
    table::assemble(&fragments)
}

/// Extract page text from a PDF and cut it into numbered blocks.
///
/// An empty list means the text held no numbered items.
pub fn extract_blocks<R: Read + Seek>(
    source: &mut R,
    extractor: &dyn TextExtractor,
    stop_marker: Option<&str>,
) -> Result<Vec<Block>, PautaError> {
    let bytes = read_validated(source)?;
    let pdf = TempPdf::from_bytes(&bytes)?;
    tracing::debug!(backend = extractor.backend_name(), "extracting text");
    let pages = extractor
        .extract_pages(pdf.path())
        .map_err(extraction_failure)?;
    Ok(blocks::segment_pages(&pages, stop_marker))
}

/// Run a job end to end: validate, extract, render.
///
/// The PDF is opened here, so each job owns its file handle.
pub fn process(job: &Job, backends: &Backends) -> Result<Artifact, PautaError> {
    let path = &job.pdf_path;
    let mut file = File::open(path)
        .map_err(|e| PautaError::InvalidInput(format!("cannot open {}: {e}", path.display())))?;
    if !is_valid_pdf(&mut file) {
        return Err(PautaError::InvalidInput(format!(
            "{} does not look like a PDF",
            path.display()
        )));
    }

    tracing::info!(path = %path.display(), kind = %job.kind, "processing");
    let artifact = match job.kind {
        OutputKind::Spreadsheet => {
            let table = extract_table(&mut file, backends.tables.as_ref())?;
            Artifact {
                bytes: render::render_spreadsheet(&table, &job.config)?,
                suggested_name: job.config.spreadsheet_file_name(),
                kind: job.kind,
            }
        }
        OutputKind::Document => {
            let blocks = extract_blocks(
                &mut file,
                backends.text.as_ref(),
                job.config.stop_marker.as_deref(),
            )?;
            if blocks.is_empty() {
                return Err(PautaError::NoBlocksFound);
            }
            Artifact {
                bytes: render::render_document(&blocks, &job.config)?,
                suggested_name: job.config.document_file_name(),
                kind: job.kind,
            }
        }
    };
    Ok(artifact)
}

/// Write an artifact to the chosen destination.
///
/// `None` means the user declined to pick one: nothing is written and the
/// result is `Cancelled`.
pub fn save_artifact(
    artifact: &Artifact,
    destination: Option<&Path>,
) -> Result<PathBuf, PautaError> {
    let Some(path) = destination else {
        tracing::info!(kind = %artifact.kind, "save declined, discarding artifact");
        return Err(PautaError::Cancelled);
    };
    std::fs::write(path, &artifact.bytes).map_err(|source| PautaError::Save {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), bytes = artifact.bytes.len(), "artifact saved");
    Ok(path.to_path_buf())
}

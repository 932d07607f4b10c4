pub mod layout_table;
pub mod pdftotext;

use std::path::Path;

use crate::error::PautaError;

/// One page's detected table: rows of text cells, as produced by a detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTableFragment {
    pub page_number: usize,
    pub rows: Vec<Vec<String>>,
}

impl RawTableFragment {
    pub fn new(page_number: usize, rows: Vec<Vec<String>>) -> Self {
        RawTableFragment { page_number, rows }
    }
}

/// Backend that finds tables in a PDF.
pub trait TableDetector: Send + Sync {
    /// Detect tables over all pages, returning fragments in page order.
    fn detect_tables(&self, pdf_path: &Path) -> Result<Vec<RawTableFragment>, PautaError>;

    /// Name of this detection backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Backend that extracts plain text per page.
pub trait TextExtractor: Send + Sync {
    /// One entry per page, in order. `None` marks a page whose text could
    /// not be extracted; callers skip it and carry on.
    fn extract_pages(&self, pdf_path: &Path) -> Result<Vec<Option<String>>, PautaError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

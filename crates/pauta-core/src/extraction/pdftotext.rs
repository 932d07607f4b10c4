use crate::error::PautaError;
use crate::extraction::TextExtractor;
use std::ffi::OsStr;
use std::path::Path;
use std::process::Command;

/// Text extraction backend using pdftotext (from poppler-utils).
///
/// Pages are extracted one at a time so a page that poppler chokes on only
/// costs that page.
pub struct PdftotextExtractor;

impl PdftotextExtractor {
    pub fn new() -> Self {
        PdftotextExtractor
    }
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for PdftotextExtractor {
    fn extract_pages(&self, pdf_path: &Path) -> Result<Vec<Option<String>>, PautaError> {
        let count = page_count(pdf_path)?;
        tracing::debug!(pages = count, "extracting text page by page");

        let mut pages = Vec::with_capacity(count);
        for page in 1..=count {
            let number = page.to_string();
            let result = run_tool(
                "pdftotext",
                &[
                    OsStr::new("-enc"),
                    OsStr::new("UTF-8"),
                    OsStr::new("-f"),
                    OsStr::new(&number),
                    OsStr::new("-l"),
                    OsStr::new(&number),
                    pdf_path.as_os_str(),
                    OsStr::new("-"),
                ],
            );
            match result {
                Ok(text) => pages.push(Some(text)),
                Err(e @ PautaError::ToolNotFound(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!(page, error = %e, "skipping unreadable page");
                    pages.push(None);
                }
            }
        }

        Ok(pages)
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

/// Run `pdftotext -layout` over the whole document and split it into pages.
///
/// The layout mode keeps the column alignment that table reconstruction
/// relies on.
pub fn layout_pages(pdf_path: &Path) -> Result<Vec<String>, PautaError> {
    let text = run_tool(
        "pdftotext",
        &[
            OsStr::new("-layout"),
            OsStr::new("-enc"),
            OsStr::new("UTF-8"),
            pdf_path.as_os_str(),
            OsStr::new("-"),
        ],
    )?;
    Ok(split_pages(&text))
}

/// Number of pages reported by `pdfinfo`.
fn page_count(pdf_path: &Path) -> Result<usize, PautaError> {
    let info = run_tool("pdfinfo", &[pdf_path.as_os_str()])?;
    parse_page_count(&info)
        .ok_or_else(|| PautaError::Extraction("pdfinfo did not report a page count".into()))
}

fn parse_page_count(info: &str) -> Option<usize> {
    info.lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .and_then(|rest| rest.trim().parse().ok())
}

/// pdftotext separates pages with a form feed and ends the last one with it.
fn split_pages(text: &str) -> Vec<String> {
    let mut pages: Vec<String> = text.split('\x0c').map(str::to_string).collect();
    if pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    pages
}

fn run_tool(tool: &'static str, args: &[&OsStr]) -> Result<String, PautaError> {
    let output = Command::new(tool).args(args).output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PautaError::ToolNotFound(tool)
        } else {
            PautaError::Extraction(format!("{tool} failed: {e}"))
        }
    })?;

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(PautaError::ToolFailed { tool, code, stderr });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_count() {
        let info = "Title:          Pauta\nPages:          12\nEncrypted:      no\n";
        assert_eq!(parse_page_count(info), Some(12));
        assert_eq!(parse_page_count("Title: x\n"), None);
    }

    #[test]
    fn test_split_pages_drops_trailing_form_feed() {
        let pages = split_pages("page one\n\x0cpage two\n\x0c");
        assert_eq!(pages, vec!["page one\n", "page two\n"]);
    }

    #[test]
    fn test_split_pages_keeps_blank_interior_page() {
        let pages = split_pages("one\x0c\x0cthree\x0c");
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[1], "");
    }
}

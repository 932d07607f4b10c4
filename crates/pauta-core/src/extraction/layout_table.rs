use std::path::Path;

use crate::error::PautaError;
use crate::extraction::pdftotext::layout_pages;
use crate::extraction::{RawTableFragment, TableDetector};

/// Segments starting within this many characters of an anchor belong to it.
const ANCHOR_TOLERANCE: usize = 2;

/// Reconstruct tables from `pdftotext -layout` output.
///
/// pdftotext -layout preserves column alignment using spaces, so a row is a
/// line whose text falls apart into several runs separated by wide gaps.
/// Each page yields at most one fragment.
pub struct LayoutTableDetector {
    /// Lines with fewer cells than this do not start a table row.
    pub min_columns: usize,
}

impl LayoutTableDetector {
    pub fn new() -> Self {
        LayoutTableDetector { min_columns: 3 }
    }
}

impl Default for LayoutTableDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl TableDetector for LayoutTableDetector {
    fn detect_tables(&self, pdf_path: &Path) -> Result<Vec<RawTableFragment>, PautaError> {
        let pages = layout_pages(pdf_path)?;
        let fragments: Vec<RawTableFragment> = pages
            .iter()
            .enumerate()
            .filter_map(|(i, text)| detect_page_table(i + 1, text, self.min_columns))
            .collect();
        tracing::debug!(
            pages = pages.len(),
            fragments = fragments.len(),
            "layout table detection finished"
        );
        Ok(fragments)
    }

    fn backend_name(&self) -> &str {
        "pdftotext-layout"
    }
}

/// A run of text on a layout line, with the character column it starts at.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    start: usize,
    text: String,
}

/// Split a layout line into runs separated by two or more spaces (or a tab).
fn split_segments(line: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut start = 0;
    let mut whitespace_run = 0_usize;

    for (col, ch) in line.chars().enumerate() {
        if ch == '\t' || (ch.is_whitespace() && whitespace_run >= 1) {
            whitespace_run += 1;
            if !current.trim().is_empty() {
                segments.push(Segment {
                    start,
                    text: current.trim().to_string(),
                });
            }
            current.clear();
            continue;
        }

        if ch.is_whitespace() {
            whitespace_run += 1;
            current.push(' ');
            continue;
        }

        if current.trim().is_empty() {
            start = col;
            current.clear();
        }
        whitespace_run = 0;
        current.push(ch);
    }

    if !current.trim().is_empty() {
        segments.push(Segment {
            start,
            text: current.trim().to_string(),
        });
    }

    segments
}

/// Find the table region: from the first to the last line carrying at least
/// `min_columns` cells, plus any wrapped lines directly below the last one.
/// Returns a half-open range of line indices.
fn find_table_region(lines: &[Vec<Segment>], min_columns: usize) -> Option<(usize, usize)> {
    let first = lines.iter().position(|s| s.len() >= min_columns)?;
    let last = lines.iter().rposition(|s| s.len() >= min_columns)?;
    let trailing = lines[last + 1..]
        .iter()
        .take_while(|s| !s.is_empty())
        .count();
    Some((first, last + 1 + trailing))
}

/// Index of the anchor a segment belongs to: the right-most anchor that
/// starts at or before it.
fn column_for(anchors: &[usize], start: usize) -> usize {
    anchors
        .iter()
        .rposition(|&a| a <= start + ANCHOR_TOLERANCE)
        .unwrap_or(0)
}

fn place(row: &mut [String], column: usize, text: &str) {
    let cell = &mut row[column];
    if !cell.is_empty() {
        cell.push(' ');
    }
    cell.push_str(text);
}

fn detect_page_table(
    page_number: usize,
    text: &str,
    min_columns: usize,
) -> Option<RawTableFragment> {
    let lines: Vec<Vec<Segment>> = text.lines().map(split_segments).collect();
    let (start, end) = find_table_region(&lines, min_columns)?;
    let region = &lines[start..end];

    // The widest line (usually the header) defines where columns begin.
    let anchors: Vec<usize> = region
        .iter()
        .rev()
        .max_by_key(|s| s.len())
        .map(|s| s.iter().map(|seg| seg.start).collect())?;

    let mut rows: Vec<Vec<String>> = Vec::new();
    for segments in region {
        if segments.is_empty() {
            continue;
        }
        // Wrapped text: a lone cell, or a line whose first column is empty.
        let continues_row = !rows.is_empty()
            && (segments.len() < 2 || segments[0].start > anchors[0] + ANCHOR_TOLERANCE);
        if !continues_row {
            rows.push(vec![String::new(); anchors.len()]);
        }
        if let Some(row) = rows.last_mut() {
            for seg in segments {
                place(row, column_for(&anchors, seg.start), &seg.text);
            }
        }
    }

    tracing::debug!(
        page = page_number,
        rows = rows.len(),
        columns = anchors.len(),
        "table fragment"
    );
    Some(RawTableFragment::new(page_number, rows))
}

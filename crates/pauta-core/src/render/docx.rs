use docx_rs::{
    BreakType, Docx, Header, PageMargin, PageOrientationType, Paragraph, Run, RunFonts, Shading,
    Table, TableCell, TableRow, WidthType,
};
use std::io::Cursor;

use crate::blocks::Block;
use crate::config::RunConfig;
use crate::error::PautaError;
use crate::render::ooxml::strip_illegal_chars;

const TARGET: &str = "document";

/// Fields left blank under every agenda item, filled in by hand later.
pub const ITEM_TEMPLATE: [&str; 5] = [
    "Autoria: ",
    "Relatoria: ",
    "Assessoria Oposição: ",
    "Minoria: ",
    "POSICIONAMENTO:",
];

pub const HEADER_PROJECT: &str = "Projeto";
pub const HEADER_ANALYSIS: &str = "Análise";

// Letter page in twentieths of a point, width and height swapped.
const PAGE_WIDTH: u32 = 15840;
const PAGE_HEIGHT: u32 = 12240;
const MARGIN: i32 = 1440;
const PROJECT_COLUMN_WIDTH: usize = 7776;
const ANALYSIS_COLUMN_WIDTH: usize = 5184;

// Half-points.
const TITLE_SIZE: usize = 26;
const HEADER_ROW_SIZE: usize = 26;
const BODY_SIZE: usize = 20;

const TITLE_COLOR: &str = "0000FF";
const SHADING: &str = "D3D3D3";
const FONT: &str = "Arial";

/// Lines of the first cell for one block.
pub fn item_lines(block: &Block) -> Vec<String> {
    std::iter::once(format!("{}. {}", block.id, block.text))
        .chain(ITEM_TEMPLATE.iter().map(|s| s.to_string()))
        .collect()
}

/// Render blocks as a landscape document with one table row per block.
pub fn render_document(blocks: &[Block], config: &RunConfig) -> Result<Vec<u8>, PautaError> {
    let title = format!("      {} - {}      ", config.agenda_title, config.display_date());

    let header = Header::new().add_paragraph(paragraph(
        &[title],
        styled_run(TITLE_SIZE, true).color(TITLE_COLOR),
    ));

    let mut rows = vec![TableRow::new(vec![
        cell(PROJECT_COLUMN_WIDTH, &[HEADER_PROJECT.to_string()], HEADER_ROW_SIZE, true)
            .shading(Shading::new().fill(SHADING)),
        cell(ANALYSIS_COLUMN_WIDTH, &[HEADER_ANALYSIS.to_string()], HEADER_ROW_SIZE, true)
            .shading(Shading::new().fill(SHADING)),
    ])];
    rows.extend(blocks.iter().map(|block| {
        TableRow::new(vec![
            cell(PROJECT_COLUMN_WIDTH, &item_lines(block), BODY_SIZE, false),
            cell(ANALYSIS_COLUMN_WIDTH, &[], BODY_SIZE, false),
        ])
    }));
    let table = Table::new(rows).set_grid(vec![PROJECT_COLUMN_WIDTH, ANALYSIS_COLUMN_WIDTH]);

    let docx = Docx::new()
        .page_size(PAGE_WIDTH, PAGE_HEIGHT)
        .page_orient(PageOrientationType::Landscape)
        .page_margin(
            PageMargin::new()
                .top(MARGIN)
                .bottom(MARGIN)
                .left(MARGIN)
                .right(MARGIN),
        )
        .header(header)
        .add_table(table)
        // Word expects a paragraph after a trailing table.
        .add_paragraph(Paragraph::new());

    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|e| PautaError::render(TARGET, e))?;

    let bytes = buffer.into_inner();
    tracing::info!(blocks = blocks.len(), bytes = bytes.len(), "document rendered");
    Ok(bytes)
}

fn styled_run(size: usize, bold: bool) -> Run {
    let run = Run::new()
        .fonts(RunFonts::new().ascii(FONT).hi_ansi(FONT).cs(FONT))
        .size(size);
    if bold {
        run.bold()
    } else {
        run
    }
}

/// A paragraph with a single run; lines are separated by breaks.
fn paragraph(lines: &[String], mut run: Run) -> Paragraph {
    if lines.is_empty() {
        return Paragraph::new();
    }
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        run = run.add_text(strip_illegal_chars(line));
    }
    Paragraph::new().add_run(run)
}

fn cell(width: usize, lines: &[String], size: usize, bold: bool) -> TableCell {
    TableCell::new()
        .width(width, WidthType::Dxa)
        .add_paragraph(paragraph(lines, styled_run(size, bold)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Read;

    fn part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut out = String::new();
        archive
            .by_name(name)
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        out
    }

    fn render(blocks: &[Block]) -> Vec<u8> {
        let config = RunConfig::for_date(NaiveDate::from_ymd_opt(2025, 3, 7).unwrap());
        render_document(blocks, &config).unwrap()
    }

    #[test]
    fn test_item_lines() {
        let lines = item_lines(&Block::new(12, "Projeto de Lei nº 1"));
        assert_eq!(lines[0], "12. Projeto de Lei nº 1");
        assert_eq!(&lines[1..], ITEM_TEMPLATE.map(String::from).as_slice());
    }

    #[test]
    fn test_landscape_section() {
        let doc = part(&render(&[Block::new(1, "A")]), "word/document.xml");
        assert!(doc.contains(r#"w:orient="landscape""#));
        assert!(doc.contains(r#"w:w="15840""#));
        assert!(doc.contains(r#"w:h="12240""#));
        assert!(doc.contains("w:headerReference"));
    }

    #[test]
    fn test_header_carries_title_and_date() {
        let header = part(&render(&[]), "word/header1.xml");
        assert!(header.contains("      PAUTA DE PLENÁRIO - 07/03/2025      "));
        assert!(header.contains(r#"w:val="0000FF""#));
    }

    #[test]
    fn test_one_row_per_block_in_order() {
        let blocks = vec![
            Block::new(2, "Segundo"),
            Block::new(1, "Primeiro & <único>"),
            Block::new(2, "Segundo de novo"),
        ];
        let doc = part(&render(&blocks), "word/document.xml");

        let first = doc.find("2. Segundo<").unwrap();
        let second = doc.find("1. Primeiro &amp; &lt;único").unwrap();
        let third = doc.find("2. Segundo de novo").unwrap();
        assert!(first < second && second < third);
        assert!(doc.find(">Projeto<").unwrap() < first);
        assert_eq!(doc.matches("POSICIONAMENTO:").count(), 3);
    }

    #[test]
    fn test_header_row_shaded() {
        let doc = part(&render(&[]), "word/document.xml");
        assert_eq!(doc.matches(r#"w:fill="D3D3D3""#).count(), 2);
        assert!(doc.contains("Análise"));
    }

    #[test]
    fn test_control_characters_dropped() {
        let doc = part(&render(&[Block::new(1, "PL\u{1}10\u{b}/2024")]), "word/document.xml");
        assert!(!doc.contains('\u{1}'));
        assert!(!doc.contains('\u{b}'));
        assert!(doc.contains("1. PL10/2024"));
    }
}

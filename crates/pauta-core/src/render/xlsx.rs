use regex::Regex;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::config::RunConfig;
use crate::error::PautaError;
use crate::render::ooxml::{
    content_types, is_xml_char, relationships, Package, XmlWriter, NS_OFFICE_RELATIONSHIPS,
    REL_OFFICE_DOCUMENT,
};
use crate::table::{CanonicalTable, Column, COLUMN_COUNT};

pub const SHEET_NAME: &str = "Tabelas";

const TARGET: &str = "spreadsheet";
const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

// cellXfs indices in styles.xml
const STYLE_HEADER: usize = 1;
const STYLE_DATA: usize = 2;
const STYLE_DATA_LABEL: usize = 3;

const LABEL_WIDTH: f64 = 5.0;
const DESCRIPTION_WIDTH: f64 = 70.0;
const TAIL_WIDTH: f64 = 18.0;
const TAIL_COLUMNS: usize = 5;
const MAX_AUTO_WIDTH: f64 = 80.0;
const MIN_AUTO_WIDTH: f64 = 8.0;
const BANNER_HEIGHT: f64 = 30.0;

/// Render a canonical table as a single-sheet workbook.
///
/// Row 1 is a merged banner with the meeting title and date, row 2 holds the
/// column titles, and each table row follows from row 3 on.
pub fn render_spreadsheet(
    table: &CanonicalTable,
    config: &RunConfig,
) -> Result<Vec<u8>, PautaError> {
    let banner = format!("{} - {}", config.meeting_title, config.display_date());
    let mut strings = SharedStrings::default();
    let sheet = sheet_xml(table, &banner, &mut strings)?;

    let mut package = Package::new(TARGET);
    package.add(
        "[Content_Types].xml",
        &content_types(
            TARGET,
            &[
                (
                    "/xl/workbook.xml",
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml",
                ),
                (
                    "/xl/worksheets/sheet1.xml",
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml",
                ),
                (
                    "/xl/styles.xml",
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml",
                ),
                (
                    "/xl/sharedStrings.xml",
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml",
                ),
            ],
        )?,
    )?;
    package.add(
        "_rels/.rels",
        &relationships(TARGET, &[("rId1", REL_OFFICE_DOCUMENT, "xl/workbook.xml")])?,
    )?;
    package.add("xl/workbook.xml", &workbook_xml()?)?;
    package.add(
        "xl/_rels/workbook.xml.rels",
        &relationships(
            TARGET,
            &[
                (
                    "rId1",
                    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet",
                    "worksheets/sheet1.xml",
                ),
                (
                    "rId2",
                    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles",
                    "styles.xml",
                ),
                (
                    "rId3",
                    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings",
                    "sharedStrings.xml",
                ),
            ],
        )?,
    )?;
    package.add("xl/styles.xml", &styles_xml()?)?;
    package.add("xl/sharedStrings.xml", &strings.to_xml()?)?;
    package.add("xl/worksheets/sheet1.xml", &sheet)?;

    let bytes = package.finish()?;
    tracing::info!(rows = table.len(), bytes = bytes.len(), "spreadsheet rendered");
    Ok(bytes)
}

/// Text that already reads like a `_xHHHH_` escape.
static ESCAPE_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"_(x[0-9A-Fa-f]{4}_)").expect("hardcoded escape regex is valid")
});

/// Encode characters XML cannot carry as `_xHHHH_`, the way spreadsheet
/// applications store them in shared strings. Literal `_xHHHH_` text gets
/// its underscore escaped so it reads back unchanged.
pub fn encode_cell_text(text: &str) -> Cow<'_, str> {
    let escaped = ESCAPE_LIKE.replace_all(text, "_x005F_$1");
    if escaped.chars().all(is_xml_char) {
        return escaped;
    }
    let mut out = String::with_capacity(escaped.len() + 8);
    for c in escaped.chars() {
        if is_xml_char(c) {
            out.push(c);
        } else {
            out.push_str(&format!("_x{:04X}_", c as u32));
        }
    }
    Cow::Owned(out)
}

/// Column letters as spreadsheets name them: A..Z, AA, AB, ...
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Width of every column.
///
/// Columns are sized to their longest text (capped), then the trailing
/// columns, the description column and the label column get fixed widths.
/// The tail never reaches the label column.
pub fn column_widths(table: &CanonicalTable) -> [f64; COLUMN_COUNT] {
    let mut widths = [0.0; COLUMN_COUNT];
    for column in Column::ALL {
        let longest = table
            .rows
            .iter()
            .map(|r| r.get(column).chars().count())
            .chain(std::iter::once(column.title().chars().count()))
            .max()
            .unwrap_or(0);
        widths[column.index()] = (longest as f64 * 1.2).clamp(MIN_AUTO_WIDTH, MAX_AUTO_WIDTH);
    }

    let tail = TAIL_COLUMNS.min(COLUMN_COUNT - 1);
    for width in widths.iter_mut().skip(COLUMN_COUNT - tail) {
        *width = TAIL_WIDTH;
    }
    widths[Column::Description.index()] = DESCRIPTION_WIDTH;
    widths[Column::Label.index()] = LABEL_WIDTH;
    widths
}

#[derive(Default)]
struct SharedStrings {
    index: HashMap<String, usize>,
    ordered: Vec<String>,
    references: usize,
}

impl SharedStrings {
    fn intern(&mut self, text: &str) -> usize {
        self.references += 1;
        if let Some(&i) = self.index.get(text) {
            return i;
        }
        let i = self.ordered.len();
        self.index.insert(text.to_string(), i);
        self.ordered.push(text.to_string());
        i
    }

    fn to_xml(&self) -> Result<Vec<u8>, PautaError> {
        let count = self.references.to_string();
        let unique = self.ordered.len().to_string();
        let mut xml = XmlWriter::new(TARGET)?;
        xml.start(
            "sst",
            &[
                ("xmlns", NS_MAIN),
                ("count", count.as_str()),
                ("uniqueCount", unique.as_str()),
            ],
        )?;
        for s in &self.ordered {
            xml.start("si", &[])?;
            xml.element("t", &[("xml:space", "preserve")], s)?;
            xml.end("si")?;
        }
        xml.end("sst")?;
        Ok(xml.finish())
    }
}

fn write_cell(
    xml: &mut XmlWriter,
    strings: &mut SharedStrings,
    reference: &str,
    style: usize,
    text: &str,
) -> Result<(), PautaError> {
    let style = style.to_string();
    if text.is_empty() {
        return xml.empty("c", &[("r", reference), ("s", style.as_str())]);
    }
    let index = strings.intern(&encode_cell_text(text)).to_string();
    xml.start("c", &[("r", reference), ("s", style.as_str()), ("t", "s")])?;
    xml.element("v", &[], &index)?;
    xml.end("c")
}

fn write_row<'a>(
    xml: &mut XmlWriter,
    strings: &mut SharedStrings,
    row_number: usize,
    cells: impl Iterator<Item = (usize, &'a str)>,
) -> Result<(), PautaError> {
    let r = row_number.to_string();
    if row_number == 1 {
        let height = BANNER_HEIGHT.to_string();
        xml.start(
            "row",
            &[
                ("r", r.as_str()),
                ("ht", height.as_str()),
                ("customHeight", "1"),
            ],
        )?;
    } else {
        xml.start("row", &[("r", r.as_str())])?;
    }
    for (col, text) in cells {
        let style = match (row_number, col) {
            (1 | 2, _) => STYLE_HEADER,
            (_, 0) => STYLE_DATA_LABEL,
            _ => STYLE_DATA,
        };
        let reference = format!("{}{}", column_letter(col), row_number);
        write_cell(xml, strings, &reference, style, text)?;
    }
    xml.end("row")
}

fn sheet_xml(
    table: &CanonicalTable,
    banner: &str,
    strings: &mut SharedStrings,
) -> Result<Vec<u8>, PautaError> {
    let mut xml = XmlWriter::new(TARGET)?;
    xml.start(
        "worksheet",
        &[("xmlns", NS_MAIN), ("xmlns:r", NS_OFFICE_RELATIONSHIPS)],
    )?;

    xml.start("cols", &[])?;
    for (i, width) in column_widths(table).iter().enumerate() {
        let n = (i + 1).to_string();
        let width = format!("{width:.2}");
        xml.empty(
            "col",
            &[
                ("min", n.as_str()),
                ("max", n.as_str()),
                ("width", width.as_str()),
                ("customWidth", "1"),
            ],
        )?;
    }
    xml.end("cols")?;

    xml.start("sheetData", &[])?;
    let banner_cells = (0..COLUMN_COUNT).map(|i| (i, if i == 0 { banner } else { "" }));
    write_row(&mut xml, strings, 1, banner_cells)?;
    write_row(
        &mut xml,
        strings,
        2,
        Column::ALL.iter().map(|c| (c.index(), c.title())),
    )?;
    for (i, row) in table.rows.iter().enumerate() {
        let cells = row.values().iter().map(String::as_str).enumerate();
        write_row(&mut xml, strings, i + 3, cells)?;
    }
    xml.end("sheetData")?;

    let merged = format!("A1:{}1", column_letter(COLUMN_COUNT - 1));
    xml.start("mergeCells", &[("count", "1")])?;
    xml.empty("mergeCell", &[("ref", merged.as_str())])?;
    xml.end("mergeCells")?;

    xml.end("worksheet")?;
    Ok(xml.finish())
}

fn workbook_xml() -> Result<Vec<u8>, PautaError> {
    let mut xml = XmlWriter::new(TARGET)?;
    xml.start(
        "workbook",
        &[("xmlns", NS_MAIN), ("xmlns:r", NS_OFFICE_RELATIONSHIPS)],
    )?;
    xml.start("sheets", &[])?;
    xml.empty(
        "sheet",
        &[("name", SHEET_NAME), ("sheetId", "1"), ("r:id", "rId1")],
    )?;
    xml.end("sheets")?;
    xml.end("workbook")?;
    Ok(xml.finish())
}

fn styles_xml() -> Result<Vec<u8>, PautaError> {
    let mut xml = XmlWriter::new(TARGET)?;
    xml.start("styleSheet", &[("xmlns", NS_MAIN)])?;

    xml.start("fonts", &[("count", "3")])?;
    let fonts = [
        ("11", "Calibri", false),
        ("14", "Arial", false),
        ("14", "Arial", true),
    ];
    for (size, family, bold) in fonts {
        xml.start("font", &[])?;
        if bold {
            xml.empty("b", &[])?;
        }
        xml.empty("sz", &[("val", size)])?;
        xml.empty("name", &[("val", family)])?;
        xml.end("font")?;
    }
    xml.end("fonts")?;

    xml.start("fills", &[("count", "3")])?;
    for pattern in ["none", "gray125"] {
        xml.start("fill", &[])?;
        xml.empty("patternFill", &[("patternType", pattern)])?;
        xml.end("fill")?;
    }
    xml.start("fill", &[])?;
    xml.start("patternFill", &[("patternType", "solid")])?;
    xml.empty("fgColor", &[("rgb", "FFD3D3D3")])?;
    xml.empty("bgColor", &[("rgb", "FFD3D3D3")])?;
    xml.end("patternFill")?;
    xml.end("fill")?;
    xml.end("fills")?;

    xml.start("borders", &[("count", "1")])?;
    xml.start("border", &[])?;
    for side in ["left", "right", "top", "bottom", "diagonal"] {
        xml.empty(side, &[])?;
    }
    xml.end("border")?;
    xml.end("borders")?;

    xml.start("cellStyleXfs", &[("count", "1")])?;
    xml.empty(
        "xf",
        &[("numFmtId", "0"), ("fontId", "0"), ("fillId", "0"), ("borderId", "0")],
    )?;
    xml.end("cellStyleXfs")?;

    // default, header, data, data in the label column
    let xfs = [
        ("0", "0", None),
        ("2", "2", Some(("center", "center"))),
        ("1", "0", Some(("left", "top"))),
        ("1", "2", Some(("left", "top"))),
    ];
    let count = xfs.len().to_string();
    xml.start("cellXfs", &[("count", count.as_str())])?;
    for (font, fill, alignment) in xfs {
        let attrs = [
            ("numFmtId", "0"),
            ("fontId", font),
            ("fillId", fill),
            ("borderId", "0"),
            ("xfId", "0"),
        ];
        match alignment {
            None => xml.empty("xf", &attrs)?,
            Some((horizontal, vertical)) => {
                let mut with_apply = attrs.to_vec();
                with_apply.extend([
                    ("applyFont", "1"),
                    ("applyFill", "1"),
                    ("applyAlignment", "1"),
                ]);
                xml.start("xf", &with_apply)?;
                xml.empty(
                    "alignment",
                    &[
                        ("horizontal", horizontal),
                        ("vertical", vertical),
                        ("wrapText", "1"),
                    ],
                )?;
                xml.end("xf")?;
            }
        }
    }
    xml.end("cellXfs")?;

    xml.start("cellStyles", &[("count", "1")])?;
    xml.empty(
        "cellStyle",
        &[("name", "Normal"), ("xfId", "0"), ("builtinId", "0")],
    )?;
    xml.end("cellStyles")?;

    xml.end("styleSheet")?;
    Ok(xml.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{to_canonical, CanonicalRow};
    use calamine::{Data, Reader, Xlsx};
    use chrono::NaiveDate;
    use std::io::{Cursor, Read};

    fn config() -> RunConfig {
        RunConfig::for_date(NaiveDate::from_ymd_opt(2025, 3, 7).unwrap())
    }

    fn cell(range: &calamine::Range<Data>, row: u32, col: u32) -> String {
        match range.get_value((row, col)) {
            Some(Data::String(s)) => s.clone(),
            Some(Data::Empty) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(4), "E");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
    }

    #[test]
    fn test_column_widths() {
        let long = "x".repeat(200);
        let table = to_canonical(vec![vec![
            "1".into(),
            long.clone(),
            "Dep. Ana".into(),
            "Urgência".into(),
            long,
        ]]);
        let widths = column_widths(&table);
        assert_eq!(widths[0], LABEL_WIDTH);
        assert_eq!(widths[1], MAX_AUTO_WIDTH);
        // "Autoria" title is shorter than the cell text
        assert!((widths[2] - 9.6).abs() < 1e-9);
        assert_eq!(widths[4], DESCRIPTION_WIDTH);
        for w in &widths[5..] {
            assert_eq!(*w, TAIL_WIDTH);
        }
    }

    #[test]
    fn test_workbook_preserves_cell_text() {
        let table = CanonicalTable {
            rows: vec![
                CanonicalRow::from_positional(vec![
                    "1".to_string(),
                    "PL 10/2024".to_string(),
                    "Dep. Ana & Dep. Beto".to_string(),
                    String::new(),
                    "Dispõe sobre <algo>".to_string(),
                ]),
                CanonicalRow::from_positional(vec!["2".to_string(), "PL 10/2024".to_string()]),
            ],
        };
        let bytes = render_spreadsheet(&table, &config()).unwrap();

        let mut workbook: Xlsx<_> = calamine::open_workbook_from_rs(Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec![SHEET_NAME.to_string()]);
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();

        assert_eq!(cell(&range, 0, 0), "REUNIÃO DE LÍDERES - 07/03/2025");
        for column in Column::ALL {
            assert_eq!(
                cell(&range, 1, column.index() as u32).trim(),
                column.title().trim()
            );
        }
        assert_eq!(cell(&range, 2, 0), "1");
        assert_eq!(cell(&range, 2, 2), "Dep. Ana & Dep. Beto");
        assert_eq!(cell(&range, 2, 3), "");
        assert_eq!(cell(&range, 2, 4), "Dispõe sobre <algo>");
        assert_eq!(cell(&range, 3, 0), "2");
        assert_eq!(cell(&range, 3, 1), "PL 10/2024");
    }

    #[test]
    fn test_sheet_merges_banner_across_all_columns() {
        let table = to_canonical(vec![vec!["1".into()]]);
        let mut strings = SharedStrings::default();
        let xml = String::from_utf8(sheet_xml(&table, "banner", &mut strings).unwrap()).unwrap();
        assert!(xml.contains(r#"<mergeCell ref="A1:J1"/>"#));
        assert!(xml.contains(r#"<row r="1" ht="30" customHeight="1">"#));
        assert!(xml.contains(r#"<c r="A3" s="3" t="s">"#));
        assert!(xml.contains(r#"<c r="B3" s="2"/>"#));
    }

    #[test]
    fn test_encode_cell_text() {
        assert_eq!(encode_cell_text("PL 10/2024"), "PL 10/2024");
        assert_eq!(encode_cell_text("PL\u{1}10\u{b}/2024"), "PL_x0001_10_x000B_/2024");
        assert_eq!(encode_cell_text("a_x0041_b"), "a_x005F_x0041_b");
        assert_eq!(encode_cell_text("tab\tok"), "tab\tok");
    }

    #[test]
    fn test_control_characters_are_encoded_in_shared_strings() {
        let table = to_canonical(vec![vec!["1".into(), "PL\u{1}10\u{b}/2024".into()]]);
        let bytes = render_spreadsheet(&table, &config()).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut shared = String::new();
        archive
            .by_name("xl/sharedStrings.xml")
            .unwrap()
            .read_to_string(&mut shared)
            .unwrap();
        assert!(!shared.contains('\u{1}'));
        assert!(!shared.contains('\u{b}'));
        assert!(shared.contains("PL_x0001_10_x000B_/2024"));
    }

    #[test]
    fn test_empty_table_still_renders_headers() {
        let bytes = render_spreadsheet(&CanonicalTable::default(), &config()).unwrap();
        let mut workbook: Xlsx<_> = calamine::open_workbook_from_rs(Cursor::new(bytes)).unwrap();
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        assert_eq!(cell(&range, 1, 1), "Proposição");
        assert_eq!(cell(&range, 2, 1), "");
    }
}

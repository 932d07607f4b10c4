use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::PautaError;
use crate::extraction::RawTableFragment;

/// The fixed columns every assembled table exposes, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Label,
    Proposition,
    Authorship,
    Regime,
    Description,
    Rapporteur,
    FloorAgendaRequests,
    Advisor,
    Orientation,
    Remarks,
}

pub const COLUMN_COUNT: usize = 10;

impl Column {
    pub const ALL: [Column; COLUMN_COUNT] = [
        Column::Label,
        Column::Proposition,
        Column::Authorship,
        Column::Regime,
        Column::Description,
        Column::Rapporteur,
        Column::FloorAgendaRequests,
        Column::Advisor,
        Column::Orientation,
        Column::Remarks,
    ];

    /// Column title as printed on the agendas.
    pub fn title(self) -> &'static str {
        match self {
            Column::Label => "  ",
            Column::Proposition => "Proposição",
            Column::Authorship => "Autoria",
            Column::Regime => "Regime",
            Column::Description => "Descrição",
            Column::Rapporteur => "Relator",
            Column::FloorAgendaRequests => "Solicitações de Pauta",
            Column::Advisor => "Assessor",
            Column::Orientation => "Orientação",
            Column::Remarks => "Observações",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// One table row with exactly one value per canonical column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalRow {
    cells: [String; COLUMN_COUNT],
}

impl CanonicalRow {
    /// Assign `values` positionally; missing columns stay empty and values
    /// beyond the last canonical column are dropped.
    pub fn from_positional<I>(values: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut row = CanonicalRow::default();
        for (cell, value) in row.cells.iter_mut().zip(values) {
            *cell = value;
        }
        row
    }

    pub fn get(&self, column: Column) -> &str {
        &self.cells[column.index()]
    }

    pub fn values(&self) -> &[String; COLUMN_COUNT] {
        &self.cells
    }

    pub fn iter(&self) -> impl Iterator<Item = (Column, &str)> {
        Column::ALL
            .iter()
            .zip(self.cells.iter())
            .map(|(c, v)| (*c, v.as_str()))
    }
}

impl Serialize for CanonicalRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(COLUMN_COUNT))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column.title(), value)?;
        }
        map.end()
    }
}

/// Multi-page table merged into the canonical column layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CanonicalTable {
    pub rows: Vec<CanonicalRow>,
}

impl CanonicalTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Merge per-page fragments into one canonical table.
pub fn assemble(fragments: &[RawTableFragment]) -> Result<CanonicalTable, PautaError> {
    if fragments.is_empty() {
        return Err(PautaError::NoTablesFound);
    }

    let mut rows = merge_fragments(fragments);
    if rows.first().is_some_and(|r| is_duplicated_header(r)) {
        tracing::debug!("dropping repeated header row");
        rows.remove(0);
    }

    let table = to_canonical(rows);
    tracing::info!(
        fragments = fragments.len(),
        rows = table.len(),
        "table assembled"
    );
    Ok(table)
}

/// Concatenate fragments in page order.
///
/// Pagination repeats the header row, so every fragment after the first
/// loses its first row, unless that row is all it has.
pub fn merge_fragments(fragments: &[RawTableFragment]) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for (i, fragment) in fragments.iter().enumerate() {
        let skip = usize::from(i > 0 && fragment.rows.len() > 1);
        rows.extend(fragment.rows.iter().skip(skip).cloned());
    }
    rows
}

/// Whether a row is a copy of the column titles.
///
/// The cells are joined with single spaces and searched, case-insensitively,
/// for any of the canonical titles. The label title is two spaces, so an
/// empty interior cell is enough to match.
pub fn is_duplicated_header(row: &[String]) -> bool {
    let joined = row.join(" ").to_lowercase();
    Column::ALL
        .iter()
        .any(|c| joined.contains(&c.title().to_lowercase()))
}

/// Map ragged rows onto the canonical columns by position.
pub fn to_canonical(rows: Vec<Vec<String>>) -> CanonicalTable {
    let rows = rows.into_iter().map(CanonicalRow::from_positional).collect();
    CanonicalTable { rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn fragment(page: usize, rows: &[&[&str]]) -> RawTableFragment {
        RawTableFragment::new(page, rows.iter().map(|r| row(r)).collect())
    }

    fn numbered_row(width: usize, prefix: &str) -> Vec<String> {
        (0..width).map(|i| format!("{prefix}{i}")).collect()
    }

    #[test]
    fn test_merge_drops_repeated_headers() {
        let fragments = vec![
            fragment(1, &[&["H"], &["a"], &["b"]]),
            fragment(2, &[&["H"], &["c"]]),
            fragment(3, &[&["d"]]),
            fragment(4, &[&["H"], &["e"], &["f"]]),
        ];
        let rows = merge_fragments(&fragments);
        let flat: Vec<&str> = rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(flat, vec!["H", "a", "b", "c", "d", "e", "f"]);
    }

    #[test]
    fn test_merge_keeps_first_fragment_whole() {
        let fragments = vec![fragment(1, &[&["x"], &["y"]])];
        assert_eq!(merge_fragments(&fragments), vec![row(&["x"]), row(&["y"])]);
    }

    #[test]
    fn test_header_detection_any_case() {
        assert!(is_duplicated_header(&row(&["", "PROPOSIÇÃO", "autoria"])));
        assert!(is_duplicated_header(&row(&["Observações"])));
        assert!(is_duplicated_header(&row(&["Solicitações de Pauta"])));
    }

    #[test]
    fn test_header_detection_keeps_data() {
        assert!(!is_duplicated_header(&row(&["1", "PL 10/2024", "Dep. Ana"])));
    }

    #[test]
    fn test_header_detection_matches_blank_label() {
        // An empty interior cell joins into the two-space label title.
        assert!(is_duplicated_header(&row(&["1", "", "PL 10/2024"])));
        assert!(!is_duplicated_header(&row(&["", "1", "PL 10/2024"])));
    }

    #[test]
    fn test_assemble_drops_first_row_with_empty_interior_cell() {
        let fragments = vec![fragment(
            1,
            &[&["1", "", "PL 10/2024"], &["2", "PL 11/2024", "Dep. Ana"]],
        )];
        let table = assemble(&fragments).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].get(Column::Label), "2");
    }

    #[test]
    fn test_assemble_drops_header_then_maps() {
        let fragments = vec![fragment(
            1,
            &[
                &["", "Proposição", "Autoria"],
                &["1", "PL 10/2024", "Dep. Ana"],
            ],
        )];
        let table = assemble(&fragments).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].get(Column::Label), "1");
        assert_eq!(table.rows[0].get(Column::Proposition), "PL 10/2024");
        assert_eq!(table.rows[0].get(Column::Authorship), "Dep. Ana");
        assert_eq!(table.rows[0].get(Column::Remarks), "");
    }

    #[test]
    fn test_assemble_keeps_data_first_row() {
        let fragments = vec![fragment(1, &[&["1", "PL 10/2024"], &["2", "PL 11/2024"]])];
        let table = assemble(&fragments).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_assemble_without_fragments() {
        assert!(matches!(assemble(&[]), Err(PautaError::NoTablesFound)));
    }

    #[test]
    fn test_always_ten_columns() {
        for width in [3, 10, 15] {
            let table = to_canonical(vec![numbered_row(width, "v")]);
            let values = table.rows[0].values();
            assert_eq!(values.len(), COLUMN_COUNT);
            for (i, value) in values.iter().enumerate() {
                if i < width {
                    assert_eq!(value, &format!("v{i}"));
                } else {
                    assert_eq!(value, "");
                }
            }
        }
    }

    #[test]
    fn test_ragged_rows_padded() {
        let table = to_canonical(vec![row(&["1", "a", "b", "c", "d"]), row(&["2"])]);
        assert_eq!(table.rows[1].get(Column::Label), "2");
        assert_eq!(table.rows[1].get(Column::Description), "");
        assert_eq!(table.rows[0].get(Column::Description), "d");
    }

    #[test]
    fn test_row_order_preserved() {
        let fragments = vec![
            fragment(1, &[&["3"], &["1"]]),
            fragment(2, &[&["hdr"], &["2"], &["0"]]),
        ];
        let table = assemble(&fragments).unwrap();
        let labels: Vec<&str> = table.rows.iter().map(|r| r.get(Column::Label)).collect();
        assert_eq!(labels, vec!["3", "1", "2", "0"]);
    }

    #[test]
    fn test_row_serializes_in_column_order() {
        let row = CanonicalRow::from_positional(row(&["1", "PL"]));
        let json = serde_json::to_string(&row).unwrap();
        assert!(json.starts_with(r#"{"  ":"1","Proposição":"PL","Autoria":"""#));
        assert!(json.ends_with(r#""Observações":""}"#));
    }
}

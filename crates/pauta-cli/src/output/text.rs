use pauta_core::blocks::Block;
use pauta_core::table::{CanonicalTable, Column};

/// Print the table as tab-separated lines, titles first.
pub fn print_table(table: &CanonicalTable) {
    for line in table_lines(table) {
        println!("{line}");
    }
}

pub fn print_blocks(blocks: &[Block]) {
    for block in blocks {
        println!("{}. {}", block.id, block.text);
    }
}

fn table_lines(table: &CanonicalTable) -> Vec<String> {
    let header = Column::ALL
        .iter()
        .map(|c| c.title().trim())
        .collect::<Vec<_>>()
        .join("\t");
    std::iter::once(header)
        .chain(table.rows.iter().map(|row| row.values().join("\t")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pauta_core::table::to_canonical;

    #[test]
    fn test_table_lines() {
        let table = to_canonical(vec![vec!["1".into(), "PL 1/2025".into()]]);
        let lines = table_lines(&table);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("\tProposição\tAutoria"));
        assert_eq!(lines[1], format!("1\tPL 1/2025{}", "\t".repeat(8)));
    }
}

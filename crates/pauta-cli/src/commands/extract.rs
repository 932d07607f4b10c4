use pauta_core::config::RunConfig;
use pauta_core::extraction::layout_table::LayoutTableDetector;
use pauta_core::extraction::pdftotext::PdftotextExtractor;
use std::fs::File;
use std::path::Path;

use super::CommandError;
use crate::output;

pub fn tables(pdf_file: &Path, output_format: &str) -> Result<(), CommandError> {
    let mut file = File::open(pdf_file)?;
    let table = pauta_core::extract_table(&mut file, &LayoutTableDetector::new())?;

    match output_format {
        "json" => output::json::print(&table)?,
        _ => output::text::print_table(&table),
    }
    eprintln!("{} row(s) extracted", table.len());
    Ok(())
}

pub fn blocks(
    pdf_file: &Path,
    config: &RunConfig,
    output_format: &str,
) -> Result<(), CommandError> {
    let mut file = File::open(pdf_file)?;
    let blocks = pauta_core::extract_blocks(
        &mut file,
        &PdftotextExtractor::new(),
        config.stop_marker.as_deref(),
    )?;

    match output_format {
        "json" => output::json::print(&blocks)?,
        _ => output::text::print_blocks(&blocks),
    }
    eprintln!("{} block(s) extracted", blocks.len());
    Ok(())
}

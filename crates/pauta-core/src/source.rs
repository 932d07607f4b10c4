use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::PautaError;

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8; 5] = b"%PDF-";

/// Check the first five bytes of `source` against the PDF signature.
///
/// The read cursor is restored to where it was. Any I/O failure counts as
/// "not a PDF".
pub fn is_valid_pdf<R: Read + Seek>(source: &mut R) -> bool {
    check_magic(source).unwrap_or(false)
}

fn check_magic<R: Read + Seek>(source: &mut R) -> std::io::Result<bool> {
    let initial = source.stream_position()?;
    source.seek(SeekFrom::Start(0))?;
    let mut header = [0u8; 5];
    let read = source.read_exact(&mut header);
    source.seek(SeekFrom::Start(initial))?;
    match read {
        Ok(()) => Ok(&header == PDF_MAGIC),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

/// Validate `source` and read its full content.
pub fn read_validated<R: Read + Seek>(source: &mut R) -> Result<Vec<u8>, PautaError> {
    if !is_valid_pdf(source) {
        return Err(PautaError::InvalidInput("does not look like a PDF".into()));
    }
    source.seek(SeekFrom::Start(0))?;
    let mut bytes = Vec::new();
    source.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// PDF bytes materialized on disk for backends that only take a path.
///
/// The file is removed when this value is dropped, on success and error
/// paths alike.
pub struct TempPdf {
    file: tempfile::NamedTempFile,
}

impl TempPdf {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PautaError> {
        let mut file = tempfile::Builder::new()
            .prefix("pauta-")
            .suffix(".pdf")
            .tempfile()
            .map_err(|e| PautaError::Extraction(e.to_string()))?;
        file.write_all(bytes)
            .and_then(|()| file.flush())
            .map_err(|e| PautaError::Extraction(e.to_string()))?;
        Ok(TempPdf { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

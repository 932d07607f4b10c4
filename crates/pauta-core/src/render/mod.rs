pub mod docx;
mod ooxml;
pub mod xlsx;

pub use docx::render_document;
pub use xlsx::render_spreadsheet;

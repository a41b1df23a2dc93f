//! Scriptorium Word export
//!
//! Assembles a `.docx` from articles and a dialog, uploads it and hands back
//! a time-limited download URL.

pub mod docx;
pub mod errors;
pub mod processor;

pub use docx::DocxBuilder;
pub use errors::ExportError;
pub use processor::{ExportProcessor, ExportRequest, DEFAULT_EXPORT_TITLE};

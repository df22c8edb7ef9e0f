//! Utility modules.

pub mod file;
pub mod time;

pub use file::{calculate_checksum, collect_pdf_files, has_pdf_extension, sanitize_filename};
pub use time::{duration_ms, elapsed_ms};

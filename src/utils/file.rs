//! File utilities for uploads.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Calculate SHA-256 checksum of raw bytes.
pub fn calculate_checksum(content: &[u8]) -> String {
    let hash = Sha256::digest(content);
    hex::encode(hash)
}

/// Check if a path has a `.pdf` extension (any case).
pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Collect PDF files under `path`, skipping anything matching `exclude`.
///
/// A file path is returned as-is whatever its extension, so callers can
/// upload a single file explicitly.
pub fn collect_pdf_files(path: &Path, exclude: &[String]) -> Result<Vec<PathBuf>, walkdir::Error> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let patterns: Vec<glob::Pattern> = exclude
        .iter()
        .filter_map(|p| glob::Pattern::new(p).ok())
        .collect();

    let mut files = Vec::new();
    for entry in WalkDir::new(path).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        let entry_path = entry.path();

        if !entry_path.is_file() || !has_pdf_extension(entry_path) {
            continue;
        }

        let path_str = entry_path.to_string_lossy();
        if patterns.iter().any(|p| p.matches(&path_str)) {
            continue;
        }

        files.push(entry_path.to_path_buf());
    }

    Ok(files)
}

/// Sanitize a filename by replacing invalid characters.
///
/// Replaces characters that are not allowed in filenames on common operating
/// systems (Windows, macOS, Linux) with hyphens.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect::<String>()
        .trim_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_calculate_checksum() {
        let checksum = calculate_checksum(b"hello world");
        assert_eq!(checksum.len(), 64); // SHA-256 produces 64 hex chars
        assert_eq!(
            checksum,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_has_pdf_extension() {
        assert!(has_pdf_extension(Path::new("report.pdf")));
        assert!(has_pdf_extension(Path::new("REPORT.PDF")));
        assert!(!has_pdf_extension(Path::new("report.txt")));
        assert!(!has_pdf_extension(Path::new("pdf")));
    }

    #[test]
    fn test_collect_pdf_files() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("nested");
        let drafts = dir.path().join("drafts");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir_all(&drafts).unwrap();
        fs::write(dir.path().join("a.pdf"), b"%PDF-").unwrap();
        fs::write(dir.path().join("notes.txt"), b"text").unwrap();
        fs::write(nested.join("b.PDF"), b"%PDF-").unwrap();
        fs::write(drafts.join("c.pdf"), b"%PDF-").unwrap();

        let files = collect_pdf_files(dir.path(), &["*/drafts/*".to_string()]).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.PDF"]);
    }

    #[test]
    fn test_collect_single_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("scan.bin");
        fs::write(&file, b"%PDF-").unwrap();
        assert_eq!(collect_pdf_files(&file, &[]).unwrap(), vec![file]);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("q3/report:final.pdf"), "q3-report-final.pdf");
        assert_eq!(sanitize_filename("/etc/passwd"), "etc-passwd");
    }
}

//! Plain-text corpus helpers used by directory ingestion.
//!
//! Text extraction from PDF/DOCX happens upstream; this only reads `.txt`.
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// A text file discovered under a corpus root, keyed by its file stem.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub doc_id: String,
    pub path: PathBuf,
}

/// List `.txt` files under `root`, sorted by path.
pub fn list_text_files(root: &Path) -> Vec<SourceFile> {
    let mut files: Vec<SourceFile> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("txt"))
        .filter_map(|e| {
            let doc_id = e.path().file_stem()?.to_string_lossy().to_string();
            Some(SourceFile { doc_id, path: e.path().to_path_buf() })
        })
        .collect();
    files.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::debug!(root = %root.display(), count = files.len(), "listed corpus files");
    files
}

/// Separate files whose doc id was already taken by an earlier path.
///
/// Returns `(kept, shadowed)`; the first file in path order keeps the id.
pub fn split_duplicate_ids(files: Vec<SourceFile>) -> (Vec<SourceFile>, Vec<SourceFile>) {
    let mut seen = HashSet::new();
    files.into_iter().partition(|f| seen.insert(f.doc_id.clone()))
}

/// Read a file as UTF-8, replacing invalid sequences instead of failing.
pub fn read_text_lossy(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(_) => {
            let bytes = fs::read(path).map_err(|e| Error::storage(path.display().to_string(), e))?;
            Ok(String::from_utf8_lossy(&bytes).to_string())
        }
    }
}

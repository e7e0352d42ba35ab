//! Input resolution: normalise the `-i` argument to a list of local PDFs.
//!
//! Both stages accept either a single PDF or a `.txt` file list — one
//! relative path per line, resolved against the list file's own directory.
//! Such lists are produced in the data root with e.g.
//! `find . -name '*.pdf' > list.txt`, so relative resolution keeps the list
//! portable together with the data it names.

use crate::error::ChinaXivError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolve the input argument into one or more validated PDF paths.
///
/// A `.txt` input is treated as a file list; anything else as a single PDF.
/// Every resolved path is checked for existence, readability, and the
/// `%PDF` magic bytes before being returned.
pub fn resolve_inputs(input: &Path) -> Result<Vec<PathBuf>, ChinaXivError> {
    if input.extension().is_some_and(|ext| ext == "txt") {
        resolve_list(input)
    } else {
        validate_pdf(input)?;
        Ok(vec![input.to_path_buf()])
    }
}

/// Read a `.txt` file list, resolving each line against the list's parent.
fn resolve_list(list_path: &Path) -> Result<Vec<PathBuf>, ChinaXivError> {
    let content = std::fs::read_to_string(list_path)
        .map_err(|e| ChinaXivError::from_io(list_path, e))?;
    let base = list_path.parent().unwrap_or_else(|| Path::new("."));

    let mut paths = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let path = base.join(line);
        validate_pdf(&path)?;
        paths.push(path);
    }

    if paths.is_empty() {
        return Err(ChinaXivError::EmptyInputList {
            path: list_path.to_path_buf(),
        });
    }

    debug!("resolved {} input files from {}", paths.len(), list_path.display());
    Ok(paths)
}

/// Validate existence, read permission, and PDF magic bytes.
fn validate_pdf(path: &Path) -> Result<(), ChinaXivError> {
    if !path.exists() {
        return Err(ChinaXivError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(ChinaXivError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
            Ok(())
        }
        Err(e) => Err(ChinaXivError::from_io(path, e)),
    }
}

//! Error types for the chinaxiv2mm library.
//!
//! One enum covers both stages. Every variant is fatal for the *document*
//! being processed; whether it is also fatal for the whole batch is the
//! caller's decision (the shipped drivers abort the batch — there is no
//! cross-document failure isolation).
//!
//! The single deliberately non-fatal condition — a page image that fails to
//! decode during row building — never surfaces here at all: the row builder
//! logs it and emits the record with a null image payload instead.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the chinaxiv2mm library.
#[derive(Debug, Error)]
pub enum ChinaXivError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("file is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// A `.txt` file list resolved to zero input documents.
    #[error("input list '{path}' contains no entries")]
    EmptyInputList { path: PathBuf },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided, or it was wrong.
    #[error("PDF '{path}' is encrypted; provide or correct --password")]
    BadPassword { path: PathBuf },

    /// pdfium returned an error while rendering or reading a specific page.
    #[error("page {page} of '{path}' failed: {detail}")]
    PageFailed {
        path: PathBuf,
        page: usize,
        detail: String,
    },

    // ── Extraction-folder errors ──────────────────────────────────────────
    /// Could not create the per-document output folder or a file inside it.
    #[error("failed to write extraction output '{path}': {source}")]
    ExportWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An expected extraction artifact (json/md export, pages dir) is missing
    /// or unreadable.
    #[error("failed to read extraction artifact '{path}': {source}")]
    ArtifactReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The structure-export JSON could not be parsed.
    #[error("invalid structure export '{path}': {source}")]
    InvalidStructureExport {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // ── Row-building errors ───────────────────────────────────────────────
    /// A page filename did not match the `…page-{n}` pattern.
    #[error("cannot parse page number from '{path}' (expected a 'page-N' suffix)")]
    PageNumberUnparsable { path: PathBuf },

    /// Page-image count and page-markdown count disagree. Raised before any
    /// record for the document is emitted.
    #[error("'{document}': {images} page images but {markdowns} page markdown files")]
    PageCountMismatch {
        document: String,
        images: usize,
        markdowns: usize,
    },

    /// A row dictionary was missing a column or held the wrong value type.
    #[error("malformed row: column '{column}' {detail}")]
    MalformedRow {
        column: &'static str,
        detail: String,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The parquet writer failed for a split file.
    #[error("failed to write parquet split '{path}': {source}")]
    ParquetWriteFailed {
        path: PathBuf,
        #[source]
        source: parquet::errors::ParquetError,
    },

    /// Generic I/O failure with the path that caused it.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ChinaXivError {
    /// Attach a path to a raw `io::Error`, mapping the common kinds to their
    /// dedicated variants.
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => ChinaXivError::FileNotFound { path },
            std::io::ErrorKind::PermissionDenied => ChinaXivError::PermissionDenied { path },
            _ => ChinaXivError::Io { path, source },
        }
    }
}

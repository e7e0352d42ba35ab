//! Pipeline stages for building the multimodal dataset.
//!
//! Each submodule implements exactly one step, and both batch stages walk
//! their documents strictly in order — the only state crossing a document
//! boundary is the batch writer's accumulation buffer.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ convert ──▶ extract            (extraction stage)
//! (PDF/list) (pdfium)   ({stem}_docling_output/)
//!
//! input ──▶ rows ──▶ pack                  (packaging stage)
//! (PDF/list) (blocks)  ({stem}_{n}.parquet)
//! ```
//!
//! 1. [`input`]   — resolve the `-i` argument to validated local PDF paths
//! 2. [`convert`] — the external conversion capability behind the
//!    [`convert::DocumentConverter`] seam
//! 3. [`extract`] — persist one output folder per document
//! 4. [`rows`]    — rebuild an extraction folder into the ordered record
//!    sequence
//! 5. [`pack`]    — batch record sequences into Parquet split files

pub mod convert;
pub mod extract;
pub mod input;
pub mod pack;
pub mod rows;

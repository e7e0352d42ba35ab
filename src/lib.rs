//! # chinaxiv2mm
//!
//! Convert ChinaXiv academic PDFs into a structured multimodal dataset.
//!
//! ## Pipeline Overview
//!
//! Two standalone batch stages, each a CLI over this library:
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Extract  one conversion call per document (pdfium), persisted as
//!  │              {stem}_docling_output/: structure JSON, whole-document
//!  │              markdown, pages/{stem}-page-{n}.png + .md
//!  │
//!  └─ 2. Pack     rebuild each folder into an ordered record sequence
//!                 (block 0 = PDF bytes + full markdown + structure JSON,
//!                 blocks 1..N = page image + page markdown + page metadata)
//!                 and flush Parquet splits of `--split_size` documents
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chinaxiv2mm::{run_packaging, resolve_inputs};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let inputs = resolve_inputs(Path::new("data/list.txt"))?;
//!     let splits = run_packaging(&inputs, Path::new("out/chinaxiv_mm"), 200)?;
//!     eprintln!("wrote {} split files", splits.len());
//!     Ok(())
//! }
//! ```
//!
//! The PDF engine sits behind [`DocumentConverter`], so everything past
//! extraction runs without pdfium — useful both for tests and for packaging
//! folders extracted on another machine.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod block;
pub mod config;
pub mod error;
#[cfg(feature = "cli")]
pub mod logging;
pub mod pipeline;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use block::{BlockKind, ChinaXivBlock, ImageSize, PageMeta, Row, RowValue};
pub use config::{ExtractConfig, ExtractConfigBuilder};
pub use error::ChinaXivError;
pub use pipeline::convert::{DocumentConverter, ParsedDocument, ParsedPage, PdfiumConverter};
pub use pipeline::extract::{extract_document, output_dir_for, run_extraction};
pub use pipeline::input::resolve_inputs;
pub use pipeline::pack::{run_packaging, BatchWriter};
pub use pipeline::rows::{convert_to_rows, page_number};

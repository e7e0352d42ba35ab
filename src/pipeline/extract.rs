//! Extraction stage: PDF → per-document output folder.
//!
//! One conversion call per document produces the folder consumed later by
//! the row builder:
//!
//! ```text
//! {stem}_docling_output/
//!   {stem}.json            structure export
//!   {stem}.md              whole-document markdown
//!   pages/
//!     {stem}-page-0.png    rendered page image
//!     {stem}-page-0.md     page markdown
//!     …
//! ```
//!
//! A document-level failure (unreadable PDF, unwritable folder) aborts that
//! document and, through the driver, the whole batch run.

use crate::config::ExtractConfig;
use crate::error::ChinaXivError;
use crate::pipeline::convert::DocumentConverter;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Suffix of the per-document output folder, e.g. `paper_docling_output`.
pub const OUTPUT_DIR_SUFFIX: &str = "_docling_output";

/// File stem of the source PDF, as used in every derived file name.
pub fn document_stem(pdf_path: &Path) -> String {
    pdf_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// The per-document output folder, derived from the source path — it always
/// sits next to the PDF itself.
pub fn output_dir_for(pdf_path: &Path) -> PathBuf {
    let dir_name = format!("{}{}", document_stem(pdf_path), OUTPUT_DIR_SUFFIX);
    match pdf_path.parent() {
        Some(parent) => parent.join(dir_name),
        None => PathBuf::from(dir_name),
    }
}

/// Extract one document into its output folder.
///
/// Invokes `converter` exactly once, then persists page images, page
/// markdown, the structure-export JSON, and the whole-document markdown.
/// Returns the output folder path.
pub fn extract_document(
    converter: &dyn DocumentConverter,
    pdf_path: &Path,
    config: &ExtractConfig,
) -> Result<PathBuf, ChinaXivError> {
    let start = Instant::now();
    let document = converter.convert(pdf_path, config)?;
    info!(
        "converted {} ({} pages) in {:.2}s",
        pdf_path.display(),
        document.pages.len(),
        start.elapsed().as_secs_f64()
    );

    let stem = document_stem(pdf_path);
    let output_dir = output_dir_for(pdf_path);
    let pages_dir = output_dir.join("pages");
    std::fs::create_dir_all(&pages_dir).map_err(|e| ChinaXivError::ExportWriteFailed {
        path: pages_dir.clone(),
        source: e,
    })?;

    for page in &document.pages {
        let png_path = pages_dir.join(format!("{stem}-page-{}.png", page.page_no));
        let mut buf = Vec::new();
        page.image
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .map_err(|e| ChinaXivError::PageFailed {
                path: pdf_path.to_path_buf(),
                page: page.page_no,
                detail: format!("PNG encoding failed: {e}"),
            })?;
        write_file(&png_path, &buf)?;

        let md_path = pages_dir.join(format!("{stem}-page-{}.md", page.page_no));
        write_file(&md_path, page.markdown.as_bytes())?;
    }

    let json = serde_json::to_string(&document.export_to_json()).map_err(|e| {
        ChinaXivError::InvalidStructureExport {
            path: output_dir.join(format!("{stem}.json")),
            source: e,
        }
    })?;
    write_file(&output_dir.join(format!("{stem}.json")), json.as_bytes())?;
    write_file(
        &output_dir.join(format!("{stem}.md")),
        document.export_to_markdown().as_bytes(),
    )?;

    info!("extracted {} → {}", pdf_path.display(), output_dir.display());
    Ok(output_dir)
}

/// Run the extraction stage over a batch of documents, strictly in order.
///
/// One failing document aborts the remainder of the batch.
pub fn run_extraction(
    converter: &dyn DocumentConverter,
    inputs: &[PathBuf],
    config: &ExtractConfig,
) -> Result<(), ChinaXivError> {
    info!("extraction run over {} documents", inputs.len());
    for pdf_path in inputs {
        extract_document(converter, pdf_path, config)?;
    }
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ChinaXivError> {
    std::fs::write(path, bytes).map_err(|e| ChinaXivError::ExportWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

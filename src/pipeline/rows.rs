//! Row builder: extraction folder → ordered [`ChinaXivBlock`] sequence.
//!
//! The folder is derived from the source PDF path, never passed on its own,
//! so the PDF and its extraction output cannot drift apart. Block 0 carries
//! the document itself; blocks 1..N carry the pages in numeric page order.
//!
//! Directory listings come back in arbitrary order and `page-10` sorts
//! before `page-2` lexically, so both page listings are sorted by the number
//! parsed out of the filename by [`page_number`].

use crate::block::{BlockKind, ChinaXivBlock, ImageSize, PageMeta};
use crate::error::ChinaXivError;
use crate::pipeline::extract::{document_stem, output_dir_for};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Matches the trailing page number of a page file stem, e.g.
/// `paper-page-12` → `12`.
static PAGE_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"page-(\d+)$").expect("valid page-number pattern"));

/// Parse the page number embedded in a page file name.
///
/// The contract: the file stem must end in `page-N` with a decimal `N`.
/// Anything else — including numbers too large for `u32` — is a
/// [`ChinaXivError::PageNumberUnparsable`].
pub fn page_number(path: &Path) -> Result<u32, ChinaXivError> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|stem| PAGE_NUMBER_RE.captures(stem))
        .and_then(|caps| caps[1].parse().ok())
        .ok_or_else(|| ChinaXivError::PageNumberUnparsable {
            path: path.to_path_buf(),
        })
}

/// List `pages/*.{ext}` sorted by embedded page number.
fn page_files(pages_dir: &Path, ext: &str) -> Result<Vec<PathBuf>, ChinaXivError> {
    let entries = std::fs::read_dir(pages_dir).map_err(|e| ChinaXivError::ArtifactReadFailed {
        path: pages_dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| ChinaXivError::ArtifactReadFailed {
                path: pages_dir.to_path_buf(),
                source: e,
            })?
            .path();
        if path.extension().is_some_and(|e| e == ext) {
            let number = page_number(&path)?;
            files.push((number, path));
        }
    }

    files.sort_by_key(|(number, _)| *number);
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

/// Read and decode a page image: `(payload bytes, pixel size)`.
///
/// Decode failures are non-fatal by design — the record is still emitted,
/// with a null payload, so one corrupt PNG cannot sink a whole document.
fn read_page_image(path: &Path) -> (Option<Vec<u8>>, ImageSize) {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            warn!("failed to read page image {}: {e}", path.display());
            return (None, ImageSize { width: 0, height: 0 });
        }
    };
    match image::load_from_memory(&bytes) {
        Ok(img) => {
            let size = ImageSize {
                width: img.width(),
                height: img.height(),
            };
            (Some(bytes), size)
        }
        Err(e) => {
            warn!("failed to decode page image {}: {e}", path.display());
            (None, ImageSize { width: 0, height: 0 })
        }
    }
}

/// Build the full record sequence for one extracted document.
///
/// `run_date` is the `%Y%m%d` stamp computed once per packaging run; every
/// block of the run carries the same value.
pub fn convert_to_rows(
    pdf_path: &Path,
    run_date: &str,
) -> Result<Vec<ChinaXivBlock>, ChinaXivError> {
    let output_dir = output_dir_for(pdf_path);
    let stem = document_stem(pdf_path);
    let file_id = pdf_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let pdf_bytes = std::fs::read(pdf_path).map_err(|e| ChinaXivError::from_io(pdf_path, e))?;
    let file_md5 = format!("{:x}", md5::compute(&pdf_bytes));

    // Whole-document exports. The structure JSON is parsed and re-serialised
    // so a truncated export fails here, not in a downstream consumer.
    let json_path = output_dir.join(format!("{stem}.json"));
    let json_text =
        std::fs::read_to_string(&json_path).map_err(|e| ChinaXivError::ArtifactReadFailed {
            path: json_path.clone(),
            source: e,
        })?;
    let structure: serde_json::Value = serde_json::from_str(&json_text).map_err(|e| {
        ChinaXivError::InvalidStructureExport {
            path: json_path.clone(),
            source: e,
        }
    })?;
    let extra = serde_json::to_string(&structure).map_err(|e| {
        ChinaXivError::InvalidStructureExport {
            path: json_path,
            source: e,
        }
    })?;

    let md_path = output_dir.join(format!("{stem}.md"));
    let md_text =
        std::fs::read_to_string(&md_path).map_err(|e| ChinaXivError::ArtifactReadFailed {
            path: md_path,
            source: e,
        })?;

    let mut rows = Vec::new();
    rows.push(ChinaXivBlock {
        file_md5: file_md5.clone(),
        file_id: file_id.clone(),
        block_id: 0,
        text: md_text,
        image: Some(pdf_bytes),
        processed_at: run_date.to_string(),
        kind: BlockKind::RawData,
        extra,
    });

    // Page image/markdown pairs, numerically ordered. Unequal counts mean
    // the extraction folder is inconsistent; no page record is emitted.
    let pages_dir = output_dir.join("pages");
    let img_files = page_files(&pages_dir, "png")?;
    let md_files = page_files(&pages_dir, "md")?;
    if img_files.len() != md_files.len() {
        error!(
            "{file_id}: page file mismatch, {} images vs {} markdown files",
            img_files.len(),
            md_files.len()
        );
        return Err(ChinaXivError::PageCountMismatch {
            document: file_id,
            images: img_files.len(),
            markdowns: md_files.len(),
        });
    }

    for (page_id, (img_file, md_file)) in img_files.iter().zip(md_files.iter()).enumerate() {
        let (image, size) = read_page_image(img_file);
        let page_md =
            std::fs::read_to_string(md_file).map_err(|e| ChinaXivError::ArtifactReadFailed {
                path: md_file.clone(),
                source: e,
            })?;

        let meta = PageMeta {
            page_id,
            page_image_size: size,
            page_text_length: page_md.chars().count(),
        };
        let extra = serde_json::to_string(&meta).map_err(|e| {
            ChinaXivError::InvalidStructureExport {
                path: md_file.clone(),
                source: e,
            }
        })?;

        rows.push(ChinaXivBlock {
            file_md5: file_md5.clone(),
            file_id: file_id.clone(),
            block_id: (page_id + 1) as i64,
            text: page_md,
            image,
            processed_at: run_date.to_string(),
            kind: BlockKind::PageData,
            extra,
        });
    }

    info!(
        "processed {} — {} rows, md5 {}",
        pdf_path.display(),
        rows.len(),
        file_md5
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbaImage};
    use std::fs;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(width, height));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .expect("encode png");
        buf
    }

    /// Build a fake extraction folder with `pages` image/markdown pairs.
    fn fake_document(dir: &Path, stem: &str, pages: usize) -> PathBuf {
        let pdf = dir.join(format!("{stem}.pdf"));
        fs::write(&pdf, format!("%PDF-1.7 body of {stem}")).expect("write pdf");

        let out = dir.join(format!("{stem}_docling_output"));
        let pages_dir = out.join("pages");
        fs::create_dir_all(&pages_dir).expect("mkdir");
        fs::write(
            out.join(format!("{stem}.json")),
            format!(r#"{{"name":"{stem}.pdf","page_count":{pages}}}"#),
        )
        .expect("write json");
        fs::write(out.join(format!("{stem}.md")), "# Whole document").expect("write md");

        for i in 0..pages {
            fs::write(
                pages_dir.join(format!("{stem}-page-{i}.png")),
                png_bytes(10, 20),
            )
            .expect("write png");
            fs::write(
                pages_dir.join(format!("{stem}-page-{i}.md")),
                format!("page {i} text"),
            )
            .expect("write page md");
        }
        pdf
    }

    #[test]
    fn page_number_parses_trailing_digits() {
        assert_eq!(page_number(Path::new("x/p-page-0.png")).unwrap(), 0);
        assert_eq!(page_number(Path::new("x/p-page-12.md")).unwrap(), 12);
    }

    #[test]
    fn page_number_rejects_other_names() {
        assert!(page_number(Path::new("x/cover.png")).is_err());
        assert!(page_number(Path::new("x/page-.png")).is_err());
        assert!(page_number(Path::new("x/page-3-notes.png")).is_err());
    }

    #[test]
    fn listings_sort_numerically_not_lexically() {
        let dir = tempfile::tempdir().expect("tempdir");
        // Created out of order on purpose; page-10 would sort before page-2
        // lexically.
        for n in [10, 2, 1] {
            fs::write(dir.path().join(format!("p-page-{n}.png")), png_bytes(2, 2))
                .expect("write png");
        }
        let files = page_files(dir.path(), "png").expect("list");
        let numbers: Vec<u32> = files.iter().map(|f| page_number(f).unwrap()).collect();
        assert_eq!(numbers, vec![1, 2, 10]);
    }

    #[test]
    fn builds_one_raw_block_plus_one_per_page() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pdf = fake_document(dir.path(), "paper", 3);

        let rows = convert_to_rows(&pdf, "20260825").expect("rows");
        assert_eq!(rows.len(), 4);

        let ids: Vec<i64> = rows.iter().map(|r| r.block_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);

        assert_eq!(rows[0].kind, BlockKind::RawData);
        assert!(rows.iter().skip(1).all(|r| r.kind == BlockKind::PageData));
        assert!(rows.iter().all(|r| r.processed_at == "20260825"));
        assert!(rows.iter().all(|r| r.file_id == "paper.pdf"));

        // Block 0 carries the PDF bytes and the re-serialised structure JSON.
        let pdf_bytes = fs::read(&pdf).expect("read pdf");
        assert_eq!(rows[0].image.as_deref(), Some(pdf_bytes.as_slice()));
        let structure: serde_json::Value =
            serde_json::from_str(&rows[0].extra).expect("structure json");
        assert_eq!(structure["page_count"], 3);

        // Page metadata records the decoded image size and text length.
        let meta: PageMeta = serde_json::from_str(&rows[1].extra).expect("page meta");
        assert_eq!(meta.page_id, 0);
        assert_eq!(meta.page_image_size, ImageSize { width: 10, height: 20 });
        assert_eq!(meta.page_text_length, rows[1].text.chars().count());
    }

    #[test]
    fn md5_is_deterministic_and_payload_sensitive() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a1 = fake_document(dir.path(), "a", 1);
        let b = fake_document(dir.path(), "b", 1);

        let first = convert_to_rows(&a1, "20260825").expect("rows")[0]
            .file_md5
            .clone();
        let again = convert_to_rows(&a1, "20260825").expect("rows")[0]
            .file_md5
            .clone();
        let other = convert_to_rows(&b, "20260825").expect("rows")[0]
            .file_md5
            .clone();

        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(first.len(), 32, "md5 hex digest is 32 chars");
    }

    #[test]
    fn count_mismatch_fails_before_any_page_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pdf = fake_document(dir.path(), "paper", 5);
        // Remove one markdown file: 5 images vs 4 markdowns.
        fs::remove_file(
            dir.path()
                .join("paper_docling_output/pages/paper-page-3.md"),
        )
        .expect("remove");

        match convert_to_rows(&pdf, "20260825") {
            Err(ChinaXivError::PageCountMismatch {
                images, markdowns, ..
            }) => {
                assert_eq!((images, markdowns), (5, 4));
            }
            other => panic!("expected count mismatch, got {other:?}"),
        }
    }

    #[test]
    fn corrupt_page_image_yields_null_payload_and_continues() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pdf = fake_document(dir.path(), "paper", 3);
        fs::write(
            dir.path()
                .join("paper_docling_output/pages/paper-page-1.png"),
            b"not a png at all",
        )
        .expect("corrupt");

        let rows = convert_to_rows(&pdf, "20260825").expect("rows");
        assert_eq!(rows.len(), 4, "all pages still produce records");
        assert!(rows[1].image.is_some());
        assert!(rows[2].image.is_none(), "corrupt page has null payload");
        assert!(rows[3].image.is_some());

        let meta: PageMeta = serde_json::from_str(&rows[2].extra).expect("meta");
        assert_eq!(meta.page_image_size, ImageSize { width: 0, height: 0 });
    }
}

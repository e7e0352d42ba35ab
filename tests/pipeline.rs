//! End-to-end pipeline tests: extraction folder → record sequence → Parquet
//! splits → read-back.
//!
//! The PDF engine is replaced by a stub [`DocumentConverter`], so these run
//! without a pdfium library on disk; the pdfium-backed converter differs only
//! in where the page images and text come from.

use chinaxiv2mm::{
    convert_to_rows, extract_document, BatchWriter, BlockKind, ChinaXivBlock, ChinaXivError,
    DocumentConverter, ExtractConfig, PageMeta, ParsedDocument, ParsedPage,
};
use image::{DynamicImage, Rgba, RgbaImage};
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::RowAccessor;
use std::fs::File;
use std::path::{Path, PathBuf};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Deterministic stub engine: N pages per document, page text derived from
/// the file name so cross-document mix-ups would be caught.
struct StubConverter {
    pages: usize,
}

impl DocumentConverter for StubConverter {
    fn convert(
        &self,
        pdf_path: &Path,
        _config: &ExtractConfig,
    ) -> Result<ParsedDocument, ChinaXivError> {
        let name = pdf_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(ParsedDocument {
            pages: (0..self.pages)
                .map(|i| ParsedPage {
                    page_no: i,
                    image: DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                        16,
                        24,
                        Rgba([i as u8, 0, 0, 255]),
                    )),
                    markdown: format!("# {name} page {i}\n\n中文正文 {i}"),
                })
                .collect(),
            name,
        })
    }
}

fn write_pdf(dir: &Path, stem: &str) -> PathBuf {
    let path = dir.join(format!("{stem}.pdf"));
    std::fs::write(&path, format!("%PDF-1.7 body of {stem}")).expect("write pdf");
    path
}

fn read_split_ids(path: &Path) -> Vec<(String, i64, String)> {
    let reader = SerializedFileReader::new(File::open(path).expect("open split")).expect("reader");
    reader
        .get_row_iter(None)
        .expect("row iter")
        .map(|row| {
            let row = row.expect("row");
            (
                row.get_string(1).expect("file id").clone(),
                row.get_long(3).expect("block id"),
                row.get_string(7).expect("kind").clone(),
            )
        })
        .collect()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn extract_then_rows_yields_contiguous_sequence() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pdf = write_pdf(dir.path(), "paper");

    extract_document(&StubConverter { pages: 4 }, &pdf, &ExtractConfig::default())
        .expect("extract");
    let rows = convert_to_rows(&pdf, "20260825").expect("rows");

    // 1 + pageCount records, ids 0..=pageCount with no gaps.
    assert_eq!(rows.len(), 5);
    let ids: Vec<i64> = rows.iter().map(|r| r.block_id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    assert_eq!(rows[0].kind, BlockKind::RawData);
    assert_eq!(
        rows.iter().filter(|r| r.kind == BlockKind::RawData).count(),
        1
    );

    // Block 0 text is the whole-document markdown; its payload is the PDF.
    assert!(rows[0].text.contains("page 0") && rows[0].text.contains("page 3"));
    assert_eq!(
        rows[0].image.as_deref(),
        Some(std::fs::read(&pdf).expect("pdf bytes").as_slice())
    );

    // Page blocks carry the rendered image and coherent metadata.
    for (i, row) in rows.iter().skip(1).enumerate() {
        assert!(row.text.contains(&format!("page {i}")));
        let meta: PageMeta = serde_json::from_str(&row.extra).expect("page meta");
        assert_eq!(meta.page_id, i);
        assert_eq!(meta.page_image_size.width, 16);
        assert_eq!(meta.page_image_size.height, 24);
        assert_eq!(meta.page_text_length, row.text.chars().count());
        let png = row.image.as_deref().expect("page payload");
        let decoded = image::load_from_memory(png).expect("valid png payload");
        assert_eq!((decoded.width(), decoded.height()), (16, 24));
    }
}

#[test]
fn full_pipeline_packs_documents_in_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let converter = StubConverter { pages: 2 };
    let config = ExtractConfig::default();

    // 5 documents, split size 2 → splits of 2/2/1 documents (6/6/3 rows).
    let pdfs: Vec<PathBuf> = (0..5)
        .map(|i| write_pdf(dir.path(), &format!("doc{i}")))
        .collect();
    for pdf in &pdfs {
        extract_document(&converter, pdf, &config).expect("extract");
    }

    let base = dir.path().join("out").join("chinaxiv_mm");
    std::fs::create_dir_all(base.parent().expect("parent")).expect("mkdir out");
    let mut writer = BatchWriter::new(&base, 2).expect("writer");
    for pdf in &pdfs {
        writer
            .push_document(convert_to_rows(pdf, "20260825").expect("rows"))
            .expect("push");
    }
    let written = writer.finish().expect("finish");

    assert_eq!(written.len(), 3);
    let counts: Vec<usize> = written.iter().map(|p| read_split_ids(p).len()).collect();
    assert_eq!(counts, vec![6, 6, 3]);

    let mut all = Vec::new();
    for path in &written {
        all.extend(read_split_ids(path));
    }
    let expected: Vec<(String, i64, String)> = (0..5)
        .flat_map(|i| {
            let id = format!("doc{i}.pdf");
            [
                (id.clone(), 0, "raw_data".to_string()),
                (id.clone(), 1, "page_data".to_string()),
                (id, 2, "page_data".to_string()),
            ]
        })
        .collect();
    assert_eq!(all, expected, "split concatenation preserves record order");
}

#[test]
fn packaging_row_dictionaries_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pdf = write_pdf(dir.path(), "paper");
    extract_document(&StubConverter { pages: 1 }, &pdf, &ExtractConfig::default())
        .expect("extract");

    for row in convert_to_rows(&pdf, "20260825").expect("rows") {
        let restored = ChinaXivBlock::from_row(&row.to_row()).expect("round trip");
        assert_eq!(restored, row);
    }
}

#[test]
fn missing_extraction_folder_fails_packaging() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pdf = write_pdf(dir.path(), "unextracted");
    assert!(matches!(
        convert_to_rows(&pdf, "20260825"),
        Err(ChinaXivError::ArtifactReadFailed { .. })
    ));
}

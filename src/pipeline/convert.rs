//! The document-conversion capability: PDF in, document tree out.
//!
//! The rest of the crate never talks to a PDF engine directly. It sees
//! [`DocumentConverter`], a one-call-per-document seam that returns a
//! [`ParsedDocument`] — pages with rendered images and page markdown, plus
//! whole-document exports. [`PdfiumConverter`] is the production
//! implementation; tests substitute a stub so the pipeline can be exercised
//! without a pdfium library on disk.

use crate::config::ExtractConfig;
use crate::error::ChinaXivError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use serde_json::json;
use std::path::Path;
use tracing::{debug, info};

/// One parsed page: its rendered image and page-scoped markdown.
pub struct ParsedPage {
    /// 0-based page index.
    pub page_no: usize,
    pub image: DynamicImage,
    pub markdown: String,
}

/// The document tree produced by one conversion call.
pub struct ParsedDocument {
    /// Source file name (with extension).
    pub name: String,
    pub pages: Vec<ParsedPage>,
}

impl ParsedDocument {
    /// Whole-document markdown export: page markdowns in order, separated by
    /// a blank line.
    pub fn export_to_markdown(&self) -> String {
        let mut out = String::new();
        for (i, page) in self.pages.iter().enumerate() {
            if i > 0 {
                out.push_str("\n\n");
            }
            out.push_str(&page.markdown);
        }
        out
    }

    /// Whole-document structure export as JSON.
    pub fn export_to_json(&self) -> serde_json::Value {
        json!({
            "name": self.name,
            "page_count": self.pages.len(),
            "pages": self.pages.iter().map(|p| json!({
                "page_no": p.page_no,
                "image_width": p.image.width(),
                "image_height": p.image.height(),
                "text_length": p.markdown.chars().count(),
            })).collect::<Vec<_>>(),
        })
    }
}

/// The external conversion capability, invoked exactly once per document.
pub trait DocumentConverter {
    fn convert(
        &self,
        pdf_path: &Path,
        config: &ExtractConfig,
    ) -> Result<ParsedDocument, ChinaXivError>;
}

/// pdfium-backed converter: rasterises each page and extracts its text.
#[derive(Debug, Default)]
pub struct PdfiumConverter;

impl PdfiumConverter {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentConverter for PdfiumConverter {
    fn convert(
        &self,
        pdf_path: &Path,
        config: &ExtractConfig,
    ) -> Result<ParsedDocument, ChinaXivError> {
        let pdfium = Pdfium::default();

        let document = pdfium
            .load_pdf_from_file(pdf_path, config.password.as_deref())
            .map_err(|e| {
                let detail = format!("{e:?}");
                if detail.to_lowercase().contains("password") {
                    ChinaXivError::BadPassword {
                        path: pdf_path.to_path_buf(),
                    }
                } else {
                    ChinaXivError::CorruptPdf {
                        path: pdf_path.to_path_buf(),
                        detail,
                    }
                }
            })?;

        let pages = document.pages();
        let total = pages.len() as usize;
        info!("PDF loaded: {} pages", total);

        let mut parsed = Vec::with_capacity(total);
        for idx in 0..total {
            let page = pages
                .get(idx as u16)
                .map_err(|e| ChinaXivError::PageFailed {
                    path: pdf_path.to_path_buf(),
                    page: idx,
                    detail: format!("{e:?}"),
                })?;

            // Render at the page's natural size times the configured scale,
            // clamped so poster-sized pages stay bounded.
            let target_width = ((page.width().value * config.image_scale) as u32)
                .min(config.max_rendered_pixels) as i32;
            let render_config = PdfRenderConfig::new()
                .set_target_width(target_width)
                .set_maximum_height(config.max_rendered_pixels as i32);

            let bitmap =
                page.render_with_config(&render_config)
                    .map_err(|e| ChinaXivError::PageFailed {
                        path: pdf_path.to_path_buf(),
                        page: idx,
                        detail: format!("{e:?}"),
                    })?;
            let image = bitmap.as_image();

            let markdown = page
                .text()
                .map(|t| t.all())
                .map_err(|e| ChinaXivError::PageFailed {
                    path: pdf_path.to_path_buf(),
                    page: idx,
                    detail: format!("{e:?}"),
                })?;

            debug!(
                "page {} → {}x{} px, {} chars",
                idx,
                image.width(),
                image.height(),
                markdown.chars().count()
            );

            parsed.push(ParsedPage {
                page_no: idx,
                image,
                markdown,
            });
        }

        let name = pdf_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(ParsedDocument {
            name,
            pages: parsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn doc_with_pages(texts: &[&str]) -> ParsedDocument {
        ParsedDocument {
            name: "paper.pdf".into(),
            pages: texts
                .iter()
                .enumerate()
                .map(|(i, t)| ParsedPage {
                    page_no: i,
                    image: DynamicImage::ImageRgba8(RgbaImage::new(4, 6)),
                    markdown: t.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn markdown_export_joins_pages_in_order() {
        let doc = doc_with_pages(&["# One", "Two"]);
        assert_eq!(doc.export_to_markdown(), "# One\n\nTwo");
    }

    #[test]
    fn json_export_describes_every_page() {
        let doc = doc_with_pages(&["abc", "de"]);
        let value = doc.export_to_json();
        assert_eq!(value["page_count"], 2);
        assert_eq!(value["pages"][1]["page_no"], 1);
        assert_eq!(value["pages"][1]["text_length"], 2);
        assert_eq!(value["pages"][0]["image_width"], 4);
    }
}

//! The record model: one [`ChinaXivBlock`] per output row.
//!
//! A packaged document is an ordered run of blocks: block 0 carries the raw
//! PDF bytes, the whole-document markdown and the structure-export JSON;
//! blocks 1..N each carry one rendered page image and its page markdown.
//!
//! The external column names are Chinese-language strings fixed by the
//! downstream dataset format. They live in [`columns`] — the single source
//! of truth shared by the row dictionary here and the parquet schema in
//! [`crate::pipeline::pack`]. Nothing else in the crate spells them out.

use crate::error::ChinaXivError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Fixed external column names of the multimodal dataset schema.
///
/// `PAGE_NO` and `BOUNDING_BOX` are reserved columns that are always null in
/// this dataset; they exist so the schema stays union-compatible with other
/// MNBVC multimodal sources.
pub mod columns {
    pub const FILE_MD5: &str = "文件md5";
    pub const FILE_ID: &str = "文件id";
    pub const PAGE_NO: &str = "页码";
    pub const BLOCK_ID: &str = "块id";
    pub const TEXT: &str = "文本";
    pub const IMAGE: &str = "图片";
    pub const PROCESSED_AT: &str = "处理时间";
    pub const DATA_TYPE: &str = "数据类型";
    pub const BOUNDING_BOX: &str = "bounding_box";
    pub const EXTRA: &str = "额外信息";

    /// All columns in canonical (parquet schema) order.
    pub const ALL: [&str; 10] = [
        FILE_MD5,
        FILE_ID,
        PAGE_NO,
        BLOCK_ID,
        TEXT,
        IMAGE,
        PROCESSED_AT,
        DATA_TYPE,
        BOUNDING_BOX,
        EXTRA,
    ];
}

/// Which kind of payload a block carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    /// Block 0: original PDF bytes + full-document markdown + structure JSON.
    RawData,
    /// Blocks 1..N: one rendered page image + page markdown.
    PageData,
}

impl BlockKind {
    /// Wire name used in the `数据类型` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::RawData => "raw_data",
            BlockKind::PageData => "page_data",
        }
    }

    /// Parse the wire name back. Unknown tags are a malformed-row error.
    pub fn parse(s: &str) -> Result<Self, ChinaXivError> {
        match s {
            "raw_data" => Ok(BlockKind::RawData),
            "page_data" => Ok(BlockKind::PageData),
            other => Err(ChinaXivError::MalformedRow {
                column: columns::DATA_TYPE,
                detail: format!("unknown kind '{other}'"),
            }),
        }
    }
}

/// Pixel dimensions of a rendered page image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// Structured metadata for a page block, serialised into the `额外信息`
/// column as JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// 0-based page index within the document.
    pub page_id: usize,
    pub page_image_size: ImageSize,
    /// Length of the page markdown, in characters.
    pub page_text_length: usize,
}

/// A single value in a row dictionary.
///
/// Binary payloads stay raw bytes here; only [`ChinaXivBlock::to_json`]
/// base64-encodes them for text export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowValue {
    Null,
    Int(i64),
    Text(String),
    Bytes(Vec<u8>),
}

/// A row dictionary keyed by the fixed column names in [`columns`].
pub type Row = BTreeMap<&'static str, RowValue>;

/// One row of the multimodal dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChinaXivBlock {
    /// MD5 hex digest of the binary payload (PDF bytes for block 0, page
    /// image bytes for the rest).
    pub file_md5: String,
    /// Source document identifier: the PDF file name.
    pub file_id: String,
    /// 0-based sequence id; 0 is always the whole-document block.
    pub block_id: i64,
    /// Full-document markdown (block 0) or single-page markdown.
    pub text: String,
    /// Raw payload bytes; `None` when a page image failed to decode.
    pub image: Option<Vec<u8>>,
    /// Run date, `%Y%m%d`, stamped once per packaging run.
    pub processed_at: String,
    pub kind: BlockKind,
    /// Stringified metadata: structure-export JSON or [`PageMeta`] JSON.
    pub extra: String,
}

impl ChinaXivBlock {
    /// Serialise into a row dictionary keyed by the external column names.
    ///
    /// The two reserved columns are emitted as null so every row carries the
    /// full schema.
    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert(columns::FILE_MD5, RowValue::Text(self.file_md5.clone()));
        row.insert(columns::FILE_ID, RowValue::Text(self.file_id.clone()));
        row.insert(columns::PAGE_NO, RowValue::Null);
        row.insert(columns::BLOCK_ID, RowValue::Int(self.block_id));
        row.insert(columns::TEXT, RowValue::Text(self.text.clone()));
        row.insert(
            columns::IMAGE,
            match &self.image {
                Some(bytes) => RowValue::Bytes(bytes.clone()),
                None => RowValue::Null,
            },
        );
        row.insert(
            columns::PROCESSED_AT,
            RowValue::Text(self.processed_at.clone()),
        );
        row.insert(
            columns::DATA_TYPE,
            RowValue::Text(self.kind.as_str().to_string()),
        );
        row.insert(columns::BOUNDING_BOX, RowValue::Null);
        row.insert(columns::EXTRA, RowValue::Text(self.extra.clone()));
        row
    }

    /// Parse a row dictionary back into a block.
    ///
    /// `额外信息` stays an opaque string — kind-specific metadata typing is
    /// not reconstructed.
    pub fn from_row(row: &Row) -> Result<Self, ChinaXivError> {
        Ok(ChinaXivBlock {
            file_md5: text_field(row, columns::FILE_MD5)?,
            file_id: text_field(row, columns::FILE_ID)?,
            block_id: int_field(row, columns::BLOCK_ID)?,
            text: text_field(row, columns::TEXT)?,
            image: bytes_field(row, columns::IMAGE)?,
            processed_at: text_field(row, columns::PROCESSED_AT)?,
            kind: BlockKind::parse(&text_field(row, columns::DATA_TYPE)?)?,
            extra: text_field(row, columns::EXTRA)?,
        })
    }

    /// JSON export of the row with the image payload base64-encoded.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut map = serde_json::Map::new();
        for (name, value) in self.to_row() {
            let json = match value {
                RowValue::Null => serde_json::Value::Null,
                RowValue::Int(i) => serde_json::Value::from(i),
                RowValue::Text(s) => serde_json::Value::from(s),
                RowValue::Bytes(b) => serde_json::Value::from(STANDARD.encode(b)),
            };
            map.insert(name.to_string(), json);
        }
        serde_json::to_string(&serde_json::Value::Object(map))
    }

    /// First 100 characters of the text, for log lines and `Display`.
    pub fn text_preview(&self) -> String {
        self.text.chars().take(100).collect()
    }
}

impl fmt::Display for ChinaXivBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=block {:04}=", self.block_id)?;
        writeln!(
            f,
            "file: {}  kind: {}  processed: {}",
            self.file_id,
            self.kind.as_str(),
            self.processed_at
        )?;
        writeln!(f, "text: {}", self.text_preview())
    }
}

fn text_field(row: &Row, column: &'static str) -> Result<String, ChinaXivError> {
    match row.get(column) {
        Some(RowValue::Text(s)) => Ok(s.clone()),
        Some(other) => Err(ChinaXivError::MalformedRow {
            column,
            detail: format!("expected text, got {other:?}"),
        }),
        None => Err(ChinaXivError::MalformedRow {
            column,
            detail: "is missing".into(),
        }),
    }
}

fn int_field(row: &Row, column: &'static str) -> Result<i64, ChinaXivError> {
    match row.get(column) {
        Some(RowValue::Int(i)) => Ok(*i),
        Some(other) => Err(ChinaXivError::MalformedRow {
            column,
            detail: format!("expected integer, got {other:?}"),
        }),
        None => Err(ChinaXivError::MalformedRow {
            column,
            detail: "is missing".into(),
        }),
    }
}

fn bytes_field(row: &Row, column: &'static str) -> Result<Option<Vec<u8>>, ChinaXivError> {
    match row.get(column) {
        Some(RowValue::Bytes(b)) => Ok(Some(b.clone())),
        Some(RowValue::Null) | None => Ok(None),
        Some(other) => Err(ChinaXivError::MalformedRow {
            column,
            detail: format!("expected bytes or null, got {other:?}"),
        }),
    }
}

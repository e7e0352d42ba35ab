//! Packaging stage: record sequences → size-bounded Parquet splits.
//!
//! [`BatchWriter`] folds per-document record sequences into a running buffer
//! and flushes a `{stem}_{split}.parquet` file every `split_size` documents
//! (documents, not records — page counts vary too much for a record bound to
//! give predictable file sizes). The final flush may be undersized.
//!
//! The Parquet schema is generated from [`crate::block::columns`], so the
//! wire names here can never drift from the row dictionary.

use crate::block::{columns, ChinaXivBlock};
use crate::error::ChinaXivError;
use crate::pipeline::rows::convert_to_rows;
use parquet::basic::{Compression, ConvertedType, Repetition, Type as PhysicalType};
use parquet::data_type::{ByteArray, ByteArrayType, Int64Type};
use parquet::errors::ParquetError;
use parquet::file::properties::WriterProperties;
use parquet::file::writer::{SerializedFileWriter, SerializedRowGroupWriter};
use parquet::schema::types::{Type, TypePtr};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Parquet schema for [`ChinaXivBlock`] rows, in [`columns::ALL`] order.
pub fn block_schema() -> Result<TypePtr, ParquetError> {
    let utf8 = |name: &str, repetition| {
        Type::primitive_type_builder(name, PhysicalType::BYTE_ARRAY)
            .with_converted_type(ConvertedType::UTF8)
            .with_repetition(repetition)
            .build()
            .map(Arc::new)
    };
    let int64 = |name: &str, repetition| {
        Type::primitive_type_builder(name, PhysicalType::INT64)
            .with_repetition(repetition)
            .build()
            .map(Arc::new)
    };
    let binary = |name: &str, repetition| {
        Type::primitive_type_builder(name, PhysicalType::BYTE_ARRAY)
            .with_repetition(repetition)
            .build()
            .map(Arc::new)
    };

    let fields = vec![
        utf8(columns::FILE_MD5, Repetition::REQUIRED)?,
        utf8(columns::FILE_ID, Repetition::REQUIRED)?,
        int64(columns::PAGE_NO, Repetition::OPTIONAL)?,
        int64(columns::BLOCK_ID, Repetition::REQUIRED)?,
        utf8(columns::TEXT, Repetition::REQUIRED)?,
        binary(columns::IMAGE, Repetition::OPTIONAL)?,
        utf8(columns::PROCESSED_AT, Repetition::REQUIRED)?,
        utf8(columns::DATA_TYPE, Repetition::REQUIRED)?,
        utf8(columns::BOUNDING_BOX, Repetition::OPTIONAL)?,
        utf8(columns::EXTRA, Repetition::REQUIRED)?,
    ];

    Ok(Arc::new(
        Type::group_type_builder("chinaxiv_block")
            .with_fields(fields)
            .build()?,
    ))
}

fn next_column<'a, W: std::io::Write + Send>(
    row_group: &'a mut SerializedRowGroupWriter<'_, W>,
) -> Result<parquet::file::writer::SerializedColumnWriter<'a>, ParquetError> {
    row_group
        .next_column()?
        .ok_or_else(|| ParquetError::General("schema has no column left to write".into()))
}

fn write_required_utf8<W: std::io::Write + Send>(
    row_group: &mut SerializedRowGroupWriter<'_, W>,
    values: Vec<ByteArray>,
) -> Result<(), ParquetError> {
    let mut col = next_column(row_group)?;
    col.typed::<ByteArrayType>().write_batch(&values, None, None)?;
    col.close()
}

fn write_required_int64<W: std::io::Write + Send>(
    row_group: &mut SerializedRowGroupWriter<'_, W>,
    values: Vec<i64>,
) -> Result<(), ParquetError> {
    let mut col = next_column(row_group)?;
    col.typed::<Int64Type>().write_batch(&values, None, None)?;
    col.close()
}

fn write_optional_bytes<'a, W: std::io::Write + Send>(
    row_group: &mut SerializedRowGroupWriter<'_, W>,
    values: impl Iterator<Item = Option<&'a [u8]>>,
) -> Result<(), ParquetError> {
    let mut def_levels = Vec::new();
    let mut present = Vec::new();
    for value in values {
        match value {
            Some(bytes) => {
                def_levels.push(1);
                present.push(ByteArray::from(bytes.to_vec()));
            }
            None => def_levels.push(0),
        }
    }
    let mut col = next_column(row_group)?;
    col.typed::<ByteArrayType>()
        .write_batch(&present, Some(&def_levels), None)?;
    col.close()
}

fn write_null_int64<W: std::io::Write + Send>(
    row_group: &mut SerializedRowGroupWriter<'_, W>,
    row_count: usize,
) -> Result<(), ParquetError> {
    let def_levels = vec![0i16; row_count];
    let mut col = next_column(row_group)?;
    col.typed::<Int64Type>()
        .write_batch(&[], Some(&def_levels), None)?;
    col.close()
}

fn write_null_utf8<W: std::io::Write + Send>(
    row_group: &mut SerializedRowGroupWriter<'_, W>,
    row_count: usize,
) -> Result<(), ParquetError> {
    let def_levels = vec![0i16; row_count];
    let mut col = next_column(row_group)?;
    col.typed::<ByteArrayType>()
        .write_batch(&[], Some(&def_levels), None)?;
    col.close()
}

/// Write one split file: all buffered rows as a single row group, columns in
/// schema order.
fn write_split(path: &Path, rows: &[ChinaXivBlock]) -> Result<(), ParquetError> {
    let schema = block_schema()?;
    let props = Arc::new(
        WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build(),
    );
    let file = File::create(path)?;
    let mut writer = SerializedFileWriter::new(file, schema, props)?;

    let mut row_group = writer.next_row_group()?;
    let utf8s = |f: fn(&ChinaXivBlock) -> &str| -> Vec<ByteArray> {
        rows.iter().map(|r| ByteArray::from(f(r))).collect()
    };

    write_required_utf8(&mut row_group, utf8s(|r| &r.file_md5))?;
    write_required_utf8(&mut row_group, utf8s(|r| &r.file_id))?;
    write_null_int64(&mut row_group, rows.len())?;
    write_required_int64(&mut row_group, rows.iter().map(|r| r.block_id).collect())?;
    write_required_utf8(&mut row_group, utf8s(|r| &r.text))?;
    write_optional_bytes(&mut row_group, rows.iter().map(|r| r.image.as_deref()))?;
    write_required_utf8(&mut row_group, utf8s(|r| &r.processed_at))?;
    write_required_utf8(
        &mut row_group,
        rows.iter()
            .map(|r| ByteArray::from(r.kind.as_str()))
            .collect(),
    )?;
    write_null_utf8(&mut row_group, rows.len())?;
    write_required_utf8(&mut row_group, utf8s(|r| &r.extra))?;

    row_group.close()?;
    writer.close()?;
    Ok(())
}

/// Accumulates per-document record sequences and flushes split files.
///
/// Every pushed record ends up in exactly one output file; file order
/// follows the split index and records are never reordered.
pub struct BatchWriter {
    parent: PathBuf,
    stem: String,
    split_size: usize,
    buffer: Vec<ChinaXivBlock>,
    buffered_docs: usize,
    split_index: usize,
    written: Vec<PathBuf>,
}

impl BatchWriter {
    /// `base` is the output base path; splits land next to it as
    /// `{stem}_{n}.parquet`. `split_size` is a count of documents.
    pub fn new(base: &Path, split_size: usize) -> Result<Self, ChinaXivError> {
        if split_size == 0 {
            return Err(ChinaXivError::InvalidConfig(
                "split size must be ≥ 1".into(),
            ));
        }
        let stem = base
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        let parent = base
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self {
            parent,
            stem,
            split_size,
            buffer: Vec::new(),
            buffered_docs: 0,
            split_index: 0,
            written: Vec::new(),
        })
    }

    fn split_path(&self, index: usize) -> PathBuf {
        self.parent.join(format!("{}_{}.parquet", self.stem, index))
    }

    /// Fold one document's record sequence into the buffer, flushing a split
    /// file once `split_size` documents have accumulated.
    pub fn push_document(&mut self, rows: Vec<ChinaXivBlock>) -> Result<(), ChinaXivError> {
        self.buffer.extend(rows);
        self.buffered_docs += 1;
        if self.buffered_docs >= self.split_size {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ChinaXivError> {
        let path = self.split_path(self.split_index);
        write_split(&path, &self.buffer).map_err(|e| ChinaXivError::ParquetWriteFailed {
            path: path.clone(),
            source: e,
        })?;
        info!(
            "split {} done — {} rows from {} documents → {}",
            self.split_index,
            self.buffer.len(),
            self.buffered_docs,
            path.display()
        );
        self.written.push(path);
        self.buffer.clear();
        self.buffered_docs = 0;
        self.split_index += 1;
        Ok(())
    }

    /// Flush any remaining documents as a final, possibly undersized split.
    /// Returns the split files written, in split order.
    pub fn finish(mut self) -> Result<Vec<PathBuf>, ChinaXivError> {
        if !self.buffer.is_empty() {
            self.flush()?;
        }
        Ok(self.written)
    }
}

/// The `%Y%m%d` stamp shared by every record of one packaging run.
pub fn run_date() -> String {
    chrono::Local::now().format("%Y%m%d").to_string()
}

/// Run the packaging stage: row-build each input document in order and feed
/// the batch writer. Returns the split files written.
pub fn run_packaging(
    inputs: &[PathBuf],
    output_base: &Path,
    split_size: usize,
) -> Result<Vec<PathBuf>, ChinaXivError> {
    let stamp = run_date();
    info!(
        "packaging run over {} documents, split size {}, stamp {}",
        inputs.len(),
        split_size,
        stamp
    );

    let mut writer = BatchWriter::new(output_base, split_size)?;
    for pdf_path in inputs {
        let rows = convert_to_rows(pdf_path, &stamp)?;
        writer.push_document(rows)?;
    }
    writer.finish()
}

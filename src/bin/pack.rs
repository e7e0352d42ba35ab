//! Packaging-stage CLI: extracted folders → Parquet split files.
//!
//! A thin shim over the library: resolves the input list, then hands the
//! batch to [`chinaxiv2mm::run_packaging`].

use anyhow::{Context, Result};
use chinaxiv2mm::{logging, resolve_inputs, run_packaging};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Package one extracted document
  chinaxiv-pack -i paper.pdf -o out/chinaxiv_mm

  # Package a corpus, 200 documents per parquet file
  chinaxiv-pack -i /data/list.txt -o /data/out/chinaxiv_mm -s 200

OUTPUT:
  {output_file stem}_{split}.parquet, one file per --split_size documents,
  plus a final undersized file for the remainder. With default settings a
  split lands around 500–1000 MB.

  Each document contributes 1 + pageCount rows: row 0 holds the raw PDF
  bytes, full markdown and structure JSON; rows 1..N hold one page image
  and its page markdown each.
"#;

/// Package extracted ChinaXiv folders into multimodal Parquet splits.
#[derive(Parser, Debug)]
#[command(
    name = "chinaxiv-pack",
    version,
    about = "Package extracted ChinaXiv folders into multimodal Parquet splits",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// A PDF file, or a .txt list of relative paths (one per line, resolved
    /// against the list's directory). Each PDF must already have its
    /// extraction folder next to it.
    #[arg(short = 'i', long = "input_file")]
    input_file: PathBuf,

    /// Base path for output files; splits are written as {stem}_{n}.parquet.
    #[arg(short = 'o', long = "output_file")]
    output_file: PathBuf,

    /// Documents per output file.
    #[arg(short = 's', long = "split_size", default_value_t = 200)]
    split_size: usize,

    /// Directory for the per-run log file.
    #[arg(short = 'l', long = "log_dir", default_value = "logs")]
    log_dir: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = logging::init(&cli.log_dir, "to_mm").context("failed to set up logging")?;
    info!("logging to {}", log_path.display());

    let inputs = resolve_inputs(&cli.input_file)
        .with_context(|| format!("failed to resolve input '{}'", cli.input_file.display()))?;

    if let Some(parent) = cli.output_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }

    let written = run_packaging(&inputs, &cli.output_file, cli.split_size)
        .context("packaging run failed")?;

    info!(
        "packaging complete: {} documents → {} split files",
        inputs.len(),
        written.len()
    );
    Ok(())
}

//! Extraction-stage CLI: PDFs → per-document output folders.
//!
//! A thin shim over the library that maps CLI flags to [`ExtractConfig`]
//! and drives the sequential batch loop.

use anyhow::{Context, Result};
use chinaxiv2mm::{logging, resolve_inputs, run_extraction, ExtractConfig, PdfiumConverter};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract a single document
  chinaxiv-extract -i paper.pdf

  # Extract a whole corpus from a file list
  # (generate with: cd /data && find . -name '*.pdf' > list.txt)
  chinaxiv-extract -i /data/list.txt -l /data/logs

  # Sharper page images for small-font scans
  chinaxiv-extract -i paper.pdf --scale 3.0

OUTPUT LAYOUT (per document, next to the source PDF):
  {stem}_docling_output/
    {stem}.json            structure export
    {stem}.md              whole-document markdown
    pages/{stem}-page-{n}.png
    pages/{stem}-page-{n}.md
"#;

/// Extract ChinaXiv PDFs into per-document image + markdown folders.
#[derive(Parser, Debug)]
#[command(
    name = "chinaxiv-extract",
    version,
    about = "Extract ChinaXiv PDFs into per-document image + markdown folders",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// A PDF file, or a .txt list of relative paths (one per line, resolved
    /// against the list's directory).
    #[arg(short = 'i', long = "input_file")]
    input_file: PathBuf,

    /// Directory for the per-run log file.
    #[arg(short = 'l', long = "log_dir", default_value = "logs")]
    log_dir: PathBuf,

    /// Page-image render scale (0.5–4.0).
    #[arg(long, env = "CHINAXIV_SCALE", default_value_t = 2.0)]
    scale: f32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "CHINAXIV_PASSWORD")]
    password: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = logging::init(&cli.log_dir, "docling_convert")
        .context("failed to set up logging")?;
    info!("logging to {}", log_path.display());

    let mut builder = ExtractConfig::builder().image_scale(cli.scale);
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }
    let config = builder.build().context("invalid configuration")?;

    let inputs = resolve_inputs(&cli.input_file)
        .with_context(|| format!("failed to resolve input '{}'", cli.input_file.display()))?;

    let converter = PdfiumConverter::new();
    run_extraction(&converter, &inputs, &config).context("extraction run failed")?;

    info!("extraction complete: {} documents", inputs.len());
    Ok(())
}

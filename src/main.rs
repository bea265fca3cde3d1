use activity_pdf::cdp::CdpEngine;
use activity_pdf::convert::OfficeConverter;
use activity_pdf::pipeline::Converter;
use activity_pdf::ConverterConfig;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Render an activity-player activity into a single PDF
#[derive(Parser, Debug)]
#[command(name = "activity-pdf", version, about)]
struct Cli {
    /// Player URL containing an `activity` or `sequence` parameter
    url: String,

    /// Directory the merged PDF is written to
    #[arg(short, long, env = "ACTIVITY_PDF_OUTPUT", default_value = ".")]
    output: PathBuf,

    /// Directory for per-page snapshots
    #[arg(long, env = "ACTIVITY_PDF_TMP_DIR", default_value = "tmp_pdfs")]
    tmp_dir: PathBuf,

    /// Also convert the PDF to DOCX
    #[arg(long)]
    docx: bool,

    /// Office suite used for DOCX conversion (default: soffice on PATH)
    #[arg(long, env = "ACTIVITY_PDF_OFFICE")]
    office: Option<PathBuf>,

    /// Chrome/Chromium executable (default: auto-detect)
    #[arg(long, env = "CHROME")]
    chrome: Option<PathBuf>,

    /// Seconds to wait for a page's content to appear
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Scroll polls per page before measuring its height
    #[arg(long, default_value_t = 20)]
    scroll_iterations: u32,
}

fn run(cli: Cli) -> activity_pdf::Result<()> {
    let config = ConverterConfig {
        temp_dir: cli.tmp_dir,
        browser_path: cli.chrome,
        element_timeout_ms: cli.timeout_secs.saturating_mul(1000),
        scroll_iterations: cli.scroll_iterations,
        ..Default::default()
    };

    let mut converter = Converter::new(config)?;
    if cli.docx {
        converter = converter.with_document_converter(Box::new(OfficeConverter::new(cli.office)?));
    }

    let report = converter.run::<CdpEngine>(&cli.url, &cli.output)?;
    println!("PDF: {}", report.pdf.final_path.display());
    if let Some(docx) = report.docx {
        println!("DOCX: {}", docx.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Conversion failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

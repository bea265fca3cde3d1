//! Secondary format conversion of the finished PDF.
//!
//! The converter is a black box: it receives the merged PDF and an output
//! directory and hands back the path of the converted document.

use crate::{Error, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::process::Command;

/// External conversion capability
pub trait DocumentConverter {
    /// Convert `pdf` and write the result into `out_dir`
    fn convert(&self, pdf: &Path, out_dir: &Path) -> Result<PathBuf>;
}

/// Converts PDFs to DOCX with a headless office suite (`soffice`)
#[derive(Debug, Clone)]
pub struct OfficeConverter {
    program: PathBuf,
}

impl OfficeConverter {
    const CANDIDATES: &'static [&'static str] = &["soffice", "libreoffice"];

    /// Use `program`, or look up `soffice`/`libreoffice` on `PATH`
    pub fn new(program: Option<PathBuf>) -> Result<Self> {
        if let Some(program) = program {
            return Ok(Self { program });
        }

        Self::CANDIDATES
            .iter()
            .find_map(|name| which::which(name).ok())
            .map(|program| {
                debug!("Found office suite at {}", program.display());
                Self { program }
            })
            .ok_or_else(|| {
                Error::Conversion(format!(
                    "none of {:?} found on PATH",
                    Self::CANDIDATES
                ))
            })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl DocumentConverter for OfficeConverter {
    fn convert(&self, pdf: &Path, out_dir: &Path) -> Result<PathBuf> {
        info!("→ Starting DOCX conversion…");
        let output = Command::new(&self.program)
            .arg("--headless")
            .arg("--infilter=writer_pdf_import")
            .arg("--convert-to")
            .arg("docx")
            .arg("--outdir")
            .arg(out_dir)
            .arg(pdf)
            .output()
            .map_err(|e| {
                Error::Conversion(format!("failed to run '{}': {}", self.program.display(), e))
            })?;

        if !output.status.success() {
            return Err(Error::Conversion(format!(
                "'{}' exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stem = pdf
            .file_stem()
            .ok_or_else(|| Error::Conversion(format!("'{}' has no file name", pdf.display())))?;
        let docx = out_dir.join(format!("{}.docx", stem.to_string_lossy()));
        if !docx.exists() {
            return Err(Error::Conversion(format!(
                "converter did not produce '{}'",
                docx.display()
            )));
        }
        Ok(docx)
    }
}

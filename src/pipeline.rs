//! End-to-end conversion run.
//!
//! Sequence: resolve the URL, launch the browser, fetch metadata, assemble the
//! PDF and optionally hand it to a [`DocumentConverter`]. The browser is
//! closed on every exit path once it has been launched.

use crate::assembler::{ensure_dirs, sanitize_filename, AssembledDocument, Assembler};
use crate::convert::DocumentConverter;
use crate::metadata::{fetch_metadata, HttpMetadataSource, MetadataSource};
use crate::reference::resolve;
use crate::{ActivityReference, ConverterConfig, Engine, Result};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// What a successful run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionReport {
    /// Activity title as published, before sanitisation
    pub title: String,
    pub pdf: AssembledDocument,
    pub docx: Option<PathBuf>,
}

/// Orchestrates one conversion run per call
pub struct Converter {
    config: ConverterConfig,
    metadata: Box<dyn MetadataSource>,
    document_converter: Option<Box<dyn DocumentConverter>>,
}

impl Converter {
    /// Converter fetching metadata over HTTP
    pub fn new(config: ConverterConfig) -> Result<Self> {
        let metadata = HttpMetadataSource::new(&config)?;
        Ok(Self::with_metadata_source(config, Box::new(metadata)))
    }

    pub fn with_metadata_source(config: ConverterConfig, metadata: Box<dyn MetadataSource>) -> Self {
        Self {
            config,
            metadata,
            document_converter: None,
        }
    }

    /// Also convert the finished PDF with `converter`
    pub fn with_document_converter(mut self, converter: Box<dyn DocumentConverter>) -> Self {
        self.document_converter = Some(converter);
        self
    }

    /// Convert `url` into `out_dir` with a freshly launched `E`
    pub fn run<E: Engine>(&self, url: &str, out_dir: &Path) -> Result<ConversionReport> {
        self.run_with(url, out_dir, E::new)
    }

    /// Like [`Converter::run`], launching the engine with `launch`.
    ///
    /// The URL is resolved before anything is launched or fetched, so a
    /// malformed reference never starts a browser.
    pub fn run_with<E, F>(&self, url: &str, out_dir: &Path, launch: F) -> Result<ConversionReport>
    where
        E: Engine,
        F: FnOnce(&ConverterConfig) -> Result<E>,
    {
        let reference = resolve(url)?;
        if let Some(hint) = reference.page_hint() {
            debug!("Ignoring page hint '{}'; every page is rendered", hint);
        }
        ensure_dirs(&[out_dir, self.config.temp_dir.as_path()])?;

        let mut engine = launch(&self.config)?;
        let result = self.convert(&mut engine, &reference, out_dir);
        if let Err(e) = engine.close() {
            warn!("Failed to close browser: {}", e);
        }
        result
    }

    fn convert<E: Engine>(
        &self,
        engine: &mut E,
        reference: &ActivityReference,
        out_dir: &Path,
    ) -> Result<ConversionReport> {
        let metadata = fetch_metadata(self.metadata.as_ref(), reference)?;
        let safe_title = sanitize_filename(&metadata.title);

        let pdf = Assembler::new(&self.config).assemble(
            engine,
            reference,
            &metadata.pages,
            &safe_title,
            out_dir,
        )?;

        let docx = match &self.document_converter {
            Some(converter) => {
                let docx = converter.convert(&pdf.final_path, out_dir)?;
                info!("DOCX saved: {}", docx.display());
                Some(docx)
            }
            None => None,
        };

        Ok(ConversionReport {
            title: metadata.title,
            pdf,
            docx,
        })
    }
}

//! Shared helpers: an in-memory browser and tiny PDFs to feed it.

#![allow(dead_code)]

use activity_pdf::{ConverterConfig, Engine, Error, PrintOptions, Result};
use lopdf::{Dictionary, Document, Object, Stream};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Browser fake that prints a one-page PDF tagged with the page it was
/// pointed at (`home` for the landing view, the page id otherwise).
#[derive(Default)]
pub struct FakeEngine {
    /// Labels whose content container never appears
    pub failing: Vec<String>,
    pub visited: Vec<String>,
    pub printed: Vec<PrintOptions>,
    pub closed: Arc<AtomicBool>,
    current: String,
}

impl FakeEngine {
    pub fn failing(labels: &[&str]) -> Self {
        Self {
            failing: labels.iter().map(|l| l.to_string()).collect(),
            ..Default::default()
        }
    }
}

pub fn label_for(url: &str) -> String {
    url.split("page=page_")
        .nth(1)
        .and_then(|rest| rest.split('&').next())
        .unwrap_or("home")
        .to_string()
}

impl Engine for FakeEngine {
    fn new(_config: &ConverterConfig) -> Result<Self> {
        Ok(Self::default())
    }

    fn navigate(&mut self, url: &str) -> Result<()> {
        self.visited.push(url.to_string());
        self.current = label_for(url);
        Ok(())
    }

    fn wait_for_element(&mut self, _selector: &str, timeout_ms: u64) -> Result<()> {
        if self.failing.contains(&self.current) {
            Err(Error::Timeout(timeout_ms))
        } else {
            Ok(())
        }
    }

    fn evaluate_script(&mut self, _script: &str) -> Result<serde_json::Value> {
        Ok(serde_json::json!(960))
    }

    fn print_to_pdf(&mut self, options: &PrintOptions) -> Result<Vec<u8>> {
        self.printed.push(options.clone());
        Ok(sample_pdf(&self.current))
    }

    fn close(self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Configuration without delays, keeping snapshots under `root`
pub fn fast_config(root: &Path) -> ConverterConfig {
    ConverterConfig {
        temp_dir: root.join("tmp_pdfs"),
        settle_delay_ms: 0,
        scroll_iterations: 2,
        scroll_interval_ms: 0,
        ..Default::default()
    }
}

/// A single-page PDF whose page carries `Marker = label`
pub fn sample_pdf(label: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content_id = doc.add_object(Stream::new(Dictionary::new(), Vec::new()));
    let page_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        (
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(900),
                Object::Integer(1056),
            ]),
        ),
        ("Contents", Object::Reference(content_id)),
        ("Marker", Object::string_literal(label)),
    ]));
    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(1)),
            ("Kids", Object::Array(vec![Object::Reference(page_id)])),
        ])),
    );
    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Page markers of the PDF at `path`, in page order
pub fn markers(path: &Path) -> Vec<String> {
    let doc = Document::load(path).expect("merged PDF should load");
    doc.get_pages()
        .into_values()
        .map(|id| match doc.get_dictionary(id).unwrap().get(b"Marker").unwrap() {
            Object::String(bytes, _) => String::from_utf8_lossy(bytes).into_owned(),
            other => panic!("unexpected marker {:?}", other),
        })
        .collect()
}

/// Files left in `dir`, sorted
pub fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

//! Merging of page snapshots into one PDF with `lopdf`.
//!
//! Every source document is renumbered into its own object id range, its
//! page dictionaries are re-parented under a fresh page tree and everything
//! else except catalogs, page trees and outlines is carried over. Pages keep
//! the order of the input list, then the order inside each source.

use crate::{Error, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Load the PDFs at `paths` and merge them in order
pub fn merge_files(paths: &[PathBuf]) -> Result<Document> {
    let documents = paths
        .iter()
        .map(|path| {
            Document::load(path)
                .map_err(|e| Error::Pdf(format!("Failed to load '{}': {}", path.display(), e)))
        })
        .collect::<Result<Vec<_>>>()?;
    merge_documents(documents)
}

/// Merge already loaded documents in order
pub fn merge_documents(documents: Vec<Document>) -> Result<Document> {
    if documents.is_empty() {
        return Err(Error::Pdf("No documents to merge".to_string()));
    }

    let mut max_id: u32 = 1;
    let mut page_order: Vec<ObjectId> = Vec::new();
    let mut pages: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for mut doc in documents {
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        for page_id in doc.get_pages().into_values() {
            let page = doc.get_object(page_id)?.clone();
            page_order.push(page_id);
            pages.insert(page_id, page);
        }

        for (object_id, object) in doc.objects {
            match object.type_name().unwrap_or(b"") {
                b"Catalog" | b"Pages" | b"Page" | b"Outlines" | b"Outline" => {}
                _ => {
                    objects.insert(object_id, object);
                }
            }
        }
    }

    let mut merged = Document::with_version("1.5");
    merged.objects.extend(objects);
    merged.max_id = max_id;

    let pages_id = merged.new_object_id();
    for (page_id, page) in pages {
        if let Object::Dictionary(mut dict) = page {
            dict.set("Parent", Object::Reference(pages_id));
            merged.objects.insert(page_id, Object::Dictionary(dict));
        }
    }

    let kids: Vec<Object> = page_order.iter().map(|&id| Object::Reference(id)).collect();
    let count = kids.len() as i64;
    merged.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
        ])),
    );

    let catalog_id = merged.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    merged.trailer.set("Root", Object::Reference(catalog_id));

    merged.renumber_objects();
    merged.compress();
    Ok(merged)
}

/// Serialize `document` to `path`, returning its page count
pub fn write_document(document: &mut Document, path: &Path) -> Result<usize> {
    let mut bytes = Vec::new();
    document
        .save_to(&mut bytes)
        .map_err(|e| Error::Pdf(format!("Failed to serialize merged PDF: {}", e)))?;
    std::fs::write(path, bytes).map_err(|source| Error::OutputWrite {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(document.get_pages().len())
}

#[cfg(test)]
pub(crate) mod test_support {
    use lopdf::{Dictionary, Document, Object, Stream};

    /// A PDF with `pages` empty pages, each tagged with `Marker = "<label>-<n>"`
    pub(crate) fn sample_pdf(label: &str, pages: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let kids = (1..=pages)
            .map(|n| {
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
                            Object::Integer(1200),
                        ]),
                    ),
                    ("Contents", Object::Reference(content_id)),
                    (
                        "Marker",
                        Object::string_literal(format!("{}-{}", label, n)),
                    ),
                ]));
                Object::Reference(page_id)
            })
            .collect::<Vec<_>>();

        doc.objects.insert(
            pages_id,
            Object::Dictionary(Dictionary::from_iter([
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Count", Object::Integer(pages as i64)),
                ("Kids", Object::Array(kids)),
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

    /// Page markers of a PDF in page order
    pub(crate) fn markers(doc: &Document) -> Vec<String> {
        doc.get_pages()
            .into_values()
            .map(|id| {
                let page = doc.get_dictionary(id).unwrap();
                match page.get(b"Marker").unwrap() {
                    Object::String(bytes, _) => String::from_utf8_lossy(bytes).into_owned(),
                    other => panic!("unexpected marker {:?}", other),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{markers, sample_pdf};
    use super::*;

    #[test]
    fn merges_in_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = Vec::new();
        for (label, count) in [("home", 1), ("p1", 2), ("p2", 1)] {
            let path = dir.path().join(format!("{}.pdf", label));
            std::fs::write(&path, sample_pdf(label, count)).unwrap();
            paths.push(path);
        }

        let mut merged = merge_files(&paths).unwrap();
        let out = dir.path().join("merged.pdf");
        let count = write_document(&mut merged, &out).unwrap();
        assert_eq!(count, 4);

        let reloaded = Document::load(&out).unwrap();
        assert_eq!(
            markers(&reloaded),
            vec!["home-1", "p1-1", "p1-2", "p2-1"]
        );
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(merge_documents(Vec::new()), Err(Error::Pdf(_))));
    }

    #[test]
    fn unreadable_snapshot_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();
        match merge_files(&[path]) {
            Err(Error::Pdf(msg)) => assert!(msg.contains("broken.pdf")),
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }
}

//! Assembly of page snapshots into the final document.
//!
//! The assembler renders the home view and every content page into the temp
//! directory, keeps only the snapshots that rendered, orders them (home view
//! first, then content pages by ascending numeric page id, then pages with a
//! non-numeric id by file name), merges them into a collision-free output path and removes the
//! snapshots afterwards.

use crate::merge;
use crate::player::{navigation_url, page_token};
use crate::renderer::render_page;
use crate::{ActivityReference, ConverterConfig, Engine, Error, PageDescriptor, Result};
use log::{debug, info, warn};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Where a snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// The landing view, rendered without a page token
    Home,
    Content,
}

/// One page snapshot written to the temp directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub kind: PageKind,
    /// Numeric page id; `None` sorts after every ordered page, by file name
    pub order: Option<u64>,
    pub temp_path: PathBuf,
    pub succeeded: bool,
}

impl RenderedPage {
    fn sort_key(&self) -> (u8, u64, String) {
        let name = self
            .temp_path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match (self.kind, self.order) {
            (PageKind::Home, _) => (0, 0, String::new()),
            (PageKind::Content, Some(order)) => (1, order, String::new()),
            (PageKind::Content, None) => (2, 0, name),
        }
    }
}

/// Order snapshots for merging: home view, ordered content, then by name
pub fn sort_rendered(pages: &mut [RenderedPage]) {
    pages.sort_by_key(RenderedPage::sort_key);
}

/// The merged output of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledDocument {
    pub final_path: PathBuf,
    /// Number of snapshots merged into the document
    pub merged_page_count: usize,
}

/// Replace characters that are illegal in file names with `_`
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if (c as u32) < 0x20 => '_',
            c => c,
        })
        .collect()
}

/// `path` itself when free, otherwise `stem(1).ext`, `stem(2).ext`, ...
///
/// Only checks existence; concurrent runs targeting the same name may race.
pub fn unique_output_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let parent = path.parent().unwrap_or_else(|| Path::new(""));

    (1u64..)
        .map(|n| parent.join(format!("{}({}){}", stem, n, ext)))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

/// Create every directory in `dirs` if it does not exist
pub fn ensure_dirs(dirs: &[&Path]) -> Result<()> {
    for dir in dirs {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Renders, orders and merges the pages of one activity
pub struct Assembler<'a> {
    config: &'a ConverterConfig,
}

impl<'a> Assembler<'a> {
    pub fn new(config: &'a ConverterConfig) -> Self {
        Self { config }
    }

    /// Render the home view and all `pages`, then merge them into
    /// `<out_dir>/<safe_title>.pdf` (or a numbered variant).
    ///
    /// Pages that fail to render are skipped. Fails with [`Error::Assembly`]
    /// when nothing rendered; no output file is created in that case.
    pub fn assemble<E: Engine + ?Sized>(
        &self,
        engine: &mut E,
        reference: &ActivityReference,
        pages: &[PageDescriptor],
        safe_title: &str,
        out_dir: &Path,
    ) -> Result<AssembledDocument> {
        ensure_dirs(&[self.config.temp_dir.as_path(), out_dir])?;

        let mut rendered = Vec::with_capacity(pages.len() + 1);

        let home_url = navigation_url(&self.config.player_base_url, reference, None);
        let home_path = self.config.temp_dir.join(format!("{}_home.pdf", safe_title));
        rendered.push(self.render(engine, &home_url, home_path, PageKind::Home, None));

        for page in pages {
            let token = page_token(&page.id);
            let url = navigation_url(&self.config.player_base_url, reference, Some(&token));
            let path = self.config.temp_dir.join(format!(
                "{}_page{}.pdf",
                safe_title,
                sanitize_filename(&page.id)
            ));
            rendered.push(self.render(
                engine,
                &url,
                path,
                PageKind::Content,
                page.id.parse::<u64>().ok(),
            ));
        }

        self.merge_rendered(rendered, safe_title, out_dir)
    }

    fn render<E: Engine + ?Sized>(
        &self,
        engine: &mut E,
        url: &str,
        temp_path: PathBuf,
        kind: PageKind,
        order: Option<u64>,
    ) -> RenderedPage {
        let outcome = render_page(engine, self.config, url, &temp_path);
        RenderedPage {
            kind,
            order,
            temp_path,
            succeeded: outcome.succeeded(),
        }
    }

    /// Merge the successful snapshots in `rendered` and remove all of them.
    pub fn merge_rendered(
        &self,
        rendered: Vec<RenderedPage>,
        safe_title: &str,
        out_dir: &Path,
    ) -> Result<AssembledDocument> {
        let (mut candidates, failed): (Vec<_>, Vec<_>) =
            rendered.into_iter().partition(|p| p.succeeded);
        if !failed.is_empty() {
            warn!("{} page(s) failed to render and were skipped", failed.len());
        }
        if candidates.is_empty() {
            remove_temp_files(failed.iter().map(|p| p.temp_path.as_path()));
            return Err(Error::Assembly(
                "No pages rendered; aborting merge.".to_string(),
            ));
        }

        sort_rendered(&mut candidates);
        let inputs: Vec<PathBuf> = candidates.iter().map(|p| p.temp_path.clone()).collect();

        let final_path = unique_output_path(&out_dir.join(format!("{}.pdf", safe_title)));
        let mut document = merge::merge_files(&inputs)?;
        let pdf_pages = merge::write_document(&mut document, &final_path)?;
        debug!(
            "Merged {} snapshot(s) into {} PDF page(s)",
            inputs.len(),
            pdf_pages
        );
        info!("PDF saved: {}", final_path.display());

        remove_temp_files(
            candidates
                .iter()
                .chain(failed.iter())
                .map(|p| p.temp_path.as_path()),
        );

        Ok(AssembledDocument {
            final_path,
            merged_page_count: inputs.len(),
        })
    }
}

/// Best-effort removal; a permission error is logged, never raised.
fn remove_temp_files<'p>(paths: impl IntoIterator<Item = &'p Path>) {
    for path in paths {
        match std::fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                warn!("Permission denied deleting '{}': {}", path.display(), e);
            }
            Err(e) => debug!("Could not delete '{}': {}", path.display(), e),
        }
    }
}

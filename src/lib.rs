//! Activity PDF
//!
//! Converts a multi-page learning activity hosted by the activity player into
//! a single paginated PDF. The pipeline resolves the input URL into an
//! [`ActivityReference`], fetches the activity's title and page list, renders
//! every page through a headless browser as a height-fitted snapshot and
//! merges the snapshots, landing page first, into one document.
//!
//! # Features
//!
//! - **CDP Backend** (default): renders pages through headless Chrome
//! - **Swappable capabilities**: the browser ([`Engine`]), the metadata
//!   service ([`metadata::MetadataSource`]) and the format converter
//!   ([`convert::DocumentConverter`]) are traits, so the pipeline can run
//!   against in-memory fakes
//!
//! # Example
//!
//! ```no_run
//! use activity_pdf::{pipeline::Converter, ConverterConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConverterConfig {
//!     scroll_iterations: 10,
//!     ..Default::default()
//! };
//!
//! let converter = Converter::new(config)?;
//! let report = converter.run::<activity_pdf::cdp::CdpEngine>(
//!     "https://activity-player.concord.org/?activity=https%3A%2F%2Fauthoring.concord.org%2Fapi%2Fv1%2Factivities%2F42.json",
//!     std::path::Path::new("out"),
//! )?;
//! println!("Saved {}", report.pdf.final_path.display());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

pub mod error;
pub use error::{Error, Result};

pub mod assembler;
pub mod convert;
pub mod merge;
pub mod metadata;
pub mod pipeline;
pub mod player;
pub mod reference;
pub mod renderer;

#[cfg(feature = "cdp")]
pub mod cdp;

pub use assembler::{AssembledDocument, Assembler, PageKind, RenderedPage};
pub use metadata::{ActivityMetadata, PageDescriptor};
pub use reference::ActivityReference;
pub use renderer::RenderOutcome;

/// Configuration for a conversion run
///
/// One immutable value is created per run and passed by reference to every
/// component. The defaults reproduce the page geometry and timings the
/// activity player has been rendered with so far.
///
/// # Examples
///
/// ```
/// let cfg = activity_pdf::ConverterConfig::default();
/// assert_eq!(cfg.scroll_iterations, 20);
/// assert_eq!(cfg.player_base_url, "https://activity-player.concord.org/");
/// ```
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// Directory holding per-page snapshots for the duration of a run
    pub temp_dir: PathBuf,
    /// Base URL of the activity player; the page query is appended after `?`
    pub player_base_url: String,
    /// Fixed page width in inches
    pub paper_width_in: f64,
    /// Page margins in inches
    pub margins: Margins,
    /// CSS pixels per inch used to turn the content height into a page length
    pub px_per_inch: f64,
    /// CSS selector of the root content container
    pub content_selector: String,
    /// How long to wait for the content container to appear, in milliseconds
    pub element_timeout_ms: u64,
    /// Delay after the container appears, letting asynchronous content populate
    pub settle_delay_ms: u64,
    /// Number of scroll-to-bottom polls used to let lazy content expand
    pub scroll_iterations: u32,
    /// Delay between two scroll polls in milliseconds
    pub scroll_interval_ms: u64,
    /// Static label printed in the page header
    pub header_label: String,
    /// Browser window size
    pub viewport: Viewport,
    /// Chrome executable; auto-detected when `None`
    pub browser_path: Option<PathBuf>,
    /// Timeout for metadata requests in milliseconds
    pub http_timeout_ms: u64,
    /// User agent sent to the metadata service
    pub user_agent: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            temp_dir: PathBuf::from("tmp_pdfs"),
            player_base_url: "https://activity-player.concord.org/".to_string(),
            paper_width_in: 12.5,
            margins: Margins::uniform(0.5),
            px_per_inch: 96.0,
            content_selector: "div.app[data-cy='app']".to_string(),
            element_timeout_ms: 30000,
            settle_delay_ms: 1000,
            scroll_iterations: 20,
            scroll_interval_ms: 300,
            header_label: "Activity".to_string(),
            viewport: Viewport::default(),
            browser_path: None,
            http_timeout_ms: 30000,
            user_agent: concat!("activity-pdf/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Page margins in inches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Margins {
    pub fn uniform(inches: f64) -> Self {
        Self {
            top: inches,
            bottom: inches,
            left: inches,
            right: inches,
        }
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Parameters of a "print current view" command
///
/// All lengths are in inches. Templates are HTML fragments rendered by the
/// browser; `pageNumber` and `totalPages` classes are filled in by it.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintOptions {
    pub paper_width_in: f64,
    pub paper_height_in: f64,
    pub margins: Margins,
    pub print_background: bool,
    pub header_template: String,
    pub footer_template: String,
}

/// Browser capability driven by the page renderer
///
/// One long-lived engine is opened per run and passed by mutable reference
/// into every render, so no two navigations ever overlap.
pub trait Engine {
    /// Launch a new browser session with the given configuration
    fn new(config: &ConverterConfig) -> Result<Self>
    where
        Self: Sized;

    /// Navigate to a URL and wait for the navigation to finish
    fn navigate(&mut self, url: &str) -> Result<()>;

    /// Wait until an element matching `selector` is present.
    ///
    /// Fails with [`Error::Timeout`] when it does not appear in time.
    fn wait_for_element(&mut self, selector: &str, timeout_ms: u64) -> Result<()>;

    /// Evaluate JavaScript in the page and return its JSON value
    fn evaluate_script(&mut self, script: &str) -> Result<serde_json::Value>;

    /// Print the current view to a PDF sized by `options`
    fn print_to_pdf(&mut self, options: &PrintOptions) -> Result<Vec<u8>>;

    /// Close the session and release the browser process
    fn close(self) -> Result<()>;
}

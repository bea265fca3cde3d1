//! Chrome DevTools Protocol adapter implementation

use crate::{ConverterConfig, Engine, Error, PrintOptions, Result};
use headless_chrome::browser::tab::Tab;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions};
use log::debug;
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

/// Chrome flags for rendering in containers and CI machines
const CHROME_ARGS: &[&str] = &[
    "--disable-gpu",
    "--disable-dev-shm-usage",
    "--disable-extensions",
    "--disable-software-rasterizer",
];

/// CDP-based engine (uses the `headless_chrome` crate)
///
/// Launches a headless Chrome instance and drives a single tab that is reused
/// for every page of a run.
pub struct CdpEngine {
    browser: Browser,
    tab: Arc<Tab>,
}

impl Engine for CdpEngine {
    fn new(config: &ConverterConfig) -> Result<Self>
    where
        Self: Sized,
    {
        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .window_size(Some((config.viewport.width, config.viewport.height)))
            .path(config.browser_path.clone())
            .args(CHROME_ARGS.iter().map(OsStr::new).collect())
            .idle_browser_timeout(Duration::from_millis(
                config.element_timeout_ms.saturating_mul(10),
            ))
            .build()
            .map_err(|e| Error::Browser(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::Browser(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| Error::Browser(format!("Failed to create tab: {}", e)))?;
        tab.set_default_timeout(Duration::from_millis(config.element_timeout_ms));

        Ok(Self { browser, tab })
    }

    fn navigate(&mut self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| Error::Browser(format!("Navigation failed: {}", e)))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| Error::Browser(format!("Wait for navigation failed: {}", e)))?;
        Ok(())
    }

    fn wait_for_element(&mut self, selector: &str, timeout_ms: u64) -> Result<()> {
        self.tab
            .wait_for_element_with_custom_timeout(selector, Duration::from_millis(timeout_ms))
            .map_err(|e| {
                debug!("Waiting for '{}' failed: {}", selector, e);
                Error::Timeout(timeout_ms)
            })?;
        Ok(())
    }

    fn evaluate_script(&mut self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| Error::Render(format!("Evaluation failed: {}", e)))?;

        Ok(result.value.unwrap_or(serde_json::Value::Null))
    }

    fn print_to_pdf(&mut self, options: &PrintOptions) -> Result<Vec<u8>> {
        let pdf_options = PrintToPdfOptions {
            print_background: Some(options.print_background),
            paper_width: Some(options.paper_width_in),
            paper_height: Some(options.paper_height_in),
            margin_top: Some(options.margins.top),
            margin_bottom: Some(options.margins.bottom),
            margin_left: Some(options.margins.left),
            margin_right: Some(options.margins.right),
            display_header_footer: Some(true),
            header_template: Some(options.header_template.clone()),
            footer_template: Some(options.footer_template.clone()),
            ..Default::default()
        };

        let pdf = self
            .tab
            .print_to_pdf(Some(pdf_options))
            .map_err(|e| Error::Render(format!("Print to PDF failed: {}", e)))?;
        Ok(pdf)
    }

    fn close(self) -> Result<()> {
        // Dropping the browser terminates the child process.
        drop(self.tab);
        drop(self.browser);
        Ok(())
    }
}

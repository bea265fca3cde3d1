//! Rendering of one player page into a height-fitted PDF snapshot.
//!
//! The activity player lays a page out inside a scrollable container whose
//! content is populated asynchronously. After the container appears the
//! renderer scrolls it to the bottom a fixed number of times so lazily loaded
//! content can expand it, then prints a single tall page sized to the last
//! reported `scrollHeight`.
//!
//! The last polled height is accepted as-is, even if it is smaller than an
//! earlier poll. A container that keeps growing after the final poll yields a
//! truncated page.

use crate::{ConverterConfig, Engine, Error, PrintOptions, Result};
use log::{debug, info, warn};
use std::path::Path;
use std::thread;
use std::time::Duration;

/// Result of rendering one page
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// The snapshot was written to the output path
    Rendered {
        content_height_px: f64,
        page_height_in: f64,
    },
    /// Nothing usable was written
    Failed { reason: String },
}

impl RenderOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, RenderOutcome::Rendered { .. })
    }
}

/// Render `url` into a PDF at `out_path`.
///
/// Never fails past its own boundary: any navigation, timeout, script, print
/// or write error is logged and reported as [`RenderOutcome::Failed`].
pub fn render_page<E: Engine + ?Sized>(
    engine: &mut E,
    config: &ConverterConfig,
    url: &str,
    out_path: &Path,
) -> RenderOutcome {
    info!(" → Rendering: {}", url);
    match try_render(engine, config, url, out_path) {
        Ok(content_height_px) => RenderOutcome::Rendered {
            content_height_px,
            page_height_in: page_height_in(config, content_height_px),
        },
        Err(e) => {
            warn!("PDF failed for {}: {}", url, e);
            RenderOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}

fn try_render<E: Engine + ?Sized>(
    engine: &mut E,
    config: &ConverterConfig,
    url: &str,
    out_path: &Path,
) -> Result<f64> {
    engine.navigate(url)?;
    engine.wait_for_element(&config.content_selector, config.element_timeout_ms)?;
    thread::sleep(Duration::from_millis(config.settle_delay_ms));

    let script = scroll_script(&config.content_selector);
    let mut height = 0.0;
    for _ in 0..config.scroll_iterations {
        let value = engine.evaluate_script(&script)?;
        height = value.as_f64().ok_or_else(|| {
            Error::Render(format!("scroll height was not a number: {}", value))
        })?;
        thread::sleep(Duration::from_millis(config.scroll_interval_ms));
    }
    debug!("Final content height for {}: {}px", url, height);

    let pdf = engine.print_to_pdf(&print_options(config, height))?;
    std::fs::write(out_path, pdf)?;
    Ok(height)
}

/// Total page length in inches for a container `content_height_px` tall
pub fn page_height_in(config: &ConverterConfig, content_height_px: f64) -> f64 {
    content_height_px / config.px_per_inch + config.margins.top + config.margins.bottom
}

/// Print parameters for a page whose content is `content_height_px` tall
pub fn print_options(config: &ConverterConfig, content_height_px: f64) -> PrintOptions {
    PrintOptions {
        paper_width_in: config.paper_width_in,
        paper_height_in: page_height_in(config, content_height_px),
        margins: config.margins,
        print_background: true,
        header_template: format!(
            "<div style='font-size:10px;text-align:center;'>{}</div>",
            config.header_label
        ),
        footer_template: "<div style='font-size:10px;text-align:center;'>\
            <span class='pageNumber'></span> / \
            <span class='totalPages'></span></div>"
            .to_string(),
    }
}

/// Script scrolling the container to its bottom and returning its scroll height
pub fn scroll_script(selector: &str) -> String {
    let selector = serde_json::Value::String(selector.to_string());
    format!(
        "(function(){{const el=document.querySelector({});\
         if(!el)return null;\
         el.scrollTo(0,el.scrollHeight);\
         return el.scrollHeight;}})()",
        selector
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::collections::VecDeque;

    #[derive(Default)]
    struct ScriptedEngine {
        heights: VecDeque<Value>,
        fail_wait: bool,
        printed: Vec<PrintOptions>,
        visited: Vec<String>,
    }

    impl Engine for ScriptedEngine {
        fn new(_config: &ConverterConfig) -> Result<Self> {
            Ok(Self::default())
        }

        fn navigate(&mut self, url: &str) -> Result<()> {
            self.visited.push(url.to_string());
            Ok(())
        }

        fn wait_for_element(&mut self, _selector: &str, timeout_ms: u64) -> Result<()> {
            if self.fail_wait {
                Err(Error::Timeout(timeout_ms))
            } else {
                Ok(())
            }
        }

        fn evaluate_script(&mut self, _script: &str) -> Result<Value> {
            Ok(self.heights.pop_front().unwrap_or(Value::Null))
        }

        fn print_to_pdf(&mut self, options: &PrintOptions) -> Result<Vec<u8>> {
            self.printed.push(options.clone());
            Ok(b"%PDF-1.5 fake".to_vec())
        }

        fn close(self) -> Result<()> {
            Ok(())
        }
    }

    fn fast_config(iterations: u32) -> ConverterConfig {
        ConverterConfig {
            settle_delay_ms: 0,
            scroll_interval_ms: 0,
            scroll_iterations: iterations,
            ..Default::default()
        }
    }

    #[test]
    fn last_polled_height_sizes_the_page() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("page.pdf");
        let mut engine = ScriptedEngine {
            heights: VecDeque::from(vec![json!(480), json!(1200), json!(960)]),
            ..Default::default()
        };

        let outcome = render_page(&mut engine, &fast_config(3), "https://player/?a", &out);

        // 960px / 96 + 0.5 + 0.5
        assert_eq!(
            outcome,
            RenderOutcome::Rendered {
                content_height_px: 960.0,
                page_height_in: 11.0
            }
        );
        assert_eq!(engine.visited, vec!["https://player/?a"]);
        let printed = &engine.printed[0];
        assert_eq!(printed.paper_width_in, 12.5);
        assert_eq!(printed.paper_height_in, 11.0);
        assert!(printed.print_background);
        assert!(printed.header_template.contains(">Activity<"));
        assert!(printed.footer_template.contains("pageNumber"));
        assert!(printed.footer_template.contains("totalPages"));
        assert_eq!(std::fs::read(&out).unwrap(), b"%PDF-1.5 fake");
    }

    #[test]
    fn timeout_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("page.pdf");
        let mut engine = ScriptedEngine {
            fail_wait: true,
            ..Default::default()
        };

        let outcome = render_page(&mut engine, &fast_config(3), "https://player/?b", &out);
        assert!(!outcome.succeeded());
        assert!(engine.printed.is_empty());
        assert!(!out.exists());
    }

    #[test]
    fn missing_container_fails_the_page() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("page.pdf");
        let mut engine = ScriptedEngine::default();

        match render_page(&mut engine, &fast_config(2), "https://player/?c", &out) {
            RenderOutcome::Failed { reason } => assert!(reason.contains("not a number")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn scroll_script_quotes_selector() {
        let script = scroll_script("div.app[data-cy='app']");
        assert!(script.contains(r#"document.querySelector("div.app[data-cy='app']")"#));
        assert!(script.contains("return el.scrollHeight"));
    }
}

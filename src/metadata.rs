//! Activity metadata retrieval.
//!
//! The authoring service publishes activities and sequences as JSON. An
//! activity carries a `name` and an ordered `pages` list; a sequence carries
//! an `activities` list of the same activity documents.

use crate::{ActivityReference, ConverterConfig, Error, Result};
use log::{debug, info};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Fetch-by-URL capability returning parsed JSON
pub trait MetadataSource {
    fn fetch_json(&self, url: &str) -> Result<Value>;
}

/// [`MetadataSource`] backed by a blocking HTTP client
pub struct HttpMetadataSource {
    client: Client,
}

impl HttpMetadataSource {
    pub fn new(config: &ConverterConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.http_timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl MetadataSource for HttpMetadataSource {
    fn fetch_json(&self, url: &str) -> Result<Value> {
        debug!("Fetching metadata from {}", url);
        let res = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::Network(format!("HTTP GET {} failed: {}", url, e)))?;

        res.json::<Value>()
            .map_err(|e| Error::Metadata(format!("{} did not return JSON: {}", url, e)))
    }
}

/// One page of an activity, in the order the service lists it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDescriptor {
    pub id: String,
    /// 1-based position in the page list
    pub ordinal: usize,
}

/// Display title and ordered pages of an activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityMetadata {
    pub title: String,
    pub pages: Vec<PageDescriptor>,
}

#[derive(Debug, Deserialize)]
struct ActivityDocument {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    pages: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct SequenceDocument {
    #[serde(default)]
    activities: Vec<ActivityDocument>,
}

/// Fetch the title and page list for `reference`.
///
/// For a sequence the member activity is matched by numeric id, ignoring any
/// non-numeric prefix on the reference's activity id; no match is
/// [`Error::ResourceNotFound`].
pub fn fetch_metadata<S: MetadataSource + ?Sized>(
    source: &S,
    reference: &ActivityReference,
) -> Result<ActivityMetadata> {
    let json = source.fetch_json(reference.resource_url())?;

    let (document, fallback_title) = match reference {
        ActivityReference::Activity { .. } => (parse::<ActivityDocument>(json)?, "Activity".to_string()),
        ActivityReference::Sequence {
            sequence_id,
            activity_id,
            ..
        } => {
            let wanted = activity_id.trim_start_matches(|c: char| !c.is_ascii_digit());
            let sequence = parse::<SequenceDocument>(json)?;
            let document = sequence
                .activities
                .into_iter()
                .find(|a| a.id.as_ref().and_then(id_string).as_deref() == Some(wanted))
                .ok_or_else(|| {
                    Error::ResourceNotFound(format!(
                        "activity {} not found in sequence {}",
                        activity_id, sequence_id
                    ))
                })?;
            (document, format!("Activity_{}", activity_id))
        }
    };

    let title = document
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(fallback_title);
    let pages = document
        .pages
        .iter()
        .enumerate()
        .map(|(idx, page)| {
            let ordinal = idx + 1;
            PageDescriptor {
                id: page
                    .get("id")
                    .and_then(id_string)
                    .unwrap_or_else(|| ordinal.to_string()),
                ordinal,
            }
        })
        .collect::<Vec<_>>();

    info!("Activity: {} ({} pages)", title, pages.len());
    Ok(ActivityMetadata { title, pages })
}

fn parse<T: serde::de::DeserializeOwned>(json: Value) -> Result<T> {
    serde_json::from_value(json).map_err(|e| Error::Metadata(e.to_string()))
}

/// Ids arrive as numbers or strings
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

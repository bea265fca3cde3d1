//! Resolution of player URLs into activity references.
//!
//! Two encodings are understood: a standalone activity
//! (`?activity=<resource>.json[&page=..][&runKey=..]`) and an activity inside a
//! sequence (`?sequence=<resource>.json&sequenceActivity=..[&preview]`). The
//! nested resource URL is percent-decoded and its numeric id is taken from the
//! `<id>.json` final path segment.

use crate::{Error, Result};
use log::debug;
use url::Url;

/// A canonical reference to one activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityReference {
    /// A standalone activity
    Activity {
        resource_url: String,
        activity_id: String,
        run_key: Option<String>,
        page_hint: Option<String>,
    },
    /// An activity embedded in a sequence
    Sequence {
        resource_url: String,
        sequence_id: String,
        /// Raw `sequenceActivity` value; may carry an `activity_` style prefix
        activity_id: String,
        preview: bool,
        page_hint: Option<String>,
    },
}

impl ActivityReference {
    /// The metadata resource URL (activity or sequence JSON)
    pub fn resource_url(&self) -> &str {
        match self {
            ActivityReference::Activity { resource_url, .. }
            | ActivityReference::Sequence { resource_url, .. } => resource_url,
        }
    }

    pub fn activity_id(&self) -> &str {
        match self {
            ActivityReference::Activity { activity_id, .. }
            | ActivityReference::Sequence { activity_id, .. } => activity_id,
        }
    }

    pub fn page_hint(&self) -> Option<&str> {
        match self {
            ActivityReference::Activity { page_hint, .. }
            | ActivityReference::Sequence { page_hint, .. } => page_hint.as_deref(),
        }
    }
}

/// Parse an input URL into an [`ActivityReference`].
///
/// Fails with [`Error::MalformedReference`] when the URL is not http(s), has
/// neither an `activity` nor a `sequence` resource, or the resource id cannot
/// be extracted.
pub fn resolve(input: &str) -> Result<ActivityReference> {
    let input = input.trim();
    let lower = input.to_ascii_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return Err(Error::MalformedReference(format!(
            "'{}' must start with http:// or https://",
            input
        )));
    }

    let url = Url::parse(input)
        .map_err(|e| Error::MalformedReference(format!("'{}' is not a valid URL: {}", input, e)))?;
    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    debug!("Query key order: {:?}", query_key_order(input));

    let page_hint = non_empty(&pairs, "page");

    if let Some(raw) = first(&pairs, "activity") {
        let resource_url = decode_nested(raw);
        let activity_id = trailing_numeric_id(&resource_url).ok_or_else(|| {
            Error::MalformedReference(format!("no activity id in '{}'", resource_url))
        })?;
        return Ok(ActivityReference::Activity {
            resource_url,
            activity_id,
            run_key: non_empty(&pairs, "runKey"),
            page_hint,
        });
    }

    let raw = first(&pairs, "sequence")
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            Error::MalformedReference(format!(
                "'{}' has neither an activity nor a sequence parameter",
                input
            ))
        })?;
    let resource_url = decode_nested(raw);
    let sequence_id = trailing_numeric_id(&resource_url).ok_or_else(|| {
        Error::MalformedReference(format!("no sequence id in '{}'", resource_url))
    })?;
    let activity_id = non_empty(&pairs, "sequenceActivity").ok_or_else(|| {
        Error::MalformedReference(format!("'{}' has no sequenceActivity parameter", input))
    })?;

    Ok(ActivityReference::Sequence {
        resource_url,
        sequence_id,
        activity_id,
        preview: first(&pairs, "preview").is_some(),
        page_hint,
    })
}

/// Literal order of the keys of every `key=value` pair in the query string.
///
/// Bare flags such as `preview` are not included.
pub fn query_key_order(input: &str) -> Vec<String> {
    let Some((_, rest)) = input.split_once('?') else {
        return Vec::new();
    };
    let query = rest.split('#').next().unwrap_or_default();
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, _)| key)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

fn first<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn non_empty(pairs: &[(String, String)], key: &str) -> Option<String> {
    first(pairs, key)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Query values are already decoded once; nested resource URLs are commonly
/// encoded twice, so decode again.
fn decode_nested(value: &str) -> String {
    match urlencoding::decode(value) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => value.to_string(),
    }
}

/// Numeric id in front of `.json` in the final path segment.
fn trailing_numeric_id(resource_url: &str) -> Option<String> {
    let path = resource_url.split(&['?', '#'][..]).next()?;
    let segment = path.rsplit('/').next()?;
    let id = segment.strip_suffix(".json")?;
    if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
        Some(id.to_string())
    } else {
        None
    }
}
